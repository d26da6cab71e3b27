mod util;

use std::sync::Arc;

use certstore::cert::{DigestAlgorithm, SignatureAlgorithm};
use certstore::chain::CertChainAndKey;
use certstore::config::Config;
use certstore::error::CertStoreError;
use certstore::key::{AuthMethod, KeyPair};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509, X509NameBuilder};
use util::{Pki, leaf_subject};

/// Self-signed certificate built entirely by OpenSSL.
fn openssl_self_signed(key: &PKeyRef<Private>, digest: MessageDigest, names: &[&str]) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, names[0]).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();

    let mut san = SubjectAlternativeName::new();
    for name in names {
        san.dns(name);
    }
    let san = san.build(&builder.x509v3_context(None, None)).unwrap();
    builder.append_extension(san).unwrap();

    builder.sign(key, digest).unwrap();
    builder.build()
}

fn cert_pem(cert: &X509) -> String {
    String::from_utf8(cert.to_pem().unwrap()).unwrap()
}

#[test]
fn test_openssl_p384_sec1_key() {
    let group = EcGroup::from_curve_name(Nid::SECP384R1).unwrap();
    let ec_key = EcKey::generate(&group).unwrap();
    let key_pem = String::from_utf8(ec_key.private_key_to_pem().unwrap()).unwrap();
    assert!(key_pem.contains("BEGIN EC PRIVATE KEY"));
    let pkey = PKey::from_ec_key(ec_key).unwrap();

    let cert = openssl_self_signed(&pkey, MessageDigest::sha384(), &["ec.alligator.com"]);
    let chain = CertChainAndKey::load_pem(&cert_pem(&cert), &key_pem).unwrap();

    assert_eq!(chain.len(), 1);
    assert!(chain.leaf().is_self_signed());
    assert_eq!(chain.leaf().signature_algorithm(), &SignatureAlgorithm::Sha384WithECDSA);
    assert_eq!(chain.leaf().signature_digest(), DigestAlgorithm::Sha384);
    assert_eq!(chain.auth_method(), AuthMethod::Ecdsa);
    assert_eq!(chain.domain_names(), ["ec.alligator.com"]);
    assert!(matches!(chain.private_key(), Some(KeyPair::EcdsaP384 { .. })));
}

#[test]
fn test_openssl_rsa_pkcs1_key() {
    let rsa = Rsa::generate(2048).unwrap();
    let key_pem = String::from_utf8(rsa.private_key_to_pem().unwrap()).unwrap();
    assert!(key_pem.contains("BEGIN RSA PRIVATE KEY"));
    let pkey = PKey::from_rsa(rsa).unwrap();

    let cert = openssl_self_signed(
        &pkey,
        MessageDigest::sha512(),
        &["rsa.alligator.com", "www.rsa.alligator.com"],
    );
    let chain = CertChainAndKey::load_pem(&cert_pem(&cert), &key_pem).unwrap();

    assert_eq!(chain.leaf().signature_algorithm(), &SignatureAlgorithm::Sha512WithRSA);
    assert_eq!(chain.leaf().signature_digest(), DigestAlgorithm::Sha512);
    assert_eq!(chain.auth_method(), AuthMethod::Rsa);
    assert_eq!(
        chain.domain_names(),
        ["rsa.alligator.com", "www.rsa.alligator.com"]
    );

    // A PKCS#8 encoding of a different key does not match.
    let other = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let other_pem = String::from_utf8(other.private_key_to_pem_pkcs8().unwrap()).unwrap();
    assert_eq!(
        CertChainAndKey::load_pem(&cert_pem(&cert), &other_pem).unwrap_err(),
        CertStoreError::KeyMismatch
    );
}

#[test]
fn test_openssl_ed25519_pkcs8_key() {
    let pkey = PKey::generate_ed25519().unwrap();
    let key_pem = String::from_utf8(pkey.private_key_to_pem_pkcs8().unwrap()).unwrap();

    let cert = openssl_self_signed(&pkey, MessageDigest::null(), &["ed.alligator.com"]);
    let chain = CertChainAndKey::load_pem(&cert_pem(&cert), &key_pem).unwrap();

    assert_eq!(chain.leaf().signature_algorithm(), &SignatureAlgorithm::Ed25519);
    assert_eq!(chain.leaf().signature_digest(), DigestAlgorithm::Intrinsic);
    assert_eq!(chain.auth_method(), AuthMethod::Ed25519);

    let mut config = Config::new();
    config.add_cert_chain_and_key_to_store(Arc::new(chain)).unwrap();
    let selected = config
        .select_certificate(Some("ed.alligator.com"), &[AuthMethod::Ed25519])
        .unwrap();
    assert_eq!(selected.leaf().der(), cert.to_der().unwrap());
}

#[test]
fn test_openssl_crate_validate_chain() {
    let pki = Pki::new(KeyPair::generate_ecdsa_p384());
    let fixture = pki.issue(
        KeyPair::generate_ecdsa_p256(),
        leaf_subject("server.myca.local"),
        &["server.myca.local", "*.server.myca.local"],
    );

    let leaf = X509::from_pem(fixture.leaf.to_pem().as_bytes()).expect("Failed to parse PEM");
    let intermediate = X509::from_pem(fixture.intermediate.to_pem().as_bytes()).unwrap();
    let root = X509::from_pem(fixture.root.to_pem().as_bytes()).unwrap();

    // Check subject
    let subject = leaf
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(subject.to_string(), "server.myca.local", "Subject CN mismatch");

    // Check issuer
    let issuer = leaf
        .issuer_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(issuer.to_string(), "intermediate.myca.local", "Issuer CN mismatch");

    assert_eq!(leaf.version(), 2, "X509 version should be 3 (0-based index)");

    let dns_names: Vec<String> = leaf
        .subject_alt_names()
        .unwrap()
        .iter()
        .filter_map(|name| name.dnsname().map(str::to_string))
        .collect();
    assert_eq!(dns_names, vec!["server.myca.local", "*.server.myca.local"]);

    assert_eq!(
        leaf.signature_algorithm().object().nid(),
        Nid::ECDSA_WITH_SHA256
    );
    assert_eq!(
        intermediate.signature_algorithm().object().nid(),
        Nid::ECDSA_WITH_SHA384
    );

    // Each signature verifies under the next certificate's key.
    assert!(leaf.verify(&intermediate.public_key().unwrap()).unwrap());
    assert!(intermediate.verify(&root.public_key().unwrap()).unwrap());
    assert!(root.verify(&root.public_key().unwrap()).unwrap());
}

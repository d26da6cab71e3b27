mod util;

use std::sync::Arc;

use certstore::chain::CertChainAndKey;
use certstore::config::Config;
use certstore::error::CertStoreError;
use certstore::key::{AuthMethod, KeyPair};
use certstore::ownership::CertOwnership;
use util::{Pki, leaf_subject};

#[test]
fn test_single_default_per_auth_method() {
    let pki = Pki::new(KeyPair::generate_ecdsa_p256());
    let first = pki.issue(
        KeyPair::generate_ecdsa_p256(),
        leaf_subject("first.alligator.com"),
        &["first.alligator.com"],
    );
    let second = pki.issue(
        KeyPair::generate_ecdsa_p384(),
        leaf_subject("second.alligator.com"),
        &["second.alligator.com"],
    );
    let ed25519 = pki.issue(
        KeyPair::generate_ed25519(),
        leaf_subject("ed.alligator.com"),
        &["ed.alligator.com"],
    );

    let mut config = Config::new();
    let registered = config
        .add_cert_chain_and_key(&first.chain_pem(), &first.key_pem())
        .unwrap();
    assert_eq!(config.cert_ownership(), CertOwnership::LibOwned);

    assert_eq!(
        config
            .add_cert_chain_and_key(&second.chain_pem(), &second.key_pem())
            .unwrap_err(),
        CertStoreError::MultipleDefaultCertificatesPerAuthType(AuthMethod::Ecdsa)
    );
    assert!(config.cert_store().get("second.alligator.com").is_none());

    // The first chain is still the one selected.
    let selected = config.select_certificate(None, &[AuthMethod::Ecdsa]).unwrap();
    assert!(Arc::ptr_eq(selected, &registered));
    let selected = config
        .select_certificate(Some("first.alligator.com"), &[AuthMethod::Ecdsa])
        .unwrap();
    assert!(Arc::ptr_eq(selected, &registered));

    // Another auth method gets its own default.
    config
        .add_cert_chain_and_key(&ed25519.chain_pem(), &ed25519.key_pem())
        .unwrap();
    assert_eq!(
        config
            .default_cert_chain(AuthMethod::Ed25519)
            .unwrap()
            .domain_names(),
        ["ed.alligator.com"]
    );
}

#[test]
fn test_defaults_sharing_a_name_follow_accepted_order() {
    let pki = Pki::new(KeyPair::generate_ecdsa_p256());
    let ecdsa = pki.issue(
        KeyPair::generate_ecdsa_p256(),
        leaf_subject("www.alligator.com"),
        &["www.alligator.com"],
    );
    let ed25519 = pki.issue(
        KeyPair::generate_ed25519(),
        leaf_subject("www.alligator.com"),
        &["www.alligator.com"],
    );

    let mut config = Config::new();
    let ecdsa = config
        .add_cert_chain_and_key(&ecdsa.chain_pem(), &ecdsa.key_pem())
        .unwrap();
    let ed25519 = config
        .add_cert_chain_and_key(&ed25519.chain_pem(), &ed25519.key_pem())
        .unwrap();
    assert_eq!(config.cert_store().get("www.alligator.com").unwrap().len(), 2);

    let selected = config
        .select_certificate(
            Some("www.alligator.com"),
            &[AuthMethod::Ecdsa, AuthMethod::Ed25519],
        )
        .unwrap();
    assert!(Arc::ptr_eq(selected, &ecdsa));
    let selected = config
        .select_certificate(
            Some("www.alligator.com"),
            &[AuthMethod::Ed25519, AuthMethod::Ecdsa],
        )
        .unwrap();
    assert!(Arc::ptr_eq(selected, &ed25519));
    let selected = config
        .select_certificate(Some("www.alligator.com"), &AuthMethod::ALL)
        .unwrap();
    assert!(Arc::ptr_eq(selected, &ecdsa));
}

#[test]
fn test_lib_owned_rejects_store_api() {
    let fixture = util::chain_for(&["www.alligator.com"]);
    let mut config = Config::new();
    config
        .add_cert_chain_and_key(&fixture.chain_pem(), &fixture.key_pem())
        .unwrap();

    let app_chain = util::shared_chain(KeyPair::generate_ed25519(), &["app.alligator.com"]);
    assert_eq!(
        config
            .add_cert_chain_and_key_to_store(Arc::clone(&app_chain))
            .unwrap_err(),
        CertStoreError::CertOwnershipConflict
    );
    assert_eq!(
        config
            .set_cert_chain_and_key_defaults(&[Arc::clone(&app_chain)])
            .unwrap_err(),
        CertStoreError::CertOwnershipConflict
    );

    assert_eq!(config.cert_ownership(), CertOwnership::LibOwned);
    assert!(config.cert_store().get("app.alligator.com").is_none());
    assert!(config.default_cert_chain(AuthMethod::Ed25519).is_none());
}

#[test]
fn test_app_owned_rejects_single_default_api() {
    let mut config = Config::new();
    let first = util::shared_chain(KeyPair::generate_ecdsa_p256(), &["www.alligator.com"]);
    let second = util::shared_chain(KeyPair::generate_ecdsa_p256(), &["www.alligator.com"]);
    config.add_cert_chain_and_key_to_store(Arc::clone(&first)).unwrap();
    config.add_cert_chain_and_key_to_store(Arc::clone(&second)).unwrap();
    assert_eq!(config.cert_ownership(), CertOwnership::AppOwned);
    assert_eq!(config.cert_store().get("www.alligator.com").unwrap().len(), 2);

    let fixture = util::chain_for(&["lib.alligator.com"]);
    assert_eq!(
        config
            .add_cert_chain_and_key(&fixture.chain_pem(), &fixture.key_pem())
            .unwrap_err(),
        CertStoreError::CertOwnershipConflict
    );
    assert_eq!(
        config.add_default_cert_chain(fixture.load()).unwrap_err(),
        CertStoreError::CertOwnershipConflict
    );
    assert_eq!(config.cert_ownership(), CertOwnership::AppOwned);
    assert!(config.cert_store().get("lib.alligator.com").is_none());
}

#[test]
fn test_failed_registration_keeps_ownership_unclaimed() {
    let mut config = Config::new();
    let fixture = util::chain_for(&["www.alligator.com"]);
    let wrong_key = KeyPair::generate_ecdsa_p256().to_pkcs8_pem().unwrap();

    assert_eq!(
        config
            .add_cert_chain_and_key(&fixture.chain_pem(), &wrong_key)
            .unwrap_err(),
        CertStoreError::KeyMismatch
    );
    assert_eq!(config.cert_ownership(), CertOwnership::NotOwned);
    assert!(config.cert_store().is_empty());

    assert!(matches!(
        config.set_cert_chain_and_key_defaults(&[]),
        Err(CertStoreError::InvalidInput(_))
    ));
    assert_eq!(config.cert_ownership(), CertOwnership::NotOwned);

    // Either API is still available.
    config
        .add_cert_chain_and_key_to_store(Arc::new(fixture.load()))
        .unwrap();
    assert_eq!(config.cert_ownership(), CertOwnership::AppOwned);
}

#[test]
fn test_single_default_api_needs_private_key() {
    let fixture = util::chain_for(&["www.alligator.com"]);
    let public_only = CertChainAndKey::load_public_pem(&fixture.chain_pem()).unwrap();

    let mut config = Config::new();
    assert!(matches!(
        config.add_default_cert_chain(public_only),
        Err(CertStoreError::InvalidInput(_))
    ));
    assert_eq!(config.cert_ownership(), CertOwnership::NotOwned);

    // The store API accepts it.
    let public_only = CertChainAndKey::load_public_pem(&fixture.chain_pem()).unwrap();
    config
        .add_cert_chain_and_key_to_store(Arc::new(public_only))
        .unwrap();
}

#[test]
fn test_explicit_defaults() {
    let mut config = Config::new();
    let registered = util::shared_chain(KeyPair::generate_ecdsa_p256(), &["www.alligator.com"]);
    config
        .add_cert_chain_and_key_to_store(Arc::clone(&registered))
        .unwrap();
    assert!(Arc::ptr_eq(
        config.select_certificate(None, &AuthMethod::ALL).unwrap(),
        &registered
    ));

    let pinned_ecdsa = util::shared_chain(KeyPair::generate_ecdsa_p384(), &["pinned.alligator.com"]);
    let pinned_ed25519 = util::shared_chain(KeyPair::generate_ed25519(), &["pinned.alligator.com"]);
    assert_eq!(
        config
            .set_cert_chain_and_key_defaults(&[Arc::clone(&pinned_ecdsa), Arc::clone(&registered)])
            .unwrap_err(),
        CertStoreError::MultipleDefaultCertificatesPerAuthType(AuthMethod::Ecdsa)
    );
    assert!(!config.cert_store().defaults_are_explicit());

    config
        .set_cert_chain_and_key_defaults(&[Arc::clone(&pinned_ecdsa), Arc::clone(&pinned_ed25519)])
        .unwrap();
    assert!(config.cert_store().defaults_are_explicit());
    assert!(Arc::ptr_eq(
        config.select_certificate(None, &[AuthMethod::Ecdsa]).unwrap(),
        &pinned_ecdsa
    ));
    assert!(Arc::ptr_eq(
        config
            .select_certificate(Some("unknown.example.com"), &[AuthMethod::Ed25519])
            .unwrap(),
        &pinned_ed25519
    ));

    // Pinned defaults are not indexed by name.
    assert!(config.cert_store().get("pinned.alligator.com").is_none());

    // Later registrations leave the pinned defaults alone.
    let later = util::shared_chain(KeyPair::generate_ecdsa_p521(), &["later.alligator.com"]);
    config.add_cert_chain_and_key_to_store(later).unwrap();
    assert!(Arc::ptr_eq(
        config.default_cert_chain(AuthMethod::Ecdsa).unwrap(),
        &pinned_ecdsa
    ));
}

#![allow(dead_code)]

use std::sync::Arc;

use certstore::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use certstore::cert::{Certificate, CertificateWithPrivateKey};
use certstore::chain::{CertChainAndKey, ChainMaterial};
use certstore::issuer::Issuer;
use certstore::key::KeyPair;

pub fn generate_ca_cert(key: KeyPair) -> CertificateWithPrivateKey {
    let subject = DistinguishedName::builder()
        .common_name("myca.local".to_string())
        .organization("certstore tests".to_string())
        .build();
    let ca_cert_info = CertificationRequestInfo::builder()
        .subject(subject)
        .subject_public_key(key.public_key_info().unwrap())
        .is_ca(true)
        .build();

    CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&ca_cert_info, &key, Validity::for_days(365)).unwrap(),
        key,
    }
}

pub fn generate_intermediate(ca: &CertificateWithPrivateKey, key: KeyPair) -> CertificateWithPrivateKey {
    let subject = DistinguishedName::builder()
        .common_name("intermediate.myca.local".to_string())
        .organization("certstore tests".to_string())
        .build();
    let info = CertificationRequestInfo::builder()
        .subject(subject)
        .subject_public_key(key.public_key_info().unwrap())
        .is_ca(true)
        .build();

    CertificateWithPrivateKey {
        cert: ca.issue(&info, Validity::for_days(365)).unwrap(),
        key,
    }
}

/// Subject with the given Common Name.
pub fn leaf_subject(common_name: &str) -> DistinguishedName {
    DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
}

/// A root and an intermediate that issue leaves.
pub struct Pki {
    pub root: CertificateWithPrivateKey,
    pub intermediate: CertificateWithPrivateKey,
}

impl Pki {
    /// Root signed with `root_key`, intermediate with a P-256 key.
    pub fn new(root_key: KeyPair) -> Self {
        let root = generate_ca_cert(root_key);
        let intermediate = generate_intermediate(&root, KeyPair::generate_ecdsa_p256());
        Self { root, intermediate }
    }

    pub fn issue(&self, leaf_key: KeyPair, subject: DistinguishedName, names: &[&str]) -> ChainFixture {
        let info = CertificationRequestInfo::builder()
            .subject(subject)
            .subject_public_key(leaf_key.public_key_info().unwrap())
            .subject_alt_names(names.iter().map(|name| name.to_string()).collect())
            .build();
        ChainFixture {
            leaf: self.intermediate.issue(&info, Validity::for_days(30)).unwrap(),
            leaf_key,
            intermediate: self.intermediate.cert.clone(),
            root: self.root.cert.clone(),
        }
    }
}

/// Leaf, intermediate and root, plus the leaf's key.
pub struct ChainFixture {
    pub leaf: Certificate,
    pub leaf_key: KeyPair,
    pub intermediate: Certificate,
    pub root: Certificate,
}

impl ChainFixture {
    pub fn chain_pem(&self) -> String {
        [
            self.leaf.to_pem(),
            self.intermediate.to_pem(),
            self.root.to_pem(),
        ]
        .concat()
    }

    pub fn key_pem(&self) -> String {
        self.leaf_key.to_pkcs8_pem().unwrap()
    }

    pub fn ders(&self) -> Vec<Vec<u8>> {
        [&self.leaf, &self.intermediate, &self.root]
            .iter()
            .map(|cert| cert.der().to_vec())
            .collect()
    }

    pub fn load(&self) -> CertChainAndKey {
        CertChainAndKey::load_pem(&self.chain_pem(), &self.key_pem()).unwrap()
    }

    /// Builds the chain, indexed under `names` instead of the leaf's names.
    pub fn load_with_names(&self, names: &[&str]) -> CertChainAndKey {
        let material = ChainMaterial::builder()
            .certificates(self.ders())
            .private_key(self.leaf_key.clone())
            .domain_names(names.iter().map(|name| name.to_string()).collect())
            .build();
        CertChainAndKey::from_material(material).unwrap()
    }
}

/// A P-256 chain serving `names`.
pub fn chain_for(names: &[&str]) -> ChainFixture {
    Pki::new(KeyPair::generate_ecdsa_p256()).issue(
        KeyPair::generate_ecdsa_p256(),
        leaf_subject(names[0]),
        names,
    )
}

pub fn shared_chain(key: KeyPair, names: &[&str]) -> Arc<CertChainAndKey> {
    let pki = Pki::new(KeyPair::generate_ecdsa_p256());
    Arc::new(pki.issue(key, leaf_subject(names[0]), names).load())
}

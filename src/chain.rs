//! Certificate chains and the private keys that go with them.
//!
//! A [`CertChainAndKey`] is built once from decoded certificates and is
//! immutable after it has been shared with a [`Config`](crate::config::Config).

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use bon::Builder;
use log::debug;
use regex::Regex;

use crate::cert::Certificate;
use crate::error::{CertStoreError, Result};
use crate::key::{AuthMethod, KeyPair};
use crate::pem_utils;
use crate::store::{normalize_name, wildcard_name};

static NEXT_CHAIN_ID: AtomicU64 = AtomicU64::new(1);

static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*\.)?[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$")
        .expect("DNS name pattern is valid")
});

/// Process-unique identity of a [`CertChainAndKey`].
///
/// Callers that keep per-chain data outside the chain can key it by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    fn next() -> Self {
        ChainId(NEXT_CHAIN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

/// An ordered certificate sequence, leaf first.
///
/// Certificate `i` is always issued by certificate `i + 1`. The last
/// certificate is either self-signed or an intermediate whose root is
/// distributed out of band.
#[derive(Debug, Clone)]
pub struct CertChain {
    certs: Vec<Certificate>,
}

impl CertChain {
    /// Parses DER certificates given in presentation order.
    pub fn from_der_certificates<B: AsRef<[u8]>>(ders: &[B]) -> Result<Self> {
        if ders.is_empty() {
            return Err(CertStoreError::EmptyChain);
        }
        let certs = ders
            .iter()
            .map(|der| Certificate::from_der(der.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if let Some(index) = certs
            .windows(2)
            .position(|pair| !pair[0].is_issued_by(&pair[1]))
        {
            return Err(CertStoreError::BrokenChain { index });
        }
        Ok(Self { certs })
    }

    /// The end-entity certificate.
    pub fn leaf(&self) -> &Certificate {
        &self.certs[0]
    }

    pub fn get(&self, index: usize) -> Option<&Certificate> {
        self.certs.get(index)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Always false: construction rejects empty chains.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certs.iter()
    }

    /// Encodes the chain as concatenated PEM blocks.
    pub fn to_pem(&self) -> String {
        pem_utils::der_chain_to_pem(self.certs.iter().map(Certificate::der))
    }
}

impl<'a> IntoIterator for &'a CertChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Raw material for a [`CertChainAndKey`].
///
/// # Fields
/// * `certificates` - DER certificates, leaf first.
/// * `private_key` - The leaf's private key; omit for a public-only chain.
/// * `domain_names` - Names to index the chain under instead of the ones
///   found in the leaf certificate.
#[derive(Builder)]
pub struct ChainMaterial {
    certificates: Vec<Vec<u8>>,
    private_key: Option<KeyPair>,
    #[builder(default)]
    domain_names: Vec<String>,
}

/// A certificate chain, its private key, and the names it serves.
pub struct CertChainAndKey {
    id: ChainId,
    chain: CertChain,
    private_key: Option<KeyPair>,
    domain_names: Vec<String>,
    auth_method: AuthMethod,
    context: Option<Arc<dyn Any + Send + Sync>>,
}

impl CertChainAndKey {
    /// Builds a chain, checking linkage, the key, and the domain names.
    pub fn from_material(material: ChainMaterial) -> Result<Self> {
        let chain = CertChain::from_der_certificates(&material.certificates)?;
        let leaf_key = &chain.leaf().inner().tbs_certificate.subject_public_key_info;
        let auth_method = AuthMethod::from_spki(leaf_key)?;

        if let Some(key) = &material.private_key {
            if !key.matches_public_key(leaf_key)? {
                return Err(CertStoreError::KeyMismatch);
            }
        }

        let domain_names = if material.domain_names.is_empty() {
            leaf_domain_names(chain.leaf())?
        } else {
            override_domain_names(&material.domain_names)?
        };
        if domain_names.is_empty() {
            return Err(CertStoreError::NoValidDomains);
        }

        let id = ChainId::next();
        debug!(
            "built {id}: {} certificate(s), {auth_method}, names {domain_names:?}",
            chain.len()
        );
        Ok(Self {
            id,
            chain,
            private_key: material.private_key,
            domain_names,
            auth_method,
            context: None,
        })
    }

    /// Loads a PEM certificate chain (leaf first) and its PEM private key.
    pub fn load_pem(chain_pem: &str, key_pem: &str) -> Result<Self> {
        let material = ChainMaterial::builder()
            .certificates(pem_utils::pem_to_der_chain(chain_pem)?)
            .private_key(KeyPair::import_from_pem(key_pem)?)
            .build();
        Self::from_material(material)
    }

    /// Loads a PEM certificate chain without a private key.
    ///
    /// Such a chain can be registered in a store, but the handshake layer
    /// has to produce signatures for it by other means.
    pub fn load_public_pem(chain_pem: &str) -> Result<Self> {
        let material = ChainMaterial::builder()
            .certificates(pem_utils::pem_to_der_chain(chain_pem)?)
            .build();
        Self::from_material(material)
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn cert_chain(&self) -> &CertChain {
        &self.chain
    }

    /// Certificates in presentation order, leaf first.
    pub fn certificates(&self) -> &[Certificate] {
        &self.chain.certs
    }

    /// Number of certificates in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn leaf(&self) -> &Certificate {
        self.chain.leaf()
    }

    /// `None` for chains loaded with [`CertChainAndKey::load_public_pem`].
    pub fn private_key(&self) -> Option<&KeyPair> {
        self.private_key.as_ref()
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    /// Normalized names this chain is indexed under.
    pub fn domain_names(&self) -> &[String] {
        &self.domain_names
    }

    /// Whether the chain serves `name`, directly or through a wildcard.
    pub fn matches_dns_name(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.domain_names.contains(&name)
            || wildcard_name(&name).is_some_and(|wildcard| self.domain_names.contains(&wildcard))
    }

    /// Attaches caller data, typically read back by a tiebreak resolver.
    ///
    /// The chain shares the `Arc`, so the caller may keep its own handle.
    /// Only possible before the chain itself is shared.
    pub fn set_context<T: Any + Send + Sync>(&mut self, context: Arc<T>) {
        self.context = Some(context);
    }

    /// The attached caller data, if any was set and it is a `T`.
    pub fn context<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.context.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for CertChainAndKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertChainAndKey")
            .field("id", &self.id)
            .field("auth_method", &self.auth_method)
            .field("domain_names", &self.domain_names)
            .field("certificates", &self.chain.len())
            .field("has_private_key", &self.private_key.is_some())
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

/// subjectAltName DNS entries, or the Common Name when there are none.
fn leaf_domain_names(leaf: &Certificate) -> Result<Vec<String>> {
    let mut names = leaf.dns_names()?;
    if names.is_empty() {
        names.extend(leaf.common_name());
    }
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names.iter().map(|name| normalize_name(name)) {
        if !name.is_empty() && !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    Ok(normalized)
}

fn override_domain_names(names: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = normalize_name(name);
        if !DNS_NAME.is_match(&name) {
            return Err(CertStoreError::InvalidInput(format!(
                "{name:?} is not a valid DNS name"
            )));
        }
        if !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    Ok(normalized)
}

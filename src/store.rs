//! Domain-indexed storage of certificate chains.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::debug;

use crate::chain::CertChainAndKey;
use crate::error::{CertStoreError, Result};
use crate::key::AuthMethod;

/// Lowercases a DNS name and drops the trailing root dot.
pub fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Replaces the leftmost label of a normalized name with `*`.
///
/// Returns `None` for single-label names and names that already are
/// wildcards.
pub fn wildcard_name(name: &str) -> Option<String> {
    let (label, rest) = name.split_once('.')?;
    if label.is_empty() || label == "*" || rest.is_empty() {
        return None;
    }
    Some(format!("*.{rest}"))
}

/// Chains indexed by the names they serve, plus one default chain per
/// auth method.
///
/// Buckets keep insertion order. The store only grows.
#[derive(Debug, Default)]
pub struct CertStore {
    by_name: HashMap<String, Vec<Arc<CertChainAndKey>>>,
    defaults: BTreeMap<AuthMethod, Arc<CertChainAndKey>>,
    defaults_are_explicit: bool,
}

impl CertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `chain` under each of its domain names.
    ///
    /// The chain also fills the default slot of its auth method when that
    /// slot is empty, unless defaults were pinned explicitly. Registering a
    /// chain twice makes it a candidate twice.
    pub fn register(&mut self, chain: Arc<CertChainAndKey>) {
        for name in chain.domain_names() {
            self.by_name
                .entry(name.clone())
                .or_default()
                .push(Arc::clone(&chain));
        }
        debug!("registered {} under {:?}", chain.id(), chain.domain_names());

        if !self.defaults_are_explicit && !self.defaults.contains_key(&chain.auth_method()) {
            debug!("{} is the default {} chain", chain.id(), chain.auth_method());
            self.defaults.insert(chain.auth_method(), chain);
        }
    }

    /// Makes `chain` the default for its auth method, replacing any
    /// previous default.
    pub(crate) fn set_default(&mut self, chain: Arc<CertChainAndKey>) {
        debug!("{} is the default {} chain", chain.id(), chain.auth_method());
        self.defaults.insert(chain.auth_method(), chain);
    }

    /// Replaces every default with `chains`, one per auth method, and stops
    /// registration from filling default slots.
    ///
    /// Nothing changes when this fails.
    pub(crate) fn set_explicit_defaults(&mut self, chains: &[Arc<CertChainAndKey>]) -> Result<()> {
        if chains.is_empty() {
            return Err(CertStoreError::InvalidInput(
                "at least one default chain is required".to_string(),
            ));
        }
        let mut defaults = BTreeMap::new();
        for chain in chains {
            let auth_method = chain.auth_method();
            if defaults.insert(auth_method, Arc::clone(chain)).is_some() {
                return Err(CertStoreError::MultipleDefaultCertificatesPerAuthType(
                    auth_method,
                ));
            }
        }
        debug!(
            "pinned defaults: {:?}",
            defaults
                .iter()
                .map(|(method, chain)| format!("{method}={}", chain.id()))
                .collect::<Vec<_>>()
        );
        self.defaults = defaults;
        self.defaults_are_explicit = true;
        Ok(())
    }

    /// The default chain for `auth_method`, if one is set.
    pub fn default_for(&self, auth_method: AuthMethod) -> Option<&Arc<CertChainAndKey>> {
        self.defaults.get(&auth_method)
    }

    /// Default chains in auth-method order.
    pub fn defaults(&self) -> impl Iterator<Item = (AuthMethod, &Arc<CertChainAndKey>)> {
        self.defaults.iter().map(|(method, chain)| (*method, chain))
    }

    pub fn defaults_are_explicit(&self) -> bool {
        self.defaults_are_explicit
    }

    /// Candidates registered under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&[Arc<CertChainAndKey>]> {
        self.by_name
            .get(&normalize_name(name))
            .map(Vec::as_slice)
    }

    /// Candidates for `name`: the exact bucket, else the bucket of the
    /// wildcard covering its leftmost label.
    pub fn lookup(&self, name: &str) -> Option<&[Arc<CertChainAndKey>]> {
        let name = normalize_name(name);
        if let Some(bucket) = self.by_name.get(&name) {
            return Some(bucket.as_slice());
        }
        let wildcard = wildcard_name(&name)?;
        self.by_name.get(&wildcard).map(Vec::as_slice)
    }

    /// Every indexed name, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Whether nothing has been registered or pinned.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.defaults.is_empty()
    }
}

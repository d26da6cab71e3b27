//! Server configuration: the certificate store, the ownership guard and
//! the tiebreak resolver.

use std::fmt;
use std::sync::Arc;

use bon::Builder;
use log::{debug, warn};

use crate::chain::CertChainAndKey;
use crate::error::{CertStoreError, Result};
use crate::key::AuthMethod;
use crate::ownership::CertOwnership;
use crate::select;
use crate::store::CertStore;
use crate::tiebreak::TiebreakResolver;

/// Certificate configuration shared by connections.
///
/// Populate it through `&mut self`, then wrap it in an `Arc` and hand it to
/// [`Connection`](crate::connection::Connection)s. Nothing can be
/// registered once it is shared.
///
/// # Example
/// ```no_run
/// use certstore::config::Config;
/// use certstore::key::AuthMethod;
///
/// # fn run(chain_pem: &str, key_pem: &str) -> certstore::error::Result<()> {
/// let mut config = Config::new();
/// config.add_cert_chain_and_key(chain_pem, key_pem)?;
/// let chain = config.select_certificate(Some("www.example.com"), &AuthMethod::ALL)?;
/// println!("{:?}", chain.domain_names());
/// # Ok(())
/// # }
/// ```
#[derive(Builder)]
pub struct Config {
    cert_tiebreak: Option<Arc<dyn TiebreakResolver>>,
    #[builder(skip)]
    store: CertStore,
    #[builder(skip)]
    cert_ownership: CertOwnership,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Loads a PEM chain and key and makes it the library-owned default
    /// for its auth method.
    ///
    /// # Errors
    /// * [`CertStoreError::CertOwnershipConflict`] after chains were added
    ///   through the store API.
    /// * [`CertStoreError::MultipleDefaultCertificatesPerAuthType`] when a
    ///   default already exists for the chain's auth method.
    /// * Any chain construction error.
    pub fn add_cert_chain_and_key(
        &mut self,
        chain_pem: &str,
        key_pem: &str,
    ) -> Result<Arc<CertChainAndKey>> {
        self.claim(CertOwnership::LibOwned)?;
        let chain = CertChainAndKey::load_pem(chain_pem, key_pem)?;
        self.add_default_cert_chain(chain)
    }

    /// Registers an already built chain as the library-owned default for
    /// its auth method.
    ///
    /// The chain must carry its private key.
    pub fn add_default_cert_chain(
        &mut self,
        chain: CertChainAndKey,
    ) -> Result<Arc<CertChainAndKey>> {
        let next = self.claim(CertOwnership::LibOwned)?;
        if chain.private_key().is_none() {
            return Err(CertStoreError::InvalidInput(
                "a library-owned default chain needs its private key".to_string(),
            ));
        }
        let auth_method = chain.auth_method();
        if self.store.default_for(auth_method).is_some() {
            warn!("rejected {}: a default {auth_method} chain exists", chain.id());
            return Err(CertStoreError::MultipleDefaultCertificatesPerAuthType(
                auth_method,
            ));
        }

        let chain = Arc::new(chain);
        self.store.register(Arc::clone(&chain));
        self.store.set_default(Arc::clone(&chain));
        self.cert_ownership = next;
        Ok(chain)
    }

    /// Registers an application-owned chain under each of its names.
    ///
    /// Any number of chains may be registered, including several for the
    /// same name.
    ///
    /// # Errors
    /// [`CertStoreError::CertOwnershipConflict`] after a library-owned
    /// default was added.
    pub fn add_cert_chain_and_key_to_store(&mut self, chain: Arc<CertChainAndKey>) -> Result<()> {
        let next = self.claim(CertOwnership::AppOwned)?;
        self.store.register(chain);
        self.cert_ownership = next;
        Ok(())
    }

    /// Pins application-owned default chains, at most one per auth method.
    ///
    /// Replaces every previous default. Chains registered afterwards no
    /// longer become defaults implicitly. The chains are not indexed by
    /// name; register them separately for name lookup.
    pub fn set_cert_chain_and_key_defaults(
        &mut self,
        chains: &[Arc<CertChainAndKey>],
    ) -> Result<()> {
        let next = self.claim(CertOwnership::AppOwned)?;
        self.store
            .set_explicit_defaults(chains)
            .inspect_err(|e| warn!("rejected default chains: {e}"))?;
        self.cert_ownership = next;
        Ok(())
    }

    /// Installs the resolver used when several chains serve one name.
    pub fn set_cert_tiebreak(&mut self, resolver: Arc<dyn TiebreakResolver>) {
        debug!("certificate tiebreak resolver installed");
        self.cert_tiebreak = Some(resolver);
    }

    pub fn cert_tiebreak(&self) -> Option<&Arc<dyn TiebreakResolver>> {
        self.cert_tiebreak.as_ref()
    }

    pub fn cert_ownership(&self) -> CertOwnership {
        self.cert_ownership
    }

    pub fn cert_store(&self) -> &CertStore {
        &self.store
    }

    /// The default chain for `auth_method`, if one is set.
    pub fn default_cert_chain(&self, auth_method: AuthMethod) -> Option<&Arc<CertChainAndKey>> {
        self.store.default_for(auth_method)
    }

    /// Chooses the chain to present for `server_name`.
    ///
    /// See [`select::select`] for the rules and errors.
    pub fn select_certificate(
        &self,
        server_name: Option<&str>,
        accepted: &[AuthMethod],
    ) -> Result<&Arc<CertChainAndKey>> {
        select::select(
            &self.store,
            self.cert_tiebreak.as_deref(),
            server_name,
            accepted,
        )
    }

    fn claim(&self, requested: CertOwnership) -> Result<CertOwnership> {
        self.cert_ownership.transition(requested).inspect_err(|_| {
            warn!(
                "rejected {requested:?} registration on a {:?} configuration",
                self.cert_ownership
            )
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("store", &self.store)
            .field("cert_ownership", &self.cert_ownership)
            .field("has_cert_tiebreak", &self.cert_tiebreak.is_some())
            .finish()
    }
}

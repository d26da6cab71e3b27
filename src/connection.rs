//! Per-connection certificate selection.

use std::sync::Arc;

use crate::chain::CertChainAndKey;
use crate::config::Config;
use crate::error::{CertStoreError, Result};
use crate::key::AuthMethod;

/// Longest host name a client can send in the server_name extension.
const MAX_SERVER_NAME_LEN: usize = 255;

/// The certificate side of one handshake.
///
/// Holds the configuration it was created from, the server name the
/// client requested and the chain chosen for it.
#[derive(Debug, Clone)]
pub struct Connection {
    config: Arc<Config>,
    server_name: Option<String>,
    selected: Option<Arc<CertChainAndKey>>,
}

impl Connection {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            server_name: None,
            selected: None,
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Records the server name sent by the client.
    pub fn set_server_name(&mut self, server_name: &str) -> Result<()> {
        if server_name.len() > MAX_SERVER_NAME_LEN {
            return Err(CertStoreError::InvalidInput(format!(
                "server name is {} bytes long, at most {MAX_SERVER_NAME_LEN} are allowed",
                server_name.len()
            )));
        }
        self.server_name = Some(server_name.to_string());
        Ok(())
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Selects the chain to present, given the auth methods the client's
    /// signature algorithms allow.
    ///
    /// A failure leaves any earlier selection in place.
    pub fn select_certificate(&mut self, accepted: &[AuthMethod]) -> Result<&Arc<CertChainAndKey>> {
        let chain = Arc::clone(
            self.config
                .select_certificate(self.server_name.as_deref(), accepted)?,
        );
        Ok(&*self.selected.insert(chain))
    }

    /// The chain chosen by the last successful selection.
    pub fn selected_cert(&self) -> Option<&Arc<CertChainAndKey>> {
        self.selected.as_ref()
    }
}

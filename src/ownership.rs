//! Which registration API a configuration has committed to.

use crate::error::{CertStoreError, Result};

/// Who owns the chains registered with a [`Config`](crate::config::Config).
///
/// The first successful registration fixes the state. The single-default
/// API makes the library the owner, the store API makes the application
/// the owner, and the two can never be mixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CertOwnership {
    /// Nothing registered yet.
    #[default]
    NotOwned,
    /// Chains were added with `add_cert_chain_and_key`.
    LibOwned,
    /// Chains were added with `add_cert_chain_and_key_to_store` or pinned
    /// as defaults.
    AppOwned,
}

impl CertOwnership {
    /// The state after a registration through the `requested` API.
    ///
    /// Does not change `self`; callers commit the returned state once the
    /// registration itself has succeeded.
    pub fn transition(self, requested: CertOwnership) -> Result<CertOwnership> {
        use CertOwnership::*;
        match (self, requested) {
            (current, NotOwned) => Ok(current),
            (NotOwned, requested) => Ok(requested),
            (LibOwned, LibOwned) => Ok(LibOwned),
            (AppOwned, AppOwned) => Ok(AppOwned),
            (LibOwned, AppOwned) | (AppOwned, LibOwned) => {
                Err(CertStoreError::CertOwnershipConflict)
            }
        }
    }
}

//! Handshake-time choice of the chain to present.

use std::sync::Arc;

use log::debug;

use crate::chain::CertChainAndKey;
use crate::error::{CertStoreError, Result};
use crate::key::AuthMethod;
use crate::store::CertStore;
use crate::tiebreak::{self, TiebreakResolver};

/// Selects the chain to present for `server_name`.
///
/// An empty or absent name, or a name with neither an exact nor a wildcard
/// bucket, selects the default of the first method in `accepted` that has
/// one. Otherwise the bucket is narrowed to the first method in `accepted`
/// that has chains in it; a single survivor is returned as is, and several
/// are folded through `resolver`.
///
/// # Errors
/// * [`CertStoreError::NoDefaultCertificate`] when the default path finds
///   no default for any accepted method.
/// * [`CertStoreError::NoMatch`] when no chain in the bucket uses an
///   accepted auth method.
/// * [`CertStoreError::AmbiguousCertificateSelection`] when several chains
///   of the chosen auth method remain and no resolver is configured.
pub fn select<'a>(
    store: &'a CertStore,
    resolver: Option<&dyn TiebreakResolver>,
    server_name: Option<&str>,
    accepted: &[AuthMethod],
) -> Result<&'a Arc<CertChainAndKey>> {
    let Some(name) = server_name.filter(|name| !name.is_empty()) else {
        return select_default(store, accepted);
    };
    let Some(bucket) = store.lookup(name) else {
        debug!("no chain registered for {name:?}, using defaults");
        return select_default(store, accepted);
    };

    let Some((auth_method, candidates)) = accepted.iter().find_map(|method| {
        let candidates: Vec<&Arc<CertChainAndKey>> = bucket
            .iter()
            .filter(|chain| chain.auth_method() == *method)
            .collect();
        (!candidates.is_empty()).then_some((*method, candidates))
    }) else {
        debug!(
            "{} chain(s) for {name:?}, none for {accepted:?}",
            bucket.len()
        );
        return Err(CertStoreError::NoMatch);
    };

    let selected = match (candidates.as_slice(), resolver) {
        ([], _) => return Err(CertStoreError::NoMatch),
        ([only], _) => *only,
        (_, None) => {
            debug!(
                "{} {auth_method} chains for {name:?} and no tiebreak resolver",
                candidates.len()
            );
            return Err(CertStoreError::AmbiguousCertificateSelection);
        }
        (_, Some(resolver)) => {
            tiebreak::fold_candidates(resolver, &candidates, name.as_bytes())
                .ok_or(CertStoreError::NoMatch)?
        }
    };
    debug!(
        "selected {} for {name:?} out of {} {auth_method} candidate(s)",
        selected.id(),
        candidates.len()
    );
    Ok(selected)
}

fn select_default<'a>(
    store: &'a CertStore,
    accepted: &[AuthMethod],
) -> Result<&'a Arc<CertChainAndKey>> {
    let selected = accepted
        .iter()
        .find_map(|method| store.default_for(*method))
        .ok_or(CertStoreError::NoDefaultCertificate)?;
    debug!("selected default {} for {accepted:?}", selected.id());
    Ok(selected)
}

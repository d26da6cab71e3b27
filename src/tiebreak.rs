//! Caller-supplied resolution between chains that serve the same name.

use std::sync::Arc;

use log::{debug, trace};

use crate::chain::CertChainAndKey;

/// Picks one of two candidate chains for a requested server name.
///
/// Called `n - 1` times for `n` candidates, folding left in registration
/// order: the first argument is the winner so far, the second the next
/// candidate. Returning anything other than one of the two arguments
/// keeps the winner so far.
///
/// Plain functions with the matching signature implement this trait:
///
/// ```
/// use certstore::chain::CertChainAndKey;
///
/// fn prefer_newest<'a>(
///     _current: &'a CertChainAndKey,
///     next: &'a CertChainAndKey,
///     _name: &[u8],
/// ) -> &'a CertChainAndKey {
///     next
/// }
///
/// let config = certstore::config::Config::builder()
///     .cert_tiebreak(std::sync::Arc::new(prefer_newest))
///     .build();
/// # drop(config);
/// ```
pub trait TiebreakResolver: Send + Sync {
    fn resolve<'a>(
        &self,
        current: &'a CertChainAndKey,
        candidate: &'a CertChainAndKey,
        name: &[u8],
    ) -> &'a CertChainAndKey;
}

impl<F> TiebreakResolver for F
where
    F: for<'a> Fn(&'a CertChainAndKey, &'a CertChainAndKey, &[u8]) -> &'a CertChainAndKey
        + Send
        + Sync,
{
    fn resolve<'a>(
        &self,
        current: &'a CertChainAndKey,
        candidate: &'a CertChainAndKey,
        name: &[u8],
    ) -> &'a CertChainAndKey {
        self(current, candidate, name)
    }
}

/// Left fold of `candidates` through `resolver`.
///
/// Returns `None` only for an empty slice.
pub(crate) fn fold_candidates<'a>(
    resolver: &dyn TiebreakResolver,
    candidates: &[&'a Arc<CertChainAndKey>],
    name: &[u8],
) -> Option<&'a Arc<CertChainAndKey>> {
    let (first, rest) = candidates.split_first()?;
    Some(rest.iter().fold(*first, |current, candidate| {
        let chosen = resolver.resolve(current, candidate, name);
        let winner = if std::ptr::eq(chosen, Arc::as_ptr(candidate)) {
            *candidate
        } else {
            if !std::ptr::eq(chosen, Arc::as_ptr(current)) {
                debug!(
                    "tiebreak resolver returned {}, neither {} nor {}; keeping {}",
                    chosen.id(),
                    current.id(),
                    candidate.id(),
                    current.id()
                );
            }
            current
        };
        trace!(
            "tiebreak {} vs {} for {:?}: {}",
            current.id(),
            candidate.id(),
            String::from_utf8_lossy(name),
            winner.id()
        );
        winner
    }))
}

//! In-flight claims for directional fetches.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use sync_types::{Direction, Narrow};

type ClaimKey = (Narrow, Direction);

/// Set of `(narrow, direction)` pairs with a fetch outstanding.
///
/// Claiming is an atomic check-and-insert, so two triggers racing past the
/// session-store guard still issue at most one request.
#[derive(Debug, Default)]
pub(crate) struct InFlightClaims {
    claimed: Mutex<HashSet<ClaimKey>>,
}

impl InFlightClaims {
    /// Claim a slot, or `None` if a fetch for it is already outstanding.
    pub(crate) fn try_claim(
        self: &Arc<Self>,
        narrow: &Narrow,
        direction: Direction,
    ) -> Option<ClaimGuard> {
        let key = (narrow.clone(), direction);
        if !self.claimed.lock().insert(key.clone()) {
            return None;
        }
        Some(ClaimGuard {
            claims: Arc::clone(self),
            key,
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.claimed.lock().len()
    }
}

/// Releases its claim when dropped, including when the fetch future is dropped.
#[derive(Debug)]
pub(crate) struct ClaimGuard {
    claims: Arc<InFlightClaims>,
    key: ClaimKey,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.claims.claimed.lock().remove(&self.key);
    }
}

//! Session store and outbox seams.

use crate::fetch::ScopeFetchState;
use crate::narrow::{Narrow, UserId};

/// Read side of the session store, queried synchronously before each decision.
pub trait SessionStateReader: Send + Sync {
    /// Fetch flags for a narrow. Unknown narrows report the default state.
    fn fetch_state(&self, narrow: &Narrow) -> ScopeFetchState;

    /// True while the bootstrap is fetching initial data.
    fn initial_fetch_in_progress(&self) -> bool;

    /// The logged-in user's id, once known.
    fn own_user_id(&self) -> Option<UserId>;
}

/// Queue of outgoing messages awaiting delivery.
pub trait OutboxSink: Send + Sync {
    fn queue_message(&self, narrow: &Narrow, content: String);
}

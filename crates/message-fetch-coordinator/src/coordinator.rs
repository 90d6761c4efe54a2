//! Message fetch coordinator.

use crate::claims::InFlightClaims;
use crate::window::{WindowPolicy, DEFAULT_MESSAGES_PER_REQUEST};
use std::sync::Arc;
use sync_types::{
    Anchor, Direction, FetchMessagesRequest, FetchOutcome, FetchWindow, MessagesApi, Narrow,
    SessionStateReader, SignalSink, SyncError, SyncResult, SyncSignal,
};
use tracing::{debug, info, warn};

/// Shared handle to the message history endpoint.
pub type MessagesApiHandle = Arc<dyn MessagesApi>;

/// Shared handle to the signal consumer.
pub type SignalSinkHandle = Arc<dyn SignalSink>;

/// Number of private messages pulled by the legacy recent-PM fetch.
pub const DEFAULT_LEGACY_RECENT_PM_COUNT: u32 = 100;

/// Tunables for [`MessageFetchCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCoordinatorConfig {
    pub messages_per_request: u32,
    pub legacy_recent_pm_count: u32,
}

impl Default for FetchCoordinatorConfig {
    fn default() -> Self {
        Self {
            messages_per_request: DEFAULT_MESSAGES_PER_REQUEST,
            legacy_recent_pm_count: DEFAULT_LEGACY_RECENT_PM_COUNT,
        }
    }
}

/// Issues paginated history requests for narrows.
///
/// Every fetch emits exactly one `FetchStart` followed by exactly one of
/// `FetchComplete` or `FetchError`. Directional fetches are skipped (returning
/// `Ok(None)`) while the initial fetch runs, while the same direction is
/// already fetching, once that direction is caught up, or when no boundary
/// message is known yet.
pub struct MessageFetchCoordinator {
    api: MessagesApiHandle,
    sink: SignalSinkHandle,
    policy: WindowPolicy,
    legacy_recent_pm_count: u32,
    claims: Arc<InFlightClaims>,
}

impl MessageFetchCoordinator {
    pub fn new(api: MessagesApiHandle, sink: SignalSinkHandle) -> Self {
        Self::with_config(api, sink, FetchCoordinatorConfig::default())
    }

    pub fn with_config(
        api: MessagesApiHandle,
        sink: SignalSinkHandle,
        config: FetchCoordinatorConfig,
    ) -> Self {
        Self {
            api,
            sink,
            policy: WindowPolicy::new(config.messages_per_request),
            legacy_recent_pm_count: config.legacy_recent_pm_count,
            claims: Arc::new(InFlightClaims::default()),
        }
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Fetch one page of history older than the first known message.
    pub async fn fetch_older(
        &self,
        state: &dyn SessionStateReader,
        narrow: &Narrow,
    ) -> SyncResult<Option<FetchOutcome>> {
        self.fetch_directional(state, narrow, Direction::Older).await
    }

    /// Fetch one page of history newer than the last known message.
    pub async fn fetch_newer(
        &self,
        state: &dyn SessionStateReader,
        narrow: &Narrow,
    ) -> SyncResult<Option<FetchOutcome>> {
        self.fetch_directional(state, narrow, Direction::Newer).await
    }

    async fn fetch_directional(
        &self,
        state: &dyn SessionStateReader,
        narrow: &Narrow,
        direction: Direction,
    ) -> SyncResult<Option<FetchOutcome>> {
        if state.initial_fetch_in_progress() {
            debug!(?narrow, ?direction, "Skipping fetch: initial fetch in progress");
            return Ok(None);
        }

        let scope = state.fetch_state(narrow);
        if scope.is_fetching(direction) {
            debug!(?narrow, ?direction, "Skipping fetch: already fetching");
            return Ok(None);
        }
        if scope.is_caught_up_in(direction) {
            debug!(?narrow, ?direction, "Skipping fetch: caught up");
            return Ok(None);
        }
        let Some(boundary) = scope.boundary(direction) else {
            debug!(?narrow, ?direction, "Skipping fetch: no boundary message known");
            return Ok(None);
        };

        let Some(_claim) = self.claims.try_claim(narrow, direction) else {
            debug!(?narrow, ?direction, "Skipping fetch: request already in flight");
            return Ok(None);
        };

        let window = self.policy.directional(direction, boundary);
        self.fetch_messages(state, narrow, window).await.map(Some)
    }

    /// Open a narrow around `anchor` with a centered window.
    ///
    /// Returns `Ok(None)` without any request when the narrow is already
    /// caught up in both directions.
    pub async fn fetch_messages_in_narrow(
        &self,
        state: &dyn SessionStateReader,
        narrow: &Narrow,
        anchor: Anchor,
    ) -> SyncResult<Option<FetchOutcome>> {
        if state.fetch_state(narrow).is_fully_caught_up() {
            debug!(?narrow, "Skipping fetch: narrow fully caught up");
            return Ok(None);
        }
        let window = self.policy.centered(anchor);
        self.fetch_messages(state, narrow, window).await.map(Some)
    }

    /// Issue a single history request and report it through signals.
    ///
    /// Windows that request nothing, and self-conversation narrows before the
    /// own user id is known, are rejected with [`SyncError::InvalidRequest`]
    /// before any signal is emitted.
    pub async fn fetch_messages(
        &self,
        state: &dyn SessionStateReader,
        narrow: &Narrow,
        window: FetchWindow,
    ) -> SyncResult<FetchOutcome> {
        if !window.is_valid() {
            return Err(SyncError::invalid_request(
                "fetch window requests no messages",
            ));
        }
        let own_user_id = state.own_user_id();
        if narrow.needs_own_user_id() && own_user_id.is_none() {
            return Err(SyncError::invalid_request(
                "own user id unknown for self-conversation narrow",
            ));
        }

        self.sink.emit(SyncSignal::FetchStart {
            narrow: narrow.clone(),
            window,
        });

        let request = FetchMessagesRequest {
            narrow: narrow.to_filters(own_user_id),
            anchor: window.anchor,
            num_before: window.num_before,
            num_after: window.num_after,
        };

        match self.api.fetch_messages(request).await {
            Ok(response) => {
                let outcome = FetchOutcome::from(response);
                debug!(
                    ?narrow,
                    anchor = %window.anchor.as_param(),
                    count = outcome.messages.len(),
                    found_oldest = outcome.found_oldest,
                    found_newest = outcome.found_newest,
                    "Fetched messages"
                );
                self.sink.emit(SyncSignal::FetchComplete {
                    narrow: narrow.clone(),
                    window,
                    outcome: outcome.clone(),
                    own_user_id,
                });
                Ok(outcome)
            }
            Err(e) => {
                warn!(?narrow, anchor = %window.anchor.as_param(), error = %e, "Message fetch failed");
                self.sink.emit(SyncSignal::FetchError {
                    narrow: narrow.clone(),
                    window,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    /// Pull the most recent private messages for servers that do not ship
    /// them in the registration snapshot.
    pub async fn fetch_recent_private_messages_legacy(
        &self,
        state: &dyn SessionStateReader,
    ) -> SyncResult<FetchOutcome> {
        let window = FetchWindow {
            anchor: Anchor::Newest,
            num_before: self.legacy_recent_pm_count,
            num_after: 0,
        };
        info!(count = self.legacy_recent_pm_count, "Fetching recent private messages");
        self.fetch_messages(state, &Narrow::AllPrivateMessages, window)
            .await
    }
}

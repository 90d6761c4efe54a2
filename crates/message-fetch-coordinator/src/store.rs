//! In-memory session store.
//!
//! Applies [`SyncSignal`]s synchronously inside [`SignalSink::emit`], so a
//! `FetchStart` is visible to the very next [`SessionStateReader`] query. The
//! CLI uses it as its session state, and tests use it to observe the signal
//! sequence.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use sync_types::{
    Anchor, FetchOutcome, FetchWindow, InitialData, Message, MessageId, Narrow, OutboxSink,
    ScopeFetchState, ServerVersion, SessionStateReader, SignalSink, SyncSignal, UserId,
};
use tracing::debug;

#[derive(Debug, Default)]
struct StoreInner {
    scopes: HashMap<Narrow, ScopeFetchState>,
    messages: HashMap<Narrow, BTreeMap<MessageId, Message>>,
    initial_fetch_in_progress: bool,
    own_user_id: Option<UserId>,
    session: Option<InitialData>,
    server_version: Option<ServerVersion>,
    event_queue: Option<(String, i64)>,
    outbox: Vec<(Narrow, String)>,
    outbox_flushes: u32,
    notifications_initialized: bool,
    logged_out: bool,
    signals: Vec<SyncSignal>,
}

/// Session state held in memory, with a log of every signal applied.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<StoreInner>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the fetch flags of a narrow.
    pub fn set_fetch_state(&self, narrow: &Narrow, state: ScopeFetchState) {
        self.inner.lock().scopes.insert(narrow.clone(), state);
    }

    pub fn set_own_user_id(&self, user_id: UserId) {
        self.inner.lock().own_user_id = Some(user_id);
    }

    /// Every signal applied so far, in order.
    pub fn signals(&self) -> Vec<SyncSignal> {
        self.inner.lock().signals.clone()
    }

    pub fn signal_names(&self) -> Vec<&'static str> {
        self.inner.lock().signals.iter().map(SyncSignal::name).collect()
    }

    /// Ids of the messages held for a narrow, ascending.
    pub fn message_ids(&self, narrow: &Narrow) -> Vec<MessageId> {
        self.inner
            .lock()
            .messages
            .get(narrow)
            .map(|messages| messages.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn session(&self) -> Option<InitialData> {
        self.inner.lock().session.clone()
    }

    pub fn server_version(&self) -> Option<ServerVersion> {
        self.inner.lock().server_version.clone()
    }

    /// Event queue handed to the live-update stream, if started.
    pub fn event_queue(&self) -> Option<(String, i64)> {
        self.inner.lock().event_queue.clone()
    }

    pub fn queued_outbox(&self) -> Vec<(Narrow, String)> {
        self.inner.lock().outbox.clone()
    }

    pub fn outbox_flushes(&self) -> u32 {
        self.inner.lock().outbox_flushes
    }

    pub fn notifications_initialized(&self) -> bool {
        self.inner.lock().notifications_initialized
    }

    pub fn is_logged_out(&self) -> bool {
        self.inner.lock().logged_out
    }
}

impl StoreInner {
    fn apply(&mut self, signal: &SyncSignal) {
        match signal {
            SyncSignal::FetchStart { narrow, window } => {
                let scope = self.scopes.entry(narrow.clone()).or_default();
                if window.reaches_older() {
                    scope.fetching_older = true;
                }
                if window.reaches_newer() {
                    scope.fetching_newer = true;
                }
            }
            SyncSignal::FetchComplete {
                narrow,
                window,
                outcome,
                ..
            } => self.apply_complete(narrow, window, outcome),
            SyncSignal::FetchError { narrow, window, .. } => {
                let scope = self.scopes.entry(narrow.clone()).or_default();
                clear_fetching(scope, window);
            }
            SyncSignal::InitialFetchStart => {
                self.initial_fetch_in_progress = true;
            }
            SyncSignal::SessionInit {
                data,
                server_version,
            } => {
                if let Some(user_id) = data.user_id() {
                    self.own_user_id = Some(user_id);
                }
                self.session = Some(data.clone());
                self.server_version = Some(server_version.clone());
                self.logged_out = false;
            }
            SyncSignal::InitialFetchComplete | SyncSignal::InitialFetchAborted => {
                self.initial_fetch_in_progress = false;
            }
            SyncSignal::Logout => {
                let signals = std::mem::take(&mut self.signals);
                *self = StoreInner {
                    logged_out: true,
                    signals,
                    ..Default::default()
                };
            }
            SyncSignal::StartEventStream {
                queue_id,
                last_event_id,
            } => {
                self.event_queue = Some((queue_id.clone(), *last_event_id));
            }
            SyncSignal::FlushOutbox => {
                self.outbox_flushes += 1;
            }
            SyncSignal::InitNotifications => {
                self.notifications_initialized = true;
            }
        }
    }

    fn apply_complete(&mut self, narrow: &Narrow, window: &FetchWindow, outcome: &FetchOutcome) {
        let scope = self.scopes.entry(narrow.clone()).or_default();
        clear_fetching(scope, window);

        if window.reaches_older() || window.anchor == Anchor::Oldest {
            scope.caught_up_older = outcome.found_oldest;
        }
        if window.reaches_newer() || window.anchor == Anchor::Newest {
            scope.caught_up_newer = outcome.found_newest;
        }

        let ids = outcome.messages.iter().map(|m| m.id);
        if let Some(min) = ids.clone().min() {
            scope.first_message_id = Some(scope.first_message_id.map_or(min, |id| id.min(min)));
        }
        if let Some(max) = ids.max() {
            scope.last_message_id = Some(scope.last_message_id.map_or(max, |id| id.max(max)));
        }

        let held = self.messages.entry(narrow.clone()).or_default();
        for message in &outcome.messages {
            held.insert(message.id, message.clone());
        }
    }
}

fn clear_fetching(scope: &mut ScopeFetchState, window: &FetchWindow) {
    if window.reaches_older() {
        scope.fetching_older = false;
    }
    if window.reaches_newer() {
        scope.fetching_newer = false;
    }
}

impl SignalSink for MemorySessionStore {
    fn emit(&self, signal: SyncSignal) {
        debug!(signal = signal.name(), "Applying signal");
        let mut inner = self.inner.lock();
        inner.apply(&signal);
        inner.signals.push(signal);
    }
}

impl SessionStateReader for MemorySessionStore {
    fn fetch_state(&self, narrow: &Narrow) -> ScopeFetchState {
        self.inner
            .lock()
            .scopes
            .get(narrow)
            .copied()
            .unwrap_or_default()
    }

    fn initial_fetch_in_progress(&self) -> bool {
        self.inner.lock().initial_fetch_in_progress
    }

    fn own_user_id(&self) -> Option<UserId> {
        self.inner.lock().own_user_id
    }
}

impl OutboxSink for MemorySessionStore {
    fn queue_message(&self, narrow: &Narrow, content: String) {
        self.inner.lock().outbox.push((narrow.clone(), content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::{Direction, SyncError};

    fn older_window(anchor: MessageId) -> FetchWindow {
        FetchWindow {
            anchor: Anchor::Message(anchor),
            num_before: 50,
            num_after: 0,
        }
    }

    fn outcome(ids: &[MessageId], found_oldest: bool, found_newest: bool) -> FetchOutcome {
        FetchOutcome {
            messages: ids.iter().copied().map(Message::new).collect(),
            found_oldest,
            found_newest,
            found_anchor: true,
        }
    }

    #[test]
    fn fetch_start_sets_only_the_reached_direction() {
        let store = MemorySessionStore::new();
        let narrow = Narrow::stream("general");

        store.emit(SyncSignal::FetchStart {
            narrow: narrow.clone(),
            window: older_window(100),
        });

        let state = store.fetch_state(&narrow);
        assert!(state.is_fetching(Direction::Older));
        assert!(!state.is_fetching(Direction::Newer));
    }

    #[test]
    fn fetch_complete_updates_range_and_caught_up() {
        let store = MemorySessionStore::new();
        let narrow = Narrow::stream("general");
        let window = older_window(100);

        store.emit(SyncSignal::FetchStart {
            narrow: narrow.clone(),
            window,
        });
        store.emit(SyncSignal::FetchComplete {
            narrow: narrow.clone(),
            window,
            outcome: outcome(&[40, 60, 100], true, false),
            own_user_id: None,
        });

        let state = store.fetch_state(&narrow);
        assert!(!state.fetching_older);
        assert!(state.caught_up_older);
        assert!(!state.caught_up_newer);
        assert_eq!(state.first_message_id, Some(40));
        assert_eq!(state.last_message_id, Some(100));
        assert_eq!(store.message_ids(&narrow), vec![40, 60, 100]);
    }

    #[test]
    fn newest_anchor_settles_newer_side() {
        let store = MemorySessionStore::new();
        let window = FetchWindow {
            anchor: Anchor::Newest,
            num_before: 100,
            num_after: 0,
        };

        store.emit(SyncSignal::FetchComplete {
            narrow: Narrow::AllPrivateMessages,
            window,
            outcome: outcome(&[7, 8], false, true),
            own_user_id: Some(1),
        });

        let state = store.fetch_state(&Narrow::AllPrivateMessages);
        assert!(state.caught_up_newer);
        assert!(!state.caught_up_older);
    }

    #[test]
    fn fetch_error_clears_flags() {
        let store = MemorySessionStore::new();
        let narrow = Narrow::Mentioned;
        let window = older_window(5);

        store.emit(SyncSignal::FetchStart {
            narrow: narrow.clone(),
            window,
        });
        store.emit(SyncSignal::FetchError {
            narrow: narrow.clone(),
            window,
            error: SyncError::Timeout,
        });

        assert_eq!(store.fetch_state(&narrow), ScopeFetchState::default());
    }

    #[test]
    fn initial_fetch_flag_follows_signals() {
        let store = MemorySessionStore::new();
        store.emit(SyncSignal::InitialFetchStart);
        assert!(store.initial_fetch_in_progress());
        store.emit(SyncSignal::InitialFetchComplete);
        assert!(!store.initial_fetch_in_progress());

        store.emit(SyncSignal::InitialFetchStart);
        store.emit(SyncSignal::InitialFetchAborted);
        assert!(!store.initial_fetch_in_progress());
        assert!(store.session().is_none());
    }

    #[test]
    fn session_init_records_user_and_version() {
        let store = MemorySessionStore::new();
        let data: InitialData = serde_json::from_value(serde_json::json!({
            "queue_id": "q-1",
            "last_event_id": -1,
            "user_id": 42
        }))
        .unwrap();

        store.emit(SyncSignal::SessionInit {
            data,
            server_version: ServerVersion::new(2, 1, 0),
        });

        assert_eq!(store.own_user_id(), Some(42));
        assert_eq!(store.server_version(), Some(ServerVersion::new(2, 1, 0)));
        assert_eq!(store.session().map(|s| s.queue_id), Some("q-1".to_string()));
    }

    #[test]
    fn logout_resets_state_but_keeps_log() {
        let store = MemorySessionStore::new();
        store.set_own_user_id(3);
        store.emit(SyncSignal::InitialFetchStart);
        store.emit(SyncSignal::Logout);

        assert!(store.is_logged_out());
        assert!(!store.initial_fetch_in_progress());
        assert_eq!(store.own_user_id(), None);
        assert_eq!(store.signal_names(), vec!["initial_fetch_start", "logout"]);
    }

    #[test]
    fn post_bootstrap_signals_are_recorded() {
        let store = MemorySessionStore::new();
        store.emit(SyncSignal::StartEventStream {
            queue_id: "q-9".to_string(),
            last_event_id: 12,
        });
        store.emit(SyncSignal::FlushOutbox);
        store.emit(SyncSignal::InitNotifications);

        assert_eq!(store.event_queue(), Some(("q-9".to_string(), 12)));
        assert_eq!(store.outbox_flushes(), 1);
        assert!(store.notifications_initialized());
    }
}

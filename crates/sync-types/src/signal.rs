//! Signals emitted by the sync core for the session store and UI.

use crate::api::InitialData;
use crate::error::SyncError;
use crate::fetch::{FetchOutcome, FetchWindow};
use crate::narrow::{Narrow, UserId};
use crate::version::ServerVersion;
use serde::Serialize;

/// Everything the sync core tells the outside world.
///
/// The session store consumes these to update its fetch flags and message
/// lists. Dedup of directional fetches relies on the store applying
/// `FetchStart` before control returns to whoever might trigger again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncSignal {
    FetchStart {
        narrow: Narrow,
        window: FetchWindow,
    },
    FetchComplete {
        narrow: Narrow,
        window: FetchWindow,
        outcome: FetchOutcome,
        own_user_id: Option<UserId>,
    },
    FetchError {
        narrow: Narrow,
        window: FetchWindow,
        error: SyncError,
    },
    InitialFetchStart,
    /// Registration data and server version to apply to session state.
    SessionInit {
        data: InitialData,
        server_version: ServerVersion,
    },
    InitialFetchComplete,
    /// The bootstrap was dropped before finishing; initial fetch is no
    /// longer in progress and nothing was applied.
    InitialFetchAborted,
    Logout,
    StartEventStream {
        queue_id: String,
        last_event_id: i64,
    },
    FlushOutbox,
    InitNotifications,
}

impl SyncSignal {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SyncSignal::FetchStart { .. } => "fetch_start",
            SyncSignal::FetchComplete { .. } => "fetch_complete",
            SyncSignal::FetchError { .. } => "fetch_error",
            SyncSignal::InitialFetchStart => "initial_fetch_start",
            SyncSignal::SessionInit { .. } => "session_init",
            SyncSignal::InitialFetchComplete => "initial_fetch_complete",
            SyncSignal::InitialFetchAborted => "initial_fetch_aborted",
            SyncSignal::Logout => "logout",
            SyncSignal::StartEventStream { .. } => "start_event_stream",
            SyncSignal::FlushOutbox => "flush_outbox",
            SyncSignal::InitNotifications => "init_notifications",
        }
    }
}

/// Consumer of sync signals (the session store's reducer).
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: SyncSignal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Anchor;

    #[test]
    fn serializes_with_type_tag() {
        let signal = SyncSignal::FetchStart {
            narrow: Narrow::stream("general"),
            window: FetchWindow {
                anchor: Anchor::Message(1000),
                num_before: 50,
                num_after: 0,
            },
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "fetch_start");
        assert_eq!(json["narrow"]["kind"], "stream");
        assert_eq!(json["window"]["anchor"], 1000);
    }

    #[test]
    fn unit_signals_serialize_as_bare_tags() {
        let json = serde_json::to_value(SyncSignal::FlushOutbox).unwrap();
        assert_eq!(json, serde_json::json!({"type": "flush_outbox"}));
        assert_eq!(SyncSignal::Logout.name(), "logout");
    }
}

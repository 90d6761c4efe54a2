//! Bootstrap orchestrator.

use crate::error::{BootstrapError, BootstrapResult};
use crate::fsm::{BootstrapMachine, BootstrapMachineInput, BootstrapMachineState, BootstrapState};
use backoff_retrier::BackoffRetrier;
use message_fetch_coordinator::MessageFetchCoordinator;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use sync_types::{
    RegisterRequest, ServerVersion, SessionApi, SessionStateReader, SignalSink, SyncError,
    SyncSignal,
};
use tracing::{debug, error, info, warn};

/// Shared handle to the session bootstrap endpoints.
pub type SessionApiHandle = Arc<dyn SessionApi>;

/// Oldest server version that ships recent private conversations in the
/// registration snapshot.
pub fn default_min_recent_pm_version() -> ServerVersion {
    ServerVersion::new(2, 1, 0)
}

/// Tunables for [`BootstrapOrchestrator`].
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Servers older than this get the legacy recent-PM fetch.
    pub min_recent_pm_version: ServerVersion,
    /// Capability and event declaration sent on registration.
    pub register: RegisterRequest,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            min_recent_pm_version: default_min_recent_pm_version(),
            register: RegisterRequest::default(),
        }
    }
}

/// What happened to the legacy recent-PM fetch during a bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegacyFetch {
    /// Server is new enough; nothing fetched.
    NotNeeded,
    Completed { message_count: usize },
    /// Reported through the fetch error signal; the session stays ready.
    Failed { error: SyncError },
}

/// Summary of a successful bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapReport {
    pub server_version: ServerVersion,
    pub queue_id: String,
    pub last_event_id: i64,
    pub legacy_fetch: LegacyFetch,
}

/// Result of a bootstrap run that was allowed to start.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    Ready(BootstrapReport),
    /// A registration or metadata call failed terminally.
    LoggedOut { cause: SyncError },
}

impl BootstrapOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapOutcome::Ready(_))
    }
}

/// Sequences the startup handshake for one app session.
///
/// Registration and server metadata are fetched concurrently, each under the
/// retry policy. A terminal failure of either one logs the session out and
/// nothing fetched is applied. On success the session data is applied, the
/// live-update stream is started, the legacy recent-PM fetch runs if the
/// server needs it, and the outbox and notification collaborators are kicked.
pub struct BootstrapOrchestrator {
    session_api: SessionApiHandle,
    coordinator: Arc<MessageFetchCoordinator>,
    state: Arc<dyn SessionStateReader>,
    sink: Arc<dyn SignalSink>,
    retrier: BackoffRetrier,
    config: BootstrapConfig,
    fsm: Mutex<BootstrapMachine>,
}

impl BootstrapOrchestrator {
    /// `sink` must be the same consumer the coordinator emits into.
    pub fn new(
        session_api: SessionApiHandle,
        coordinator: Arc<MessageFetchCoordinator>,
        state: Arc<dyn SessionStateReader>,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        Self {
            session_api,
            coordinator,
            state,
            sink,
            retrier: BackoffRetrier::default(),
            config: BootstrapConfig::default(),
            fsm: Mutex::new(BootstrapMachine::new()),
        }
    }

    pub fn with_retrier(mut self, retrier: BackoffRetrier) -> Self {
        self.retrier = retrier;
        self
    }

    pub fn with_config(mut self, config: BootstrapConfig) -> Self {
        self.config = config;
        self
    }

    /// Current bootstrap state.
    pub fn state(&self) -> BootstrapState {
        BootstrapState::from(self.fsm.lock().state())
    }

    fn transition(&self, input: &BootstrapMachineInput) -> BootstrapResult<BootstrapState> {
        let mut fsm = self.fsm.lock();
        let old_state = BootstrapState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            BootstrapError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = BootstrapState::from(fsm.state());
        drop(fsm);

        debug!(
            old_state = ?old_state,
            new_state = ?new_state,
            "Bootstrap state transition"
        );
        Ok(new_state)
    }

    /// Run the startup handshake.
    ///
    /// Fails only if a bootstrap is already running. Transient failures are
    /// retried without limit, so this may wait indefinitely on an unreachable
    /// server; dropping the future cancels it and returns the machine to
    /// `Idle`.
    pub async fn run(&self) -> BootstrapResult<BootstrapOutcome> {
        self.transition(&BootstrapMachineInput::Start)?;
        let _cancel = CancelOnDrop {
            fsm: &self.fsm,
            sink: self.sink.as_ref(),
        };

        info!("Starting bootstrap");
        self.sink.emit(SyncSignal::InitialFetchStart);

        let api = &self.session_api;
        let register = &self.config.register;
        let fetched = tokio::try_join!(
            self.retrier
                .run("register_session", || api.register_session(register)),
            self.retrier.run("server_metadata", || api.server_metadata()),
        );

        let (data, metadata) = match fetched {
            Ok(pair) => pair,
            Err(cause) => {
                self.transition(&BootstrapMachineInput::Rejected)?;
                error!(error = %cause, "Bootstrap rejected, logging out");
                self.sink.emit(SyncSignal::Logout);
                return Ok(BootstrapOutcome::LoggedOut { cause });
            }
        };

        let server_version = resolve_server_version(&metadata.version);
        let queue_id = data.queue_id.clone();
        let last_event_id = data.last_event_id;

        self.sink.emit(SyncSignal::SessionInit {
            data,
            server_version: server_version.clone(),
        });
        self.transition(&BootstrapMachineInput::Succeeded)?;
        self.sink.emit(SyncSignal::InitialFetchComplete);
        info!(
            server_version = %server_version,
            queue_id = %queue_id,
            "Bootstrap complete"
        );

        self.sink.emit(SyncSignal::StartEventStream {
            queue_id: queue_id.clone(),
            last_event_id,
        });

        let legacy_fetch = if server_version < self.config.min_recent_pm_version {
            self.fetch_recent_private_messages().await
        } else {
            LegacyFetch::NotNeeded
        };

        self.sink.emit(SyncSignal::FlushOutbox);
        self.sink.emit(SyncSignal::InitNotifications);

        Ok(BootstrapOutcome::Ready(BootstrapReport {
            server_version,
            queue_id,
            last_event_id,
            legacy_fetch,
        }))
    }

    async fn fetch_recent_private_messages(&self) -> LegacyFetch {
        match self
            .coordinator
            .fetch_recent_private_messages_legacy(self.state.as_ref())
            .await
        {
            Ok(outcome) => LegacyFetch::Completed {
                message_count: outcome.messages.len(),
            },
            Err(e) => {
                warn!(error = %e, "Legacy recent private messages fetch failed");
                LegacyFetch::Failed { error: e }
            }
        }
    }
}

/// Parse the server's version string, falling back to the lowest version.
pub fn resolve_server_version(raw: &str) -> ServerVersion {
    match raw.parse::<ServerVersion>() {
        Ok(version) => version,
        Err(e) => {
            warn!(version = raw, error = %e, "Unparseable server version, assuming oldest");
            ServerVersion::lowest()
        }
    }
}

/// Returns the machine to `Idle` if the run future is dropped mid-fetch, and
/// tells the store the initial fetch is over.
struct CancelOnDrop<'a> {
    fsm: &'a Mutex<BootstrapMachine>,
    sink: &'a dyn SignalSink,
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        let cancelled = {
            let mut fsm = self.fsm.lock();
            *fsm.state() == BootstrapMachineState::FetchingInitialData
                && fsm.consume(&BootstrapMachineInput::Cancelled).is_ok()
        };
        if cancelled {
            warn!("Bootstrap cancelled before completion");
            self.sink.emit(SyncSignal::InitialFetchAborted);
        }
    }
}

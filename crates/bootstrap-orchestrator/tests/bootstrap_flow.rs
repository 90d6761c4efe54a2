//! End-to-end bootstrap flows against scripted remote endpoints.

use async_trait::async_trait;
use backoff_retrier::{BackoffConfig, BackoffRetrier};
use bootstrap_orchestrator::{
    BootstrapError, BootstrapOrchestrator, BootstrapOutcome, BootstrapState, LegacyFetch,
};
use message_fetch_coordinator::{MemorySessionStore, MessageFetchCoordinator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use sync_types::{
    Anchor, FetchMessagesRequest, FetchMessagesResponse, InitialData, Message, MessagesApi,
    Narrow, RegisterRequest, ScopeFetchState, ServerMetadata, SessionApi, SessionStateReader,
    SignalSink, SyncError, SyncResult, SyncSignal,
};

// =============================================================================
// Harness
// =============================================================================

#[derive(Default)]
struct FakeServer {
    register_results: Mutex<VecDeque<SyncResult<InitialData>>>,
    metadata_results: Mutex<VecDeque<SyncResult<ServerMetadata>>>,
    message_results: Mutex<VecDeque<SyncResult<FetchMessagesResponse>>>,
    message_requests: Mutex<Vec<FetchMessagesRequest>>,
    register_calls: AtomicU32,
    metadata_calls: AtomicU32,
    register_latency: Option<Duration>,
    version: String,
}

impl FakeServer {
    fn running(version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..Default::default()
        }
    }

    fn script_register(&self, result: SyncResult<InitialData>) {
        self.register_results.lock().push_back(result);
    }

    fn script_metadata(&self, result: SyncResult<ServerMetadata>) {
        self.metadata_results.lock().push_back(result);
    }

    fn script_messages(&self, result: SyncResult<FetchMessagesResponse>) {
        self.message_results.lock().push_back(result);
    }

    fn message_requests(&self) -> Vec<FetchMessagesRequest> {
        self.message_requests.lock().clone()
    }
}

#[async_trait]
impl SessionApi for FakeServer {
    async fn register_session(&self, _request: &RegisterRequest) -> SyncResult<InitialData> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.register_latency {
            tokio::time::sleep(latency).await;
        }
        let scripted = self.register_results.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(initial_data("q-1", 17, 42)))
    }

    async fn server_metadata(&self) -> SyncResult<ServerMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.metadata_results.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(metadata(&self.version)))
    }
}

#[async_trait]
impl MessagesApi for FakeServer {
    async fn fetch_messages(
        &self,
        request: FetchMessagesRequest,
    ) -> SyncResult<FetchMessagesResponse> {
        self.message_requests.lock().push(request);
        let scripted = self.message_results.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(FetchMessagesResponse {
                messages: vec![Message::new(500), Message::new(501)],
                found_newest: true,
                found_oldest: false,
                found_anchor: true,
            })
        })
    }
}

struct Harness {
    server: Arc<FakeServer>,
    store: Arc<MemorySessionStore>,
    coordinator: Arc<MessageFetchCoordinator>,
    orchestrator: BootstrapOrchestrator,
}

fn harness(server: FakeServer) -> Harness {
    let server = Arc::new(server);
    let store = Arc::new(MemorySessionStore::new());
    let coordinator = Arc::new(MessageFetchCoordinator::new(server.clone(), store.clone()));
    let retrier = BackoffRetrier::new(BackoffConfig {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
        ..Default::default()
    });
    let orchestrator = BootstrapOrchestrator::new(
        server.clone(),
        coordinator.clone(),
        store.clone(),
        store.clone(),
    )
    .with_retrier(retrier);
    Harness {
        server,
        store,
        coordinator,
        orchestrator,
    }
}

fn initial_data(queue_id: &str, last_event_id: i64, user_id: i64) -> InitialData {
    serde_json::from_value(serde_json::json!({
        "queue_id": queue_id,
        "last_event_id": last_event_id,
        "user_id": user_id,
        "realm_name": "Test realm"
    }))
    .unwrap()
}

fn metadata(version: &str) -> ServerMetadata {
    serde_json::from_value(serde_json::json!({
        "version": version,
        "push_notifications_enabled": false
    }))
    .unwrap()
}

fn unauthorized() -> SyncError {
    SyncError::Client {
        status: 401,
        code: Some("UNAUTHORIZED".to_string()),
        message: "Invalid API key".to_string(),
    }
}

fn unavailable() -> SyncError {
    SyncError::Server {
        status: 503,
        message: "unavailable".to_string(),
    }
}

// =============================================================================
// Successful bootstrap
// =============================================================================

#[tokio::test]
async fn current_server_bootstraps_without_legacy_fetch() {
    let h = harness(FakeServer::running("4.0"));

    let outcome = h.orchestrator.run().await.unwrap();

    let BootstrapOutcome::Ready(report) = outcome else {
        panic!("expected ready outcome");
    };
    assert_eq!(report.queue_id, "q-1");
    assert_eq!(report.last_event_id, 17);
    assert_eq!(report.legacy_fetch, LegacyFetch::NotNeeded);
    assert_eq!(h.orchestrator.state(), BootstrapState::Ready);
    assert!(h.server.message_requests().is_empty());
    assert_eq!(
        h.store.signal_names(),
        vec![
            "initial_fetch_start",
            "session_init",
            "initial_fetch_complete",
            "start_event_stream",
            "flush_outbox",
            "init_notifications",
        ]
    );
    assert_eq!(h.store.own_user_id(), Some(42));
    assert_eq!(h.store.event_queue(), Some(("q-1".to_string(), 17)));
    assert!(!h.store.initial_fetch_in_progress());
}

#[tokio::test]
async fn old_server_gets_exactly_one_legacy_fetch() {
    let h = harness(FakeServer::running("1.9.2"));

    let outcome = h.orchestrator.run().await.unwrap();

    let BootstrapOutcome::Ready(report) = outcome else {
        panic!("expected ready outcome");
    };
    assert_eq!(report.legacy_fetch, LegacyFetch::Completed { message_count: 2 });

    let requests = h.server.message_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].anchor, Anchor::Newest);
    assert_eq!((requests[0].num_before, requests[0].num_after), (100, 0));

    assert_eq!(
        h.store.signal_names(),
        vec![
            "initial_fetch_start",
            "session_init",
            "initial_fetch_complete",
            "start_event_stream",
            "fetch_start",
            "fetch_complete",
            "flush_outbox",
            "init_notifications",
        ]
    );
    assert_eq!(
        h.store.message_ids(&Narrow::AllPrivateMessages),
        vec![500, 501]
    );
}

#[tokio::test]
async fn unparseable_version_takes_legacy_path() {
    let h = harness(FakeServer::running("unknown"));

    let outcome = h.orchestrator.run().await.unwrap();

    assert!(outcome.is_ready());
    assert_eq!(h.server.message_requests().len(), 1);
}

#[tokio::test]
async fn legacy_fetch_failure_keeps_session_ready() {
    let server = FakeServer::running("2.0");
    server.script_messages(Err(unavailable()));
    let h = harness(server);

    let outcome = h.orchestrator.run().await.unwrap();

    let BootstrapOutcome::Ready(report) = outcome else {
        panic!("expected ready outcome");
    };
    assert_eq!(report.legacy_fetch, LegacyFetch::Failed { error: unavailable() });
    assert_eq!(h.orchestrator.state(), BootstrapState::Ready);
    let names = h.store.signal_names();
    assert!(names.contains(&"fetch_error"));
    assert_eq!(names.last(), Some(&"init_notifications"));
    assert_eq!(h.server.message_requests().len(), 1);
}

// =============================================================================
// Retry and logout
// =============================================================================

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_until_success() {
    let server = FakeServer::running("4.0");
    server.script_register(Err(unavailable()));
    server.script_register(Err(SyncError::network("connection reset")));
    server.script_metadata(Err(SyncError::Timeout));
    let h = harness(server);

    let outcome = h.orchestrator.run().await.unwrap();

    assert!(outcome.is_ready());
    assert_eq!(h.server.register_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.server.metadata_calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.store.signal_names().first(), Some(&"initial_fetch_start"));
}

#[tokio::test(start_paused = true)]
async fn terminal_metadata_error_logs_out_without_applying_registration() {
    let server = FakeServer::running("4.0");
    server.script_metadata(Err(unauthorized()));
    let h = harness(server);

    let outcome = h.orchestrator.run().await.unwrap();

    assert_eq!(outcome, BootstrapOutcome::LoggedOut { cause: unauthorized() });
    assert_eq!(h.orchestrator.state(), BootstrapState::LoggedOut);
    assert_eq!(h.store.signal_names(), vec!["initial_fetch_start", "logout"]);
    assert!(h.store.session().is_none());
    assert!(h.store.is_logged_out());
    assert!(h.server.message_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn terminal_register_error_cancels_metadata_retries() {
    let server = FakeServer::running("4.0");
    server.script_register(Err(unauthorized()));
    for _ in 0..1000 {
        server.script_metadata(Err(unavailable()));
    }
    let h = harness(server);

    let outcome = h.orchestrator.run().await.unwrap();

    assert!(matches!(outcome, BootstrapOutcome::LoggedOut { .. }));
    let metadata_calls = h.server.metadata_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.server.metadata_calls.load(Ordering::SeqCst), metadata_calls);
}

#[tokio::test(start_paused = true)]
async fn can_bootstrap_again_after_logout() {
    let server = FakeServer::running("4.0");
    server.script_register(Err(unauthorized()));
    let h = harness(server);

    let first = h.orchestrator.run().await.unwrap();
    assert!(!first.is_ready());

    let second = h.orchestrator.run().await.unwrap();
    assert!(second.is_ready());
    assert!(!h.store.is_logged_out());
    assert_eq!(h.orchestrator.state(), BootstrapState::Ready);
}

// =============================================================================
// State machine guards
// =============================================================================

#[tokio::test(start_paused = true)]
async fn second_bootstrap_while_running_is_rejected() {
    let server = FakeServer {
        register_latency: Some(Duration::from_millis(50)),
        ..FakeServer::running("4.0")
    };
    let h = harness(server);

    let first = h.orchestrator.run();
    let second = async {
        tokio::task::yield_now().await;
        h.orchestrator.run().await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.unwrap().is_ready());
    assert!(matches!(
        second,
        Err(BootstrapError::InvalidStateTransition(_))
    ));
    assert_eq!(h.server.register_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_bootstrap_returns_to_idle() {
    let server = FakeServer {
        register_latency: Some(Duration::from_secs(5)),
        ..FakeServer::running("4.0")
    };
    let h = harness(server);

    let timed_out = tokio::time::timeout(Duration::from_secs(1), h.orchestrator.run()).await;

    assert!(timed_out.is_err());
    assert_eq!(h.orchestrator.state(), BootstrapState::Idle);
    assert!(!h.store.initial_fetch_in_progress());
    assert_eq!(
        h.store.signal_names(),
        vec!["initial_fetch_start", "initial_fetch_aborted"]
    );
    assert!(h.store.session().is_none());

    let narrow = Narrow::stream("general");
    h.store.set_fetch_state(
        &narrow,
        ScopeFetchState {
            first_message_id: Some(1000),
            last_message_id: Some(1100),
            ..Default::default()
        },
    );
    let paged = h.coordinator.fetch_older(&*h.store, &narrow).await.unwrap();

    assert!(paged.is_some());
    assert_eq!(h.server.message_requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn finished_bootstrap_emits_no_abort_signal() {
    let h = harness(FakeServer::running("4.0"));

    h.orchestrator.run().await.unwrap();

    assert!(!h
        .store
        .signal_names()
        .contains(&"initial_fetch_aborted"));
}

// =============================================================================
// Coordinator after bootstrap
// =============================================================================

#[tokio::test]
async fn paging_is_blocked_during_bootstrap_and_allowed_after() {
    let h = harness(FakeServer::running("4.0"));
    let narrow = Narrow::stream("general");
    h.store.set_fetch_state(
        &narrow,
        ScopeFetchState {
            first_message_id: Some(1000),
            last_message_id: Some(1100),
            ..Default::default()
        },
    );

    h.store.emit(SyncSignal::InitialFetchStart);
    let blocked = h.coordinator.fetch_older(&*h.store, &narrow).await.unwrap();
    assert!(blocked.is_none());
    h.store.emit(SyncSignal::InitialFetchComplete);

    h.orchestrator.run().await.unwrap();
    let paged = h.coordinator.fetch_older(&*h.store, &narrow).await.unwrap();

    assert!(paged.is_some());
    let requests = h.server.message_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].anchor, Anchor::Message(1000));
    assert_eq!((requests[0].num_before, requests[0].num_after), (50, 0));
}

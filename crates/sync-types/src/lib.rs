//! Shared types for realm message synchronization.
//!
//! This crate provides:
//! - The pagination data model (narrows, anchors, fetch windows, per-narrow fetch state)
//! - The signal vocabulary emitted by the fetch coordinator and bootstrap orchestrator
//! - The error taxonomy with terminal/transient classification
//! - Collaborator traits for the remote API, the session store, and the outbox

mod api;
mod error;
mod fetch;
mod narrow;
mod session;
mod signal;
mod version;

pub use api::{
    AttachmentApi, ClientCapabilities, FetchMessagesRequest, FetchMessagesResponse, InitialData,
    MessagesApi, RegisterRequest, ServerMetadata, SessionApi, UploadResponse,
    DEFAULT_FETCH_EVENT_TYPES,
};
pub use error::{SyncError, SyncResult};
pub use fetch::{Anchor, Direction, FetchOutcome, FetchWindow, Message, ScopeFetchState};
pub use narrow::{MessageId, Narrow, NarrowFilter, NarrowOperand, UserId};
pub use session::{OutboxSink, SessionStateReader};
pub use signal::{SignalSink, SyncSignal};
pub use version::{InvalidVersion, ServerVersion};

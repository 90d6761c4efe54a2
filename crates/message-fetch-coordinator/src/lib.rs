//! # Message Fetch Coordinator
//!
//! Decides when and how to request a window of message history for a narrow,
//! and reports every request through [`SyncSignal`](sync_types::SyncSignal)s.
//!
//! ## Guards
//!
//! A directional fetch (older or newer) is skipped when:
//!
//! 1. the bootstrap's initial fetch is still running
//! 2. the session store reports that direction as fetching or caught up
//! 3. no boundary message is known for the narrow
//! 4. another request for the same narrow and direction is in flight
//!
//! The last guard is held by the coordinator itself, so it holds even if the
//! store applies `FetchStart` late.

mod attachment;
mod claims;
mod coordinator;
mod store;
mod window;

pub use attachment::{attachment_markdown, upload_attachment};
pub use coordinator::{
    FetchCoordinatorConfig, MessageFetchCoordinator, MessagesApiHandle, SignalSinkHandle,
    DEFAULT_LEGACY_RECENT_PM_COUNT,
};
pub use store::MemorySessionStore;
pub use window::{WindowPolicy, DEFAULT_MESSAGES_PER_REQUEST};

//! # Bootstrap Orchestrator
//!
//! Runs the startup handshake for an app session: register a live-update
//! session and fetch server metadata in parallel under the retry policy,
//! then either log out (terminal failure) or apply the session, start the
//! event stream, run the legacy recent-PM fetch for old servers, and signal
//! the outbox and notification collaborators.
//!
//! State is tracked by an explicit FSM; see [`fsm`] for the diagram.

mod error;
pub mod fsm;
mod orchestrator;

pub use error::{BootstrapError, BootstrapResult};
pub use fsm::BootstrapState;
pub use orchestrator::{
    default_min_recent_pm_version, resolve_server_version, BootstrapConfig, BootstrapOrchestrator,
    BootstrapOutcome, BootstrapReport, LegacyFetch, SessionApiHandle,
};

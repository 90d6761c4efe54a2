//! Bootstrap state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │      Idle       │ (initial)
//! └────────┬────────┘
//!          │ Start
//!          ▼
//! ┌─────────────────────┐  Cancelled
//! │ FetchingInitialData │ ──────────► Idle
//! └────────┬────────────┘
//!          │
//!          ├── Succeeded ──► Ready ─────┐
//!          │                            │ Start (reconnect)
//!          └── Rejected ───► LoggedOut ─┤
//!                                       ▼
//!                              FetchingInitialData
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub bootstrap_machine(Idle)

    Idle => {
        Start => FetchingInitialData
    },
    FetchingInitialData => {
        Succeeded => Ready,
        // Registration or metadata failed terminally
        Rejected => LoggedOut,
        // Bootstrap future dropped before finishing
        Cancelled => Idle
    },
    Ready => {
        Start => FetchingInitialData
    },
    LoggedOut => {
        Start => FetchingInitialData
    }
}

pub use bootstrap_machine::Input as BootstrapMachineInput;
pub use bootstrap_machine::State as BootstrapMachineState;
pub use bootstrap_machine::StateMachine as BootstrapMachine;

/// Bootstrap state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    /// Nothing started yet.
    Idle,
    /// Registration and metadata calls in flight.
    FetchingInitialData,
    /// Session registered and live updates started.
    Ready,
    /// Credentials rejected; session cleared.
    LoggedOut,
}

impl BootstrapState {
    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapState::Ready)
    }
}

impl From<&BootstrapMachineState> for BootstrapState {
    fn from(state: &BootstrapMachineState) -> Self {
        match state {
            BootstrapMachineState::Idle => BootstrapState::Idle,
            BootstrapMachineState::FetchingInitialData => BootstrapState::FetchingInitialData,
            BootstrapMachineState::Ready => BootstrapState::Ready,
            BootstrapMachineState::LoggedOut => BootstrapState::LoggedOut,
        }
    }
}

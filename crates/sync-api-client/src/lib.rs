//! HTTP client for a realm's REST API.
//!
//! [`ApiClient`] implements the sync core's remote-call traits
//! ([`MessagesApi`](sync_types::MessagesApi),
//! [`SessionApi`](sync_types::SessionApi),
//! [`AttachmentApi`](sync_types::AttachmentApi)) over `reqwest`, and maps
//! HTTP outcomes onto [`SyncError`](sync_types::SyncError) so the retry
//! policy can tell terminal failures from transient ones:
//!
//! | Outcome | Error | Class |
//! |---------|-------|-------|
//! | 4xx (except 408, 429) | `Client` | terminal |
//! | 408 | `Timeout` | transient |
//! | 429, 5xx | `Server` | transient |
//! | connect / IO failure | `Network` | transient |
//! | client-side timeout | `Timeout` | transient |
//! | undecodable body | `MalformedResponse` | transient |

mod client;
mod response;

pub use client::{ApiClient, ApiCredentials};

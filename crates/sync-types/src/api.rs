//! Remote call contracts.
//!
//! The transport client that performs these calls lives outside the sync core;
//! these traits are the seam. Auth is owned by the implementation.

use crate::error::SyncResult;
use crate::fetch::{Anchor, FetchOutcome, Message};
use crate::narrow::NarrowFilter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Event types requested when registering a live-update session.
pub const DEFAULT_FETCH_EVENT_TYPES: &[&str] = &[
    "alert_words",
    "message",
    "muted_topics",
    "presence",
    "realm",
    "realm_emoji",
    "realm_filters",
    "realm_user",
    "realm_user_groups",
    "recent_private_conversations",
    "stream",
    "subscription",
    "update_display_settings",
    "update_global_notifications",
    "user_status",
];

/// Parameters of a message history request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchMessagesRequest {
    pub narrow: Vec<NarrowFilter>,
    pub anchor: Anchor,
    pub num_before: u32,
    pub num_after: u32,
}

/// Message history response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchMessagesResponse {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub found_newest: bool,
    #[serde(default)]
    pub found_oldest: bool,
    #[serde(default)]
    pub found_anchor: bool,
}

impl From<FetchMessagesResponse> for FetchOutcome {
    fn from(response: FetchMessagesResponse) -> Self {
        FetchOutcome {
            messages: response.messages,
            found_newest: response.found_newest,
            found_oldest: response.found_oldest,
            found_anchor: response.found_anchor,
        }
    }
}

/// Feature flags the client declares when registering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    pub notification_settings_null: bool,
    pub bulk_message_deletion: bool,
    pub user_avatar_url_field_optional: bool,
}

impl Default for ClientCapabilities {
    fn default() -> Self {
        Self {
            notification_settings_null: true,
            bulk_message_deletion: true,
            user_avatar_url_field_optional: true,
        }
    }
}

/// Live-update session registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub fetch_event_types: Vec<String>,
    pub apply_markdown: bool,
    pub include_subscribers: bool,
    pub client_capabilities: ClientCapabilities,
}

impl Default for RegisterRequest {
    fn default() -> Self {
        Self {
            fetch_event_types: DEFAULT_FETCH_EVENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            apply_markdown: true,
            include_subscribers: false,
            client_capabilities: ClientCapabilities::default(),
        }
    }
}

/// Registration result: event queue handle plus the initial state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialData {
    pub queue_id: String,
    pub last_event_id: i64,
    #[serde(flatten)]
    pub state: serde_json::Map<String, serde_json::Value>,
}

impl InitialData {
    /// The registering user's id, when the snapshot includes it.
    pub fn user_id(&self) -> Option<i64> {
        self.state.get("user_id").and_then(|v| v.as_i64())
    }
}

/// Unauthenticated server metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMetadata {
    pub version: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Attachment upload result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub uri: String,
}

/// Message history endpoint.
#[async_trait]
pub trait MessagesApi: Send + Sync {
    async fn fetch_messages(
        &self,
        request: FetchMessagesRequest,
    ) -> SyncResult<FetchMessagesResponse>;
}

/// Session bootstrap endpoints.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn register_session(&self, request: &RegisterRequest) -> SyncResult<InitialData>;

    async fn server_metadata(&self) -> SyncResult<ServerMetadata>;
}

/// File upload endpoint.
#[async_trait]
pub trait AttachmentApi: Send + Sync {
    async fn upload_attachment(&self, local_path: &Path, name: &str)
        -> SyncResult<UploadResponse>;
}

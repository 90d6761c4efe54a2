//! Realm REST API client.

use crate::response::{decode_body, transport_error};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use sync_types::{
    AttachmentApi, FetchMessagesRequest, FetchMessagesResponse, InitialData, MessagesApi,
    RegisterRequest, ServerMetadata, SessionApi, SyncError, SyncResult, UploadResponse,
};
use url::Url;

const USER_AGENT: &str = concat!("realm-sync/", env!("CARGO_PKG_VERSION"));

/// Login email plus API key, sent as HTTP basic auth.
#[derive(Clone)]
pub struct ApiCredentials {
    pub email: String,
    pub api_key: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// HTTP client for one realm.
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    realm: Url,
    credentials: ApiCredentials,
}

impl ApiClient {
    pub fn new(
        realm: Url,
        credentials: ApiCredentials,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http_client,
            realm: with_trailing_slash(realm),
            credentials,
        })
    }

    pub fn realm(&self) -> &Url {
        &self.realm
    }

    /// Absolute URL for an API path such as `messages`.
    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        self.realm
            .join("api/v1/")
            .and_then(|base| base.join(path))
            .map_err(|e| SyncError::invalid_request(format!("bad endpoint {path}: {e}")))
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> SyncResult<(u16, String)> {
        let response = request
            .basic_auth(&self.credentials.email, Some(&self.credentials.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(endpoint, error = %e, "Request did not complete");
                transport_error(&e)
            })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        tracing::debug!(endpoint, status, "Response received");
        Ok((status, body))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Query parameters for a message history request.
pub(crate) fn messages_query(
    request: &FetchMessagesRequest,
) -> SyncResult<Vec<(&'static str, String)>> {
    let narrow = serde_json::to_string(&request.narrow)
        .map_err(|e| SyncError::invalid_request(format!("narrow: {e}")))?;
    Ok(vec![
        ("narrow", narrow),
        ("anchor", request.anchor.as_param()),
        ("num_before", request.num_before.to_string()),
        ("num_after", request.num_after.to_string()),
        ("apply_markdown", "true".to_string()),
    ])
}

/// Form fields for registration. Each value is JSON-encoded.
pub(crate) fn register_form(
    request: &RegisterRequest,
) -> SyncResult<Vec<(&'static str, String)>> {
    let encode = |name: &str, value: serde_json::Result<String>| {
        value.map_err(|e| SyncError::invalid_request(format!("{name}: {e}")))
    };
    Ok(vec![
        (
            "fetch_event_types",
            encode("fetch_event_types", serde_json::to_string(&request.fetch_event_types))?,
        ),
        (
            "apply_markdown",
            encode("apply_markdown", serde_json::to_string(&request.apply_markdown))?,
        ),
        (
            "include_subscribers",
            encode(
                "include_subscribers",
                serde_json::to_string(&request.include_subscribers),
            )?,
        ),
        (
            "client_capabilities",
            encode(
                "client_capabilities",
                serde_json::to_string(&request.client_capabilities),
            )?,
        ),
    ])
}

#[async_trait]
impl MessagesApi for ApiClient {
    async fn fetch_messages(
        &self,
        request: FetchMessagesRequest,
    ) -> SyncResult<FetchMessagesResponse> {
        let url = self.endpoint("messages")?;
        let query = messages_query(&request)?;
        let (status, body) = self
            .send("messages", self.http_client.get(url).query(&query))
            .await?;
        decode_body("messages", status, &body)
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn register_session(&self, request: &RegisterRequest) -> SyncResult<InitialData> {
        let url = self.endpoint("register")?;
        let form = register_form(request)?;
        let (status, body) = self
            .send("register", self.http_client.post(url).form(&form))
            .await?;
        decode_body("register", status, &body)
    }

    async fn server_metadata(&self) -> SyncResult<ServerMetadata> {
        let url = self.endpoint("server_settings")?;
        let (status, body) = self
            .send("server_settings", self.http_client.get(url))
            .await?;
        decode_body("server_settings", status, &body)
    }
}

#[async_trait]
impl AttachmentApi for ApiClient {
    async fn upload_attachment(
        &self,
        local_path: &Path,
        name: &str,
    ) -> SyncResult<UploadResponse> {
        let url = self.endpoint("user_uploads")?;
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            SyncError::invalid_request(format!("cannot read {}: {e}", local_path.display()))
        })?;
        tracing::debug!(name, size = bytes.len(), "Uploading attachment");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let (status, body) = self
            .send("user_uploads", self.http_client.post(url).multipart(form))
            .await?;
        decode_body("user_uploads", status, &body)
    }
}

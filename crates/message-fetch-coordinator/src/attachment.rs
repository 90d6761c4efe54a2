//! Attachment upload pass-through.

use std::path::Path;
use sync_types::{AttachmentApi, Narrow, OutboxSink, SyncResult};
use tracing::info;

/// Markdown link that references an uploaded file in message content.
pub fn attachment_markdown(name: &str, uri: &str) -> String {
    format!("[{name}]({uri})")
}

/// Upload a local file and queue a message linking to it.
///
/// Nothing is queued if the upload fails. Returns the queued content.
pub async fn upload_attachment(
    api: &dyn AttachmentApi,
    outbox: &dyn OutboxSink,
    narrow: &Narrow,
    local_path: &Path,
    name: &str,
) -> SyncResult<String> {
    let response = api.upload_attachment(local_path, name).await?;
    info!(?narrow, name, uri = %response.uri, "Attachment uploaded");

    let content = attachment_markdown(name, &response.uri);
    outbox.queue_message(narrow, content.clone());
    Ok(content)
}

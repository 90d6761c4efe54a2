//! Mapping HTTP outcomes onto [`SyncError`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use sync_types::{SyncError, SyncResult};

/// Length and digest of a body, so logs never carry message content.
pub(crate) fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Error envelope returned by the server alongside a non-success status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Classify a non-success HTTP status.
///
/// 4xx responses mean the request itself is wrong and are terminal, except
/// 408 (timeout) and 429 (rate limited), which are worth retrying.
pub(crate) fn status_error(status: u16, body: &str) -> SyncError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (message, code) = match parsed {
        Some(ErrorBody { msg, code }) => (
            msg.unwrap_or_else(|| summarize_response_body(body)),
            code,
        ),
        None => (summarize_response_body(body), None),
    };

    match status {
        408 => SyncError::Timeout,
        429 => SyncError::Server { status, message },
        400..=499 => SyncError::Client {
            status,
            code,
            message,
        },
        _ => SyncError::Server { status, message },
    }
}

/// Classify a failure that produced no HTTP status.
pub(crate) fn transport_error(error: &reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::Timeout
    } else if error.is_decode() {
        SyncError::malformed(error.to_string())
    } else if error.is_builder() {
        SyncError::invalid_request(error.to_string())
    } else {
        SyncError::network(error.to_string())
    }
}

/// Decode a JSON success body, or map a failure status.
pub(crate) fn decode_body<T: DeserializeOwned>(
    endpoint: &'static str,
    status: u16,
    body: &str,
) -> SyncResult<T> {
    if !(200..300).contains(&status) {
        let error = status_error(status, body);
        tracing::warn!(
            endpoint,
            status,
            body_summary = %summarize_response_body(body),
            terminal = error.is_terminal(),
            "Request failed"
        );
        return Err(error);
    }

    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(
            endpoint,
            body_summary = %summarize_response_body(body),
            error = %e,
            "Undecodable response body"
        );
        SyncError::malformed(format!("{endpoint}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_types::FetchMessagesResponse;

    #[test]
    fn test_summary_hides_content() {
        let summary = summarize_response_body("secret message text");
        assert!(summary.starts_with("len=19,digest="));
        assert!(!summary.contains("secret"));
        assert_eq!(summary, summarize_response_body("secret message text"));
    }

    #[test]
    fn test_unauthorized_is_terminal_with_code() {
        let body = r#"{"result":"error","msg":"Invalid API key","code":"UNAUTHORIZED"}"#;
        let error = status_error(401, body);
        assert_eq!(
            error,
            SyncError::Client {
                status: 401,
                code: Some("UNAUTHORIZED".to_string()),
                message: "Invalid API key".to_string(),
            }
        );
        assert!(error.is_terminal());
    }

    #[test]
    fn test_bad_request_is_terminal() {
        let error = status_error(400, r#"{"result":"error","msg":"Invalid narrow"}"#);
        assert!(matches!(error, SyncError::Client { status: 400, code: None, .. }));
        assert!(error.is_terminal());
    }

    #[test]
    fn test_rate_limit_and_request_timeout_are_transient() {
        assert!(status_error(429, "{}").is_transient());
        assert_eq!(status_error(408, ""), SyncError::Timeout);
    }

    #[test]
    fn test_server_errors_are_transient() {
        let error = status_error(502, "<html>Bad Gateway</html>");
        match &error {
            SyncError::Server { status, message } => {
                assert_eq!(*status, 502);
                assert!(message.starts_with("len="));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(error.is_transient());
    }

    #[test]
    fn test_decode_success_body() {
        let body = r#"{
            "result": "success",
            "messages": [{"id": 10, "content": "hi"}],
            "found_newest": true,
            "found_oldest": false,
            "found_anchor": true
        }"#;
        let response: FetchMessagesResponse = decode_body("messages", 200, body).unwrap();
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].id, 10);
        assert!(response.found_newest);
    }

    #[test]
    fn test_decode_garbage_is_malformed_and_transient() {
        let result: SyncResult<FetchMessagesResponse> = decode_body("messages", 200, "not json");
        let error = result.unwrap_err();
        assert!(matches!(error, SyncError::MalformedResponse { .. }));
        assert!(error.is_transient());
    }

    #[test]
    fn test_decode_failure_status_maps_error() {
        let result: SyncResult<FetchMessagesResponse> =
            decode_body("messages", 403, r#"{"msg":"Forbidden"}"#);
        assert!(result.unwrap_err().is_terminal());
    }
}

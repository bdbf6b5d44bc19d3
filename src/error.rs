use reqwest::StatusCode;
use serde_json::Value;

use crate::models::field;

/// Unified failure type for every client operation. The feed store itself
/// never errors; only the network-facing layers produce these.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("{0}")]
    Api(String),
    #[error("malformed response: {0}")]
    Malformed(&'static str),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("session store: {0}")]
    Store(#[from] std::io::Error),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    /// Normalize a failed round-trip. Message priority: server-supplied
    /// message field, then a status-derived description.
    pub fn from_failure(status: StatusCode, body: &Value) -> Self {
        let server_msg = field(body, &["message", "error"])
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty());
        match server_msg {
            Some(msg) => ClientError::Api(msg.to_string()),
            None => ClientError::Api(format!("request failed with status {status}")),
        }
    }
}

/// Read a response body as JSON, mapping non-2xx statuses into the
/// normalized error. Empty and non-JSON bodies are tolerated as `Null`.
pub async fn json_or_error(resp: reqwest::Response) -> Result<Value, ClientError> {
    let status = resp.status();
    let text = resp.text().await?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::from_failure(status, &body))
    }
}

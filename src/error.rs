//! Client error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from REST, socket and storage operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server answered with a non-success status.
    #[error("server returned {status}{}", detail_suffix(.message))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body's `detail`, if any.
        message: Option<String>,
    },

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("chat channel did not connect within {0:?}")]
    ConnectTimeout(Duration),

    #[error("chat channel is not open")]
    NotConnected,
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

impl ClientError {
    /// Text to show the user: the server message when one was extracted,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

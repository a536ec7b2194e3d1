use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Method;

#[derive(Debug, thiserror::Error)]
pub enum InkpadError {
    #[error("Transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("HTTP {status} from {method} {path}{}", format_body(.body))]
    Http {
        status: u16,
        method: Method,
        path: String,
        body: String,
    },

    /// An expired-token status on a request that was already replayed with a
    /// fresh token.
    #[error("Access token rejected after refresh: {0}")]
    AuthExpired(Box<InkpadError>),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(Arc<InkpadError>),

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl InkpadError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            InkpadError::Transport(_) => "transport_error",
            InkpadError::AuthExpired(_) => "auth_expired",
            InkpadError::Http { .. } => "http_error",
            InkpadError::RefreshFailed(_) => "refresh_failed",
            InkpadError::ConfigError { .. } => "config_error",
            InkpadError::ProtocolError(_) => "parse_error",
            InkpadError::InvalidRequest(_) => "invalid_request",
            InkpadError::IoError(_) => "io_error",
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            InkpadError::Http { status, .. } => Some(*status),
            InkpadError::AuthExpired(inner) => inner.status(),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            InkpadError::Http { path, .. } => Some(path),
            InkpadError::AuthExpired(inner) => inner.path(),
            _ => None,
        }
    }

    /// Produce a structured JSON error object.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(status) = self.status() {
            obj.insert("status".into(), serde_json::Value::from(status));
        }
        if let Some(path) = self.path() {
            obj.insert("path".into(), serde_json::Value::String(path.to_string()));
        }
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        serde_json::json!({ "error": obj })
    }
}

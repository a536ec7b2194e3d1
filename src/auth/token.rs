use serde::{Deserialize, Serialize};

use crate::error::InkpadError;

/// What the credential file holds between runs.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl StoredCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: default_token_type(),
            saved_at: chrono::Utc::now(),
        }
    }
}

/// Token payload returned by the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
}

impl TokenResponse {
    /// Pull the token out of a response body. `token_field` names the access
    /// token key (`access_token` for the stock server).
    pub fn from_body(body: &serde_json::Value, token_field: &str) -> Result<Self, InkpadError> {
        let access_token = body
            .get(token_field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                InkpadError::ProtocolError(format!(
                    "Token response is missing a non-empty '{token_field}' field"
                ))
            })?
            .to_string();

        let refresh_token = body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let token_type = body
            .get("token_type")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(default_token_type);

        Ok(Self {
            access_token,
            refresh_token,
            token_type,
        })
    }
}

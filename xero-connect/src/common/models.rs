use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome marker of the "authorize" collaborator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizeStatus {
    Success,
    Error,
}

/// Grant payload produced by a code or refresh-token exchange.
///
/// Every field is optional on the wire; the coordinator decides which
/// absences are fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenData {
    /// The access token, if present and non-empty
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Envelope returned by the "authorize" collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub status: AuthorizeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_data: Option<TokenData>,
}

impl AuthorizeResponse {
    pub fn success(token_data: TokenData) -> Self {
        Self {
            status: AuthorizeStatus::Success,
            message: Some("Authorization successful! Connection established with Xero.".into()),
            token_data: Some(token_data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AuthorizeStatus::Error,
            message: Some(message.into()),
            token_data: None,
        }
    }
}

/// Connection status derived from the stored credential, for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

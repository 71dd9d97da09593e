use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::common::ConnectionStatus;

/// Scope requested when the document does not name one
pub const DEFAULT_SCOPE: &str =
    "openid profile email accounting.transactions offline_access accounting.contacts";

const EXPIRY_BUFFER: Duration = Duration::minutes(5);

/// The persisted "Xero Settings" document.
///
/// Configuration fields are edited by the operator; `code` and `state` are
/// flow bookkeeping; the credential is written only by the flow
/// coordinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XeroSettings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(flatten)]
    pub credential: StoredCredential,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub enable: bool,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl XeroSettings {
    pub fn client_id(&self) -> Option<&str> {
        non_empty(&self.client_id)
    }

    pub fn client_secret(&self) -> Option<&str> {
        non_empty(&self.client_secret)
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        non_empty(&self.redirect_uri)
    }

    pub fn state(&self) -> Option<&str> {
        non_empty(&self.state)
    }

    pub fn code(&self) -> Option<&str> {
        non_empty(&self.code)
    }

    /// Requested scope, falling back to [`DEFAULT_SCOPE`]
    pub fn scope_or_default(&self) -> &str {
        non_empty(&self.scope).unwrap_or(DEFAULT_SCOPE)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.credential.status()
    }
}

impl StoredCredential {
    pub fn access_token(&self) -> Option<&str> {
        non_empty(&self.access_token)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        non_empty(&self.refresh_token)
    }

    /// Whether the access token expires within the refresh buffer.
    ///
    /// A credential without a recorded expiry is never considered stale.
    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at
            .map(|expires_at| expires_at <= now + EXPIRY_BUFFER)
            .unwrap_or(false)
    }

    pub fn status(&self) -> ConnectionStatus {
        let connected = self.access_token().is_some();
        ConnectionStatus {
            connected,
            label: if connected { "Connected" } else { "Not Connected" }.to_string(),
            tenant_name: self.tenant_name.clone(),
            expires_at: self.token_expires_at,
        }
    }
}

use std::fmt;
use thiserror::Error;

use crate::error::SettingsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    ClientId,
    RedirectUri,
    AuthorizationEndpoint,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientId => f.write_str("Client ID"),
            Self::RedirectUri => f.write_str("Redirect URI"),
            Self::AuthorizationEndpoint => f.write_str("authorization endpoint"),
        }
    }
}

/// Terminal outcomes of an authorization attempt. The display text is
/// what the user sees.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Please enter the {0} before authorizing.")]
    MissingConfiguration(ConfigField),

    #[error("The {0} is not valid: {1}")]
    InvalidConfiguration(ConfigField, String),

    #[error("Network error during authorization. Please try again.")]
    NetworkFailure(String),

    #[error("Authorization response does not belong to this session. Please try again.")]
    StateMismatch,

    #[error("Authorization failed: No token data received from Xero{}", detail_suffix(.0))]
    IncompleteGrant(Option<String>),

    #[error("Authorization failed: No access token received from Xero")]
    MissingAccessToken,

    #[error("Authorization failed: The access token received from Xero has already expired. Please try again.")]
    ExpiredGrant,

    #[error("Failed to load Xero Settings: {0}")]
    LoadFailure(#[source] SettingsError),

    #[error("Failed to save Xero Settings: {0}")]
    SaveFailure(#[source] SettingsError),

    #[error("An authorization is already in progress")]
    AuthorizationInProgress,

    #[error("Xero is not connected. Please authorize the application first.")]
    NotConnected,
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!(" ({})", detail),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            FlowError::MissingConfiguration(ConfigField::ClientId).to_string(),
            "Please enter the Client ID before authorizing."
        );
        assert_eq!(
            FlowError::IncompleteGrant(None).to_string(),
            "Authorization failed: No token data received from Xero"
        );
        assert_eq!(
            FlowError::IncompleteGrant(Some("code expired".into())).to_string(),
            "Authorization failed: No token data received from Xero (code expired)"
        );
        assert_eq!(
            FlowError::MissingAccessToken.to_string(),
            "Authorization failed: No access token received from Xero"
        );
        assert_eq!(
            FlowError::ExpiredGrant.to_string(),
            "Authorization failed: The access token received from Xero has already expired. Please try again."
        );
    }
}

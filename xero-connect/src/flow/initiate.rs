use oauth2::{basic::BasicClient, AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use rand::Rng;
use serde::Serialize;

use super::error::{ConfigField, FlowError};

pub const XERO_AUTH_URL: &str = "https://login.xero.com/identity/connect/authorize";

/// Size of the browsing context the consent screen is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowFeatures {
    pub width: u32,
    pub height: u32,
    pub scrollbars: bool,
    pub resizable: bool,
}

impl WindowFeatures {
    pub fn consent_screen() -> Self {
        Self {
            width: 600,
            height: 700,
            scrollbars: true,
            resizable: true,
        }
    }

    /// Feature string in the form `window.open` accepts
    pub fn to_feature_string(&self) -> String {
        let flag = |on: bool| if on { "yes" } else { "no" };
        format!(
            "width={},height={},scrollbars={},resizable={}",
            self.width,
            self.height,
            flag(self.scrollbars),
            flag(self.resizable)
        )
    }
}

/// What the host needs to send the user to the consent screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub state: String,
    pub window: WindowFeatures,
    pub window_features: String,
}

/// Build the consent-screen URL. `scope` is whitespace separated.
pub fn build_authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: &str,
) -> Result<String, FlowError> {
    let auth_url = AuthUrl::new(auth_url.to_string()).map_err(|e| {
        FlowError::InvalidConfiguration(ConfigField::AuthorizationEndpoint, e.to_string())
    })?;

    let redirect_url = RedirectUrl::new(redirect_uri.to_string())
        .map_err(|e| FlowError::InvalidConfiguration(ConfigField::RedirectUri, e.to_string()))?;

    let csrf_token = CsrfToken::new(state.to_string());
    let (url, _) = BasicClient::new(ClientId::new(client_id.to_string()))
        .set_auth_uri(auth_url)
        .set_redirect_uri(redirect_url)
        .authorize_url(|| csrf_token)
        .add_scopes(scope.split_whitespace().map(|s| Scope::new(s.to_string())))
        .url();

    Ok(url.to_string())
}

/// Generate a random CSRF state nonce
pub fn generate_state_token() -> String {
    use base64::Engine;
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
    base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(&random_bytes)
}

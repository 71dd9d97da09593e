use oauth2::basic::BasicErrorResponseType;
use secrecy::SecretString;
use std::sync::Arc;
use xero_api::endpoints::connections::Connection;
use xero_api::{Client as XeroClient, Request as XeroRequest};

use super::oauth_client::{OAuthClient, TokenExchangeError, TokenGrant};
use crate::common::{AuthorizeResponse, TokenData};
use crate::flow::{AuthorizationSession, Authorizer, RemoteCallError};
use crate::server::config::XeroConfiguration;
use crate::settings::{SettingsStore, XeroSettings};

/// The "authorize" collaborator backed by Xero's identity endpoints.
///
/// Client credentials are read from the settings document on every call
/// so that edits take effect without a restart. Upstream rejections come
/// back as `status: error` envelopes; only an unreachable token endpoint
/// is reported as a transport failure.
pub struct XeroAuthorizer<S> {
    store: Arc<S>,
    token_url: String,
    api_url: String,
}

impl<S: SettingsStore> XeroAuthorizer<S> {
    pub fn new(store: Arc<S>, config: &XeroConfiguration) -> Self {
        Self {
            store,
            token_url: config.token_url.clone(),
            api_url: config.api_url.clone(),
        }
    }

    async fn client(&self) -> Result<Result<(OAuthClient, XeroSettings), String>, RemoteCallError> {
        let settings = self
            .store
            .load()
            .await
            .map_err(|e| RemoteCallError(e.to_string()))?;

        let (Some(client_id), Some(client_secret)) =
            (settings.client_id(), settings.client_secret())
        else {
            return Ok(Err(
                "Client ID or Client Secret is missing in Xero Settings.".to_string()
            ));
        };
        let Some(redirect_uri) = settings.redirect_uri() else {
            return Ok(Err("Redirect URI is missing in Xero Settings.".to_string()));
        };

        let client = match OAuthClient::new(client_id, client_secret, redirect_uri, &self.token_url)
        {
            Ok(client) => client,
            Err(e) => return Ok(Err(e.to_string())),
        };
        Ok(Ok((client, settings)))
    }

    /// First tenant connected to the access token, if any
    async fn primary_tenant(&self, access_token: &str) -> Option<Connection> {
        let client =
            XeroClient::with_base_url(&self.api_url, &SecretString::from(access_token.to_string()));

        match client.send(XeroRequest::connections().list()).await {
            Ok(connections) => {
                if connections.is_empty() {
                    tracing::warn!("No tenant connections available");
                }
                connections.into_iter().next()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to get tenant info");
                None
            }
        }
    }
}

impl<S: SettingsStore> Authorizer for XeroAuthorizer<S> {
    async fn authorize(
        &self,
        session: &AuthorizationSession,
    ) -> Result<AuthorizeResponse, RemoteCallError> {
        let (client, _) = match self.client().await? {
            Ok(client) => client,
            Err(message) => return Ok(AuthorizeResponse::error(message)),
        };

        let grant = match client.exchange_code_for_token(&session.code).await {
            Ok(grant) => grant,
            Err(TokenExchangeError::Transport(e)) => return Err(RemoteCallError(e)),
            Err(e) => {
                tracing::warn!(error = %e, "Token exchange failed");
                return Ok(AuthorizeResponse::error(describe_exchange_error(&e)));
            }
        };

        let Some(tenant) = self.primary_tenant(&grant.access_token).await else {
            return Ok(AuthorizeResponse::error(
                "Failed to get tenant information from Xero",
            ));
        };

        tracing::info!(tenant_id = %tenant.tenant_id, "Resolved Xero tenant");
        Ok(AuthorizeResponse::success(token_data(
            grant,
            Some(tenant.tenant_id.to_string()),
            tenant.tenant_name,
        )))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthorizeResponse, RemoteCallError> {
        let (client, settings) = match self.client().await? {
            Ok(client) => client,
            Err(message) => return Ok(AuthorizeResponse::error(message)),
        };

        let grant = match client.refresh_access_token(refresh_token).await {
            Ok(grant) => grant,
            Err(TokenExchangeError::Transport(e)) => return Err(RemoteCallError(e)),
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                return Ok(AuthorizeResponse::error(describe_exchange_error(&e)));
            }
        };

        // A refresh keeps the tenant chosen at authorization time
        let credential = settings.credential;
        Ok(AuthorizeResponse::success(token_data(
            grant,
            credential.tenant_id,
            credential.tenant_name,
        )))
    }
}

fn token_data(grant: TokenGrant, tenant_id: Option<String>, tenant_name: Option<String>) -> TokenData {
    TokenData {
        access_token: Some(grant.access_token),
        refresh_token: grant.refresh_token,
        scope: grant.scope,
        tenant_id,
        tenant_name,
        expires_at: Some(grant.expires_at),
    }
}

/// User-facing explanation of a failed token request
fn describe_exchange_error(err: &TokenExchangeError) -> String {
    match err {
        TokenExchangeError::Rejected { error, description } => match error {
            BasicErrorResponseType::InvalidGrant => "Authorization code has expired or already been used. Please click 'Authorize' to get a new authorization code.".to_string(),
            BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient => {
                "Invalid Client ID or Client Secret. Please check your Xero app credentials."
                    .to_string()
            }
            BasicErrorResponseType::InvalidRequest => {
                "Invalid authorization request. Please check your Client ID and Client Secret, then try authorizing again.".to_string()
            }
            other => format!(
                "Authorization error: {}. Please try authorizing again.",
                description.as_deref().unwrap_or(other.as_ref())
            ),
        },
        TokenExchangeError::Unavailable(status) if status.as_u16() == 429 => {
            "Rate limit exceeded - Please try again later".to_string()
        }
        TokenExchangeError::Unavailable(status) => format!(
            "Xero server error ({}) - Please try again later",
            status.as_u16()
        ),
        other => format!("Authorization error: {}. Please try authorizing again.", other),
    }
}

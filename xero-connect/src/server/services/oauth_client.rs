use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicTokenResponse},
    AuthorizationCode, ClientId, ClientSecret, HttpRequest, HttpResponse, RedirectUrl,
    RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Throttled or failing upstream; the body is not an OAuth error document
    #[error("token endpoint unavailable ({0})")]
    Unavailable(StatusCode),
}

// Simple async HTTP client for OAuth2
async fn http_client(request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let mut builder = client
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(HttpClientError::Unavailable(status));
    }
    let body = response.bytes().await?.to_vec();

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;

    Ok(http_response)
}

/// Token lifetime Xero documents when `expires_in` is omitted
const DEFAULT_EXPIRES_IN: Duration = Duration::minutes(30);

#[derive(Debug, Error)]
pub enum TokenExchangeError {
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    #[error("Could not reach the token endpoint: {0}")]
    Transport(String),

    #[error("Token endpoint unavailable: {0}")]
    Unavailable(StatusCode),

    #[error("Token endpoint rejected the request: {error}")]
    Rejected {
        error: BasicErrorResponseType,
        description: Option<String>,
    },

    #[error("Unexpected token response: {0}")]
    InvalidResponse(String),
}

impl From<RequestTokenError<HttpClientError, BasicErrorResponse>> for TokenExchangeError {
    fn from(err: RequestTokenError<HttpClientError, BasicErrorResponse>) -> Self {
        match err {
            RequestTokenError::ServerResponse(response) => TokenExchangeError::Rejected {
                error: response.error().clone(),
                description: response.error_description().cloned(),
            },
            RequestTokenError::Request(HttpClientError::Unavailable(status)) => {
                TokenExchangeError::Unavailable(status)
            }
            RequestTokenError::Request(e) => TokenExchangeError::Transport(e.to_string()),
            RequestTokenError::Parse(e, _) => TokenExchangeError::InvalidResponse(e.to_string()),
            RequestTokenError::Other(msg) => TokenExchangeError::InvalidResponse(msg),
        }
    }
}

/// Tokens issued by the Xero identity server
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
}

pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
}

impl OAuthClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        token_url: &str,
    ) -> Result<Self, TokenExchangeError> {
        let token_url = TokenUrl::new(token_url.to_string()).map_err(|e| {
            TokenExchangeError::Configuration(format!("Invalid token URL: {}", e))
        })?;

        let redirect_url = RedirectUrl::new(redirect_uri.to_string()).map_err(|e| {
            TokenExchangeError::Configuration(format!("Invalid redirect URI: {}", e))
        })?;

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url,
            redirect_url,
        })
    }

    /// Exchange authorization code for access and refresh tokens
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenGrant, TokenExchangeError> {
        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&http_client)
            .await?;

        let grant = Self::grant_from(&token_result);
        tracing::debug!(
            "Successfully exchanged code for tokens, expires_at: {}",
            grant.expires_at
        );
        Ok(grant)
    }

    /// Refresh an expired access token using a refresh token
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenGrant, TokenExchangeError> {
        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await?;

        let grant = Self::grant_from(&token_result);
        tracing::debug!("Successfully refreshed tokens, expires_at: {}", grant.expires_at);
        Ok(grant)
    }

    fn grant_from(token_result: &BasicTokenResponse) -> TokenGrant {
        let expires_in = token_result
            .expires_in()
            .and_then(|d| Duration::from_std(d).ok())
            .unwrap_or(DEFAULT_EXPIRES_IN);

        TokenGrant {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string()),
            scope: token_result.scopes().map(|scopes| {
                scopes
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            expires_at: Utc::now() + expires_in,
        }
    }
}

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use super::AuthorizationSession;
use crate::common::{AuthorizeResponse, TokenData};

/// Transport-level failure of a collaborator call
#[derive(Debug, Clone, Error)]
#[error("Remote call failed: {0}")]
pub struct RemoteCallError(pub String);

/// The "authorize" collaborator.
///
/// Implementations read client credentials from the persisted settings
/// document; the session only carries what arrived on the redirect.
pub trait Authorizer: Send + Sync {
    fn authorize(
        &self,
        session: &AuthorizationSession,
    ) -> impl Future<Output = Result<AuthorizeResponse, RemoteCallError>> + Send;

    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<AuthorizeResponse, RemoteCallError>> + Send;
}

impl<T: Authorizer> Authorizer for Arc<T> {
    async fn authorize(
        &self,
        session: &AuthorizationSession,
    ) -> Result<AuthorizeResponse, RemoteCallError> {
        self.as_ref().authorize(session).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthorizeResponse, RemoteCallError> {
        self.as_ref().refresh(refresh_token).await
    }
}

/// Classification of a collaborator answer
pub(crate) enum Grant {
    Usable(TokenData),
    Incomplete(Option<String>),
    MissingAccessToken,
}

impl Grant {
    pub(crate) fn classify(response: AuthorizeResponse) -> Self {
        use crate::common::AuthorizeStatus;

        match (response.status, response.token_data) {
            (AuthorizeStatus::Success, Some(token_data)) if token_data.access_token().is_some() => {
                Grant::Usable(token_data)
            }
            (AuthorizeStatus::Success, Some(_)) => Grant::MissingAccessToken,
            (AuthorizeStatus::Success, None) => Grant::Incomplete(None),
            (AuthorizeStatus::Error, _) => Grant::Incomplete(response.message),
        }
    }
}

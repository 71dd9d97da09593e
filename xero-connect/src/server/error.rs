use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::flow::FlowError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("OAuth error: {0}")]
    OAuthError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServerError::OAuthError(msg) => (StatusCode::BAD_GATEWAY, msg),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<FlowError> for ServerError {
    fn from(err: FlowError) -> Self {
        let message = err.to_string();
        match err {
            FlowError::MissingConfiguration(_)
            | FlowError::InvalidConfiguration(..)
            | FlowError::NotConnected => ServerError::BadRequest(message),
            FlowError::AuthorizationInProgress => ServerError::Conflict(message),
            FlowError::NetworkFailure(_)
            | FlowError::StateMismatch
            | FlowError::IncompleteGrant(_)
            | FlowError::MissingAccessToken
            | FlowError::ExpiredGrant => ServerError::OAuthError(message),
            FlowError::LoadFailure(_) | FlowError::SaveFailure(_) => ServerError::Internal(message),
        }
    }
}

impl From<crate::error::SettingsError> for ServerError {
    fn from(err: crate::error::SettingsError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

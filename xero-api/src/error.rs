use serde::{Deserialize, Serialize};
use tower_api_client::{Error as ApiError, StatusCode};

#[derive(Debug)]
pub enum XeroApiError {
    Xero(StatusCode, ErrorDetail),
    Internal(ApiError),
}

impl XeroApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            XeroApiError::Xero(status, _) => Some(*status),
            XeroApiError::Internal(_) => None,
        }
    }
}

impl From<ApiError> for XeroApiError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::ClientError(status, body) | ApiError::ServerError(status, body) => {
                // Identity endpoints answer with RFC 7807 problem documents, but
                // gateways in front of them sometimes return plain text.
                let detail = serde_json::from_str::<ErrorDetail>(&body).unwrap_or(ErrorDetail {
                    title: status.canonical_reason().unwrap_or("Error").to_string(),
                    detail: body,
                });
                XeroApiError::Xero(status, detail)
            }
            e => XeroApiError::Internal(e),
        }
    }
}

impl std::fmt::Display for XeroApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XeroApiError::Internal(e) => write!(f, "Internal error: {}", e),
            XeroApiError::Xero(status, detail) => {
                write!(f, "({}) {}: {}", status, detail.title, detail.detail)
            }
        }
    }
}

impl std::error::Error for XeroApiError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDetail {
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

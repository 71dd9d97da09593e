use serde::{Deserialize, Serialize};

use crate::common::ConnectionStatus;
use crate::flow::Notification;

// GET /settings
#[derive(Debug, Default, Deserialize)]
pub struct ConsentErrorParams {
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl ConsentErrorParams {
    /// Message shown when the consent screen redirects back with an error
    pub fn message(&self) -> Option<String> {
        let error = self.error.as_deref().filter(|e| !e.is_empty())?;
        Some(match self.error_description.as_deref() {
            Some(description) if !description.is_empty() => {
                format!("Authorization was not completed: {} ({})", description, error)
            }
            _ => format!("Authorization was not completed: {}", error),
        })
    }
}

// GET /api/status, POST /api/refresh
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: ConnectionStatus,
    pub notifications: Vec<Notification>,
}

// Health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

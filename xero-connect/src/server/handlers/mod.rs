mod initiate;
mod refresh;
mod settings;

pub use initiate::authorize;
pub use refresh::refresh_credential;
pub use settings::settings_view;

use axum::{extract::State, Json};

use crate::server::{
    error::ServerError,
    models::{HealthResponse, StatusResponse},
    AppState,
};

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn connection_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ServerError> {
    // Refresh failures are reported through the notifications below
    let status = match state.coordinator.ensure_fresh_credential().await {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!(error = %e, "Could not refresh credential for status");
            state.coordinator.connection_status().await?
        }
    };

    Ok(Json(StatusResponse {
        status,
        notifications: state.notifications.drain(),
    }))
}

use axum::{extract::State, Json};

use crate::server::{error::ServerError, models::StatusResponse, AppState};

pub async fn refresh_credential(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ServerError> {
    tracing::debug!("Credential refresh requested");

    let result = state.coordinator.refresh_credential().await;
    // The response carries the outcome; nothing stays queued for the next page render
    let notifications = state.notifications.drain();
    let status = result?;

    tracing::info!("Credential refresh successful");

    Ok(Json(StatusResponse {
        status,
        notifications,
    }))
}

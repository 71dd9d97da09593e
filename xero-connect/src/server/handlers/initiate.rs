use axum::{extract::State, Json};
use tracing::Instrument;

use crate::flow::AuthorizationRequest;
use crate::server::{error::ServerError, AppState};

/// Authorize button: hands back where to send the user
pub async fn authorize(
    State(state): State<AppState>,
) -> Result<Json<AuthorizationRequest>, ServerError> {
    let request = state
        .coordinator
        .begin_authorization()
        .instrument(tracing::info_span!("begin_authorization"))
        .await?;

    tracing::info!(state_len = request.state.len(), "Initiated authorization");

    Ok(Json(request))
}

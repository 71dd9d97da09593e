pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Configuration;
pub use error::ServerError;

use axum::{
    routing::{get, post},
    Router,
};
use services::XeroAuthorizer;
use std::sync::Arc;
use url::Url;

use crate::flow::{AuthorizationFlowCoordinator, NotificationCenter};
use crate::settings::FileSettingsStore;

pub type Coordinator = AuthorizationFlowCoordinator<
    XeroAuthorizer<FileSettingsStore>,
    FileSettingsStore,
    NotificationCenter,
>;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub notifications: Arc<NotificationCenter>,
    /// Origin the settings view is served from, as seen by the browser
    pub public_url: Url,
}

/// Build the settings service router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/settings", get(handlers::settings_view))
        .route("/settings/authorize", post(handlers::authorize))
        .route("/api/status", get(handlers::connection_status))
        .route("/api/refresh", post(handlers::refresh_credential))
        .with_state(state)
}

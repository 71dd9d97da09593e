use anyhow::Result;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use xero_connect::{
    flow::{AuthorizationFlowCoordinator, NotificationCenter},
    server::{app, config::Configuration, services::XeroAuthorizer, AppState},
    FileSettingsStore, SettingsStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    // Load configuration
    let configuration = Configuration::new()?;
    configuration.validate().map_err(anyhow::Error::msg)?;
    tracing::info!("Configuration loaded successfully");

    // Settings document, seeded from configuration on first run
    let settings_path = match &configuration.server.settings_path {
        Some(path) => path.clone(),
        None => FileSettingsStore::default_path()?,
    };
    let store = Arc::new(FileSettingsStore::new(settings_path));
    let mut settings = store.load().await?;
    if configuration.xero.seed(&mut settings) {
        store.save(&settings).await?;
        tracing::info!(path = %store.path().display(), "Seeded settings from configuration");
    }

    // Initialize services
    let notifications = Arc::new(NotificationCenter::new());
    let authorizer = XeroAuthorizer::new(store.clone(), &configuration.xero);
    let coordinator = AuthorizationFlowCoordinator::new(authorizer, store, notifications.clone())
        .with_auth_url(configuration.xero.auth_url.clone());

    let public_url = Url::parse(&configuration.server.public_url)?;
    let app_state = AppState {
        coordinator: Arc::new(coordinator),
        notifications,
        public_url: public_url.clone(),
    };

    // Build router
    let app = app(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(64 * 1024)),
    );

    // Start server
    let addr = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if configuration.server.open_browser {
        let settings_url = public_url.join("/settings")?;
        if let Err(e) = open::that(settings_url.as_str()) {
            tracing::warn!(error = %e, "Failed to open browser");
        }
    }

    axum::serve(listener, app).await?;

    Ok(())
}

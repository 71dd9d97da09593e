use serde::Deserialize;
use std::path::PathBuf;

use crate::flow::XERO_AUTH_URL;
use crate::settings::XeroSettings;

pub const XERO_TOKEN_URL: &str = "https://identity.xero.com/connect/token";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfiguration,
    #[serde(default)]
    pub xero: XeroConfiguration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfiguration {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible origin of this service, used to rebuild view addresses
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Defaults to `<data dir>/xero-connect/settings.json`
    #[serde(default)]
    pub settings_path: Option<PathBuf>,

    /// Open the settings page in the local browser after startup
    #[serde(default)]
    pub open_browser: bool,
}

/// Seed values for the settings document plus Xero endpoints
#[derive(Debug, Deserialize, Clone)]
pub struct XeroConfiguration {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_auth_url() -> String {
    XERO_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    XERO_TOKEN_URL.to_string()
}

fn default_api_url() -> String {
    xero_api::BASE_URL.to_string()
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            settings_path: None,
            open_browser: false,
        }
    }
}

impl Default for XeroConfiguration {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            scope: None,
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            api_url: default_api_url(),
        }
    }
}

impl Configuration {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(config::File::with_name("config"));
        }

        builder =
            builder.add_source(config::Environment::with_prefix("XERO_CONNECT").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.server.public_url.starts_with("http") {
            return Err("server.public_url must be a valid HTTP(S) URL".to_string());
        }
        if let Some(redirect_uri) = &self.xero.redirect_uri {
            if !redirect_uri.starts_with("http") {
                return Err("xero.redirect_uri must be a valid HTTP(S) URL".to_string());
            }
        }
        Ok(())
    }
}

impl XeroConfiguration {
    /// Fill document fields the operator has not set yet.
    ///
    /// Returns whether anything changed; values already on the document win.
    pub fn seed(&self, settings: &mut XeroSettings) -> bool {
        let mut changed = false;
        for (field, value) in [
            (&mut settings.client_id, &self.client_id),
            (&mut settings.client_secret, &self.client_secret),
            (&mut settings.redirect_uri, &self.redirect_uri),
            (&mut settings.scope, &self.scope),
        ] {
            let unset = field.as_deref().map(str::trim).unwrap_or_default().is_empty();
            if unset && value.is_some() {
                *field = value.clone();
                changed = true;
            }
        }
        changed
    }
}

use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::XeroSettings;
use crate::error::SettingsError;

/// Persistence for the single settings document
pub trait SettingsStore: Send + Sync {
    /// Load the document; a store that has never been saved yields the default document
    fn load(&self) -> impl Future<Output = Result<XeroSettings, SettingsError>> + Send;

    /// Full save of the document
    fn save(&self, settings: &XeroSettings)
        -> impl Future<Output = Result<(), SettingsError>> + Send;
}

/// Stores the document as JSON on disk, readable by the owner only
pub struct FileSettingsStore {
    settings_path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
        }
    }

    /// `<data dir>/xero-connect/settings.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            SettingsError::Configuration("Could not find data directory".to_string())
        })?;
        Ok(data_dir.join("xero-connect").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }
}

impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<XeroSettings, SettingsError> {
        if !fs::try_exists(&self.settings_path).await? {
            return Ok(XeroSettings::default());
        }

        let json = fs::read_to_string(&self.settings_path).await.map_err(|e| {
            SettingsError::Storage(format!("Failed to read settings: {}", e))
        })?;

        Ok(serde_json::from_str(&json)?)
    }

    async fn save(&self, settings: &XeroSettings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SettingsError::Storage(format!("Failed to create settings directory: {}", e))
            })?;
        }

        fs::write(&self.settings_path, json)
            .await
            .map_err(|e| SettingsError::Storage(format!("Failed to save settings: {}", e)))?;

        // Tokens and the client secret live in this file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.settings_path)
                .await
                .map_err(|e| {
                    SettingsError::Storage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.settings_path, perms)
                .await
                .map_err(|e| {
                    SettingsError::Storage(format!("Failed to set file permissions: {}", e))
                })?;
        }

        tracing::debug!(path = %self.settings_path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_default_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));

        let settings = store.load().await.unwrap();
        assert_eq!(settings, XeroSettings::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("nested").join("settings.json"));

        let mut settings = XeroSettings::default();
        settings.client_id = Some("client".into());
        settings.credential.access_token = Some("at".into());
        settings.credential.enable = true;
        store.save(&settings).await.unwrap();

        assert_eq!(store.load().await.unwrap(), settings);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        store.save(&XeroSettings::default()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

mod document;
mod store;

pub use document::{StoredCredential, XeroSettings, DEFAULT_SCOPE};
pub use store::{FileSettingsStore, SettingsStore};

// Wire models shared between the coordinator and the server
pub mod common;

// Authorization flow and settings persistence (public API for hosts)
pub mod flow;
pub mod settings;
mod error;

pub use common::{AuthorizeResponse, AuthorizeStatus, ConnectionStatus, TokenData};
pub use error::SettingsError;
pub use flow::{Activation, AuthorizationFlowCoordinator, Authorizer, FlowError, Notifier};
pub use settings::{FileSettingsStore, SettingsStore, StoredCredential, XeroSettings};

// In-memory collaborators for tests
pub mod testing;

// Server modules (public for binary, internal for library)
#[cfg(feature = "server")]
pub mod server;

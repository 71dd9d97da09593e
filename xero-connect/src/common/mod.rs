mod models;

pub use models::{AuthorizeResponse, AuthorizeStatus, ConnectionStatus, TokenData};

pub mod authorizer;
pub mod oauth_client;

pub use authorizer::XeroAuthorizer;
pub use oauth_client::{OAuthClient, TokenExchangeError, TokenGrant};

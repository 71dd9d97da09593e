mod authorizer;
mod coordinator;
mod error;
mod initiate;
mod notify;
mod session;

pub use authorizer::{Authorizer, RemoteCallError};
pub use coordinator::{Activation, AuthorizationFlowCoordinator, Completion};
pub use error::{ConfigField, FlowError};
pub use initiate::{
    build_authorization_url, generate_state_token, AuthorizationRequest, WindowFeatures,
    XERO_AUTH_URL,
};
pub use notify::{Indicator, Notification, NotificationCenter, Notifier};
pub use session::{strip_callback_params, AuthorizationSession, FlowState, CALLBACK_PARAMS};
pub(crate) use session::strip_params;

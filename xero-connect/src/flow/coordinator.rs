use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Instrument;
use url::Url;

use super::authorizer::{Authorizer, Grant};
use super::error::{ConfigField, FlowError};
use super::initiate::{
    build_authorization_url, generate_state_token, AuthorizationRequest, WindowFeatures,
    XERO_AUTH_URL,
};
use super::notify::{Notification, Notifier};
use super::session::{strip_callback_params, AuthorizationSession, FlowState};
use crate::common::{ConnectionStatus, TokenData};
use crate::settings::{SettingsStore, XeroSettings};

/// Result of handing a view activation to the coordinator
#[derive(Debug)]
pub enum Activation {
    /// No authorization code on the address
    Idle,
    /// The code on the address has already been exchanged
    AlreadyProcessed,
    /// Another exchange is running; this activation was ignored
    Busy,
    Completed(Completion),
}

#[derive(Debug)]
pub struct Completion {
    pub outcome: Result<(), FlowError>,
    /// The view address with the one-time callback parameters removed
    pub address: Url,
    /// Connection status re-read after the document was persisted
    pub status: ConnectionStatus,
}

/// Drives the authorization-code flow for one settings document.
///
/// The coordinator is the only writer of the stored credential. At most
/// one exchange or refresh runs at a time; overlapping activations are
/// no-ops rather than queued.
pub struct AuthorizationFlowCoordinator<A, S, N> {
    authorizer: A,
    store: Arc<S>,
    notifier: Arc<N>,
    auth_url: String,
    state: Mutex<FlowState>,
}

impl<A, S, N> AuthorizationFlowCoordinator<A, S, N>
where
    A: Authorizer,
    S: SettingsStore,
    N: Notifier,
{
    pub fn new(authorizer: A, store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            authorizer,
            store,
            notifier,
            auth_url: XERO_AUTH_URL.to_string(),
            state: Mutex::new(FlowState::Idle),
        }
    }

    /// Override the consent-screen endpoint
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn flow_state(&self) -> FlowState {
        self.lock_state().clone()
    }

    pub fn notifier(&self) -> &Arc<N> {
        &self.notifier
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Called whenever the hosting view becomes active with its current address.
    pub async fn on_view_activated(&self, address: &Url) -> Activation {
        let Some(session) = AuthorizationSession::from_address(address) else {
            return Activation::Idle;
        };

        if let Some(skipped) = self.try_begin_exchange(&session.code) {
            tracing::debug!(activation = ?skipped, "Ignoring authorization code");
            return skipped;
        }

        let span = tracing::info_span!("authorization", code_len = session.code.len());
        self.run_exchange(session, address).instrument(span).await
    }

    async fn run_exchange(&self, session: AuthorizationSession, address: &Url) -> Activation {
        let mut settings = match self.store.load().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load settings before exchange");
                let error = FlowError::LoadFailure(e);
                self.notifier.notify(Notification::failure(error.to_string()));
                self.finish_exchange(&session.code);
                return Activation::Completed(Completion {
                    outcome: Err(error),
                    address: strip_callback_params(address),
                    status: XeroSettings::default().connection_status(),
                });
            }
        };

        if settings.code() == Some(session.code.as_str()) {
            // Exchanged by an earlier view instance
            self.finish_exchange(&session.code);
            return Activation::AlreadyProcessed;
        }

        settings.code = Some(session.code.clone());
        settings.scope = session.scope.clone();

        let outcome = self.exchange(&session, &mut settings).await;
        match &outcome {
            Ok(()) => tracing::info!(
                tenant_id = settings.credential.tenant_id.as_deref().unwrap_or_default(),
                "Authorization code exchanged"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Authorization failed");
                self.notifier.notify(Notification::failure(e.to_string()));
            }
        }

        // Persist even on failure so the consumed code is recorded
        if let Err(e) = self.store.save(&settings).await {
            tracing::error!(error = %e, "Failed to save settings after authorization");
        }

        if outcome.is_ok() {
            self.notifier
                .notify(Notification::success("Authorization Successful!"));
        }

        self.finish_exchange(&session.code);

        let status = match self.store.load().await {
            Ok(reloaded) => reloaded.connection_status(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to re-read settings after authorization");
                settings.connection_status()
            }
        };

        Activation::Completed(Completion {
            outcome,
            address: strip_callback_params(address),
            status,
        })
    }

    async fn exchange(
        &self,
        session: &AuthorizationSession,
        settings: &mut XeroSettings,
    ) -> Result<(), FlowError> {
        if let Some(expected) = settings.state() {
            if session.state.as_deref() != Some(expected) {
                return Err(FlowError::StateMismatch);
            }
        }

        let response = self
            .authorizer
            .authorize(session)
            .await
            .map_err(|e| FlowError::NetworkFailure(e.0))?;

        match Grant::classify(response) {
            Grant::Usable(token_data) => apply_grant(settings, token_data, Utc::now()),
            Grant::Incomplete(detail) => Err(FlowError::IncompleteGrant(detail)),
            Grant::MissingAccessToken => Err(FlowError::MissingAccessToken),
        }
    }

    /// Start the authorization flow: validate configuration, make sure a
    /// state nonce is stored, and build the consent-screen request.
    pub async fn begin_authorization(&self) -> Result<AuthorizationRequest, FlowError> {
        let result = match self.claim(FlowState::Initiating) {
            Ok(previous) => {
                let result = self.prepare_authorization().await;
                *self.lock_state() = previous;
                result
            }
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => self.notifier.notify(Notification::info(
                "Complete the authorization in the opened window",
            )),
            Err(e) => self.notifier.notify(Notification::failure(e.to_string())),
        }
        result
    }

    async fn prepare_authorization(&self) -> Result<AuthorizationRequest, FlowError> {
        let mut settings = self.store.load().await.map_err(FlowError::LoadFailure)?;

        let client_id = settings
            .client_id()
            .ok_or(FlowError::MissingConfiguration(ConfigField::ClientId))?
            .to_string();
        let redirect_uri = settings
            .redirect_uri()
            .ok_or(FlowError::MissingConfiguration(ConfigField::RedirectUri))?
            .to_string();

        let state = match settings.state() {
            Some(state) => state.to_string(),
            None => {
                let state = generate_state_token();
                settings.state = Some(state.clone());
                self.store
                    .save(&settings)
                    .await
                    .map_err(FlowError::SaveFailure)?;
                tracing::debug!("Generated new state nonce");
                state
            }
        };

        let authorization_url = build_authorization_url(
            &self.auth_url,
            &client_id,
            &redirect_uri,
            settings.scope_or_default(),
            &state,
        )?;

        let window = WindowFeatures::consent_screen();
        tracing::info!("Prepared authorization request");

        Ok(AuthorizationRequest {
            authorization_url,
            state,
            window_features: window.to_feature_string(),
            window,
        })
    }

    /// Exchange the stored refresh token for a new grant.
    pub async fn refresh_credential(&self) -> Result<ConnectionStatus, FlowError> {
        let previous = self.claim(FlowState::Refreshing)?;

        let result = self
            .refresh()
            .instrument(tracing::info_span!("refresh"))
            .await;

        *self.lock_state() = previous;

        match &result {
            Ok(_) => self
                .notifier
                .notify(Notification::success("Xero access token refreshed")),
            Err(e) => self.notifier.notify(Notification::failure(e.to_string())),
        }
        result
    }

    async fn refresh(&self) -> Result<ConnectionStatus, FlowError> {
        let mut settings = self.store.load().await.map_err(FlowError::LoadFailure)?;

        if !settings.credential.enable {
            return Err(FlowError::NotConnected);
        }
        let refresh_token = settings
            .credential
            .refresh_token()
            .ok_or(FlowError::NotConnected)?
            .to_string();

        let response = self
            .authorizer
            .refresh(&refresh_token)
            .await
            .map_err(|e| FlowError::NetworkFailure(e.0))?;

        match Grant::classify(response) {
            Grant::Usable(mut token_data) => {
                // Xero may answer without rotating the refresh token
                if token_data.refresh_token.is_none() {
                    token_data.refresh_token = Some(refresh_token);
                }
                apply_grant(&mut settings, token_data, Utc::now())?
            }
            Grant::Incomplete(detail) => return Err(FlowError::IncompleteGrant(detail)),
            Grant::MissingAccessToken => return Err(FlowError::MissingAccessToken),
        }

        self.store
            .save(&settings)
            .await
            .map_err(FlowError::SaveFailure)?;

        tracing::info!(expires_at = ?settings.credential.token_expires_at, "Credential refreshed");
        Ok(settings.connection_status())
    }

    /// Refresh only when the access token is about to expire
    pub async fn ensure_fresh_credential(&self) -> Result<ConnectionStatus, FlowError> {
        let settings = self.store.load().await.map_err(FlowError::LoadFailure)?;
        if settings.credential.enable && settings.credential.expires_soon(Utc::now()) {
            tracing::debug!("Access token expires soon, refreshing");
            return self.refresh_credential().await;
        }
        Ok(settings.connection_status())
    }

    pub async fn connection_status(&self) -> Result<ConnectionStatus, FlowError> {
        let settings = self.store.load().await.map_err(FlowError::LoadFailure)?;
        Ok(settings.connection_status())
    }

    /// Claim the guard for `code`, or say why this activation is skipped
    fn try_begin_exchange(&self, code: &str) -> Option<Activation> {
        let mut state = self.lock_state();
        match &*state {
            busy if busy.is_busy() => return Some(Activation::Busy),
            FlowState::Done { code: processed } if processed == code => {
                return Some(Activation::AlreadyProcessed);
            }
            _ => {}
        }
        *state = FlowState::Exchanging {
            code: code.to_string(),
        };
        None
    }

    /// Enter `next` unless another write is in flight; returns the state to restore
    fn claim(&self, next: FlowState) -> Result<FlowState, FlowError> {
        let mut state = self.lock_state();
        if state.is_busy() {
            return Err(FlowError::AuthorizationInProgress);
        }
        Ok(std::mem::replace(&mut *state, next))
    }

    fn finish_exchange(&self, code: &str) {
        *self.lock_state() = FlowState::Done {
            code: code.to_string(),
        };
    }

    fn lock_state(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Copy a usable grant onto the document and mark the integration enabled
fn apply_grant(
    settings: &mut XeroSettings,
    token_data: TokenData,
    now: DateTime<Utc>,
) -> Result<(), FlowError> {
    let access_token = token_data
        .access_token()
        .ok_or(FlowError::MissingAccessToken)?
        .to_string();

    if let Some(expires_at) = token_data.expires_at {
        if expires_at <= now {
            return Err(FlowError::ExpiredGrant);
        }
    }

    let credential = &mut settings.credential;
    credential.access_token = Some(access_token);
    credential.refresh_token = token_data.refresh_token;
    credential.tenant_id = token_data.tenant_id;
    credential.tenant_name = token_data.tenant_name;
    if let Some(expires_at) = token_data.expires_at {
        credential.token_expires_at = Some(expires_at);
    }
    credential.enable = true;

    if token_data.scope.is_some() {
        settings.scope = token_data.scope;
    }
    Ok(())
}

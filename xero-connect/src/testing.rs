use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::common::AuthorizeResponse;
use crate::error::SettingsError;
use crate::flow::{AuthorizationSession, Authorizer, RemoteCallError};
use crate::settings::{SettingsStore, XeroSettings};

/// Settings store backed by memory
///
/// Counts saves and can be told to fail them, to exercise the save-failure
/// paths without touching the filesystem.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<XeroSettings>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new(settings: XeroSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
            ..Default::default()
        }
    }

    /// Current document, bypassing the async interface
    pub fn snapshot(&self) -> XeroSettings {
        self.settings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<XeroSettings, SettingsError> {
        Ok(self.snapshot())
    }

    async fn save(&self, settings: &XeroSettings) -> Result<(), SettingsError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SettingsError::Storage("save rejected".to_string()));
        }
        *self.settings.lock().unwrap_or_else(|e| e.into_inner()) = settings.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Authorizer that replays queued responses
///
/// With a gate installed, each call parks until the test releases it,
/// which keeps an exchange "in flight" for as long as needed.
#[derive(Default)]
pub struct ScriptedAuthorizer {
    responses: Mutex<VecDeque<Result<AuthorizeResponse, RemoteCallError>>>,
    sessions: Mutex<Vec<AuthorizationSession>>,
    refresh_tokens: Mutex<Vec<String>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
    entered: Arc<Notify>,
}

impl ScriptedAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Result<AuthorizeResponse, RemoteCallError>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Notified every time a call reaches the authorizer
    pub fn entered(&self) -> Arc<Notify> {
        self.entered.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> Vec<AuthorizationSession> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn refresh_tokens(&self) -> Vec<String> {
        self.refresh_tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn next_response(&self) -> Result<AuthorizeResponse, RemoteCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(RemoteCallError("no scripted response".to_string())))
    }
}

impl Authorizer for ScriptedAuthorizer {
    async fn authorize(
        &self,
        session: &AuthorizationSession,
    ) -> Result<AuthorizeResponse, RemoteCallError> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(session.clone());
        self.next_response().await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthorizeResponse, RemoteCallError> {
        self.refresh_tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(refresh_token.to_string());
        self.next_response().await
    }
}

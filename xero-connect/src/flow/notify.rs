use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Green,
    Red,
    Blue,
}

/// A transient, user-facing alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub indicator: Indicator,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            indicator: Indicator::Green,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            indicator: Indicator::Red,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            indicator: Indicator::Blue,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Queues notifications until the next render drains them
#[derive(Default)]
pub struct NotificationCenter {
    pending: Mutex<VecDeque<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.drain(..).collect()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        match notification.indicator {
            Indicator::Red => tracing::warn!(message = %notification.message, "Notification"),
            _ => tracing::info!(message = %notification.message, "Notification"),
        }
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(notification);
    }
}

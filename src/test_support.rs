//! Shared mock implementations for the alarm and presenter seams.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::alarm::{AlarmBackend, AlarmToken, NotificationPresenter};
use crate::reminder::ReminderId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Register {
        reminder: ReminderId,
        fire_at: DateTime<Utc>,
        token: AlarmToken,
    },
    Cancel {
        token: AlarmToken,
    },
}

/// Backend that records every call and can be switched into refusing
/// registrations, mimicking a host that denies the alarm permission.
pub struct MockAlarmBackend {
    calls: Arc<Mutex<Vec<BackendCall>>>,
    refusing: Arc<AtomicBool>,
    next_token: AtomicU64,
}

impl MockAlarmBackend {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            refusing: Arc::new(AtomicBool::new(false)),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<BackendCall>>> {
        Arc::clone(&self.calls)
    }

    pub fn refuse(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlarmBackend for MockAlarmBackend {
    async fn register(
        &self,
        fire_at: DateTime<Utc>,
        reminder: ReminderId,
    ) -> anyhow::Result<AlarmToken> {
        if self.refusing.load(Ordering::SeqCst) {
            anyhow::bail!("exact alarm permission denied");
        }
        let token = AlarmToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.calls.lock().unwrap().push(BackendCall::Register {
            reminder,
            fire_at,
            token,
        });
        Ok(token)
    }

    async fn cancel(&self, token: AlarmToken) {
        self.calls.lock().unwrap().push(BackendCall::Cancel { token });
    }
}

type ShownNotifications = Arc<Mutex<Vec<(String, String)>>>;

/// Presenter that records every shown notification.
pub struct RecordingPresenter {
    shown: ShownNotifications,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self {
            shown: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn shown(&self) -> ShownNotifications {
        Arc::clone(&self.shown)
    }
}

#[async_trait]
impl NotificationPresenter for RecordingPresenter {
    async fn show(&self, title: &str, body: &str) {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

//! Seam to the host alarm primitive: one-shot, at-most-once wake-ups that do
//! not survive a restart, plus the notification presenter the fire path talks
//! to. [`TokioAlarmBackend`] is the in-process implementation used by the
//! binary and the timer-driven tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::reminder::ReminderId;

/// Opaque handle for one registered future wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmToken(u64);

impl AlarmToken {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[async_trait]
pub trait AlarmBackend: Send + Sync + 'static {
    /// Registers a single wake-up at `fire_at` carrying `reminder` as payload.
    /// The backend fires at most once per returned token and never repeats.
    async fn register(
        &self,
        fire_at: DateTime<Utc>,
        reminder: ReminderId,
    ) -> anyhow::Result<AlarmToken>;

    /// Cancels a registration. Unknown or already-fired tokens are a no-op.
    async fn cancel(&self, token: AlarmToken);
}

#[async_trait]
pub trait NotificationPresenter: Send + Sync + 'static {
    async fn show(&self, title: &str, body: &str);
}

/// Presenter that writes notifications to the log.
pub struct LogNotificationPresenter;

#[async_trait]
impl NotificationPresenter for LogNotificationPresenter {
    async fn show(&self, title: &str, body: &str) {
        log::info!("[NOTIFICATION] {title}: {body}");
    }
}

struct RegisteredAlarm {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

/// In-process alarm backend: every registration is a spawned task sleeping
/// until its deadline, and fired reminder ids come out of a single mpsc
/// channel consumed by the scheduler's fire loop.
pub struct TokioAlarmBackend {
    fired_tx: mpsc::Sender<ReminderId>,
    alarms: Mutex<HashMap<u64, RegisteredAlarm>>,
    next_token: AtomicU64,
}

impl TokioAlarmBackend {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ReminderId>) {
        let (fired_tx, fired_rx) = mpsc::channel(capacity);
        let backend = Self {
            fired_tx,
            alarms: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        };
        (backend, fired_rx)
    }
}

#[async_trait]
impl AlarmBackend for TokioAlarmBackend {
    async fn register(
        &self,
        fire_at: DateTime<Utc>,
        reminder: ReminderId,
    ) -> anyhow::Result<AlarmToken> {
        // A deadline already in the past fires immediately.
        let delay = (fire_at - Utc::now()).to_std().unwrap_or_default();

        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.child_token();
        let fired_tx = self.fired_tx.clone();
        let raw = self.next_token.fetch_add(1, Ordering::Relaxed);

        log::debug!("Registering alarm {raw} for reminder {reminder} in {delay:?}");
        let task = task::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = fired_tx.send(reminder).await;
                }
            }
        });

        let mut alarms = self.alarms.lock().await;
        alarms.retain(|_, alarm| !alarm.task.is_finished());
        alarms.insert(
            raw,
            RegisteredAlarm {
                task,
                cancellation_token,
            },
        );

        Ok(AlarmToken::new(raw))
    }

    async fn cancel(&self, token: AlarmToken) {
        if let Some(alarm) = self.alarms.lock().await.remove(&token.0) {
            alarm.cancellation_token.cancel();
        }
    }
}

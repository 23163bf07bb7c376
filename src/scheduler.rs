//! Scheduler facade: single owner of the trigger registry. Store mutations
//! call `schedule`/`cancel`, the boot hook bulk-reconciles, and every fire
//! rolls the reminder forward to its next occurrence since the host alarm
//! primitive has no native recurrence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::sync::{Mutex, mpsc};

use crate::alarm::{AlarmBackend, NotificationPresenter};
use crate::occurrence::next_occurrence;
use crate::registry::{SchedulingError, TriggerRegistry};
use crate::reminder::{Reminder, ReminderId};
use crate::storage::ReminderStorage;

pub const NOTIFICATION_TITLE: &str = "Hey, reminder!";

pub struct ReminderScheduler<S, A, P>
where
    S: ReminderStorage,
    A: AlarmBackend,
    P: NotificationPresenter,
{
    storage: Arc<S>,
    presenter: Arc<P>,
    // One lock serializes every registry read-modify-write, so two triggers
    // can never coexist for the same reminder.
    registry: Mutex<TriggerRegistry<A>>,
    timezone: Tz,
}

impl<S, A, P> ReminderScheduler<S, A, P>
where
    S: ReminderStorage,
    A: AlarmBackend,
    P: NotificationPresenter,
{
    pub fn new(storage: Arc<S>, backend: A, presenter: Arc<P>, timezone: Tz) -> Self {
        Self {
            storage,
            presenter,
            registry: Mutex::new(TriggerRegistry::new(backend)),
            timezone,
        }
    }

    /// Binds the reminder to its next occurrence. An edit goes through here
    /// too: a changed occurrence replaces the stale trigger under the same
    /// lock acquisition, so the old and new trigger are never both live.
    /// Safe to call redundantly.
    pub async fn schedule(&self, reminder: &Reminder) -> Result<(), SchedulingError> {
        let occurrence = next_occurrence(reminder, Utc::now(), self.timezone)?;
        let mut registry = self.registry.lock().await;
        registry.set(reminder.id, occurrence).await
    }

    /// Cancels the outstanding trigger, if any. Safe to call redundantly.
    pub async fn cancel(&self, id: ReminderId) {
        self.registry.lock().await.remove(id).await;
    }

    /// Fire path: show the notification and roll the reminder forward. A fire
    /// for an id deleted in the meantime is expected noise, not an error.
    pub async fn handle_fire(&self, id: ReminderId) {
        self.registry.lock().await.mark_fired(id);

        let reminder = match self.storage.get(id).await {
            Ok(Some(reminder)) => reminder,
            Ok(None) => {
                log::warn!("Stale fire for reminder {id}, it no longer exists");
                return;
            }
            Err(err) => {
                log::error!("Could not look up reminder {id} after fire: {err}");
                return;
            }
        };

        self.presenter.show(NOTIFICATION_TITLE, &reminder.label).await;

        if let Err(err) = self.schedule(&reminder).await {
            log::warn!("Could not roll reminder {id} forward: {err}");
        }
    }

    /// Boot hook: the host loses all registered alarms across a restart, so
    /// re-derive the full desired schedule from one store snapshot and
    /// reconcile the registry against it. The only bulk path.
    pub async fn bootstrap(&self) -> Result<(), S::Error> {
        let reminders = self.storage.list().await?;
        log::info!("Reconciling triggers for {} reminders", reminders.len());

        let now = Utc::now();
        let mut desired = HashMap::new();
        for reminder in &reminders {
            match next_occurrence(reminder, now, self.timezone) {
                Ok(occurrence) => {
                    desired.insert(reminder.id, occurrence);
                }
                Err(err) => log::warn!("Skipping reminder {}: {err}", reminder.id),
            }
        }

        let errors = self.registry.lock().await.reconcile(&desired).await;
        for err in errors {
            log::warn!("Boot reconcile: {err}");
        }
        Ok(())
    }

    /// Consumes the alarm backend's fire channel until it closes.
    pub async fn run(&self, mut fired_rx: mpsc::Receiver<ReminderId>) {
        while let Some(id) = fired_rx.recv().await {
            log::info!("Alarm fired for reminder {id}");
            self.handle_fire(id).await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn outstanding_triggers(&self) -> usize {
        self.registry.lock().await.outstanding()
    }

    #[cfg(test)]
    pub(crate) async fn bound_occurrence(
        &self,
        id: ReminderId,
    ) -> Option<chrono::DateTime<Utc>> {
        self.registry
            .lock()
            .await
            .binding(id)
            .map(|binding| binding.occurrence)
    }
}

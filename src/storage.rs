//! Reminder store: durable CRUD plus a replay-latest snapshot stream the UI
//! layer binds its list to.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{RwLock, watch};

use crate::reminder::{NewReminder, Reminder, ReminderId, ValidationError};

#[async_trait]
pub trait ReminderStorage: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error>;
    async fn list(&self) -> Result<Vec<Reminder>, Self::Error>;
    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, Self::Error>;
    /// Full entity replacement under an existing id; no partial updates.
    async fn update(&self, reminder: Reminder) -> Result<Reminder, Self::Error>;
    async fn delete(&self, id: ReminderId) -> Result<(), Self::Error>;

    /// Snapshot stream: new subscribers observe the latest committed set
    /// immediately, then every committed mutation in commit order.
    fn stream_all(&self) -> watch::Receiver<Vec<Reminder>>;
}

#[derive(Debug, Error)]
pub enum InMemoryStorageError {
    #[error("reminder {0} does not exist")]
    NotFound(ReminderId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

struct InMemoryStore {
    next_id: ReminderId,
    reminders: HashMap<ReminderId, Reminder>,
}

pub struct InMemoryReminderStorage {
    store: RwLock<InMemoryStore>,
    snapshot_tx: watch::Sender<Vec<Reminder>>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            store: RwLock::new(InMemoryStore {
                next_id: 1,
                reminders: HashMap::new(),
            }),
            snapshot_tx,
        }
    }

    fn publish(&self, store: &InMemoryStore) {
        let mut snapshot: Vec<Reminder> = store.reminders.values().cloned().collect();
        snapshot.sort_by_key(|reminder| reminder.id);
        let _ = self.snapshot_tx.send(snapshot);
    }
}

impl Default for InMemoryReminderStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    type Error = InMemoryStorageError;

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error> {
        let store = self.store.read().await;
        Ok(store.reminders.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Reminder>, Self::Error> {
        let store = self.store.read().await;
        let mut all: Vec<Reminder> = store.reminders.values().cloned().collect();
        all.sort_by_key(|reminder| reminder.id);
        Ok(all)
    }

    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        reminder.validate()?;

        let mut store = self.store.write().await;
        let id = store.next_id;
        store.next_id += 1;

        let created = Reminder {
            id,
            label: reminder.label,
            time: reminder.time,
            days: reminder.days,
        };
        store.reminders.insert(id, created.clone());
        self.publish(&store);

        log::info!("Created reminder {id}");
        Ok(created)
    }

    async fn update(&self, reminder: Reminder) -> Result<Reminder, Self::Error> {
        reminder.validate()?;

        let mut store = self.store.write().await;
        if !store.reminders.contains_key(&reminder.id) {
            return Err(InMemoryStorageError::NotFound(reminder.id));
        }
        store.reminders.insert(reminder.id, reminder.clone());
        self.publish(&store);

        Ok(reminder)
    }

    async fn delete(&self, id: ReminderId) -> Result<(), Self::Error> {
        let mut store = self.store.write().await;
        if store.reminders.remove(&id).is_none() {
            return Err(InMemoryStorageError::NotFound(id));
        }
        self.publish(&store);

        log::info!("Deleted reminder {id}");
        Ok(())
    }

    fn stream_all(&self) -> watch::Receiver<Vec<Reminder>> {
        self.snapshot_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{ReminderTime, WeekdaySet};
    use chrono::Weekday;

    fn new_reminder(label: &str) -> NewReminder {
        NewReminder {
            label: label.to_string(),
            time: ReminderTime::new(8, 0).unwrap(),
            days: WeekdaySet::from_iter([Weekday::Mon]),
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let storage = InMemoryReminderStorage::new();

        let first = storage.insert(new_reminder("stretch")).await.unwrap();
        let second = storage.insert(new_reminder("drink water")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(storage.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_replaces_the_full_entity() {
        let storage = InMemoryReminderStorage::new();
        let mut reminder = storage.insert(new_reminder("stretch")).await.unwrap();

        reminder.label = "stretch properly".to_string();
        reminder.time = ReminderTime::new(9, 30).unwrap();
        storage.update(reminder.clone()).await.unwrap();

        let stored = storage.get(reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.label, "stretch properly");
        assert_eq!(stored.time, ReminderTime::new(9, 30).unwrap());
    }

    #[tokio::test]
    async fn update_of_unknown_id_fails() {
        let storage = InMemoryReminderStorage::new();
        let reminder = Reminder {
            id: 42,
            label: "ghost".to_string(),
            time: ReminderTime::new(8, 0).unwrap(),
            days: WeekdaySet::from_iter([Weekday::Mon]),
        };

        assert!(matches!(
            storage.update(reminder).await,
            Err(InMemoryStorageError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_without_side_effects() {
        let storage = InMemoryReminderStorage::new();
        let mut rx = storage.stream_all();

        let mut invalid = new_reminder("stretch");
        invalid.days = WeekdaySet::EMPTY;
        let err = storage.insert(invalid).await.unwrap_err();

        assert!(matches!(
            err,
            InMemoryStorageError::Validation(ValidationError::EmptyDays)
        ));
        assert!(storage.list().await.unwrap().is_empty());
        assert!(!rx.has_changed().unwrap(), "rejected mutation must not be streamed");
    }

    #[tokio::test]
    async fn stream_replays_latest_snapshot_to_new_subscribers() {
        let storage = InMemoryReminderStorage::new();
        storage.insert(new_reminder("stretch")).await.unwrap();

        let rx = storage.stream_all();
        let snapshot = rx.borrow().clone();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].label, "stretch");
    }

    #[tokio::test]
    async fn stream_observes_mutations_in_commit_order() {
        let storage = InMemoryReminderStorage::new();
        let mut rx = storage.stream_all();

        let created = storage.insert(new_reminder("stretch")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        storage.delete(created.id).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }
}

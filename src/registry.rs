//! Trigger registry: the mapping from reminder ids to their single
//! outstanding alarm token, and the reconciliation that keeps it in step with
//! the desired schedule.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::alarm::{AlarmBackend, AlarmToken};
use crate::occurrence::OccurrenceError;
use crate::reminder::ReminderId;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("alarm backend refused registration for reminder {id}: {reason}")]
    RegistrationRefused { id: ReminderId, reason: String },
    #[error(transparent)]
    Occurrence(#[from] OccurrenceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBinding {
    pub occurrence: DateTime<Utc>,
    pub token: AlarmToken,
}

/// At most one binding per reminder id. A refused registration leaves the id
/// in `unscheduled` so the next reconcile retries it instead of dropping it.
pub struct TriggerRegistry<A: AlarmBackend> {
    backend: A,
    bindings: HashMap<ReminderId, TriggerBinding>,
    unscheduled: HashSet<ReminderId>,
}

impl<A: AlarmBackend> TriggerRegistry<A> {
    pub fn new(backend: A) -> Self {
        Self {
            backend,
            bindings: HashMap::new(),
            unscheduled: HashSet::new(),
        }
    }

    pub fn binding(&self, id: ReminderId) -> Option<&TriggerBinding> {
        self.bindings.get(&id)
    }

    pub fn outstanding(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_unscheduled(&self, id: ReminderId) -> bool {
        self.unscheduled.contains(&id)
    }

    /// Binds `id` to `occurrence`, replacing a stale binding if the occurrence
    /// changed. A matching binding is left untouched, which makes repeated
    /// calls with the same desired occurrence no-ops.
    pub async fn set(
        &mut self,
        id: ReminderId,
        occurrence: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        if let Some(bound) = self.bindings.get(&id) {
            if bound.occurrence == occurrence {
                return Ok(());
            }
        }

        if let Some(stale) = self.bindings.remove(&id) {
            log::info!(
                "Replacing trigger for reminder {id}: {} -> {occurrence}",
                stale.occurrence
            );
            self.backend.cancel(stale.token).await;
        }

        match self.backend.register(occurrence, id).await {
            Ok(token) => {
                self.bindings.insert(id, TriggerBinding { occurrence, token });
                self.unscheduled.remove(&id);
                Ok(())
            }
            Err(err) => {
                log::warn!("Alarm registration refused for reminder {id}: {err}");
                self.unscheduled.insert(id);
                Err(SchedulingError::RegistrationRefused {
                    id,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Cancels and forgets the binding for `id`. Unknown ids are a no-op.
    pub async fn remove(&mut self, id: ReminderId) {
        self.unscheduled.remove(&id);
        if let Some(binding) = self.bindings.remove(&id) {
            self.backend.cancel(binding.token).await;
        }
    }

    /// Drops the spent binding after the backend fired it. The token is
    /// consumed by the fire, so there is nothing to cancel.
    pub fn mark_fired(&mut self, id: ReminderId) -> Option<TriggerBinding> {
        self.bindings.remove(&id)
    }

    /// Bulk diff against the full desired schedule: cancels bindings with no
    /// desired entry, then applies `set` for every desired occurrence.
    /// Previously refused ids are retried; errors are collected per id.
    pub async fn reconcile(
        &mut self,
        desired: &HashMap<ReminderId, DateTime<Utc>>,
    ) -> Vec<SchedulingError> {
        let stale: Vec<ReminderId> = self
            .bindings
            .keys()
            .filter(|id| !desired.contains_key(id))
            .copied()
            .collect();
        for id in stale {
            self.remove(id).await;
        }
        self.unscheduled.retain(|id| desired.contains_key(id));

        let mut errors = Vec::new();
        for (&id, &occurrence) in desired {
            if let Err(err) = self.set(id, occurrence).await {
                errors.push(err);
            }
        }
        errors
    }
}

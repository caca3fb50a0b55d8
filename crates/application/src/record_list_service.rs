use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use scholardesk_core::{AppError, AppResult, OwnerId, RecordId};
use scholardesk_domain::{Record, StoredRecord};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::list_state::{ItemsSetter, ListState};
use crate::optimistic::{ErrorCallback, MutationOutcome, OptimisticMutator};
use crate::record_events::{RecordEvent, RecordEventBus};
use crate::record_ports::{RecordListQuery, RecordRepository};
use crate::single_flight::SingleFlightRunner;

/// Headless controller behind one record list screen.
///
/// Reads go through a [`SingleFlightRunner`] so only the newest refresh lands;
/// favorite toggles and deletes go through an [`OptimisticMutator`].
pub struct RecordListService<R: Record> {
    owner_id: OwnerId,
    repository: Arc<dyn RecordRepository>,
    items: ListState<R>,
    runner: SingleFlightRunner,
    mutator: OptimisticMutator,
    events: Option<RecordEventBus>,
    last_error: Arc<Mutex<Option<String>>>,
    event_listener: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Record> RecordListService<R> {
    /// Creates a list service for one owner's records of kind `R`.
    #[must_use]
    pub fn new(
        owner_id: OwnerId,
        repository: Arc<dyn RecordRepository>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            owner_id,
            repository,
            items: ListState::default(),
            runner: SingleFlightRunner::new(request_timeout),
            mutator: OptimisticMutator::new(),
            events: None,
            last_error: Arc::new(Mutex::new(None)),
            event_listener: Mutex::new(None),
        }
    }

    /// Publishes committed changes to `events` and allows [`follow_events`](Self::follow_events).
    #[must_use]
    pub fn with_event_bus(mut self, events: RecordEventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the displayed records.
    #[must_use]
    pub fn items(&self) -> Vec<R> {
        self.items.snapshot()
    }

    /// Returns whether an optimistic mutation is waiting on remote writes.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.mutator.is_syncing()
    }

    /// Returns whether a refresh is still in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.runner.is_running()
    }

    /// Returns the message of the most recent reported failure.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    /// Reloads the displayed records, superseding any refresh still running.
    pub fn refresh(&self, query: RecordListQuery) -> JoinHandle<()> {
        let repository = Arc::clone(&self.repository);
        let owner_id = self.owner_id;
        let items = self.items.clone();
        let success_slot = Arc::clone(&self.last_error);
        let error_slot = Arc::clone(&self.last_error);

        self.runner.execute(
            move |_signal| async move {
                let rows = repository.list_records(owner_id, R::KIND, query).await?;
                rows.iter()
                    .map(StoredRecord::decode::<R>)
                    .collect::<AppResult<Vec<R>>>()
            },
            move |records| {
                debug!(kind = R::KIND.as_str(), count = records.len(), "records refreshed");
                items.set(records);
                *lock(&success_slot) = None;
            },
            move |error| {
                warn!(kind = R::KIND.as_str(), error = %error, "record refresh failed");
                *lock(&error_slot) = Some(error.to_string());
            },
        )
    }

    /// Appends stored records that the current page does not display.
    ///
    /// Returns the ids the store has no record for.
    pub async fn include(&self, record_ids: &[RecordId]) -> AppResult<Vec<RecordId>> {
        let displayed: HashSet<RecordId> = self.items.snapshot().iter().map(Record::id).collect();
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut missing = Vec::new();

        for record_id in record_ids
            .iter()
            .copied()
            .filter(|record_id| !displayed.contains(record_id) && seen.insert(*record_id))
        {
            match self
                .repository
                .find_record(self.owner_id, R::KIND, record_id)
                .await?
            {
                Some(stored) => found.push(stored.decode::<R>()?),
                None => missing.push(record_id),
            }
        }

        if !found.is_empty() {
            debug!(kind = R::KIND.as_str(), count = found.len(), "including off-page records");
            self.items.update(|mut items| {
                items.extend(found);
                items
            });
        }

        Ok(missing)
    }

    /// Stars or unstars the targeted records, rolling back if any write fails.
    pub async fn set_favorite(&self, record_ids: &[RecordId], is_favorite: bool) -> MutationOutcome {
        let repository = Arc::clone(&self.repository);
        let owner_id = self.owner_id;

        let outcome = self
            .mutator
            .perform_update(
                self.items.snapshot(),
                &self.items,
                record_ids,
                |record: &R| record.clone().with_favorite(is_favorite),
                |updated: R| {
                    let repository = Arc::clone(&repository);
                    async move {
                        let stored = StoredRecord::encode(&updated)?;
                        repository.upsert_record(owner_id, stored).await?;
                        AppResult::Ok(true)
                    }
                },
                Some(self.error_callback("favorite")),
            )
            .await;

        if outcome.is_committed() {
            let targets: HashSet<RecordId> = record_ids.iter().copied().collect();
            for record in self.items.snapshot() {
                if targets.contains(&record.id()) {
                    self.publish(RecordEvent::Upserted(record));
                }
            }
        }

        outcome
    }

    /// Removes the targeted records, restoring them if any delete fails.
    ///
    /// A delete that matches no stored row counts as a failure.
    pub async fn delete(&self, record_ids: &[RecordId]) -> MutationOutcome {
        let repository = Arc::clone(&self.repository);
        let owner_id = self.owner_id;

        let outcome = self
            .mutator
            .perform_delete(
                self.items.snapshot(),
                &self.items,
                record_ids,
                |record_id: RecordId| {
                    let repository = Arc::clone(&repository);
                    async move {
                        repository
                            .delete_record(owner_id, R::KIND, record_id)
                            .await
                    }
                },
                Some(self.error_callback("delete")),
            )
            .await;

        if outcome.is_committed() {
            let mut seen = HashSet::new();
            for record_id in record_ids.iter().filter(|record_id| seen.insert(**record_id)) {
                self.publish(RecordEvent::<R>::Deleted(*record_id));
            }
        }

        outcome
    }

    /// Persists a created or edited record and shows the stored version.
    pub async fn save(&self, record: R) -> AppResult<R> {
        let stored = StoredRecord::encode(&record)?;
        let saved: R = self
            .repository
            .upsert_record(self.owner_id, stored)
            .await?
            .decode()?;

        let event = RecordEvent::Upserted(saved.clone());
        let applied = event.clone();
        self.items
            .update_items(Box::new(move |items| apply_event(items, applied)));
        self.publish(event);

        Ok(saved)
    }

    /// Applies changes published by other list services to the displayed records.
    ///
    /// Replaces any listener started earlier. The listener stops when the
    /// service is dropped.
    pub fn follow_events(&self) -> AppResult<()> {
        let Some(events) = &self.events else {
            return Err(AppError::Validation(format!(
                "{} list has no event bus to follow",
                R::KIND
            )));
        };

        let mut subscription = events.subscribe::<R>()?;
        let items = self.items.clone();
        let listener = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                debug!(
                    kind = R::KIND.as_str(),
                    record_id = %event.record_id(),
                    "applying record event"
                );
                items.update(|current| apply_event(current, event));
            }
        });

        if let Some(previous) = lock(&self.event_listener).replace(listener) {
            previous.abort();
        }

        Ok(())
    }

    fn publish(&self, event: RecordEvent<R>) {
        let Some(events) = &self.events else {
            return;
        };

        if let Err(error) = events.publish(event) {
            warn!(kind = R::KIND.as_str(), error = %error, "failed to publish record event");
        }
    }

    fn error_callback(&self, operation: &'static str) -> ErrorCallback {
        let last_error = Arc::clone(&self.last_error);
        Box::new(move |error: AppError| {
            warn!(kind = R::KIND.as_str(), operation, error = %error, "record mutation rolled back");
            *lock(&last_error) = Some(error.to_string());
        })
    }
}

impl<R: Record> Drop for RecordListService<R> {
    fn drop(&mut self) {
        if let Some(listener) = lock(&self.event_listener).take() {
            listener.abort();
        }
    }
}

/// Upserts replace in place or prepend; deletes drop every matching record.
fn apply_event<R: Record>(mut items: Vec<R>, event: RecordEvent<R>) -> Vec<R> {
    match event {
        RecordEvent::Upserted(record) => {
            match items.iter().position(|current| current.id() == record.id()) {
                Some(index) => items[index] = record,
                None => items.insert(0, record),
            }
        }
        RecordEvent::Deleted(record_id) => items.retain(|current| current.id() != record_id),
    }

    items
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests;

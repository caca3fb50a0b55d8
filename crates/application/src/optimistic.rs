use std::collections::HashSet;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use scholardesk_core::{AppError, AppResult, RecordId};
use scholardesk_domain::Record;
use tracing::{debug, warn};

use crate::list_state::ItemsSetter;

/// Callback invoked after a failed mutation has been rolled back.
pub type ErrorCallback = Box<dyn FnOnce(AppError) + Send + 'static>;

/// Item with a stable identity inside a displayed collection.
pub trait Keyed {
    /// Identifier type.
    type Key: Clone + Eq + Hash + Debug + Send + Sync;

    /// Returns the item's identifier.
    fn key(&self) -> Self::Key;
}

impl<R: Record> Keyed for R {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id()
    }
}

/// Final state of one optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Every remote write succeeded; the optimistic state stands.
    Committed,
    /// At least one remote write failed; the snapshot was restored.
    RolledBack,
}

impl MutationOutcome {
    /// Returns whether the optimistic state was kept.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Applies list mutations locally before their remote writes confirm them.
///
/// Remote writes for one mutation run concurrently and are joined; if any of
/// them reports `false` or fails, the whole collection is restored to the
/// snapshot taken before the mutation. A batch is never left half-applied.
#[derive(Debug, Clone, Default)]
pub struct OptimisticMutator {
    in_flight: Arc<AtomicUsize>,
}

struct SyncGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> SyncGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl OptimisticMutator {
    /// Creates an idle mutator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether any mutation is waiting on remote writes.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Applies `update_fn` to the targeted items, then persists each updated item.
    ///
    /// `async_action` receives one updated item and resolves to whether the
    /// remote write succeeded.
    pub async fn perform_update<T, S, U, A, Fut>(
        &self,
        current_items: Vec<T>,
        setter: &S,
        target_ids: &[T::Key],
        update_fn: U,
        async_action: A,
        on_error: Option<ErrorCallback>,
    ) -> MutationOutcome
    where
        T: Keyed + Clone,
        S: ItemsSetter<T> + ?Sized,
        U: Fn(&T) -> T,
        A: Fn(T) -> Fut,
        Fut: Future<Output = AppResult<bool>>,
    {
        let _guard = SyncGuard::enter(&self.in_flight);
        let targets: HashSet<T::Key> = target_ids.iter().cloned().collect();
        let original_items = current_items;

        let mut updated_targets = Vec::new();
        let optimistic_items = original_items
            .iter()
            .map(|item| {
                if !targets.contains(&item.key()) {
                    return item.clone();
                }

                let updated = update_fn(item);
                updated_targets.push((item.key(), updated.clone()));
                updated
            })
            .collect();
        setter.set_items(optimistic_items);

        let writes = updated_targets.into_iter().map(|(key, updated)| {
            let write = async_action(updated);
            async move { (key, write.await) }
        });
        let results = join_all(writes).await;

        settle("update", results, original_items, setter, on_error)
    }

    /// Removes the targeted items, then deletes each one remotely.
    ///
    /// `async_action` receives one target id and resolves to whether the
    /// remote delete succeeded.
    pub async fn perform_delete<T, S, A, Fut>(
        &self,
        current_items: Vec<T>,
        setter: &S,
        target_ids: &[T::Key],
        async_action: A,
        on_error: Option<ErrorCallback>,
    ) -> MutationOutcome
    where
        T: Keyed + Clone,
        S: ItemsSetter<T> + ?Sized,
        A: Fn(T::Key) -> Fut,
        Fut: Future<Output = AppResult<bool>>,
    {
        let _guard = SyncGuard::enter(&self.in_flight);
        let mut seen = HashSet::new();
        let targets: Vec<T::Key> = target_ids
            .iter()
            .filter(|key| seen.insert((*key).clone()))
            .cloned()
            .collect();
        let original_items = current_items;

        let remaining = original_items
            .iter()
            .filter(|item| !seen.contains(&item.key()))
            .cloned()
            .collect();
        setter.set_items(remaining);

        let writes = targets.into_iter().map(|key| {
            let write = async_action(key.clone());
            async move { (key, write.await) }
        });
        let results = join_all(writes).await;

        settle("delete", results, original_items, setter, on_error)
    }
}

fn settle<T, K, S>(
    operation: &'static str,
    results: Vec<(K, AppResult<bool>)>,
    original_items: Vec<T>,
    setter: &S,
    on_error: Option<ErrorCallback>,
) -> MutationOutcome
where
    K: Debug,
    S: ItemsSetter<T> + ?Sized,
{
    let write_count = results.len();
    let mut rejected = Vec::new();
    let mut first_error = None;

    for (key, result) in results {
        match result {
            Ok(true) => {}
            Ok(false) => rejected.push(key),
            Err(error) => {
                debug!(operation, key = ?key, error = %error, "optimistic write failed");
                rejected.push(key);
                first_error.get_or_insert(error);
            }
        }
    }

    if rejected.is_empty() {
        debug!(operation, write_count, "optimistic mutation committed");
        return MutationOutcome::Committed;
    }

    setter.set_items(original_items);
    warn!(
        operation,
        write_count,
        rejected_count = rejected.len(),
        "optimistic mutation rolled back"
    );

    let error = first_error.unwrap_or_else(|| {
        AppError::Conflict(format!("remote {operation} rejected for {rejected:?}"))
    });
    if let Some(on_error) = on_error {
        on_error(error);
    }

    MutationOutcome::RolledBack
}

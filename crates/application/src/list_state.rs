use std::sync::{Arc, PoisonError, RwLock};

/// Receiver of replacement collections produced by list mutations.
pub trait ItemsSetter<T>: Send + Sync {
    /// Replaces the displayed collection.
    fn set_items(&self, items: Vec<T>);

    /// Replaces the displayed collection with a function of the current one.
    fn update_items(&self, update: Box<dyn FnOnce(Vec<T>) -> Vec<T> + '_>);
}

/// Shared, ordered collection displayed by one list view.
///
/// Clones share the same underlying collection. The lock is only held for
/// synchronous reads and swaps.
#[derive(Debug)]
pub struct ListState<T> {
    items: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for ListState<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> ListState<T> {
    /// Creates a list state seeded with `items`.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Returns the number of displayed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether nothing is displayed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the displayed collection.
    pub fn set(&self, items: Vec<T>) {
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }

    /// Replaces the displayed collection with a function of the previous one.
    pub fn update(&self, update: impl FnOnce(Vec<T>) -> Vec<T>) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::take(&mut *items);
        *items = update(previous);
    }
}

impl<T: Clone> ListState<T> {
    /// Returns a copy of the displayed collection.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Send + Sync> ItemsSetter<T> for ListState<T> {
    fn set_items(&self, items: Vec<T>) {
        self.set(items);
    }

    fn update_items(&self, update: Box<dyn FnOnce(Vec<T>) -> Vec<T> + '_>) {
        self.update(update);
    }
}

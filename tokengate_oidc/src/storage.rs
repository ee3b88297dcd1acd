//! Keyed storage for values a relying party wants to keep between requests
//!
//! Nothing in this crate stores data on its own. Callers use this contract
//! to cache resolved metadata or signing keys under names of their choosing.

use std::{collections::HashMap, convert::Infallible, error};

use parking_lot::RwLock;

/// A keyed store of values
pub trait Storage<T>: Send + Sync {
    /// The error returned when the backing store fails
    type Error: error::Error + Send + Sync + 'static;

    /// Stores `value` under `id`, replacing any previous value
    fn store(&self, id: &str, value: T) -> Result<(), Self::Error>;

    /// Retrieves the value stored under `id`
    fn get(&self, id: &str) -> Result<Option<T>, Self::Error>;

    /// Whether a value is stored under `id`
    ///
    /// An empty ID never holds a value.
    fn contains(&self, id: &str) -> Result<bool, Self::Error>;

    /// Removes the value stored under `id`, if there is one
    fn remove(&self, id: &str) -> Result<(), Self::Error>;
}

/// A process-local [`Storage`]
#[derive(Debug)]
pub struct MemoryStorage<T> {
    entries: RwLock<HashMap<String, T>>,
}

impl<T> MemoryStorage<T> {
    /// An empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The number of stored values
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T> Default for MemoryStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> for MemoryStorage<T>
where
    T: Clone + Send + Sync,
{
    type Error = Infallible;

    fn store(&self, id: &str, value: T) -> Result<(), Self::Error> {
        self.entries.write().insert(id.to_owned(), value);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<T>, Self::Error> {
        Ok(self.entries.read().get(id).cloned())
    }

    fn contains(&self, id: &str) -> Result<bool, Self::Error> {
        Ok(!id.is_empty() && self.entries.read().contains_key(id))
    }

    fn remove(&self, id: &str) -> Result<(), Self::Error> {
        self.entries.write().remove(id);
        Ok(())
    }
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::records::{CourseArchive, ProfileStore, ProgressStore};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Contract for the persistent key-value substrate.
///
/// The core writes course-scoped keys and treats each key as exclusively
/// owned by the store for that course; adapters only need durable
/// string get/set.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// A single `set` is the unit of atomicity; record stores serialize a
    /// whole record into one value so a crash can never split it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Typed facades over one shared key-value store.
#[derive(Clone)]
pub struct Storage {
    pub progress: ProgressStore,
    pub courses: CourseArchive,
    pub profile: ProfileStore,
}

impl Storage {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            progress: ProgressStore::new(Arc::clone(&kv)),
            courses: CourseArchive::new(Arc::clone(&kv)),
            profile: ProfileStore::new(kv),
        }
    }

    /// Storage backed by an in-memory map; used in tests and prototypes.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }
}

/// In-memory key-value store for tests and prototyping.
///
/// Clones share the same map. Read/write failures can be injected to
/// exercise error paths.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail with a connection error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail with a connection error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a raw value, bypassing record serialization; lets tests plant
    /// corrupt JSON.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("in-memory store lock poisoned")
            .insert(key.to_owned(), value.to_owned());
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Connection("in-memory store lock poisoned".into()))
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("injected read failure".into()));
        }
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("injected write failure".into()));
        }
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_roundtrip_and_overwrite() {
        let store = InMemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());

        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = InMemoryStore::new();
        let clone = store.clone();
        clone.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn failure_injection_surfaces_connection_errors() {
        let store = InMemoryStore::new();
        store.set("k", "v").await.unwrap();

        store.fail_reads(true);
        assert!(matches!(
            store.get("k").await,
            Err(StorageError::Connection(_))
        ));

        store.fail_reads(false);
        store.fail_writes(true);
        assert!(matches!(
            store.set("k", "w").await,
            Err(StorageError::Connection(_))
        ));

        store.fail_writes(false);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}

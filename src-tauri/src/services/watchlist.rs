use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Runtime};
use tauri_plugin_store::{Store, StoreExt};
use tokio::sync::OnceCell;

use crate::error::{Error, Result};

pub const STORE_PATH: &str = "watchlist.json";
pub const WATCHED_IDS_KEY: &str = "watched_ids";

/// Minimal key-value surface the watchlist needs from a persisted store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    /// Flush to durable storage.
    fn save(&self) -> Result<()>;
}

impl<R: Runtime> KeyValueStore for Store<R> {
    fn get(&self, key: &str) -> Option<Value> {
        Store::get(self, key)
    }

    fn set(&self, key: &str, value: Value) {
        Store::set(self, key, value);
    }

    fn save(&self) -> Result<()> {
        Store::save(self).map_err(|e| Error::Store(e.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }
}

/// Produces the store handle on first use.
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn KeyValueStore>>;
}

pub struct TauriStoreOpener<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriStoreOpener<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

#[async_trait]
impl<R: Runtime> StoreOpener for TauriStoreOpener<R> {
    async fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
        log::info!("Opening store {STORE_PATH}");
        let store = self
            .app
            .store(STORE_PATH)
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(store)
    }
}

pub struct MemoryOpener;

#[async_trait]
impl StoreOpener for MemoryOpener {
    async fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(MemoryStore::default()))
    }
}

/// Persisted watchlist. The store handle is acquired once, on first use, and
/// shared by every later call.
pub struct WatchlistStore {
    opener: Arc<dyn StoreOpener>,
    handle: OnceCell<Arc<dyn KeyValueStore>>,
}

impl WatchlistStore {
    pub fn new(opener: Arc<dyn StoreOpener>) -> Self {
        Self {
            opener,
            handle: OnceCell::new(),
        }
    }

    async fn handle(&self) -> Result<&Arc<dyn KeyValueStore>> {
        self.handle.get_or_try_init(|| self.opener.open()).await
    }

    /// Saved ids, in order, without duplicates. Missing or malformed data
    /// reads as an empty watchlist.
    pub async fn get(&self) -> Result<Vec<u64>> {
        let store = self.handle().await?;
        let Some(value) = store.get(WATCHED_IDS_KEY) else {
            return Ok(Vec::new());
        };
        let ids: Vec<u64> = match serde_json::from_value(value) {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("Ignoring malformed {WATCHED_IDS_KEY}: {e}");
                return Ok(Vec::new());
            }
        };
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Ok(unique)
    }

    /// Write and flush; the ids are durable once this returns.
    pub async fn set(&self, ids: &[u64]) -> Result<()> {
        let store = self.handle().await?;
        store.set(WATCHED_IDS_KEY, serde_json::json!(ids));
        store.save()?;
        log::debug!("Persisted watchlist ({} repos)", ids.len());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryStore,
        saves: AtomicUsize,
    }

    impl KeyValueStore for RecordingStore {
        fn get(&self, key: &str) -> Option<Value> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: Value) {
            self.inner.set(key, value);
        }

        fn save(&self) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingOpener {
        opens: AtomicUsize,
        store: Arc<RecordingStore>,
    }

    #[async_trait]
    impl StoreOpener for CountingOpener {
        async fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(self.store.clone())
        }
    }

    fn counting() -> Arc<CountingOpener> {
        Arc::new(CountingOpener {
            opens: AtomicUsize::new(0),
            store: Arc::new(RecordingStore::default()),
        })
    }

    pub(crate) struct FailingOpener;

    #[async_trait]
    impl StoreOpener for FailingOpener {
        async fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
            Err(Error::Store("no store".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_first_use_opens_once() {
        let opener = counting();
        let store = WatchlistStore::new(opener.clone());
        let (a, b) = tokio::join!(store.get(), store.get());
        assert!(a.unwrap().is_empty());
        assert!(b.unwrap().is_empty());
        store.set(&[1]).await.unwrap();
        assert_eq!(opener.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_flushes_before_returning() {
        let opener = counting();
        let store = WatchlistStore::new(opener.clone());
        store.set(&[102, 103]).await.unwrap();
        assert_eq!(opener.store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(store.get().await.unwrap(), vec![102, 103]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_and_duplicate_values() {
        let opener = counting();
        let store = WatchlistStore::new(opener.clone());

        opener.store.set(WATCHED_IDS_KEY, serde_json::json!("nope"));
        assert!(store.get().await.unwrap().is_empty());

        opener.store.set(WATCHED_IDS_KEY, serde_json::json!([3, 1, 3, 2, 1]));
        assert_eq!(store.get().await.unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_open_failure_propagates() {
        let store = WatchlistStore::new(Arc::new(FailingOpener));
        assert!(matches!(store.get().await, Err(Error::Store(_))));
        assert!(store.set(&[1]).await.is_err());
    }
}

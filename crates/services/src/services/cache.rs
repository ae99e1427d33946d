//! Process-wide query cache with explicit invalidation and change notifications.
//!
//! Key schema: `(resource, List { page, page_size })` for list queries and
//! `(resource, Item(documentId))` for single records. Invalidation marks
//! entries stale; stale entries stay readable through [`QueryCache::peek`]
//! but are never served as fresh, so the next read re-fetches.

use std::{any::Any, fmt, sync::Arc, time::Duration};

use models::resource::{DocumentId, ResourceKind};
use moka::future::Cache;
use tokio::sync::broadcast;
use tracing::{debug, trace};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKind {
    List { page: u32, page_size: u32 },
    Item(DocumentId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: ResourceKind,
    pub query: QueryKind,
}

impl CacheKey {
    pub fn list(resource: ResourceKind, page: u32, page_size: u32) -> Self {
        Self {
            resource,
            query: QueryKind::List { page, page_size },
        }
    }

    pub fn item(resource: ResourceKind, document_id: DocumentId) -> Self {
        Self {
            resource,
            query: QueryKind::Item(document_id),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.query, QueryKind::List { .. })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            QueryKind::List { page, page_size } => {
                write!(f, "{}:list:{}:{}", self.resource, page, page_size)
            }
            QueryKind::Item(id) => write!(f, "{}:item:{}", self.resource, id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheChange {
    /// A fresh value was stored
    Updated,
    /// The value is stale and should be re-fetched
    Invalidated,
    /// The entry no longer exists
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: CacheKey,
    pub change: CacheChange,
}

#[derive(Clone)]
struct CachedValue {
    value: Arc<dyn Any + Send + Sync>,
    stale: bool,
}

/// A cached value together with its freshness.
#[derive(Debug, Clone)]
pub struct CacheSnapshot<T> {
    pub value: Arc<T>,
    pub stale: bool,
}

/// Shared query cache. Cloning is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<CacheKey, CachedValue>,
    events: broadcast::Sender<CacheEvent>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl QueryCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { entries, events }
    }

    /// Value for `key` unless it is missing, stale or of another type.
    pub async fn get_fresh<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<Arc<T>> {
        self.peek::<T>(key)
            .await
            .filter(|snapshot| !snapshot.stale)
            .map(|snapshot| snapshot.value)
    }

    /// Value for `key` regardless of freshness.
    pub async fn peek<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<CacheSnapshot<T>> {
        let cached = self.entries.get(key).await?;
        let value = cached.value.downcast::<T>().ok()?;
        Some(CacheSnapshot {
            value,
            stale: cached.stale,
        })
    }

    /// Store a fresh value, replacing whatever was there.
    pub async fn insert<T: Any + Send + Sync>(&self, key: CacheKey, value: T) {
        trace!(key = %key, "Cache insert");
        self.entries
            .insert(
                key.clone(),
                CachedValue {
                    value: Arc::new(value),
                    stale: false,
                },
            )
            .await;
        self.publish(key, CacheChange::Updated);
    }

    pub async fn remove(&self, key: &CacheKey) {
        if self.entries.remove(key).await.is_some() {
            debug!(key = %key, "Cache entry removed");
        }
        self.publish(key.clone(), CacheChange::Removed);
    }

    pub async fn remove_item(&self, resource: ResourceKind, document_id: &DocumentId) {
        self.remove(&CacheKey::item(resource, document_id.clone())).await;
    }

    /// Mark one single-record entry stale.
    pub async fn invalidate_item(&self, resource: ResourceKind, document_id: &DocumentId) {
        let key = CacheKey::item(resource, document_id.clone());
        self.mark_stale(&key).await;
    }

    /// Mark every cached list page of `resource` stale.
    pub async fn invalidate_resource(&self, resource: ResourceKind) {
        let keys = self.list_keys(resource);
        debug!(resource = %resource, pages = keys.len(), "Invalidating list queries");
        for key in keys {
            self.mark_stale(&key).await;
        }
    }

    /// Rewrite every cached list page of `resource` with `patch`, then mark it stale.
    ///
    /// Pages holding a value of another type are left untouched.
    pub async fn patch_lists<T, F>(&self, resource: ResourceKind, patch: F)
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T,
    {
        for key in self.list_keys(resource) {
            let Some(snapshot) = self.peek::<T>(&key).await else {
                continue;
            };
            self.entries
                .insert(
                    key.clone(),
                    CachedValue {
                        value: Arc::new(patch(&snapshot.value)),
                        stale: true,
                    },
                )
                .await;
            self.publish(key, CacheChange::Invalidated);
        }
    }

    /// Drop everything, e.g. when the session changes hands.
    pub async fn clear(&self) {
        let keys: Vec<CacheKey> = self.entries.iter().map(|(k, _)| (*k).clone()).collect();
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
        debug!(entries = keys.len(), "Cache cleared");
        for key in keys {
            self.publish(key, CacheChange::Removed);
        }
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.get(key).await.is_some()
    }

    /// Change notifications for a single key.
    pub fn subscribe(&self, key: CacheKey) -> CacheSubscription {
        CacheSubscription {
            key,
            events: self.events.subscribe(),
        }
    }

    /// Every change notification.
    pub fn subscribe_all(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn list_keys(&self, resource: ResourceKind) -> Vec<CacheKey> {
        self.entries
            .iter()
            .filter(|(k, _)| k.resource == resource && k.is_list())
            .map(|(k, _)| (*k).clone())
            .collect()
    }

    async fn mark_stale(&self, key: &CacheKey) {
        let Some(cached) = self.entries.get(key).await else {
            return;
        };
        if !cached.stale {
            self.entries
                .insert(
                    key.clone(),
                    CachedValue {
                        stale: true,
                        ..cached
                    },
                )
                .await;
        }
        self.publish(key.clone(), CacheChange::Invalidated);
    }

    fn publish(&self, key: CacheKey, change: CacheChange) {
        // No receivers is fine: nothing is mounted.
        let _ = self.events.send(CacheEvent { key, change });
    }
}

/// Receives the changes affecting one cache key.
#[derive(Debug)]
pub struct CacheSubscription {
    key: CacheKey,
    events: broadcast::Receiver<CacheEvent>,
}

impl CacheSubscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Wait for the next change to this key. `None` once the cache is gone.
    ///
    /// A subscriber that fell behind gets `Invalidated` so it re-reads.
    pub async fn changed(&mut self) -> Option<CacheChange> {
        loop {
            match self.events.recv().await {
                Ok(event) if event.key == self.key => return Some(event.change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => return Some(CacheChange::Invalidated),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`changed`](Self::changed).
    pub fn try_changed(&mut self) -> Option<CacheChange> {
        loop {
            match self.events.try_recv() {
                Ok(event) if event.key == self.key => return Some(event.change),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    return Some(CacheChange::Invalidated);
                }
                Err(_) => return None,
            }
        }
    }
}

//! Bounded cache of open organization databases.
//!
//! Each organization is its own SQLite file; this cache caps how many stay
//! open at once (default 5) and evicts the least-recently-used handle on
//! insert, plus anything idle past the TTL (default 5 minutes).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::Mutex as AsyncMutex;

use super::Database;

/// Default maximum number of open organization databases
pub const DEFAULT_CAPACITY: usize = 5;

/// Default idle eviction window
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(300);

/// Shared handle to one organization's database
pub type DbHandle = Arc<AsyncMutex<Database>>;

/// Cache entry for an open database
struct CachedHandle {
    db: DbHandle,
    /// Last access timestamp (for LRU eviction)
    last_access: Instant,
}

/// Thread-safe bounded connection cache, keyed by organization id
pub struct ConnectionCache {
    handles: Mutex<HashMap<String, CachedHandle>>,
    capacity: usize,
    idle_ttl: Duration,
    /// Database directory override (tests); None means the orgs dir
    root: Option<PathBuf>,
}

impl Default for ConnectionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_IDLE_TTL)
    }
}

impl ConnectionCache {
    /// Create a new cache with an explicit capacity and idle TTL
    #[must_use]
    pub fn new(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            idle_ttl,
            root: None,
        }
    }

    /// Create a cache whose databases live under a specific directory
    #[must_use]
    pub fn with_root(root: PathBuf, capacity: usize, idle_ttl: Duration) -> Self {
        let mut cache = Self::new(capacity, idle_ttl);
        cache.root = Some(root);
        cache
    }

    /// Get the database handle for an organization, opening it if needed
    ///
    /// Opening a sixth organization evicts the least-recently-used handle;
    /// idle handles are dropped on every access.
    pub fn open(&self, organization: &str) -> Result<DbHandle> {
        let mut handles = self.handles.lock().unwrap();

        Self::evict_idle_locked(&mut handles, self.idle_ttl);

        if let Some(entry) = handles.get_mut(organization) {
            entry.last_access = Instant::now();
            return Ok(Arc::clone(&entry.db));
        }

        let db = match &self.root {
            Some(root) => Database::open_path(&root.join(format!("{organization}.sqlite")))?,
            None => Database::open_org(organization)?,
        };

        if handles.len() >= self.capacity {
            Self::evict_oldest(&mut handles);
        }

        let handle: DbHandle = Arc::new(AsyncMutex::new(db));
        handles.insert(
            organization.to_string(),
            CachedHandle {
                db: Arc::clone(&handle),
                last_access: Instant::now(),
            },
        );

        Ok(handle)
    }

    /// Check if an organization's database is currently open
    pub fn contains(&self, organization: &str) -> bool {
        self.handles.lock().unwrap().contains_key(organization)
    }

    /// Drop handles idle past the TTL
    pub fn evict_idle(&self) {
        let mut handles = self.handles.lock().unwrap();
        Self::evict_idle_locked(&mut handles, self.idle_ttl);
    }

    /// Evict the least-recently-used entry
    fn evict_oldest(handles: &mut HashMap<String, CachedHandle>) {
        if let Some(oldest_key) = handles
            .iter()
            .min_by_key(|(_, v)| v.last_access)
            .map(|(k, _)| k.clone())
        {
            handles.remove(&oldest_key);
        }
    }

    fn evict_idle_locked(handles: &mut HashMap<String, CachedHandle>, ttl: Duration) {
        handles.retain(|_, entry| entry.last_access.elapsed() < ttl);
    }

    /// Close all open databases
    pub fn clear(&self) {
        self.handles.lock().unwrap().clear();
    }

    /// Get the number of open databases
    pub fn len(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.handles.lock().unwrap().is_empty()
    }
}

/// Open the cache sized from config values
pub fn cache_from_config(config: &crate::config::Config) -> ConnectionCache {
    ConnectionCache::new(
        config.connection_cache_capacity,
        Duration::from_secs(config.connection_cache_idle_secs),
    )
}

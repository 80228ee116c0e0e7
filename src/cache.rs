use moka::sync::Cache;
use std::fmt;
use std::sync::Arc;

use crate::models::{Item, ItemId};

/// Last known snapshot of each item, bounded by entry count.
///
/// Clones share the same underlying store, so one instance can be handed
/// to every fetcher and view that needs it.
#[derive(Clone)]
pub struct ItemCache {
    items: Cache<ItemId, Arc<Item>>,
    capacity: u64,
}

impl fmt::Debug for ItemCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.items.entry_count())
            .finish()
    }
}

impl Default for ItemCache {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl ItemCache {
    pub const DEFAULT_CAPACITY: u64 = 1000;

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            items: Cache::new(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn get_item(&self, key: ItemId) -> Option<Arc<Item>> {
        self.items.get(&key)
    }

    /// Stores `item` under `key`, replacing whatever was there.
    pub fn cache(&self, item: Arc<Item>, key: ItemId) {
        self.items.insert(key, item);
    }

    pub fn invalidate(&self, key: ItemId) {
        self.items.invalidate(&key);
    }

    pub fn clear(&self) {
        self.items.invalidate_all();
        self.items.run_pending_tasks();
    }

    pub fn len(&self) -> u64 {
        // entry_count lags behind until pending maintenance has run
        self.items.run_pending_tasks();
        self.items.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

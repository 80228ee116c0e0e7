use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{HnError, Result};
use crate::hn_client::ItemDownloader;
use crate::models::{Item, ItemId};

/// In-memory downloader that counts lookups.
#[derive(Default)]
pub(crate) struct StubDownloader {
    items: Mutex<HashMap<ItemId, Item>>,
    failing: Mutex<HashSet<ItemId>>,
    calls: AtomicUsize,
}

impl StubDownloader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_item(self, item: Item) -> Self {
        self.items.lock().unwrap().insert(item.id, item);
        self
    }

    pub(crate) fn failing(self, id: ItemId) -> Self {
        self.failing.lock().unwrap().insert(id);
        self
    }

    pub(crate) fn recover(&self, id: ItemId) {
        self.failing.lock().unwrap().remove(&id);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ItemDownloader for StubDownloader {
    fn download_item(&self, id: ItemId) -> Result<Option<Item>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&id) {
            return Err(HnError::Status(503));
        }
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }
}

/// Downloader whose every lookup panics.
pub(crate) struct PanickingDownloader;

impl ItemDownloader for PanickingDownloader {
    fn download_item(&self, id: ItemId) -> Result<Option<Item>> {
        panic!("lookup of item {} blew up", id);
    }
}

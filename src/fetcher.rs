use log::{debug, error, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::cache::ItemCache;
use crate::dispatch::Dispatcher;
use crate::hn_client::ItemDownloader;
use crate::models::{Item, ItemId};

/// Resolves items from the cache, falling back to the downloader.
#[derive(Clone)]
pub struct ItemFetcher {
    cache: ItemCache,
    downloader: Arc<dyn ItemDownloader>,
    dispatcher: Dispatcher,
}

/// Handle to one fetch.
///
/// Cache hits produce an already finished handle. For remote lookups the
/// handle can cancel delivery of the completion; a result that already
/// reached the cache stays there.
pub struct FetchHandle {
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FetchHandle {
    fn finished() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once the worker thread has exited. Its completion was queued
    /// unless the main context had already been dropped.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |worker| worker.is_finished())
    }

    /// Whether this fetch went to the network.
    pub fn is_remote(&self) -> bool {
        self.worker.is_some()
    }

    /// Blocks until the worker thread has exited.
    /// Returns false if the worker thread panicked.
    pub fn join(mut self) -> bool {
        match self.worker.take() {
            Some(worker) => worker.join().is_ok(),
            None => true,
        }
    }
}

impl ItemFetcher {
    pub fn new(cache: ItemCache, downloader: Arc<dyn ItemDownloader>, dispatcher: Dispatcher) -> Self {
        Self {
            cache,
            downloader,
            dispatcher,
        }
    }

    pub fn cache(&self) -> &ItemCache {
        &self.cache
    }

    /// Resolves `id` and reports the result to `on_complete` exactly once.
    ///
    /// A cache hit calls `on_complete` before returning, on the caller's
    /// thread. A miss looks the item up on a worker thread, stores a
    /// successful result in the cache, and then queues `on_complete` on the
    /// main context. Failures, including a panicking downloader, are
    /// reported as `None` and are not cached. If the main context has been
    /// dropped there is nowhere to deliver to and `on_complete` never runs.
    pub fn fetch<F>(&self, id: ItemId, on_complete: F) -> FetchHandle
    where
        F: FnOnce(Option<Arc<Item>>) + Send + 'static,
    {
        if let Some(item) = self.cache.get_item(id) {
            debug!("Cache hit for item {}", id);
            on_complete(Some(item));
            return FetchHandle::finished();
        }

        debug!("Cache miss for item {}, starting remote lookup", id);

        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel_flag = Arc::clone(&cancelled);
        let cache = self.cache.clone();
        let downloader = Arc::clone(&self.downloader);
        let dispatcher = self.dispatcher.clone();

        let worker = thread::spawn(move || {
            let lookup = panic::catch_unwind(AssertUnwindSafe(|| downloader.download_item(id)));
            let item = match lookup {
                Ok(Ok(Some(item))) => {
                    let item = Arc::new(item);
                    cache.cache(Arc::clone(&item), id);
                    Some(item)
                }
                Ok(Ok(None)) => {
                    warn!("Item {} does not exist", id);
                    None
                }
                Ok(Err(e)) => {
                    warn!("Failed to fetch item {}: {}", id, e);
                    None
                }
                Err(_) => {
                    error!("Downloader panicked while fetching item {}", id);
                    None
                }
            };

            let queued = dispatcher.dispatch(move || {
                if cancel_flag.load(Ordering::SeqCst) {
                    debug!("Fetch of item {} was cancelled, dropping result", id);
                    return;
                }
                on_complete(item);
            });

            if !queued {
                debug!("Main context is gone, dropping result for item {}", id);
            }
        });

        FetchHandle {
            cancelled,
            worker: Some(worker),
        }
    }
}

//! The single execution context item completions are delivered on.
//!
//! Background lookups never touch consumer state directly. They post a
//! closure through a [`Dispatcher`], and whoever owns the [`MainContext`]
//! runs the queued closures from its own loop, the same way a UI frame
//! drains its loader channels before drawing.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct MainContext {
    sender: Sender<Job>,
    receiver: Receiver<Job>,
}

/// Sending half of a [`MainContext`]; cheap to clone into worker threads.
#[derive(Clone)]
pub struct Dispatcher {
    sender: Sender<Job>,
}

impl Default for MainContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MainContext {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            sender: self.sender.clone(),
        }
    }

    /// Runs every queued job on the calling thread without waiting.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for the first job, then drains the queue.
    pub fn run_pending_timeout(&self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(job) => {
                job();
                1 + self.run_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }
}

impl Dispatcher {
    /// Queues `job` for the main context. Returns false when the context is gone.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender.send(Box::new(job)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn jobs_run_on_the_draining_thread() {
        let ctx = MainContext::new();
        let dispatcher = ctx.dispatcher();
        let ran_on = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&ran_on);
        thread::spawn(move || {
            dispatcher.dispatch(move || {
                *slot.lock().unwrap() = Some(thread::current().id());
            });
        })
        .join()
        .unwrap();

        assert!(ran_on.lock().unwrap().is_none());
        assert_eq!(ctx.run_pending(), 1);
        assert_eq!(*ran_on.lock().unwrap(), Some(thread::current().id()));
    }

    #[test]
    fn jobs_run_in_dispatch_order() {
        let ctx = MainContext::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            ctx.dispatcher().dispatch(move || order.lock().unwrap().push(n));
        }
        assert_eq!(ctx.run_pending(), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn timeout_without_jobs_returns_zero() {
        let ctx = MainContext::new();
        assert_eq!(ctx.run_pending_timeout(Duration::from_millis(10)), 0);
    }

    #[test]
    fn timeout_variant_waits_for_late_jobs() {
        let ctx = MainContext::new();
        let dispatcher = ctx.dispatcher();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            dispatcher.dispatch(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(ctx.run_pending_timeout(Duration::from_secs(5)), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        worker.join().unwrap();
    }

    #[test]
    fn dispatch_fails_once_context_is_dropped() {
        let ctx = MainContext::new();
        let dispatcher = ctx.dispatcher();
        drop(ctx);
        assert!(!dispatcher.dispatch(|| {}));
    }
}

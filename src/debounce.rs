//! Trailing debounce on the tokio runtime.
//!
//! [`Debouncer::call`] cancels whatever is pending and schedules the new
//! job after the configured delay. Only the last call in a burst runs.
//!
//! A superseded timer is aborted, and additionally carries a ticket that
//! is re-checked when it wakes, so a timer that was already waking when it
//! got superseded still does nothing. Once the delay elapses the job is
//! spawned as its own task: a later `call` cancels the *next* timer but
//! never the job already started.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    ticket: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ticket: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `job` to run after the delay, discarding any pending job.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call<F, Fut>(&self, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mine = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = Arc::clone(&self.ticket);
        let delay = self.delay;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if ticket.load(Ordering::SeqCst) != mine {
                return;
            }
            tokio::spawn(job());
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
    }

    /// Drop the pending job, if any.
    pub fn cancel(&self) {
        self.ticket.fetch_add(1, Ordering::SeqCst);
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// Whether a timer is scheduled and has not fired yet.
    pub fn is_scheduled(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

//! Debounced task scheduling
//!
//! At most one task is outstanding per debouncer. Scheduling a new task
//! supersedes the pending one, so a burst of events yields a single run
//! once the quiet period has elapsed.
//!
//! Outside a Tokio runtime there is no timer; the latest task is held
//! until [`Debouncer::flush`] or drop.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

type Task = Box<dyn FnOnce() + Send + 'static>;

enum Pending {
    Timer(JoinHandle<()>),
    Deferred(Task),
}

pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
    /// Bumped on every schedule and cancel; a timer task only runs if its
    /// generation is still current, and runs holding the lock.
    generation: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None, generation: Arc::new(Mutex::new(0)) }
    }

    /// Run `task` after the quiet period, replacing any pending task
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let ticket = *self.generation.lock();
        match Handle::try_current() {
            Ok(handle) => {
                let delay = self.delay;
                let generation = Arc::clone(&self.generation);
                self.pending = Some(Pending::Timer(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    let current = generation.lock();
                    if *current == ticket {
                        task();
                    }
                })));
            }
            Err(_) => self.pending = Some(Pending::Deferred(Box::new(task))),
        }
    }

    /// Drop the pending task; returns whether one was still waiting.
    ///
    /// Waits for a task that already started, so nothing it writes can
    /// land after this returns.
    pub fn cancel(&mut self) -> bool {
        *self.generation.lock() += 1;
        match self.pending.take() {
            Some(Pending::Timer(handle)) if !handle.is_finished() => {
                handle.abort();
                true
            }
            Some(Pending::Deferred(_)) => true,
            _ => false,
        }
    }

    /// Run a held task now; returns whether one ran.
    ///
    /// Timer tasks are left to their timer.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(Pending::Deferred(task)) => {
                task();
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        match &self.pending {
            Some(Pending::Timer(handle)) => !handle.is_finished(),
            Some(Pending::Deferred(_)) => true,
            None => false,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.flush();
    }
}

//! Start/stop lifecycle for fixed-rate background loops

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// A timer-driven loop that can be started once and stopped once.
///
/// After `stop` returns, the callback is never invoked again.
pub struct PeriodicTask {
    name: &'static str,
    stopped: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stopped: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the loop on the current tokio runtime, calling `f` every
    /// `period`. The loop ends when `f` returns false or on `stop`.
    ///
    /// Returns false if the task was already started, already stopped, or
    /// there is no runtime to spawn on.
    pub fn start<F>(&self, period: Duration, mut f: F) -> bool
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let mut slot = self.handle.lock();
        if slot.is_some() || self.is_stopped() {
            return false;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!(task = self.name, "No tokio runtime, periodic task not started");
            return false;
        };

        let stopped = self.stopped.clone();
        let name = self.name;

        *slot = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // Late ticks run late rather than being dropped
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if stopped.load(Ordering::Acquire) || !f() {
                    break;
                }
            }

            debug!(task = name, "Periodic task finished");
        }));

        true
    }

    /// Stop the loop. Only the first call has an effect.
    pub fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
        debug!(task = self.name, "Periodic task stopped");
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

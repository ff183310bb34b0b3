//! Environment hand-off between scheduling and temp-file readiness
//!
//! Temp files for a cohort become ready in whatever order the filesystem
//! completes them. The coordinator holds every environment of the cohort
//! until all of them have been enqueued, then releases them one per ready
//! file, newest first.
//!
//! Only exactly-once consumption is guaranteed. Which argument lands in
//! which temp file depends on completion order and is not tracked.

use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tracing::debug;

use crate::environment::Environment;
use crate::error::FanoutError;

#[derive(Debug, Default)]
struct Backlog {
    items: Vec<Environment>,
    enqueued: usize,
}

/// Bounded cohort queue for one suite file
#[derive(Debug)]
pub struct RunCoordinator {
    capacity: usize,
    backlog: Mutex<Backlog>,
    drained: watch::Sender<bool>,
}

impl RunCoordinator {
    /// Create a coordinator expecting exactly `capacity` environments
    pub fn schedule(capacity: usize) -> Self {
        let (drained, _) = watch::channel(capacity == 0);
        Self {
            capacity,
            backlog: Mutex::new(Backlog::default()),
            drained,
        }
    }

    #[cfg(test)]
    pub fn is_drained(&self) -> bool {
        *self.drained.borrow()
    }

    /// Environments enqueued and not yet handed out
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.backlog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    /// Add an environment to the backlog; the last one of the cohort opens the drain
    pub fn enqueue(&self, environment: Environment) -> Result<(), FanoutError> {
        let mut backlog = self.backlog.lock().unwrap_or_else(PoisonError::into_inner);

        if backlog.enqueued == self.capacity {
            return Err(FanoutError::CoordinatorOverflow {
                capacity: self.capacity,
            });
        }

        debug!(
            "Enqueued environment {} for {:?} ({}/{})",
            environment.identifier(),
            environment.argument(),
            backlog.enqueued + 1,
            self.capacity
        );

        backlog.items.push(environment);
        backlog.enqueued += 1;

        if backlog.enqueued == self.capacity {
            debug!("Cohort of {} drained", self.capacity);
            self.drained.send_replace(true);
        }

        Ok(())
    }

    /// Wait until the whole cohort is enqueued, then take the newest environment
    pub async fn dequeue(&self) -> Result<Environment, FanoutError> {
        let exhausted = FanoutError::CoordinatorExhausted {
            capacity: self.capacity,
        };

        let mut drained = self.drained.subscribe();
        if drained.wait_for(|done| *done).await.is_err() {
            return Err(exhausted);
        }

        self.backlog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .pop()
            .ok_or(exhausted)
    }
}

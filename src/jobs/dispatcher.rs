//! Bounded fire-and-forget job dispatcher.
//!
//! Each accepted job runs as its own tokio task. Admission is gated by a
//! semaphore sized to the dispatcher capacity: a job holds one permit from the
//! moment it is accepted until its task finishes, whether it succeeds, fails
//! or panics. When no permit is free, `submit` refuses the job instead of
//! queueing it, which is the service's only backpressure signal.
//!
//! ```text
//!  handler ──submit──► try_acquire ──ok──► spawn task ──► job ──► on_error? ──► drop permit
//!     ▲                     │
//!     └── accepted=false ◄──┘ (no permit)
//! ```
//!
//! Jobs are not durable. Anything still running when the process exits is
//! lost; [`JobDispatcher::shutdown`] only offers a bounded grace period.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

type JobFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;
type ErrorObserver = Box<dyn FnOnce(&anyhow::Error) -> anyhow::Result<()> + Send + 'static>;

/// A unit of background work.
///
/// The future is not polled until the dispatcher accepts and spawns it.
pub struct Job {
    label: &'static str,
    body: JobFuture,
    on_error: Option<ErrorObserver>,
}

impl Job {
    /// Wraps a future as a job. `label` names the job in logs.
    pub fn new<F>(label: &'static str, body: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Job {
            label,
            body: Box::pin(body),
            on_error: None,
        }
    }

    /// Attaches an observer that receives the job's error if it fails.
    ///
    /// If the observer itself fails, both errors are logged.
    pub fn on_error<O>(mut self, observer: O) -> Self
    where
        O: FnOnce(&anyhow::Error) -> anyhow::Result<()> + Send + 'static,
    {
        self.on_error = Some(Box::new(observer));
        self
    }

    async fn run(self) {
        let Job {
            label,
            body,
            on_error,
        } = self;

        let job_error = match body.await {
            Ok(()) => {
                debug!(job = label, "Job completed");
                return;
            }
            Err(e) => e,
        };

        match on_error {
            Some(observer) => {
                if let Err(observer_error) = observer(&job_error) {
                    error!(
                        job = label,
                        error = %job_error,
                        observer_error = %observer_error,
                        "Job failed and its error observer also failed"
                    );
                }
            }
            None => {
                error!(job = label, error = %job_error, "Job failed");
            }
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label)
            .field("has_observer", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Result of a [`JobDispatcher::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// Whether the job was accepted and spawned.
    pub accepted: bool,
    /// Jobs outstanding after this call (including this one if accepted).
    pub pending: usize,
    /// Dispatcher capacity.
    pub max_pending: usize,
}

/// Runs jobs in the background with a ceiling on outstanding work.
///
/// Clones share the same capacity and task set.
#[derive(Clone)]
pub struct JobDispatcher {
    permits: Arc<Semaphore>,
    max_pending: usize,
    tracker: TaskTracker,
}

impl JobDispatcher {
    /// Creates a dispatcher that admits at most `max_pending` outstanding jobs.
    ///
    /// A capacity of zero rejects every submission.
    pub fn new(max_pending: usize) -> Self {
        info!(max_pending, "Creating job dispatcher");
        JobDispatcher {
            permits: Arc::new(Semaphore::new(max_pending)),
            max_pending,
            tracker: TaskTracker::new(),
        }
    }

    /// Returns the dispatcher capacity.
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Returns the number of jobs currently outstanding.
    pub fn pending(&self) -> usize {
        self.max_pending - self.permits.available_permits()
    }

    /// Submits a job without waiting for it.
    ///
    /// On acceptance the pending count is already incremented when this
    /// returns. A rejected job is dropped without being polled; callers should
    /// treat rejection as "try again later". Must be called from within a
    /// tokio runtime.
    pub fn submit(&self, job: Job) -> Submission {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    job = job.label,
                    max_pending = self.max_pending,
                    "Job rejected: dispatcher at capacity"
                );
                return Submission {
                    accepted: false,
                    pending: self.pending(),
                    max_pending: self.max_pending,
                };
            }
        };

        let pending = self.pending();
        debug!(job = job.label, pending, "Job accepted");

        self.tracker.spawn(async move {
            // Held for the whole task so the slot is released exactly once,
            // including when the job panics and the task is torn down.
            let _permit = permit;
            job.run().await;
        });

        Submission {
            accepted: true,
            pending,
            max_pending: self.max_pending,
        }
    }

    /// Closes the task tracker and waits up to `grace` for outstanding jobs
    /// to finish.
    ///
    /// Returns the number of jobs still outstanding when the wait ended.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.tracker.close();
        let outstanding = self.pending();
        if outstanding > 0 {
            info!(outstanding, grace_secs = grace.as_secs(), "Waiting for background jobs");
        }

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            let abandoned = self.pending();
            warn!(abandoned, "Shutdown grace period elapsed with jobs still running");
            return abandoned;
        }
        0
    }
}

impl fmt::Debug for JobDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDispatcher")
            .field("pending", &self.pending())
            .field("max_pending", &self.max_pending)
            .finish_non_exhaustive()
    }
}

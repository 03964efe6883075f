use anyhow::Context;
use ehub_events::{DispatchTarget, Job};
use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, OnceLock, mpsc as std_mpsc},
    thread::{self, ThreadId},
};
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

const MAIN_QUEUE_LABEL: &str = "ehub-main";

/// A serial execution context backed by one dedicated thread.
///
/// Jobs run one at a time in submission order. Clones share the same thread;
/// once the last clone is dropped the thread drains the remaining jobs and exits.
/// A panicking job is logged and does not stop the queue.
#[derive(Clone)]
pub struct SerialQueue {
    label: Arc<str>,
    sender: mpsc::UnboundedSender<Job>,
    thread: ThreadId,
}

impl SerialQueue {
    /// Starts a queue whose worker thread is named `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn new(label: impl Into<String>) -> anyhow::Result<Self> {
        let label: Arc<str> = Arc::from(label.into());
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let worker_label = Arc::clone(&label);
        let handle = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!(queue = %worker_label, "Job panicked on serial queue");
                    }
                }
                trace!(queue = %worker_label, "Serial queue drained");
            })
            .with_context(|| format!("Failed to spawn serial queue '{label}'"))?;

        Ok(Self { thread: handle.thread().id(), label, sender })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the calling thread is this queue's worker.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    /// Blocks until every job submitted before this call has run.
    ///
    /// Returns immediately when called from the queue itself.
    pub fn barrier(&self) {
        if self.is_current() {
            return;
        }
        let (done, wait) = std_mpsc::sync_channel::<()>(1);
        self.dispatch(Box::new(move || {
            let _ = done.send(());
        }));
        if wait.recv().is_err() {
            warn!(queue = %self.label, "Serial queue stopped before reaching barrier");
        }
    }
}

impl DispatchTarget for SerialQueue {
    fn dispatch(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!(queue = %self.label, "Serial queue is closed, job dropped");
        }
    }
}

impl fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.label)
            .field("thread", &self.thread)
            .finish_non_exhaustive()
    }
}

static MAIN_QUEUE: OnceLock<SerialQueue> = OnceLock::new();

/// The process-wide default callback queue, labelled `ehub-main`.
///
/// # Panics
///
/// Panics if the queue thread cannot be spawned on first use.
pub fn main_queue() -> &'static SerialQueue {
    MAIN_QUEUE.get_or_init(|| {
        SerialQueue::new(MAIN_QUEUE_LABEL).expect("CRITICAL: Failed to start the main serial queue")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_jobs_run_in_submission_order() {
        let queue = SerialQueue::new("order").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..100 {
            let seen = Arc::clone(&seen);
            queue.dispatch(Box::new(move || seen.lock().push(i)));
        }
        queue.barrier();

        assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_jobs_run_on_the_named_thread() {
        let queue = SerialQueue::new("named-queue").unwrap();
        let observed = Arc::new(Mutex::new(None));
        let is_current = Arc::new(Mutex::new(false));

        let (name, current, probe) = (Arc::clone(&observed), Arc::clone(&is_current), queue.clone());
        queue.dispatch(Box::new(move || {
            *name.lock() = thread::current().name().map(str::to_owned);
            *current.lock() = probe.is_current();
        }));
        queue.barrier();

        assert_eq!(observed.lock().as_deref(), Some("named-queue"));
        assert!(*is_current.lock());
        assert!(!queue.is_current());
        assert_eq!(queue.label(), "named-queue");
    }

    #[test]
    fn test_panicking_job_does_not_stop_the_queue() {
        let queue = SerialQueue::new("resilient").unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        queue.dispatch(Box::new(|| panic!("listener failure")));
        let counter = Arc::clone(&ran);
        queue.dispatch(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        queue.barrier();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_barrier_on_the_queue_itself_returns() {
        let queue = SerialQueue::new("reentrant").unwrap();
        let reached = Arc::new(AtomicUsize::new(0));

        let (inner, counter) = (queue.clone(), Arc::clone(&reached));
        queue.dispatch(Box::new(move || {
            inner.barrier();
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        queue.barrier();

        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_queue_drains_pending_jobs() {
        let ran = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = std_mpsc::channel();
        {
            let queue = SerialQueue::new("draining").unwrap();
            for _ in 0..10 {
                let counter = Arc::clone(&ran);
                queue.dispatch(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
            queue.dispatch(Box::new(move || tx.send(()).unwrap()));
        }

        rx.recv_timeout(std::time::Duration::from_secs(2)).unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_main_queue_is_a_singleton() {
        assert!(std::ptr::eq(main_queue(), main_queue()));
        assert_eq!(main_queue().label(), MAIN_QUEUE_LABEL);
    }
}

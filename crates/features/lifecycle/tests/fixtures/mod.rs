use ehub_events::{DispatchTarget, Job};
use ehub_lifecycle::{ApplicationState, ApplicationStatus, LifecyclePlatform, ManualPlatform};
use ehub_runtime::SerialQueue;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

/// Runs every job on the emitting thread.
#[derive(Debug, Default)]
pub struct Inline;

impl DispatchTarget for Inline {
    fn dispatch(&self, job: Job) {
        job();
    }
}

/// Collects jobs in hand-over order and holds the first hand-over back until
/// a second one arrives or `hold` elapses.
pub struct Staggered {
    hold: Duration,
    first_taken: AtomicBool,
    entered: Mutex<mpsc::Sender<()>>,
    second_tx: Mutex<mpsc::Sender<()>>,
    second_rx: Mutex<mpsc::Receiver<()>>,
    jobs: Mutex<Vec<Job>>,
}

impl Staggered {
    /// Returns the target and a receiver signalled once the first hand-over is held.
    #[must_use]
    pub fn new(hold: Duration) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (entered, entered_rx) = mpsc::channel();
        let (second_tx, second_rx) = mpsc::channel();
        let target = Self {
            hold,
            first_taken: AtomicBool::new(false),
            entered: Mutex::new(entered),
            second_tx: Mutex::new(second_tx),
            second_rx: Mutex::new(second_rx),
            jobs: Mutex::new(Vec::new()),
        };
        (Arc::new(target), entered_rx)
    }

    /// Runs the collected jobs in the order they were handed over.
    pub fn run_all(&self) {
        let jobs = std::mem::take(&mut *self.jobs.lock());
        for job in jobs {
            job();
        }
    }
}

impl std::fmt::Debug for Staggered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Staggered").field("hold", &self.hold).field("jobs", &self.jobs.lock().len()).finish()
    }
}

impl DispatchTarget for Staggered {
    fn dispatch(&self, job: Job) {
        if self.first_taken.swap(true, Ordering::SeqCst) {
            let _ = self.second_tx.lock().send(());
        } else {
            let _ = self.entered.lock().send(());
            let _ = self.second_rx.lock().recv_timeout(self.hold);
        }
        self.jobs.lock().push(job);
    }
}

/// Ordered log of `(new, old)` pairs seen by a listener.
#[derive(Debug, Clone, Default)]
pub struct Transitions {
    seen: Arc<Mutex<Vec<(ApplicationStatus, ApplicationStatus)>>>,
}

impl Transitions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&self) -> impl Fn(ApplicationStatus, ApplicationStatus) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |new, old| seen.lock().push((new, old))
    }

    #[must_use]
    pub fn seen(&self) -> Vec<(ApplicationStatus, ApplicationStatus)> {
        self.seen.lock().clone()
    }
}

/// An observer over a fresh [`ManualPlatform`] that delivers inline.
#[must_use]
pub fn inline_observer(initial: ApplicationStatus) -> (Arc<ManualPlatform>, Arc<ApplicationState>) {
    let platform = Arc::new(ManualPlatform::new(initial));
    let state = ApplicationState::new(Arc::clone(&platform) as Arc<dyn LifecyclePlatform>, Arc::new(Inline));
    (platform, state)
}

/// An observer over a fresh [`ManualPlatform`] that delivers on a serial queue.
///
/// # Panics
/// * If the queue thread cannot be spawned.
#[must_use]
pub fn queued_observer(
    initial: ApplicationStatus,
    label: &str,
) -> (Arc<ManualPlatform>, Arc<ApplicationState>, SerialQueue) {
    let platform = Arc::new(ManualPlatform::new(initial));
    let queue = SerialQueue::new(label).expect("callback queue");
    let state = ApplicationState::new(
        Arc::clone(&platform) as Arc<dyn LifecyclePlatform>,
        Arc::new(queue.clone()),
    );
    (platform, state, queue)
}

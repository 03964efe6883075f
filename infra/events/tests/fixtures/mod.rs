use ehub_events::{DispatchTarget, Job};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts how often the listeners it hands out were invoked.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    hits: Arc<AtomicUsize>,
}

impl Probe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener<P>(&self) -> impl Fn(&P) + Send + Sync + 'static {
        let hits = Arc::clone(&self.hits);
        move |_: &P| {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Records labelled invocations in order.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener<P: std::fmt::Debug>(&self, label: &'static str) -> impl Fn(&P) + Send + Sync + 'static {
        let entries = Arc::clone(&self.entries);
        move |payload: &P| entries.lock().push(format!("{label}:{payload:?}"))
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// Runs jobs inline and counts how many were handed over.
#[derive(Debug, Default)]
pub struct CountingTarget {
    dispatched: AtomicUsize,
}

impl CountingTarget {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

impl DispatchTarget for CountingTarget {
    fn dispatch(&self, job: Job) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        job();
    }
}

/// Builds a runtime whose threads are all named `name`.
///
/// # Panics
/// * If the runtime cannot be created.
#[must_use]
pub fn named_runtime(name: &str) -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name(name)
        .build()
        .expect("test runtime")
}

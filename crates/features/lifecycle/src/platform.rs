use crate::status::{ApplicationStatus, LifecycleSignal};
use ehub_events::EventHub;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// The host side of the lifecycle observer.
///
/// A platform reports its current status on demand and posts
/// [`LifecycleSignal`]s on its signal hub whenever that status may have moved.
pub trait LifecyclePlatform: Send + Sync {
    fn current_status(&self) -> ApplicationStatus;

    fn signals(&self) -> &EventHub<LifecycleSignal, ()>;
}

/// A platform whose status is driven by the embedding process.
///
/// Signals are delivered synchronously on the posting thread.
#[derive(Debug)]
pub struct ManualPlatform {
    status: RwLock<ApplicationStatus>,
    signals: EventHub<LifecycleSignal, ()>,
}

impl Default for ManualPlatform {
    /// Starts `Inactive`, as a process that has launched but not yet become active.
    fn default() -> Self {
        Self::new(ApplicationStatus::Inactive)
    }
}

impl ManualPlatform {
    #[must_use]
    pub fn new(initial: ApplicationStatus) -> Self {
        Self { status: RwLock::new(initial), signals: EventHub::new() }
    }

    /// The platform behind [`crate::ApplicationState::shared`] unless another one was installed.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<ManualPlatform>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::default())))
    }

    /// Records `status` without posting a signal.
    pub fn set_status(&self, status: ApplicationStatus) {
        *self.status.write() = status;
    }

    /// Posts `signal` to every observer.
    pub fn post(&self, signal: LifecycleSignal) {
        debug!(%signal, "Posting lifecycle signal");
        self.signals.notify(&signal);
    }

    /// Records `status`, then posts `signal`.
    pub fn transition(&self, status: ApplicationStatus, signal: LifecycleSignal) {
        self.set_status(status);
        self.post(signal);
    }

    /// Moves to the status `signal` implies and posts it.
    pub fn signal(&self, signal: LifecycleSignal) {
        self.transition(signal.implied_status(), signal);
    }
}

impl LifecyclePlatform for ManualPlatform {
    fn current_status(&self) -> ApplicationStatus {
        *self.status.read()
    }

    fn signals(&self) -> &EventHub<LifecycleSignal, ()> {
        &self.signals
    }
}

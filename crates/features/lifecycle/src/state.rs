use crate::error::LifecycleError;
use crate::platform::{LifecyclePlatform, ManualPlatform};
use crate::status::{ApplicationStatus, LifecycleSignal, StatusChange};
use ehub_events::{DispatchTarget, Disposable, DisposeBag, EventHub, ListenerHandle};
use ehub_runtime::main_queue;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};

const CHANGE: &str = "change";

static SHARED: OnceLock<Arc<ApplicationState>> = OnceLock::new();

/// Tracks the host application's status and publishes changes.
///
/// Listeners receive [`ApplicationStatus`] updates on the configured callback
/// target. Registering a listener replays the current status to that listener
/// alone, synchronously, before the registration call returns.
pub struct ApplicationState {
    platform: Arc<dyn LifecyclePlatform>,
    status: Mutex<ApplicationStatus>,
    /// Held from the platform read until the change is handed to the target,
    /// so targets receive changes in the order they were recorded.
    publish: ReentrantMutex<()>,
    callback_target: RwLock<Arc<dyn DispatchTarget>>,
    hub: EventHub<&'static str, StatusChange>,
    subscriptions: DisposeBag,
}

impl ApplicationState {
    /// Starts observing `platform`, delivering changes on `callback_target`.
    ///
    /// The observer unsubscribes from the platform when the returned `Arc` is
    /// released.
    pub fn new(
        platform: Arc<dyn LifecyclePlatform>,
        callback_target: Arc<dyn DispatchTarget>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let subscriptions = DisposeBag::new();
            let observer = Weak::clone(weak);
            platform
                .signals()
                .on_any_of(LifecycleSignal::ALL, move |_: &()| {
                    if let Some(state) = observer.upgrade() {
                        state.refresh();
                    }
                })
                .add_to(&subscriptions);

            let status = platform.current_status();
            debug!(%status, "Application state observer started");

            Self {
                status: Mutex::new(status),
                publish: ReentrantMutex::new(()),
                callback_target: RwLock::new(callback_target),
                hub: EventHub::new(),
                platform,
                subscriptions,
            }
        })
    }

    /// The process-wide observer.
    ///
    /// Created on first use over [`ManualPlatform::shared`], delivering on
    /// [`main_queue`], unless [`ApplicationState::install`] ran first.
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| {
            Self::new(ManualPlatform::shared(), Arc::new(main_queue().clone()))
        }))
    }

    /// Sets up the process-wide observer explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyInitialized`] if the shared observer
    /// already exists.
    pub fn install(
        platform: Arc<dyn LifecyclePlatform>,
        callback_target: Arc<dyn DispatchTarget>,
    ) -> Result<Arc<Self>, LifecycleError> {
        if SHARED.get().is_some() {
            return Err(LifecycleError::AlreadyInitialized { context: None });
        }
        let state = Self::new(platform, callback_target);
        SHARED.set(Arc::clone(&state)).map_err(|_| LifecycleError::AlreadyInitialized {
            context: Some("lost initialization race".into()),
        })?;
        Ok(state)
    }

    /// The last status this observer recorded.
    #[must_use]
    pub fn status(&self) -> ApplicationStatus {
        *self.status.lock()
    }

    #[must_use]
    pub fn callback_target(&self) -> Arc<dyn DispatchTarget> {
        Arc::clone(&*self.callback_target.read())
    }

    /// Changes where subsequent notifications are delivered.
    pub fn set_callback_target(&self, target: Arc<dyn DispatchTarget>) {
        *self.callback_target.write() = target;
    }

    /// Calls `listener` with every new status, and once right away with the
    /// current one.
    #[must_use = "Dropping the handle keeps the listener; dispose it to stop notifications"]
    pub fn add_change_listener(
        &self,
        listener: impl Fn(ApplicationStatus) + Send + Sync + 'static,
    ) -> ListenerHandle {
        let listener = Arc::new(listener);
        let registered = Arc::clone(&listener);
        let handle = self.hub.on(CHANGE, move |change: &StatusChange| registered(change.new));

        listener(self.status());
        handle
    }

    /// Calls `listener` with `(new, old)` on every change, and once right away
    /// with `(current, current)`.
    #[must_use = "Dropping the handle keeps the listener; dispose it to stop notifications"]
    pub fn add_transition_listener(
        &self,
        listener: impl Fn(ApplicationStatus, ApplicationStatus) + Send + Sync + 'static,
    ) -> ListenerHandle {
        let listener = Arc::new(listener);
        let registered = Arc::clone(&listener);
        let handle =
            self.hub.on(CHANGE, move |change: &StatusChange| registered(change.new, change.old));

        let current = self.status();
        listener(current, current);
        handle
    }

    /// Re-reads the platform status and publishes it if it differs from the
    /// recorded one.
    ///
    /// The platform is read once. Read, compare, swap and hand-over to the
    /// callback target are serialized across threads, so a serial target
    /// delivers an unbroken `(new, old)` chain. A listener running inline may
    /// refresh again on the same thread. Returns whether a change was published.
    pub fn refresh(&self) -> bool {
        let _publish = self.publish.lock();
        let observed = self.platform.current_status();
        let change = {
            let mut status = self.status.lock();
            if *status == observed {
                None
            } else {
                let old = std::mem::replace(&mut *status, observed);
                Some(StatusChange { new: observed, old })
            }
        };

        let Some(change) = change else {
            trace!(status = %observed, "Lifecycle signal without status change");
            return false;
        };

        debug!(new = %change.new, old = %change.old, "Application status changed");
        let target = self.callback_target();
        self.hub.emit_on(&CHANGE, target.as_ref(), change);
        true
    }

    /// Number of change and transition listeners currently registered.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.hub.listener_count(None)
    }
}

impl fmt::Debug for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationState")
            .field("status", &self.status())
            .field("listeners", &self.listener_count())
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

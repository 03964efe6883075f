use crate::listener::ListenerId;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Weak;
use tracing::trace;

/// Something that releases a subscription or resource when disposed.
///
/// Disposal is idempotent: calling [`Disposable::dispose`] again is a no-op.
pub trait Disposable {
    /// Releases the underlying registration, if it is still present.
    fn dispose(&self);

    /// Hands `self` over to `bag`, which disposes it together with its other entries.
    fn add_to(self, bag: &DisposeBag)
    where
        Self: Sized + Send + Sync + 'static,
    {
        bag.add(self);
    }
}

/// Removal hook a hub exposes to the handles it mints.
pub(crate) trait Unregister: Send + Sync {
    fn unregister(&self, id: ListenerId) -> bool;

    fn is_registered(&self, id: ListenerId) -> bool;
}

/// Cancellation handle returned by every registration on an [`EventHub`](crate::EventHub).
///
/// The handle holds only a weak reference to the hub: it never keeps the hub
/// alive, and disposing it after the hub is gone does nothing. Dropping the
/// handle does **not** cancel the listener.
#[derive(Clone)]
pub struct ListenerHandle {
    registration: Option<(ListenerId, Weak<dyn Unregister>)>,
}

impl ListenerHandle {
    pub(crate) fn new(id: ListenerId, owner: Weak<dyn Unregister>) -> Self {
        Self { registration: Some((id, owner)) }
    }

    /// A handle bound to nothing, returned for empty any-of key sets.
    pub(crate) const fn inert() -> Self {
        Self { registration: None }
    }

    /// Identity of the listener this handle controls, or `None` for an inert handle.
    #[must_use]
    pub fn id(&self) -> Option<ListenerId> {
        self.registration.as_ref().map(|(id, _)| *id)
    }

    /// Returns `true` while the listener is still registered with a live hub.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registration
            .as_ref()
            .and_then(|(id, owner)| owner.upgrade().map(|owner| owner.is_registered(*id)))
            .unwrap_or(false)
    }
}

impl Disposable for ListenerHandle {
    fn dispose(&self) {
        let Some((id, owner)) = &self.registration else {
            return;
        };
        let Some(owner) = owner.upgrade() else {
            trace!(listener = %id, "Dispose skipped: hub already dropped");
            return;
        };
        if owner.unregister(*id) {
            trace!(listener = %id, "Listener disposed");
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id()).finish_non_exhaustive()
    }
}

/// Collects disposables and disposes them together, in insertion order.
///
/// The bag also disposes its contents when dropped.
#[derive(Default)]
pub struct DisposeBag {
    items: Mutex<Vec<Box<dyn Disposable + Send + Sync>>>,
}

impl DisposeBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `disposable` to the bag.
    pub fn add(&self, disposable: impl Disposable + Send + Sync + 'static) {
        self.items.lock().push(Box::new(disposable));
    }

    /// Number of entries waiting to be disposed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl Disposable for DisposeBag {
    fn dispose(&self) {
        // Entries may touch this bag again while disposing.
        let items = std::mem::take(&mut *self.items.lock());
        if items.is_empty() {
            return;
        }
        trace!(count = items.len(), "Disposing bag");
        for item in items {
            item.dispose();
        }
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeBag").field("len", &self.len()).finish()
    }
}

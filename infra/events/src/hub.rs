use crate::dispatch::DispatchTarget;
use crate::disposable::{ListenerHandle, Unregister};
use crate::listener::{Callback, IdGenerator, Listener, ListenerId, ListenerLifetime};
use crate::table::{Matches, Table};
use fxhash::FxHashSet;
use parking_lot::Mutex;
use std::any::type_name;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

struct Shared<K, P> {
    table: Mutex<Table<K, P>>,
    ids: IdGenerator,
}

impl<K, P> Unregister for Shared<K, P>
where
    K: Eq + Hash + Clone + Send,
    P: Send + Sync,
{
    fn unregister(&self, id: ListenerId) -> bool {
        self.table.lock().remove(id)
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.table.lock().contains(id)
    }
}

/// A thread-safe publish/subscribe hub keyed by `K`, delivering payloads of type `P`.
///
/// Cloning the hub is cheap and yields another handle to the same listener
/// table. The table is released once the last clone is dropped; outstanding
/// [`ListenerHandle`]s never keep it alive.
///
/// # Delivery
///
/// An emission selects the listeners registered for its key (single-key
/// registrations first, then any-of registrations, each in registration
/// order) and removes the `Once` listeners among them while holding the lock.
/// Callbacks run after the lock is released, so a callback may register,
/// dispose or emit on the same hub.
///
/// # Examples
///
/// ```rust
/// use ehub_events::EventHub;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let hub = EventHub::<&str, u32>::new();
/// let total = Arc::new(AtomicU32::new(0));
///
/// let sum = Arc::clone(&total);
/// let _handle = hub.on("tick", move |value: &u32| {
///     sum.fetch_add(*value, Ordering::SeqCst);
/// });
///
/// hub.emit(&"tick", 2);
/// hub.emit(&"tick", 3);
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
pub struct EventHub<K, P> {
    shared: Arc<Shared<K, P>>,
}

impl<K, P> Clone for EventHub<K, P> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<K, P> Default for EventHub<K, P> {
    fn default() -> Self {
        Self { shared: Arc::new(Shared { table: Mutex::new(Table::default()), ids: IdGenerator::new() }) }
    }
}

impl<K, P> EventHub<K, P>
where
    K: Eq + Hash + Clone + Send + 'static,
    P: Send + Sync + 'static,
{
    /// Creates a hub with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent listener for `key`.
    #[must_use = "Dropping the handle leaves the listener registered with no way to cancel it"]
    pub fn on(&self, key: K, listener: impl Fn(&P) + Send + Sync + 'static) -> ListenerHandle {
        self.register(key, ListenerLifetime::Always, Arc::new(listener))
    }

    /// Registers a listener for `key` that is removed by its first matching emission.
    pub fn once(&self, key: K, listener: impl Fn(&P) + Send + Sync + 'static) -> ListenerHandle {
        self.register(key, ListenerLifetime::Once, Arc::new(listener))
    }

    /// Registers a persistent listener that fires for any of `keys`.
    ///
    /// An empty key set registers nothing and returns a handle whose disposal
    /// is a no-op. A single key behaves exactly like [`EventHub::on`].
    #[must_use = "Dropping the handle leaves the listener registered with no way to cancel it"]
    pub fn on_any_of(
        &self,
        keys: impl IntoIterator<Item = K>,
        listener: impl Fn(&P) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.register_any_of(keys, ListenerLifetime::Always, Arc::new(listener))
    }

    /// Registers a listener that fires for the first emission of any of `keys`,
    /// then leaves all of them.
    pub fn once_any_of(
        &self,
        keys: impl IntoIterator<Item = K>,
        listener: impl Fn(&P) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.register_any_of(keys, ListenerLifetime::Once, Arc::new(listener))
    }

    /// Delivers `payload` synchronously to the listeners of `key`.
    ///
    /// Every callback has returned by the time this call returns. A panicking
    /// callback unwinds into the caller; the remaining listeners of this
    /// emission are skipped.
    pub fn emit(&self, key: &K, payload: P) {
        self.dispatch(key, None, || payload);
    }

    /// Like [`EventHub::emit`], but builds the payload only if a listener matches.
    pub fn emit_with(&self, key: &K, payload: impl FnOnce() -> P) {
        self.dispatch(key, None, payload);
    }

    /// Schedules delivery of `payload` to the listeners of `key` onto `target`.
    ///
    /// Returns once every invocation is handed to `target`, not once they ran.
    pub fn emit_on(&self, key: &K, target: &dyn DispatchTarget, payload: P) {
        self.dispatch(key, Some(target), || payload);
    }

    /// Like [`EventHub::emit_on`], but builds the payload only if a listener matches.
    pub fn emit_on_with(&self, key: &K, target: &dyn DispatchTarget, payload: impl FnOnce() -> P) {
        self.dispatch(key, Some(target), payload);
    }

    /// Removes listeners in bulk.
    ///
    /// With `Some(key)`, clears the single-key listeners of `key` and removes
    /// `key` from every any-of listener, dropping those left without keys.
    /// With `None`, clears the whole hub.
    pub fn remove_all_listeners(&self, key: Option<&K>) {
        let removed = {
            let mut table = self.shared.table.lock();
            match key {
                Some(key) => table.clear_key(key),
                None => table.clear(),
            }
        };
        debug!(event = type_name::<K>(), scoped = key.is_some(), removed, "Listeners removed");
    }

    /// Number of registered listeners.
    ///
    /// With `Some(key)`, counts the listeners an emission of `key` would reach.
    /// With `None`, counts every registration once, however many keys it spans.
    #[must_use]
    pub fn listener_count(&self, key: Option<&K>) -> usize {
        self.shared.table.lock().count(key)
    }

    fn register(&self, key: K, lifetime: ListenerLifetime, callback: Arc<Callback<P>>) -> ListenerHandle {
        let listener = Arc::new(Listener::new(self.shared.ids.next(), lifetime, callback));
        let id = listener.id();
        self.shared.table.lock().insert_single(key, listener);
        trace!(event = type_name::<K>(), listener = %id, ?lifetime, "Listener registered");
        self.handle(id)
    }

    fn register_any_of(
        &self,
        keys: impl IntoIterator<Item = K>,
        lifetime: ListenerLifetime,
        callback: Arc<Callback<P>>,
    ) -> ListenerHandle {
        let mut keys: FxHashSet<K> = keys.into_iter().collect();
        if keys.len() < 2 {
            return match keys.drain().next() {
                Some(key) => self.register(key, lifetime, callback),
                None => {
                    trace!(event = type_name::<K>(), "Empty key set; nothing registered");
                    ListenerHandle::inert()
                },
            };
        }

        let span = keys.len();
        let listener = Arc::new(Listener::new(self.shared.ids.next(), lifetime, callback));
        let id = listener.id();
        self.shared.table.lock().insert_any_of(keys, listener);
        trace!(event = type_name::<K>(), listener = %id, ?lifetime, keys = span, "Any-of listener registered");
        self.handle(id)
    }

    fn handle(&self, id: ListenerId) -> ListenerHandle {
        let owner = Arc::downgrade(&self.shared);
        let owner: Weak<dyn Unregister> = owner;
        ListenerHandle::new(id, owner)
    }

    fn dispatch(&self, key: &K, target: Option<&dyn DispatchTarget>, payload: impl FnOnce() -> P) {
        let Matches { listeners, pruned } = self.shared.table.lock().take_matches(key);

        if listeners.is_empty() {
            trace!(event = type_name::<K>(), "Event dropped: no listeners");
            return;
        }

        let payload = payload();
        trace!(
            event = type_name::<K>(),
            listeners = listeners.len(),
            pruned,
            scheduled = target.is_some(),
            "Event dispatched"
        );

        match target {
            None => {
                for listener in &listeners {
                    listener.invoke(&payload);
                }
            },
            Some(target) => {
                let payload = Arc::new(payload);
                for listener in listeners {
                    let payload = Arc::clone(&payload);
                    target.dispatch(Box::new(move || listener.invoke(&payload)));
                }
            },
        }
    }
}

impl<K> EventHub<K, ()>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Emits `key` synchronously on a hub without payload.
    pub fn notify(&self, key: &K) {
        self.emit(key, ());
    }

    /// Schedules `key` onto `target` on a hub without payload.
    pub fn notify_on(&self, key: &K, target: &dyn DispatchTarget) {
        self.emit_on(key, target, ());
    }
}

impl<K, P> fmt::Debug for EventHub<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("event", &type_name::<K>())
            .field("payload", &type_name::<P>())
            .finish_non_exhaustive()
    }
}

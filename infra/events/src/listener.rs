use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Closure type shared by every registered listener.
pub(crate) type Callback<P> = dyn Fn(&P) + Send + Sync;

/// How often a listener fires for the events it is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerLifetime {
    /// Removed from the hub by the first emission that matches it.
    Once,
    /// Stays registered until cancelled or cleared.
    Always,
}

/// Identity of a single registration within one hub.
///
/// Two listeners built from the same closure still receive distinct ids, so
/// cancellation never confuses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Mints monotonically increasing [`ListenerId`]s, starting at 1.
#[derive(Debug)]
pub(crate) struct IdGenerator(AtomicU64);

impl IdGenerator {
    pub(crate) const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub(crate) fn next(&self) -> ListenerId {
        ListenerId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// A callback tagged with its identity and lifetime.
pub(crate) struct Listener<P> {
    id: ListenerId,
    lifetime: ListenerLifetime,
    callback: Arc<Callback<P>>,
}

impl<P> Listener<P> {
    pub(crate) fn new(id: ListenerId, lifetime: ListenerLifetime, callback: Arc<Callback<P>>) -> Self {
        Self { id, lifetime, callback }
    }

    pub(crate) const fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) const fn is_once(&self) -> bool {
        matches!(self.lifetime, ListenerLifetime::Once)
    }

    pub(crate) fn invoke(&self, payload: &P) {
        (self.callback)(payload);
    }
}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).field("lifetime", &self.lifetime).finish()
    }
}

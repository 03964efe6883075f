use crate::listener::{Listener, ListenerId};
use fxhash::{FxHashMap, FxHashSet};
use std::hash::Hash;
use std::sync::Arc;

/// Where a live registration is stored.
#[derive(Debug)]
enum Slot<K> {
    Single(K),
    AnyOf,
}

#[derive(Debug)]
struct AnyOfEntry<K, P> {
    listener: Arc<Listener<P>>,
    keys: FxHashSet<K>,
}

/// Listeners selected by one emission, in invocation order.
#[derive(Debug)]
pub(crate) struct Matches<P> {
    pub(crate) listeners: Vec<Arc<Listener<P>>>,
    pub(crate) pruned: usize,
}

/// The registration table guarded by the hub lock.
///
/// Invariant: every listener stored in `singles` or `any_of` has exactly one
/// entry in `index`, and vice versa.
#[derive(Debug)]
pub(crate) struct Table<K, P> {
    singles: FxHashMap<K, Vec<Arc<Listener<P>>>>,
    any_of: Vec<AnyOfEntry<K, P>>,
    index: FxHashMap<ListenerId, Slot<K>>,
}

impl<K, P> Default for Table<K, P> {
    fn default() -> Self {
        Self { singles: FxHashMap::default(), any_of: Vec::new(), index: FxHashMap::default() }
    }
}

impl<K: Eq + Hash + Clone, P> Table<K, P> {
    pub(crate) fn insert_single(&mut self, key: K, listener: Arc<Listener<P>>) {
        self.index.insert(listener.id(), Slot::Single(key.clone()));
        self.singles.entry(key).or_default().push(listener);
    }

    pub(crate) fn insert_any_of(&mut self, keys: FxHashSet<K>, listener: Arc<Listener<P>>) {
        debug_assert!(keys.len() > 1, "any-of registrations span at least two keys");
        self.index.insert(listener.id(), Slot::AnyOf);
        self.any_of.push(AnyOfEntry { listener, keys });
    }

    /// Removes the registration with `id`. Returns `false` when it is already gone.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        match self.index.remove(&id) {
            Some(Slot::Single(key)) => {
                if let Some(list) = self.singles.get_mut(&key) {
                    list.retain(|listener| listener.id() != id);
                    if list.is_empty() {
                        self.singles.remove(&key);
                    }
                }
                true
            },
            Some(Slot::AnyOf) => {
                self.any_of.retain(|entry| entry.listener.id() != id);
                true
            },
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.index.contains_key(&id)
    }

    /// Collects the listeners matching `key` and prunes the `Once` ones.
    ///
    /// Single-key registrations come first, then any-of registrations, each in
    /// registration order. A pruned any-of listener leaves all of its keys.
    pub(crate) fn take_matches(&mut self, key: &K) -> Matches<P> {
        let mut listeners = Vec::new();

        if let Some(list) = self.singles.get_mut(key) {
            listeners.extend(list.iter().cloned());
            list.retain(|listener| !listener.is_once());
            if list.is_empty() {
                self.singles.remove(key);
            }
        }

        listeners.extend(
            self.any_of
                .iter()
                .filter(|entry| entry.keys.contains(key))
                .map(|entry| Arc::clone(&entry.listener)),
        );
        self.any_of.retain(|entry| !(entry.listener.is_once() && entry.keys.contains(key)));

        let mut pruned = 0;
        for listener in listeners.iter().filter(|listener| listener.is_once()) {
            self.index.remove(&listener.id());
            pruned += 1;
        }

        Matches { listeners, pruned }
    }

    /// Drops every single-key registration for `key` and strips `key` from the
    /// any-of registrations, removing those left without keys.
    ///
    /// Returns the number of registrations removed entirely.
    pub(crate) fn clear_key(&mut self, key: &K) -> usize {
        let mut removed = 0;

        if let Some(list) = self.singles.remove(key) {
            for listener in &list {
                self.index.remove(&listener.id());
            }
            removed += list.len();
        }

        let index = &mut self.index;
        self.any_of.retain_mut(|entry| {
            entry.keys.remove(key);
            if entry.keys.is_empty() {
                index.remove(&entry.listener.id());
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }

    /// Drops everything. Returns the number of registrations removed.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.index.len();
        self.singles.clear();
        self.any_of.clear();
        self.index.clear();
        removed
    }

    pub(crate) fn count(&self, key: Option<&K>) -> usize {
        key.map_or_else(
            || self.singles.values().map(Vec::len).sum::<usize>() + self.any_of.len(),
            |key| {
                let singles = self.singles.get(key).map_or(0, Vec::len);
                let any_of = self.any_of.iter().filter(|entry| entry.keys.contains(key)).count();
                singles + any_of
            },
        )
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let stored = self.singles.values().map(Vec::len).sum::<usize>() + self.any_of.len();
        stored == self.index.len()
            && self.singles.values().all(|list| !list.is_empty())
            && self.any_of.iter().all(|entry| !entry.keys.is_empty())
    }
}

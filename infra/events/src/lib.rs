//! # Event Hub
//!
//! A small, thread-safe publish/subscribe primitive for in-process event fan-out.
//!
//! ## Overview
//!
//! Callers register listener callbacks against keyed events on an [`EventHub`]
//! and receive a [`ListenerHandle`] back. Other callers emit events carrying a
//! typed payload; every listener registered for the emitted key runs, either
//! synchronously on the emitting thread or scheduled onto a [`DispatchTarget`].
//!
//! ## Features
//!
//! * **Lifetimes**: `on` listeners persist, `once` listeners fire at most once.
//! * **Any-of registrations**: one listener watching several keys.
//! * **Lazy payloads**: `emit_with` builds the payload only when somebody listens.
//! * **Re-entrancy**: callbacks run outside the lock and may use the hub freely.
//! * **Safe cancellation**: handles are weak; disposing twice, or after the
//!   hub is gone, is a no-op. [`DisposeBag`] cancels many handles at once.
//!
//! # Example
//!
//! ```rust
//! use ehub_events::{Disposable, DisposeBag, EventHub};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Topic { Saved, Deleted }
//!
//! let hub = EventHub::<Topic, String>::new();
//! let bag = DisposeBag::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! hub.on_any_of([Topic::Saved, Topic::Deleted], move |_: &String| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! })
//! .add_to(&bag);
//!
//! hub.emit(&Topic::Saved, "users/42".to_owned());
//! bag.dispose();
//! hub.emit(&Topic::Deleted, "users/42".to_owned());
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! assert_eq!(hub.listener_count(None), 0);
//! ```

mod dispatch;
mod disposable;
mod hub;
mod listener;
mod table;

pub use dispatch::{DispatchTarget, Job};
pub use disposable::{Disposable, DisposeBag, ListenerHandle};
pub use hub::EventHub;
pub use listener::{ListenerId, ListenerLifetime};

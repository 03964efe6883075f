//! # Application Lifecycle
//!
//! Observes the host application's foreground state and publishes changes
//! through an [`ehub_events::EventHub`].
//!
//! The host posts [`LifecycleSignal`]s on its [`LifecyclePlatform`];
//! [`ApplicationState`] re-reads the platform status on each signal and, when it
//! moved, emits a [`StatusChange`] on the configured callback target (the
//! process [`main_queue`](ehub_runtime::main_queue) by default).
//!
//! New listeners get the current status immediately, synchronously, in
//! addition to later changes.
//!
//! ## Example
//!
//! ```rust
//! use ehub_lifecycle::{ApplicationState, ApplicationStatus, LifecycleSignal, ManualPlatform};
//! use ehub_runtime::SerialQueue;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let platform = Arc::new(ManualPlatform::new(ApplicationStatus::Active));
//! let callbacks = SerialQueue::new("lifecycle")?;
//! let state = ApplicationState::new(platform.clone(), Arc::new(callbacks.clone()));
//!
//! let _handle = state.add_change_listener(|status| println!("now {status}"));
//! platform.signal(LifecycleSignal::DidEnterBackground);
//! callbacks.barrier();
//!
//! assert_eq!(state.status(), ApplicationStatus::Background);
//! # Ok(())
//! # }
//! ```

mod error;
mod platform;
mod state;
mod status;

pub use crate::error::{LifecycleError, LifecycleErrorExt};
pub use crate::platform::{LifecyclePlatform, ManualPlatform};
pub use crate::state::ApplicationState;
pub use crate::status::{ApplicationStatus, LifecycleSignal, StatusChange};

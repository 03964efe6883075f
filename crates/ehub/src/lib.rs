//! Facade crate for the event hub workspace.
//! Re-exports the core hub, execution contexts, logger and lifecycle observer,
//! and owns the layered configuration that wires them together.
//! Keep this crate thin: it composes other crates, it does not implement hub logic.
//!
//! ## Usage
//! - Load a [`config::HubConfig`] with [`config::load_config`].
//! - Call [`start_logger`], then build contexts from [`config::RuntimeSettings`].

pub mod config;

pub use ehub_events as events;
pub use ehub_lifecycle as lifecycle;
pub use ehub_logger as logger;
pub use ehub_runtime as runtime;

pub use ehub_events::{
    DispatchTarget, Disposable, DisposeBag, EventHub, Job, ListenerHandle, ListenerId, ListenerLifetime,
};

use crate::config::{LifecycleConfig, LoggingConfig};
use ehub_logger::{Logger, LoggerError, LoggerErrorExt, parse_level};
use ehub_runtime::{SerialQueue, main_queue};

/// Installs the global tracing subscriber described by `config`.
///
/// # Errors
///
/// Returns a [`LoggerError`] for an unknown level, invalid filter directives, an
/// unusable log directory, or when a subscriber is already installed.
pub fn start_logger(config: &LoggingConfig) -> Result<Logger, LoggerError> {
    let level = parse_level(&config.level).context("logger.level")?;

    let builder = Logger::builder()
        .name(config.name.as_str())
        .level(level)
        .console(config.console)
        .trace_dispatch(config.trace_dispatch);
    let builder = match &config.env_filter {
        Some(filter) => builder.env_filter(filter.as_str()),
        None => builder,
    };

    match &config.directory {
        Some(directory) => builder.path(directory).json(config.json).init(),
        None => builder.init(),
    }
}

/// The queue lifecycle notifications should be delivered on.
///
/// # Errors
///
/// Returns an error if a dedicated callback queue cannot be started.
pub fn lifecycle_callback_queue(config: &LifecycleConfig) -> ehub_runtime::Result<SerialQueue> {
    match &config.callback_queue {
        Some(label) => SerialQueue::new(label.as_str()),
        None => Ok(main_queue().clone()),
    }
}

//! # Runtime
//!
//! Execution contexts that event listeners can be dispatched onto.
//!
//! * **Tokio profiles**: [`RuntimeConfig`] presets for building multi-threaded
//!   runtimes; pass `runtime.handle()` to `EventHub::emit_on`.
//! * **Serial queues**: [`SerialQueue`] runs jobs one at a time, in submission
//!   order, on a dedicated thread.
//! * **Process-wide contexts**: [`global_runtime`] and [`main_queue`] are
//!   created lazily on first use and live until the process exits.
//!
//! ## Example
//!
//! ```rust
//! use ehub_events::EventHub;
//! use ehub_runtime::SerialQueue;
//!
//! # fn main() -> anyhow::Result<()> {
//! let queue = SerialQueue::new("ui")?;
//! let hub = EventHub::<&str, u32>::new();
//! let _handle = hub.on("tick", |value: &u32| assert_eq!(*value, 1));
//!
//! hub.emit_on(&"tick", &queue, 1);
//! queue.barrier();
//! # Ok(())
//! # }
//! ```

mod queue;

pub use anyhow::Result;
pub use queue::{SerialQueue, main_queue};

use anyhow::anyhow;
use serde::Deserialize;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// Fallback worker count when parallelism cannot be detected.
const DEFAULT_WORKER_THREADS: usize = 4;
const MAX_WORKER_THREADS: usize = 1024;
/// 2 `MiB`, enough for listener bodies that recurse through `emit`.
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 1024 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);
const DEFAULT_THREAD_NAME: &str = "ehub-worker";

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

/// `TOKIO_WORKER_THREADS` if set and sane, otherwise the available parallelism.
fn detected_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= MAX_WORKER_THREADS)
            .unwrap_or_else(|| {
                available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

fn thread_name_or_default(name: String) -> String {
    if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name }
}

/// Named runtime presets, selectable from configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeProfile {
    #[default]
    Default,
    HighPerformance,
    MemoryEfficient,
}

/// Configuration for a dispatch runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detected_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl From<RuntimeProfile> for RuntimeConfig {
    fn from(profile: RuntimeProfile) -> Self {
        match profile {
            RuntimeProfile::Default => Self::default(),
            RuntimeProfile::HighPerformance => Self::high_performance(),
            RuntimeProfile::MemoryEfficient => Self::memory_efficient(),
        }
    }
}

impl RuntimeConfig {
    /// Preset for hubs with heavy fan-out onto many workers.
    #[must_use = "Use this configuration for high-throughput dispatch"]
    pub fn high_performance() -> Self {
        Self {
            worker_threads: detected_worker_threads(),
            stack_size: 4 * 1024 * 1024,
            thread_name: "ehub-hp".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
        }
    }

    /// Preset for embedded or client processes where footprint matters.
    #[must_use = "Use this configuration for low-footprint dispatch"]
    pub fn memory_efficient() -> Self {
        Self {
            worker_threads: (detected_worker_threads() / 2).max(1),
            stack_size: MIN_STACK_SIZE,
            thread_name: "ehub-mem".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = thread_name_or_default(name.into());
        self
    }

    #[must_use = "Customize how long idle threads stay alive"]
    pub const fn with_thread_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.thread_keep_alive = keep_alive;
        self
    }

    fn normalized(&self) -> Self {
        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKER_THREADS),
            stack_size: self.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE),
            thread_name: thread_name_or_default(self.thread_name.clone()),
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Builds a multi-threaded runtime from `config`.
///
/// Out-of-range values are clamped before the runtime is built.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
///
/// # Examples
///
/// ```rust
/// use ehub_runtime::{RuntimeConfig, build_runtime_with_config};
///
/// let config = RuntimeConfig::memory_efficient().with_worker_threads(1);
/// let runtime = build_runtime_with_config(&config)?;
/// runtime.block_on(async {});
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building dispatch runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

/// Builds a runtime with the default configuration.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the runtime cannot be created.
pub fn build_service_runtime() -> Result<Runtime> {
    let config = RuntimeConfig::default();
    info!(threads = config.worker_threads, stack = config.stack_size, "Initializing service runtime");
    build_runtime_with_config(&config)
}

static GLOBAL_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// The lazily initialized process-wide dispatch runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be created on first use. This is treated as a
/// fatal system error.
pub fn global_runtime() -> &'static Runtime {
    GLOBAL_RUNTIME.get_or_init(|| {
        build_service_runtime().expect("CRITICAL: Failed to initialize global dispatch runtime")
    })
}

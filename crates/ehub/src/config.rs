use config::{Config, Environment, File};
use ehub_lifecycle::ApplicationStatus;
use ehub_runtime::{RuntimeConfig, RuntimeProfile};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "ehub";
const ENV_PREFIX: &str = "EHUB";
const ENV_SEPARATOR: &str = "__";

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Attaches human-readable context to configuration failures.
pub trait ConfigErrorExt<T> {
    /// # Errors
    ///
    /// Returns the original error with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// Loads `T` from a configuration file with environment overrides layered on top.
///
/// 1. **Base file**: `path`, or `ehub` in the working directory when `None`. The
///    extension may be omitted; any format the `config` crate supports is found.
/// 2. **Environment**: variables prefixed `EHUB__`, nested with `__`
///    (`EHUB__RUNTIME__WORKER_THREADS` maps to `runtime.worker_threads`).
///
/// # Errors
///
/// Returns [`ConfigError::Config`] if the file is missing or its content does
/// not match `T`.
///
/// # Example
///
/// ```rust
/// use ehub::config::{HubConfig, load_config};
///
/// let cfg: HubConfig = load_config(Some("config/local")).unwrap_or_default();
/// assert_eq!(cfg.logger.name, "ehub");
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .convert_case(config::Case::Snake),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context(format!("Failed to read {}", effective_path.display()))?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Settings for every hub subsystem.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfigInner {
    pub logger: LoggingConfig,
    pub runtime: RuntimeSettings,
    pub lifecycle: LifecycleConfig,
}

/// Arc-wrapped [`HubConfigInner`], cheap to clone into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(flatten, default)]
    inner: Arc<HubConfigInner>,
}

impl Deref for HubConfig {
    type Target = HubConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for HubConfig {
    fn deref_mut(&mut self) -> &mut HubConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Global subscriber settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub name: String,
    /// Default level name (`trace` .. `error`, or `off`).
    pub level: String,
    pub console: bool,
    /// JSON lines in the file sink. Ignored without `directory`.
    pub json: bool,
    /// Enables the rolling file sink.
    pub directory: Option<PathBuf>,
    pub env_filter: Option<String>,
    pub trace_dispatch: bool,
}

/// Dispatch runtime settings.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub profile: RuntimeProfile,
    /// Overrides the profile's worker count.
    pub worker_threads: Option<usize>,
}

impl RuntimeSettings {
    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        let config = RuntimeConfig::from(self.profile);
        match self.worker_threads {
            Some(threads) => config.with_worker_threads(threads),
            None => config,
        }
    }
}

/// Lifecycle observer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Label of a dedicated callback queue; `None` delivers on the main queue.
    pub callback_queue: Option<String>,
    /// Status a manually driven platform starts in.
    pub initial_status: ApplicationStatus,
}

// --- Default ---

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            name: "ehub".to_owned(),
            level: "info".to_owned(),
            console: true,
            json: false,
            directory: None,
            env_filter: None,
            trace_dispatch: false,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { callback_queue: None, initial_status: ApplicationStatus::Inactive }
    }
}

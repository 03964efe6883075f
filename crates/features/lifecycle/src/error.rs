use std::borrow::Cow;
use thiserror::Error;

/// Errors raised by the lifecycle observer.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The process-wide observer was already created, either by an earlier
    /// `install` or by a call to `shared`.
    #[error("Application state already initialized{}", format_context(context))]
    AlreadyInitialized { context: Option<Cow<'static, str>> },

    /// A status name did not match `active`, `inactive` or `background`.
    #[error("Invalid application status{}: {source}", format_context(context))]
    InvalidStatus { source: strum::ParseError, context: Option<Cow<'static, str>> },
}

/// Attaches human-readable context to lifecycle failures.
pub trait LifecycleErrorExt<T> {
    /// # Errors
    ///
    /// Returns the original error with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, LifecycleError>;
}

impl<T> LifecycleErrorExt<T> for Result<T, LifecycleError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                LifecycleError::AlreadyInitialized { context: c }
                | LifecycleError::InvalidStatus { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> LifecycleErrorExt<T> for Result<T, strum::ParseError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, LifecycleError> {
        self.map_err(|source| LifecycleError::InvalidStatus { source, context: Some(context.into()) })
    }
}

impl From<strum::ParseError> for LifecycleError {
    fn from(source: strum::ParseError) -> Self {
        Self::InvalidStatus { source, context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

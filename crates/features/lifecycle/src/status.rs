use crate::error::{LifecycleError, LifecycleErrorExt};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};

/// Coarse foreground state of the host application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// In the foreground and receiving input.
    Active,
    /// In the foreground but not receiving input (launching, interrupted, resigning).
    Inactive,
    Background,
}

impl ApplicationStatus {
    /// Parses a status name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidStatus`] for unknown names.
    pub fn parse(name: &str) -> Result<Self, LifecycleError> {
        Self::from_str(name.trim()).context(format!("'{name}'"))
    }
}

/// Transition notifications posted by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleSignal {
    WillEnterForeground,
    DidBecomeActive,
    WillResignActive,
    DidEnterBackground,
}

impl LifecycleSignal {
    pub const ALL: [Self; 4] = [
        Self::WillEnterForeground,
        Self::DidBecomeActive,
        Self::WillResignActive,
        Self::DidEnterBackground,
    ];

    /// The status a platform reports once this signal has been posted.
    #[must_use]
    pub const fn implied_status(self) -> ApplicationStatus {
        match self {
            Self::WillEnterForeground | Self::WillResignActive => ApplicationStatus::Inactive,
            Self::DidBecomeActive => ApplicationStatus::Active,
            Self::DidEnterBackground => ApplicationStatus::Background,
        }
    }
}

/// Payload of a status change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub new: ApplicationStatus,
    pub old: ApplicationStatus,
}

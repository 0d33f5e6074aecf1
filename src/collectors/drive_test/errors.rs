//! Failure taxonomy for drive-test collection
//!
//! Only [`CollectorError`] is ever returned to a caller, and only from the
//! start/stop transitions. Everything that goes wrong inside a tick is
//! classified with [`FailureClass`], logged and published as an event.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::storage::StoreError;

/// Coarse classification of every failure the collector can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// A permission the tick needs was not granted
    PermissionDenied,
    /// A capability is switched off or produced nothing in time
    Unavailable,
    /// A probe did not complete
    ProbeFailure,
    /// Start or stop requested in the wrong state
    StateConflict,
    /// The sample store rejected a write
    PersistenceFailure,
    /// Rejected collection settings
    InvalidConfiguration,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureClass::PermissionDenied => "permission denied",
            FailureClass::Unavailable => "unavailable",
            FailureClass::ProbeFailure => "probe failure",
            FailureClass::StateConflict => "state conflict",
            FailureClass::PersistenceFailure => "persistence failure",
            FailureClass::InvalidConfiguration => "invalid configuration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("drive test is already running")]
    AlreadyActive,

    #[error("drive test is not running")]
    NotActive,

    #[error("collection interval {0:?} is outside 1s..=3600s")]
    InvalidInterval(Duration),

    #[error("location timeout must be greater than zero")]
    InvalidLocationTimeout,

    #[error("cell info timeout must be greater than zero")]
    InvalidCellTimeout,
}

impl CollectorError {
    pub fn class(&self) -> FailureClass {
        match self {
            CollectorError::AlreadyActive | CollectorError::NotActive => FailureClass::StateConflict,
            CollectorError::InvalidInterval(_)
            | CollectorError::InvalidLocationTimeout
            | CollectorError::InvalidCellTimeout => FailureClass::InvalidConfiguration,
        }
    }
}

/// Why a tick produced no sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    LocationPermissionMissing,
    LocationDisabled,
    NoLocationFix,
    /// The sample was kept in the retry backlog
    StoreRejected(String),
    /// A platform backend or the store panicked mid-tick
    Crashed(String),
}

impl SkipReason {
    pub fn class(&self) -> FailureClass {
        match self {
            SkipReason::LocationPermissionMissing => FailureClass::PermissionDenied,
            SkipReason::LocationDisabled | SkipReason::NoLocationFix | SkipReason::Crashed(_) => {
                FailureClass::Unavailable
            }
            SkipReason::StoreRejected(_) => FailureClass::PersistenceFailure,
        }
    }

    pub fn store_rejected(error: &StoreError) -> Self {
        SkipReason::StoreRejected(error.to_string())
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LocationPermissionMissing => f.write_str("location permission not granted"),
            SkipReason::LocationDisabled => f.write_str("location services disabled"),
            SkipReason::NoLocationFix => f.write_str("no location fix"),
            SkipReason::StoreRejected(e) => write!(f, "sample not stored: {e}"),
            SkipReason::Crashed(e) => write!(f, "tick crashed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_errors_are_conflicts() {
        assert_eq!(CollectorError::AlreadyActive.class(), FailureClass::StateConflict);
        assert_eq!(CollectorError::NotActive.class(), FailureClass::StateConflict);
        assert_eq!(
            CollectorError::InvalidInterval(Duration::ZERO).class(),
            FailureClass::InvalidConfiguration
        );
        assert_eq!(
            CollectorError::InvalidCellTimeout.class(),
            FailureClass::InvalidConfiguration
        );
    }

    #[test]
    fn test_skip_reason_classes() {
        assert_eq!(
            SkipReason::LocationPermissionMissing.class(),
            FailureClass::PermissionDenied
        );
        assert_eq!(SkipReason::NoLocationFix.class(), FailureClass::Unavailable);
        assert_eq!(
            SkipReason::store_rejected(&StoreError::Poisoned).to_string(),
            "sample not stored: sample store lock poisoned"
        );
        let crashed = SkipReason::Crashed("boom".to_string());
        assert_eq!(crashed.class(), FailureClass::Unavailable);
        assert_eq!(crashed.to_string(), "tick crashed: boom");
    }
}

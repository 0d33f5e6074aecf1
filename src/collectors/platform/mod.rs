use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::collectors::radio::{CapabilityLevel, CellSnapshot};
use crate::models::Location;

// Platform capability seams used by the drive-test collector.
// Each backend implements the traits it can serve; the collector only sees trait objects.

/// Helpers for running external tools and reading their output
pub mod command;

/// ModemManager backend driven through the `mmcli` tool
/// Serves cell snapshots, GPS fixes and SMS submission on Linux
pub mod modem_manager;

/// Fixed-position location provider for bench tests and stationary probes
pub mod static_location;

pub use modem_manager::ModemManager;
pub use static_location::StaticLocation;

/// Whether the user granted access to precise location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    NotRequested,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

/// Requested accuracy for a single position fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    High,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn permission(&self) -> PermissionState;

    /// Whether the positioning hardware or service is switched on
    async fn is_enabled(&self) -> bool;

    /// One fix, waiting at most `timeout`; `None` when no fix arrived in time
    async fn current_fix(&self, accuracy: Accuracy, timeout: Duration) -> Option<Location>;
}

#[async_trait]
pub trait CellInfoSource: Send + Sync {
    async fn snapshot(&self) -> Result<CellSnapshot>;

    fn capabilities(&self) -> CapabilityLevel;
}

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS permission denied")]
    PermissionDenied,

    #[error("SMS not available: {0}")]
    Unavailable(String),

    #[error("SMS send failed: {0}")]
    Send(String),
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    fn has_permission(&self) -> bool;

    /// Hands a message to the platform send queue; returns once it is accepted
    async fn enqueue(&self, number: &str, body: &str) -> Result<(), SmsError>;
}

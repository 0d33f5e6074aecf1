//! Drive-test collection
//!
//! The [`DriveTestCollector`] runs the periodic collection loop and is the only
//! writer to the sample store.
//!
//! ## Module Organization
//!
//! - `collector`: start/stop transitions and the tick pipeline
//! - `session`: per-run configuration, counters and the retry backlog
//! - `events`: status snapshots and events published to observers
//! - `errors`: failure taxonomy and the errors start/stop can return

pub mod collector;
pub mod errors;
pub mod events;
pub mod session;

pub use collector::{DriveTestCollector, TickOutcome};
pub use errors::{CollectorError, FailureClass, SkipReason};
pub use events::{CollectorEvent, CollectorStatus};
pub use session::{CollectionSession, PendingBacklog, SessionConfig};

#[cfg(test)]
pub mod tests;

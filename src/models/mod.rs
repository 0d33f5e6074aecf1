pub mod cell;
pub mod probe;
pub mod sample;

pub use cell::{CellMeasurement, CellMeasurementBuilder, SignalGroup, Technology, UNAVAILABLE};
pub use probe::{ProbeKind, ProbeResult, ProbeTargets};
pub use sample::{DriveSample, Location, METRIC_UNKNOWN};

pub mod drive_test;
pub mod platform;
pub mod probes;
pub mod radio;

pub use drive_test::DriveTestCollector;
pub use probes::NetworkProbeSuite;
pub use radio::RadioSampler;

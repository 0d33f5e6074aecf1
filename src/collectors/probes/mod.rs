//! Network probes run on every drive-test tick
//!
//! Each probe measures one thing against one target and always produces a
//! [`ProbeResult`]; failures are reported in the result, never as errors.
//! [`NetworkProbeSuite`] runs the selected probes concurrently.

use async_trait::async_trait;

use crate::models::{ProbeKind, ProbeResult};

pub mod dns;
pub mod http;
pub mod reachability;
pub mod sms;
pub mod suite;

pub use dns::DnsProbe;
pub use http::{UploadProbe, WebProbe, normalize_url};
pub use reachability::PingProbe;
pub use sms::SmsProbe;
pub use suite::{NetworkProbeSuite, ProbeReport};

#[async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    async fn run(&self, target: &str) -> ProbeResult;
}

/// Milliseconds elapsed since `start`, with sub-millisecond precision
pub(crate) fn elapsed_ms(start: tokio::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

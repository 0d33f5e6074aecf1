use async_trait::async_trait;
use log::{debug, warn};
use std::collections::BTreeSet;
use tokio::net::lookup_host;
use tokio::time::Instant;

use super::{Probe, elapsed_ms};
use crate::models::{ProbeKind, ProbeResult};

/// Resolves every address of a host through the system resolver
#[derive(Debug, Default)]
pub struct DnsProbe;

impl DnsProbe {
    pub fn new() -> Self {
        Self
    }
}

/// A lookup that returns no addresses still counts as a completed resolution
fn resolution_result(elapsed: f64, count: usize) -> ProbeResult {
    ProbeResult::completed_with_note(
        elapsed,
        format!("DNS resolution successful ({count} addresses)"),
    )
}

#[async_trait]
impl Probe for DnsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Dns
    }

    async fn run(&self, target: &str) -> ProbeResult {
        let host = target.trim();
        debug!("Starting DNS test for {}", host);

        let start = Instant::now();
        match lookup_host((host, 0)).await {
            Ok(addrs) => {
                let elapsed = elapsed_ms(start);
                let unique: BTreeSet<_> = addrs.map(|addr| addr.ip()).collect();
                debug!("DNS test completed: {:.1}ms, {} addresses", elapsed, unique.len());
                resolution_result(elapsed, unique.len())
            }
            Err(e) => {
                warn!("DNS test for {} failed: {}", host, e);
                ProbeResult::failed(format!("DNS error: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_ip_literal() {
        let result = DnsProbe::new().run("127.0.0.1").await;
        assert!(result.is_complete());
        assert_eq!(result.note, "DNS resolution successful (1 addresses)");
    }

    #[test]
    fn test_empty_answer_is_success() {
        let result = resolution_result(4.5, 0);
        assert!(result.is_complete());
        assert_eq!(result.metric, Some(4.5));
        assert_eq!(result.note, "DNS resolution successful (0 addresses)");
    }

    #[tokio::test]
    async fn test_localhost_resolves() {
        let result = DnsProbe::new().run("localhost").await;
        assert!(result.is_complete());
        assert!(result.note.starts_with("DNS resolution successful"));
    }
}

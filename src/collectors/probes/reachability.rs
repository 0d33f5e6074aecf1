use async_trait::async_trait;
use log::{debug, warn};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::Instant;

use super::{Probe, elapsed_ms};
use crate::models::{ProbeKind, ProbeResult};

/// TCP echo service; most hosts answer it with either an accept or a reset
pub const ECHO_PORT: u16 = 7;

pub const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reachability check without raw sockets
///
/// The host counts as reachable when a TCP connection to `port` is accepted
/// or actively refused within the timeout; both mean a round trip happened.
pub struct PingProbe {
    port: u16,
    timeout: Duration,
}

impl PingProbe {
    pub fn new() -> Self {
        Self {
            port: ECHO_PORT,
            timeout: REACHABILITY_TIMEOUT,
        }
    }

    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::new()
        }
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for PingProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Ping
    }

    async fn run(&self, target: &str) -> ProbeResult {
        let host = target.trim();
        debug!("Starting ping test to {}:{}", host, self.port);

        let start = Instant::now();
        let addr = match lookup_host((host, self.port)).await {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => addr,
                None => return ProbeResult::failed("Ping error: no address for host"),
            },
            Err(e) => {
                warn!("Ping test could not resolve {}: {}", host, e);
                return ProbeResult::failed(format!("Ping error: {e}"));
            }
        };

        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => ProbeResult::completed(elapsed_ms(start)),
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                ProbeResult::completed(elapsed_ms(start))
            }
            Ok(Err(e)) => {
                warn!("Ping test to {} failed: {}", addr, e);
                ProbeResult::failed("Ping failed: Host not reachable")
            }
            Err(_) => {
                warn!("Ping test to {} timed out", addr);
                ProbeResult::failed("Ping failed: Host not reachable")
            }
        }
    }
}

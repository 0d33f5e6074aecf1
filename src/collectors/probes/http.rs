use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio::time::Instant;

use super::{Probe, elapsed_ms};
use crate::models::{ProbeKind, ProbeResult};

/// Size of the upload payload; the rate is reported in KB/s against this
pub const UPLOAD_PAYLOAD_BYTES: usize = 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefixes `https://` when the target has no scheme
pub fn normalize_url(target: &str) -> String {
    let target = target.trim();
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{target}")
    }
}

/// Shared client used by the HTTP probes
pub fn probe_client() -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Short classification of a transport failure for probe notes
pub fn describe_error(error: &reqwest::Error) -> String {
    let class = if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_builder() {
        "invalid URL"
    } else if error.is_request() {
        "request failed"
    } else {
        "transport error"
    };
    format!("{class} ({error})")
}

/// POSTs a fixed payload and reports throughput in KB/s
pub struct UploadProbe {
    client: Client,
}

impl UploadProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for UploadProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Upload
    }

    async fn run(&self, target: &str) -> ProbeResult {
        let url = normalize_url(target);
        debug!("Starting HTTP upload test to {}", url);

        let payload = vec![b'x'; UPLOAD_PAYLOAD_BYTES];
        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                let seconds = (elapsed_ms(start) / 1000.0).max(f64::EPSILON);
                let rate = (UPLOAD_PAYLOAD_BYTES as f64 / 1024.0) / seconds;
                debug!("HTTP upload completed: {:.2} KB/s", rate);
                ProbeResult::completed_with_note(rate, "Upload successful")
            }
            Ok(response) => {
                let status = response.status().as_u16();
                warn!("HTTP upload to {} failed: {}", url, status);
                ProbeResult::failed(format!("Upload failed: {status}"))
            }
            Err(e) => {
                warn!("HTTP upload to {} error: {}", url, e);
                ProbeResult::failed(format!("Upload error: {}", describe_error(&e)))
            }
        }
    }
}

/// GETs a page and reports the response time, whatever the status code
pub struct WebProbe {
    client: Client,
}

impl WebProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for WebProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Web
    }

    async fn run(&self, target: &str) -> ProbeResult {
        let url = normalize_url(target);
        debug!("Starting web test to {}", url);

        let start = Instant::now();
        match self.client.get(&url).send().await {
            Ok(response) => {
                let elapsed = elapsed_ms(start);
                let status = response.status();
                if status.is_success() {
                    ProbeResult::completed_with_note(elapsed, "Web request successful")
                } else {
                    warn!("Web test to {} returned {}", url, status.as_u16());
                    ProbeResult::completed_with_note(
                        elapsed,
                        format!("Web request failed: {}", status.as_u16()),
                    )
                }
            }
            Err(e) => {
                warn!("Web test to {} error: {}", url, e);
                ProbeResult::failed(format!("Web error: {}", describe_error(&e)))
            }
        }
    }
}

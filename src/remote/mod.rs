//! Collector service client
//!
//! Bulk upload of stored samples and device signup against the Polaris
//! collector service.

pub mod client;
pub mod record;

pub use client::{CollectorClient, SignupOutcome};
pub use record::UploadRecord;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

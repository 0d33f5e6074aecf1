use log::{debug, info, warn};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::RemoteError;
use super::record::UploadRecord;
use crate::models::DriveSample;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ALREADY_REGISTERED: &str = "Username already registered";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Registered,
    /// The account exists already; repeated signups are not an error
    AlreadyRegistered,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    password: &'a str,
    device_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    detail: String,
}

/// Decides whether a 400 response body means the user already exists
fn is_already_registered(body: &str) -> bool {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(error) => error.detail.eq_ignore_ascii_case(ALREADY_REGISTERED),
        Err(_) => body
            .to_ascii_lowercase()
            .contains(&ALREADY_REGISTERED.to_ascii_lowercase()),
    }
}

pub struct CollectorClient {
    base_url: String,
    client: Client,
}

impl CollectorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::ClientInit)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts all samples as one JSON array; returns how many were sent
    ///
    /// Nothing is sent for an empty slice.
    pub async fn upload(&self, samples: &[DriveSample]) -> Result<usize, RemoteError> {
        if samples.is_empty() {
            info!("No samples to upload");
            return Ok(0);
        }

        let url = self.endpoint("/drive-data/app");
        let records: Vec<UploadRecord> = samples.iter().map(UploadRecord::from).collect();
        debug!("Uploading {} samples to {}", records.len(), url);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&records)
            .send()
            .await
            .map_err(|source| RemoteError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Upload rejected with {}: {}", status, body);
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!("Uploaded {} samples", records.len());
        Ok(records.len())
    }

    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        device_id: &str,
    ) -> Result<SignupOutcome, RemoteError> {
        let url = self.endpoint("/auth/signup");
        let request = SignupRequest {
            username,
            password,
            device_id,
        };

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|source| RemoteError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        match status {
            200 | 201 => Ok(SignupOutcome::Registered),
            400 => {
                let body = response.text().await.unwrap_or_default();
                if is_already_registered(&body) {
                    info!("User {} is already registered", username);
                    Ok(SignupOutcome::AlreadyRegistered)
                } else {
                    Err(RemoteError::Status { status, body })
                }
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(RemoteError::Status { status, body })
            }
        }
    }
}

use async_trait::async_trait;
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;
use tokio::time::Instant;

use super::{Probe, elapsed_ms};
use crate::collectors::platform::{SmsError, SmsSender};
use crate::models::{ProbeKind, ProbeResult};

/// Measures how long the platform takes to accept an SMS into its send queue
///
/// This is not a delivery time; nothing waits for a delivery report.
pub struct SmsProbe {
    sender: Option<Arc<dyn SmsSender>>,
}

impl SmsProbe {
    pub fn new(sender: Option<Arc<dyn SmsSender>>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Probe for SmsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Sms
    }

    async fn run(&self, target: &str) -> ProbeResult {
        let Some(sender) = self.sender.as_ref() else {
            return ProbeResult::failed("SMS not available on this device");
        };
        if !sender.has_permission() {
            return ProbeResult::failed("SMS permission required");
        }

        let body = format!("Polaris Test SMS {}", Utc::now().timestamp_millis());
        let start = Instant::now();
        match sender.enqueue(target.trim(), &body).await {
            Ok(()) => {
                let elapsed = elapsed_ms(start);
                info!("SMS queued in {:.0}ms", elapsed);
                ProbeResult::completed_with_note(elapsed, format!("SMS queued: {elapsed:.0}ms"))
            }
            Err(SmsError::PermissionDenied) => {
                error!("SMS permission denied while sending to {}", target);
                ProbeResult::failed("SMS permission denied")
            }
            Err(e) => {
                error!("Failed to send SMS: {}", e);
                ProbeResult::failed(format!("SMS error: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSender {
        permission: bool,
        outcome: fn() -> Result<(), SmsError>,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsSender for RecordingSender {
        fn has_permission(&self) -> bool {
            self.permission
        }

        async fn enqueue(&self, number: &str, body: &str) -> Result<(), SmsError> {
            self.sent
                .lock()
                .unwrap()
                .push((number.to_string(), body.to_string()));
            (self.outcome)()
        }
    }

    fn sender(permission: bool, outcome: fn() -> Result<(), SmsError>) -> Arc<RecordingSender> {
        Arc::new(RecordingSender {
            permission,
            outcome,
            sent: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_queued_message() {
        let sender = sender(true, || Ok(()));
        let probe = SmsProbe::new(Some(sender.clone()));

        let result = probe.run("+15550100").await;

        assert!(result.is_complete());
        assert!(result.note.starts_with("SMS queued: "));
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].0, "+15550100");
        assert!(sent[0].1.starts_with("Polaris Test SMS "));
    }

    #[tokio::test]
    async fn test_missing_permission_is_distinct_from_failure() {
        let missing = SmsProbe::new(Some(sender(false, || Ok(())))).run("1").await;
        assert_eq!(missing, ProbeResult::failed("SMS permission required"));

        let denied = SmsProbe::new(Some(sender(true, || Err(SmsError::PermissionDenied))))
            .run("1")
            .await;
        assert_eq!(denied, ProbeResult::failed("SMS permission denied"));

        let failed = SmsProbe::new(Some(sender(true, || {
            Err(SmsError::Send("no network".to_string()))
        })))
        .run("1")
        .await;
        assert_eq!(failed.metric, None);
        assert_eq!(failed.note, "SMS error: SMS send failed: no network");
    }

    #[tokio::test]
    async fn test_without_sender() {
        let result = SmsProbe::new(None).run("1").await;
        assert!(!result.is_complete());
    }
}

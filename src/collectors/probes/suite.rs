use anyhow::Result;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use super::http::probe_client;
use super::{DnsProbe, PingProbe, Probe, SmsProbe, UploadProbe, WebProbe};
use crate::collectors::platform::SmsSender;
use crate::models::{ProbeKind, ProbeResult, ProbeTargets};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Results of one suite run; only selected kinds are present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    results: BTreeMap<ProbeKind, ProbeResult>,
}

impl ProbeReport {
    pub fn get(&self, kind: ProbeKind) -> Option<&ProbeResult> {
        self.results.get(&kind)
    }

    pub fn results(&self) -> &BTreeMap<ProbeKind, ProbeResult> {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Non-empty notes as "Label: note", joined with "; " in kind order
    pub fn notes(&self) -> String {
        self.results
            .iter()
            .filter(|(_, result)| !result.note.is_empty())
            .map(|(kind, result)| format!("{}: {}", kind.label(), result.note))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Runs the selected probes concurrently, isolating each one
///
/// Every selected probe gets its own task bounded by the per-probe timeout;
/// a timeout or a panic only fails that probe's result. There are no retries.
pub struct NetworkProbeSuite {
    probes: BTreeMap<ProbeKind, Arc<dyn Probe>>,
    timeout: Duration,
}

impl NetworkProbeSuite {
    pub fn new(timeout: Duration) -> Self {
        Self {
            probes: BTreeMap::new(),
            timeout,
        }
    }

    /// The production probe set; SMS is only wired when a sender exists
    pub fn standard(timeout: Duration, sms: Option<Arc<dyn SmsSender>>) -> Result<Self> {
        let client = probe_client()?;
        Ok(Self::new(timeout)
            .with_probe(UploadProbe::new(client.clone()))
            .with_probe(PingProbe::new())
            .with_probe(DnsProbe::new())
            .with_probe(WebProbe::new(client))
            .with_probe(SmsProbe::new(sms)))
    }

    /// Registers `probe` for its kind, replacing any earlier one
    pub fn with_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.probes.insert(probe.kind(), Arc::new(probe));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run(&self, selected: &BTreeSet<ProbeKind>, targets: &ProbeTargets) -> ProbeReport {
        let mut results = BTreeMap::new();
        let mut handles = Vec::with_capacity(selected.len());

        for &kind in selected {
            let target = targets.target_for(kind).trim().to_string();
            if target.is_empty() {
                results.insert(kind, ProbeResult::failed("no target configured"));
                continue;
            }
            let Some(probe) = self.probes.get(&kind).cloned() else {
                results.insert(kind, ProbeResult::failed("probe not available"));
                continue;
            };

            let timeout = self.timeout;
            let handle = tokio::spawn(async move {
                tokio::time::timeout(timeout, probe.run(&target)).await
            });
            handles.push((kind, handle));
        }

        for (kind, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => {
                    warn!("{} probe timed out after {:?}", kind, self.timeout);
                    ProbeResult::failed(format!(
                        "timed out after {}s",
                        self.timeout.as_secs_f64()
                    ))
                }
                Err(e) => {
                    warn!("{} probe task failed: {}", kind, e);
                    ProbeResult::failed("probe crashed")
                }
            };
            debug!("{} probe finished: {:?}", kind, result.metric);
            results.insert(kind, result);
        }

        ProbeReport { results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedProbe(ProbeKind, f64);

    #[async_trait]
    impl Probe for FixedProbe {
        fn kind(&self) -> ProbeKind {
            self.0
        }

        async fn run(&self, _target: &str) -> ProbeResult {
            ProbeResult::completed_with_note(self.1, "ok")
        }
    }

    struct SlowProbe;

    #[async_trait]
    impl Probe for SlowProbe {
        fn kind(&self) -> ProbeKind {
            ProbeKind::Web
        }

        async fn run(&self, _target: &str) -> ProbeResult {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            ProbeResult::completed(1.0)
        }
    }

    struct PanickingProbe;

    #[async_trait]
    impl Probe for PanickingProbe {
        fn kind(&self) -> ProbeKind {
            ProbeKind::Upload
        }

        async fn run(&self, _target: &str) -> ProbeResult {
            panic!("probe blew up");
        }
    }

    fn targets() -> ProbeTargets {
        ProbeTargets {
            upload_url: "upload.test".to_string(),
            ping_host: "ping.test".to_string(),
            dns_host: "dns.test".to_string(),
            web_url: "web.test".to_string(),
            sms_number: String::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_selection_gives_empty_report() {
        let suite = NetworkProbeSuite::new(Duration::from_secs(1))
            .with_probe(FixedProbe(ProbeKind::Ping, 10.0));

        let report = suite.run(&BTreeSet::new(), &targets()).await;

        assert!(report.is_empty());
        assert_eq!(report.notes(), "");
    }

    #[tokio::test]
    async fn test_only_selected_kinds_are_present() {
        let suite = NetworkProbeSuite::new(Duration::from_secs(1))
            .with_probe(FixedProbe(ProbeKind::Ping, 12.0))
            .with_probe(FixedProbe(ProbeKind::Dns, 3.0))
            .with_probe(FixedProbe(ProbeKind::Web, 40.0));

        let selected = BTreeSet::from([ProbeKind::Dns, ProbeKind::Ping]);
        let report = suite.run(&selected, &targets()).await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.get(ProbeKind::Ping).unwrap().metric, Some(12.0));
        assert_eq!(report.get(ProbeKind::Dns).unwrap().metric, Some(3.0));
        assert!(report.get(ProbeKind::Web).is_none());
        assert_eq!(report.notes(), "Ping: ok; DNS: ok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_and_panic_are_isolated() {
        let suite = NetworkProbeSuite::new(Duration::from_secs(5))
            .with_probe(SlowProbe)
            .with_probe(PanickingProbe)
            .with_probe(FixedProbe(ProbeKind::Dns, 7.0));

        let selected = BTreeSet::from([ProbeKind::Upload, ProbeKind::Dns, ProbeKind::Web]);
        let report = suite.run(&selected, &targets()).await;

        assert_eq!(report.get(ProbeKind::Dns).unwrap().metric, Some(7.0));
        let web = report.get(ProbeKind::Web).unwrap();
        assert_eq!(web.metric, None);
        assert_eq!(web.note, "timed out after 5s");
        let upload = report.get(ProbeKind::Upload).unwrap();
        assert_eq!(upload.metric, None);
        assert_eq!(upload.note, "probe crashed");
        assert_eq!(
            report.notes(),
            "HTTP Upload: probe crashed; DNS: ok; Web: timed out after 5s"
        );
    }

    #[tokio::test]
    async fn test_missing_target_and_missing_probe() {
        let suite = NetworkProbeSuite::new(Duration::from_secs(1));

        let selected = BTreeSet::from([ProbeKind::Ping, ProbeKind::Sms]);
        let report = suite.run(&selected, &targets()).await;

        assert_eq!(
            report.get(ProbeKind::Sms),
            Some(&ProbeResult::failed("no target configured"))
        );
        assert_eq!(
            report.get(ProbeKind::Ping),
            Some(&ProbeResult::failed("probe not available"))
        );
    }
}

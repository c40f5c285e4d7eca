use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::analyze::fingerprint::{Fingerprint, Signature};
use crate::error::{Result, ScanError};
use crate::probe::{ProbeOutcome, Prober};
use crate::utils::{random_label, RANDOM_LABEL_LEN};

/// Reference signatures of the server's catch-all response. Immutable once built.
#[derive(Debug, Clone)]
pub struct Baseline {
    fingerprint: Arc<dyn Fingerprint>,
    signatures: Vec<Signature>,
}

impl Baseline {
    pub fn new(fingerprint: Arc<dyn Fingerprint>, signatures: Vec<Signature>) -> Self {
        Self { fingerprint, signatures }
    }

    pub fn matches(&self, outcome: &ProbeOutcome) -> bool {
        if self.signatures.is_empty() {
            return false;
        }
        let candidate = self.fingerprint.signature(outcome);
        self.fingerprint.matches(&candidate, &self.signatures)
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn strategy(&self) -> &'static str {
        self.fingerprint.name()
    }
}

/// Probes random, non-existent hostnames under the target domain.
pub struct BaselineProber<'a> {
    prober: &'a Prober,
    domain: &'a str,
    fingerprint: Arc<dyn Fingerprint>,
    probes: usize,
}

impl<'a> BaselineProber<'a> {
    pub fn new(prober: &'a Prober, domain: &'a str, fingerprint: Arc<dyn Fingerprint>, configured_probes: usize) -> Self {
        let probes = fingerprint.baseline_probes(configured_probes).max(1);
        Self { prober, domain, fingerprint, probes }
    }

    /// Failed probes are skipped, never recorded as empty signatures.
    /// Errors only when no probe succeeded.
    pub async fn establish(&self, cancel: &CancellationToken) -> Result<Baseline> {
        let mut signatures: Vec<Signature> = Vec::with_capacity(self.probes);
        let mut last_error = String::new();
        let mut failed = 0usize;

        for _ in 0..self.probes {
            let host = format!("{}.{}", random_label(RANDOM_LABEL_LEN), self.domain);
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                outcome = self.prober.probe(&host) => outcome,
            };

            if outcome.is_failure() {
                failed += 1;
                last_error = outcome.error.unwrap_or_default();
                tracing::warn!(host = %host, error = %last_error, "baseline probe failed, skipping");
                continue;
            }

            let signature = self.fingerprint.signature(&outcome);
            tracing::info!(host = %host, signature = %signature, "baseline recorded");
            if !signatures.contains(&signature) {
                signatures.push(signature);
            }
        }

        if failed == self.probes {
            return Err(ScanError::BaselineUnavailable {
                attempted: self.probes,
                last_error,
            });
        }
        if failed > 0 {
            tracing::warn!(failed, total = self.probes, "continuing with a reduced baseline");
        }

        Ok(Baseline::new(self.fingerprint.clone(), signatures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::fingerprint::{ContentFingerprint, ResponseFingerprint};

    #[test]
    fn test_empty_baseline_matches_nothing() {
        let baseline = Baseline::new(Arc::new(ResponseFingerprint), Vec::new());
        let outcome = ProbeOutcome {
            status: 404,
            ..Default::default()
        };
        assert!(!baseline.matches(&outcome));
    }

    #[test]
    fn test_coarse_baseline_ignores_unrelated_empty_body() {
        let fp = ContentFingerprint;
        let catch_all = ProbeOutcome {
            status: 200,
            body: b"<html>default site</html>".to_vec(),
            ..Default::default()
        };
        let baseline = Baseline::new(Arc::new(fp), vec![fp.signature(&catch_all)]);

        let empty = ProbeOutcome {
            status: 204,
            ..Default::default()
        };
        assert!(baseline.matches(&catch_all));
        assert!(!baseline.matches(&empty));
    }
}

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::probe::ProbeOutcome;

/// Observable features of a response used to recognise the catch-all vhost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    Content { hash: [u8; 32], size: usize },
    Response { status: u16, title: Option<String>, server: Option<String> },
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Content { hash, size } => {
                let short: String = hash.iter().take(6).map(|b| format!("{:02x}", b)).collect();
                write!(f, "sha256:{}.. size:{}", short, size)
            }
            Signature::Response { status, title, server } => write!(
                f,
                "status:{} title:{:?} server:{:?}",
                status,
                title.as_deref().unwrap_or(""),
                server.as_deref().unwrap_or("")
            ),
        }
    }
}

/// A way of fingerprinting responses and comparing them to the baseline.
pub trait Fingerprint: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Number of baseline probes to send, given the configured count.
    fn baseline_probes(&self, configured: usize) -> usize;

    fn signature(&self, outcome: &ProbeOutcome) -> Signature;

    fn matches(&self, candidate: &Signature, baseline: &[Signature]) -> bool;
}

/// Coarse: body hash or body size equal to the single baseline response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFingerprint;

impl Fingerprint for ContentFingerprint {
    fn name(&self) -> &'static str {
        "coarse"
    }

    fn baseline_probes(&self, _configured: usize) -> usize {
        1
    }

    fn signature(&self, outcome: &ProbeOutcome) -> Signature {
        Signature::Content {
            hash: Sha256::digest(&outcome.body).into(),
            size: outcome.size(),
        }
    }

    fn matches(&self, candidate: &Signature, baseline: &[Signature]) -> bool {
        let Signature::Content { hash, size } = candidate else {
            return false;
        };
        baseline.iter().any(|b| match b {
            Signature::Content { hash: bh, size: bs } => bh == hash || bs == size,
            _ => false,
        })
    }
}

/// Precise: exact `(status, title, server)` match against any baseline response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFingerprint;

impl Fingerprint for ResponseFingerprint {
    fn name(&self) -> &'static str {
        "precise"
    }

    fn baseline_probes(&self, configured: usize) -> usize {
        configured
    }

    fn signature(&self, outcome: &ProbeOutcome) -> Signature {
        Signature::Response {
            status: outcome.status,
            title: outcome.title.clone(),
            server: outcome.server.clone(),
        }
    }

    fn matches(&self, candidate: &Signature, baseline: &[Signature]) -> bool {
        baseline.contains(candidate)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Single probe, match on content hash or size
    Coarse,
    /// Several probes, match on status + title + Server header
    #[default]
    Precise,
}

impl Strategy {
    pub fn fingerprint(self) -> Arc<dyn Fingerprint> {
        match self {
            Strategy::Coarse => Arc::new(ContentFingerprint),
            Strategy::Precise => Arc::new(ResponseFingerprint),
        }
    }
}

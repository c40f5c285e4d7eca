use std::time::Duration;

use ahash::AHashSet;
use reqwest::Method;
use url::Url;

use crate::analyze::fingerprint::Strategy;
use crate::error::{Result, ScanError};
use crate::utils;

pub const DEFAULT_THREADS: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_BASELINE_PROBES: usize = 3;
pub const MIN_BASELINE_PROBES: usize = 3;
pub const MAX_BASELINE_PROBES: usize = 10;
/// 10 MiB
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Which responses are skipped or hidden after the baseline check.
#[derive(Debug, Clone, Default)]
pub struct FilterRule {
    pub ignore_codes: AHashSet<u16>,
    /// When non-empty, only these codes are shown and `ignore_codes` is ignored.
    pub only_codes: AHashSet<u16>,
    pub exact_size: Option<usize>,
    /// Stored lowercased.
    pub ignore_keyword: Option<String>,
}

impl FilterRule {
    pub fn new(
        ignore_codes: impl IntoIterator<Item = u16>,
        only_codes: impl IntoIterator<Item = u16>,
        exact_size: Option<usize>,
        ignore_keyword: Option<&str>,
    ) -> Self {
        Self {
            ignore_codes: ignore_codes.into_iter().collect(),
            only_codes: only_codes.into_iter().collect(),
            exact_size,
            ignore_keyword: ignore_keyword
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_lowercase),
        }
    }

    pub fn size_matches(&self, size: usize) -> bool {
        self.exact_size == Some(size)
    }

    pub fn keyword_matches(&self, body: &[u8]) -> bool {
        match self.ignore_keyword {
            Some(ref keyword) => String::from_utf8_lossy(body).to_lowercase().contains(keyword.as_str()),
            None => false,
        }
    }

    pub fn is_visible(&self, status: u16) -> bool {
        if !self.only_codes.is_empty() {
            return self.only_codes.contains(&status);
        }
        !self.ignore_codes.contains(&status)
    }
}

/// Runtime configuration of a scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: Url,
    /// Suffix appended to every candidate label.
    pub domain: String,
    pub threads: usize,
    pub timeout: Duration,
    /// Requests per second across all workers, 0 = unlimited.
    pub rate_limit: u32,
    pub burst: u32,
    pub method: Method,
    pub filters: FilterRule,
    pub baseline_probes: usize,
    pub strategy: Strategy,
    /// `None` reads bodies in full.
    pub max_body_bytes: Option<usize>,
    pub follow_redirects: bool,
    pub user_agent: String,
}

impl ScanConfig {
    /// Build a config with defaults for `target`. A missing scheme becomes `http://`.
    pub fn for_target(target: &str) -> Result<Self> {
        let target = utils::normalize_target(target)?;
        let domain = utils::extract_domain(&target).ok_or_else(|| ScanError::InvalidTarget {
            target: target.to_string(),
            reason: "no host".to_string(),
        })?;

        Ok(Self {
            target,
            domain,
            threads: DEFAULT_THREADS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rate_limit: 0,
            burst: 1,
            method: Method::GET,
            filters: FilterRule::default(),
            baseline_probes: DEFAULT_BASELINE_PROBES,
            strategy: Strategy::default(),
            max_body_bytes: Some(DEFAULT_MAX_BODY_BYTES),
            follow_redirects: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        let domain = domain.trim().trim_matches('.');
        if !domain.is_empty() {
            self.domain = domain.to_lowercase();
        }
        self
    }

    pub fn with_method(mut self, method: &str) -> Result<Self> {
        self.method = Method::from_bytes(method.trim().to_uppercase().as_bytes())
            .map_err(|_| ScanError::InvalidMethod(method.to_string()))?;
        Ok(self)
    }

    pub fn worker_count(&self) -> usize {
        self.threads.max(1)
    }

    pub fn baseline_probe_count(&self) -> usize {
        self.baseline_probes.clamp(MIN_BASELINE_PROBES, MAX_BASELINE_PROBES)
    }

    pub fn host_for(&self, candidate: &str) -> String {
        format!("{}.{}", candidate, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ScanConfig::for_target("10.0.0.5").unwrap();
        assert_eq!(cfg.target.as_str(), "http://10.0.0.5/");
        assert_eq!(cfg.domain, "10.0.0.5");
        assert_eq!(cfg.threads, 10);
        assert_eq!(cfg.method, Method::GET);
        assert_eq!(cfg.rate_limit, 0);
        assert_eq!(cfg.host_for("api"), "api.10.0.0.5");
    }

    #[test]
    fn test_baseline_probe_clamp() {
        let mut cfg = ScanConfig::for_target("https://example.com").unwrap();
        cfg.baseline_probes = 1;
        assert_eq!(cfg.baseline_probe_count(), 3);
        cfg.baseline_probes = 50;
        assert_eq!(cfg.baseline_probe_count(), 10);
        cfg.baseline_probes = 5;
        assert_eq!(cfg.baseline_probe_count(), 5);
    }

    #[test]
    fn test_method_parsing() {
        let cfg = ScanConfig::for_target("example.com").unwrap().with_method("post").unwrap();
        assert_eq!(cfg.method, Method::POST);
        assert!(ScanConfig::for_target("example.com").unwrap().with_method("BAD METHOD").is_err());
    }

    #[test]
    fn test_domain_override() {
        let cfg = ScanConfig::for_target("http://10.0.0.5:8080/").unwrap().with_domain(".Corp.Local.");
        assert_eq!(cfg.host_for("intranet"), "intranet.corp.local");
    }

    #[test]
    fn test_only_codes_override_ignore_codes() {
        let rule = FilterRule::new([200, 404], [200], None, None);
        assert!(rule.is_visible(200));
        assert!(!rule.is_visible(404));
        assert!(!rule.is_visible(301));
    }

    #[test]
    fn test_ignore_codes() {
        let rule = FilterRule::new([404, 400], [], None, None);
        assert!(!rule.is_visible(404));
        assert!(!rule.is_visible(400));
        assert!(rule.is_visible(200));
        assert!(rule.is_visible(302));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let rule = FilterRule::new([], [], None, Some("Default Page"));
        assert!(rule.keyword_matches(b"<h1>Apache2 DEFAULT PAGE</h1>"));
        assert!(!rule.keyword_matches(b"<h1>Admin login</h1>"));
        assert!(!FilterRule::new([], [], None, Some("  ")).keyword_matches(b"anything"));
    }
}

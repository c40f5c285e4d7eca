use std::path::Path;

use anyhow::Context;
use rand::Rng;
use url::Url;

use crate::error::{Result, ScanError};

/// Length of the random labels used for baseline probes.
pub const RANDOM_LABEL_LEN: usize = 12;

/// Read a newline-delimited wordlist, trimming lines and dropping blanks.
pub fn read_wordlist(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read wordlist {}", path.display()))?;
    Ok(parse_wordlist(&data))
}

pub fn parse_wordlist(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a target, defaulting the scheme to `http://`.
pub fn normalize_target(target: &str) -> Result<Url> {
    let target = target.trim();
    let with_scheme = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    };
    Url::parse(&with_scheme).map_err(|e| ScanError::InvalidTarget {
        target: target.to_string(),
        reason: e.to_string(),
    })
}

/// Host part of the target, without scheme, port or path.
pub fn extract_domain(target: &Url) -> Option<String> {
    target
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_lowercase())
        .filter(|h| !h.is_empty())
}

/// Lowercase label that is very unlikely to name a real vhost.
pub fn random_label(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wordlist_skips_blank_lines() {
        let words = parse_wordlist("api\n\n  admin  \r\n\t\nwww\n");
        assert_eq!(words, vec!["api", "admin", "www"]);
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("example.com").unwrap().as_str(), "http://example.com/");
        assert_eq!(normalize_target("https://example.com/app").unwrap().as_str(), "https://example.com/app");
        assert!(normalize_target("http://").is_err());
    }

    #[test]
    fn test_extract_domain() {
        let url = normalize_target("https://Target.Example.com:8443/login").unwrap();
        assert_eq!(extract_domain(&url).as_deref(), Some("target.example.com"));
        let ip = normalize_target("192.168.1.10:8080").unwrap();
        assert_eq!(extract_domain(&ip).as_deref(), Some("192.168.1.10"));
    }

    #[test]
    fn test_random_label() {
        let a = random_label(RANDOM_LABEL_LEN);
        let b = random_label(RANDOM_LABEL_LEN);
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_lowercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_read_wordlist_missing_file() {
        let err = read_wordlist(Path::new("/nonexistent/vhosts.txt")).unwrap_err();
        assert!(err.to_string().contains("failed to read wordlist"));
    }
}

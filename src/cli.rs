use std::path::PathBuf;

use clap::Parser;
use vhost_hunter::analyze::Strategy;
use vhost_hunter::config::{self, FilterRule, ScanConfig};
use vhost_hunter::output::OutputFormat;

/// Discover virtual hosts hidden behind a single IP or URL
#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target IP, domain or URL (http:// is assumed when no scheme is given)
    #[arg(short = 'u', long)]
    pub url: String,

    /// Path to vhost wordlist, one label per line
    #[arg(short = 'w', long)]
    pub wordlist: PathBuf,

    /// Domain appended to each label (defaults to the target host)
    #[arg(short = 'd', long)]
    pub domain: Option<String>,

    /// Number of concurrent workers
    #[arg(short = 't', long, default_value_t = config::DEFAULT_THREADS)]
    pub threads: usize,

    /// Comma-separated list of response codes to ignore
    #[arg(long = "filter-codes", visible_alias = "fc", value_delimiter = ',')]
    pub filter_codes: Vec<u16>,

    /// Comma-separated list of response codes to ONLY show (overrides --filter-codes)
    #[arg(long = "show-codes", visible_alias = "sc", value_delimiter = ',')]
    pub show_codes: Vec<u16>,

    /// Filter out responses with body size exactly this value in bytes (0 = off)
    #[arg(long = "filter-size", visible_alias = "fs")]
    pub filter_size: Option<usize>,

    /// Filter out responses whose body contains this text (case-insensitive)
    #[arg(long = "filter-keyword", visible_alias = "fw")]
    pub filter_keyword: Option<String>,

    /// Requests per second across all workers (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub rate: u32,

    /// Requests allowed back to back once the rate limiter has idled
    #[arg(long, default_value_t = 1)]
    pub burst: u32,

    /// HTTP client timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// HTTP method to use
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Baseline fingerprint strategy
    #[arg(long, value_enum, default_value_t = Strategy::Precise)]
    pub strategy: Strategy,

    /// Number of random hostnames probed for the baseline (clamped to 3..=10)
    #[arg(long = "baseline-probes", default_value_t = config::DEFAULT_BASELINE_PROBES)]
    pub baseline_probes: usize,

    /// Maximum response body bytes read per probe (0 = unlimited)
    #[arg(long = "max-body", default_value_t = config::DEFAULT_MAX_BODY_BYTES)]
    pub max_body: usize,

    /// Follow redirects (up to 10) instead of reporting the 3xx itself
    #[arg(long, default_value_t = false)]
    pub follow_redirects: bool,

    /// Append matched results to this file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Format of the output file
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Do not draw the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Verbose mode: more detail per result and info logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Enable detailed debug logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Cli {
    pub fn scan_config(&self) -> anyhow::Result<ScanConfig> {
        let mut cfg = ScanConfig::for_target(&self.url)?.with_method(&self.method)?;
        if let Some(ref domain) = self.domain {
            cfg = cfg.with_domain(domain);
        }
        cfg.threads = self.threads;
        cfg.timeout = std::time::Duration::from_secs(self.timeout.max(1));
        cfg.rate_limit = self.rate;
        cfg.burst = self.burst;
        cfg.strategy = self.strategy;
        cfg.baseline_probes = self.baseline_probes;
        cfg.max_body_bytes = if self.max_body == 0 { None } else { Some(self.max_body) };
        cfg.follow_redirects = self.follow_redirects;
        cfg.filters = FilterRule::new(
            self.filter_codes.iter().copied(),
            self.show_codes.iter().copied(),
            self.filter_size.filter(|&size| size > 0),
            self.filter_keyword.as_deref(),
        );
        Ok(cfg)
    }
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

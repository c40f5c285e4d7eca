use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::config::ScanConfig;

/// Build the shared probing client for a scan.
pub fn create_scan_client(config: &ScanConfig) -> reqwest::Result<Client> {
    let connect_timeout = config.timeout.min(Duration::from_secs(5));

    let redirect = if config.follow_redirects {
        reqwest::redirect::Policy::limited(10)
    } else {
        reqwest::redirect::Policy::none()
    };

    ClientBuilder::new()
        // Connection pooling - every worker talks to the same address
        .pool_max_idle_per_host(config.worker_count())
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)

        // Timeouts (covers the body read as well)
        .timeout(config.timeout)
        .connect_timeout(connect_timeout)

        // Compression
        .gzip(true)
        .brotli(true)

        // TLS
        .use_rustls_tls()
        .https_only(false)
        // h2 sends :authority from the URL, which overrides the Host header
        .http1_only()

        .redirect(redirect)
        .user_agent(config.user_agent.as_str())

        // Staging and internal targets are usually self-signed
        .danger_accept_invalid_certs(true)

        .build()
}

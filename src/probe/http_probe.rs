use once_cell::sync::Lazy;
use reqwest::header::{HOST, SERVER};
use reqwest::{Client, Method, Response};
use scraper::{Html, Selector};
use url::Url;

use crate::config::ScanConfig;

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));

/// What one request with an overridden Host header produced.
///
/// Lives only until it has been classified.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    pub host: String,
    /// 0 when the request failed at the transport level.
    pub status: u16,
    pub body: Vec<u8>,
    /// The body hit the read cap and was cut short.
    pub truncated: bool,
    pub title: Option<String>,
    pub server: Option<String>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn failed(host: &str, error: String) -> Self {
        Self {
            host: host.to_string(),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == 0
    }

    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// Sends single requests at the scan target with a chosen Host header.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    method: Method,
    target: Url,
    max_body_bytes: Option<usize>,
}

impl Prober {
    pub fn new(client: Client, config: &ScanConfig) -> Self {
        Self {
            client,
            method: config.method.clone(),
            target: config.target.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Probe `host`. Never fails: transport errors become a failed outcome.
    pub async fn probe(&self, host: &str) -> ProbeOutcome {
        match self.fetch(host).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(host, error = %e, "probe failed");
                ProbeOutcome::failed(host, e.to_string())
            }
        }
    }

    async fn fetch(&self, host: &str) -> reqwest::Result<ProbeOutcome> {
        let mut resp = self
            .client
            .request(self.method.clone(), self.target.clone())
            .header(HOST, host)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let server = resp
            .headers()
            .get(SERVER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string());
        let (body, truncated) = read_body(&mut resp, self.max_body_bytes).await?;
        if truncated {
            tracing::debug!(host, limit = ?self.max_body_bytes, "response body truncated");
        }
        let title = extract_title(&body);

        Ok(ProbeOutcome {
            host: host.to_string(),
            status,
            body,
            truncated,
            title,
            server,
            error: None,
        })
    }
}

/// Read the body chunk by chunk, stopping once `limit` bytes are held.
async fn read_body(resp: &mut Response, limit: Option<usize>) -> reqwest::Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        match limit {
            Some(max) if body.len() + chunk.len() > max => {
                body.extend_from_slice(&chunk[..max - body.len()]);
                return Ok((body, true));
            }
            _ => body.extend_from_slice(&chunk),
        }
    }
    Ok((body, false))
}

/// Text of the first `<title>` element, whitespace collapsed.
pub fn extract_title(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(body);
    let document = Html::parse_document(&text);
    let title = document
        .select(&TITLE_SELECTOR)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

pub mod async_writer;
pub mod console;

use async_trait::async_trait;
use serde::Serialize;

pub use async_writer::{FileSink, OutputFormat, WriterHandle};
pub use console::ConsoleSink;

/// A visible result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VhostHit {
    pub host: String,
    pub status: u16,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    pub truncated: bool,
}

impl VhostHit {
    /// `[200] admin.example.com size: 1234 bytes`
    pub fn line(&self) -> String {
        format!("[{}] {} size: {} bytes", self.status, self.host, self.size)
    }
}

/// Receives visible results as workers produce them.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record(&self, hit: &VhostHit);
}

#[async_trait]
impl<S: ResultSink> ResultSink for Option<S> {
    async fn record(&self, hit: &VhostHit) {
        if let Some(sink) = self {
            sink.record(hit).await;
        }
    }
}

/// Fan a hit out to two sinks in order.
#[async_trait]
impl<A: ResultSink, B: ResultSink> ResultSink for (A, B) {
    async fn record(&self, hit: &VhostHit) {
        self.0.record(hit).await;
        self.1.record(hit).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_line() {
        let hit = VhostHit {
            host: "admin.example.com".into(),
            status: 200,
            size: 1234,
            title: Some("Admin".into()),
            server: None,
            truncated: false,
        };
        assert_eq!(hit.line(), "[200] admin.example.com size: 1234 bytes");
    }
}

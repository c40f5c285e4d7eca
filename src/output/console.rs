use async_trait::async_trait;

use crate::output::{ResultSink, VhostHit};
use crate::progress::ScanProgress;

/// Prints visible results to stdout, above the progress bar.
pub struct ConsoleSink {
    progress: ScanProgress,
    verbose: bool,
}

impl ConsoleSink {
    pub fn new(progress: ScanProgress, verbose: bool) -> Self {
        Self { progress, verbose }
    }

    fn render(&self, hit: &VhostHit) -> String {
        let mut line = hit.line();
        if self.verbose {
            if let Some(ref title) = hit.title {
                line.push_str(&format!(" title: {:?}", title));
            }
            if let Some(ref server) = hit.server {
                line.push_str(&format!(" server: {}", server));
            }
            if hit.truncated {
                line.push_str(" (truncated)");
            }
        }
        line
    }
}

#[async_trait]
impl ResultSink for ConsoleSink {
    async fn record(&self, hit: &VhostHit) {
        self.progress.println(&self.render(hit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_line_carries_details() {
        let hit = VhostHit {
            host: "api.example.com".into(),
            status: 200,
            size: 10,
            title: Some("API".into()),
            server: Some("nginx".into()),
            truncated: true,
        };
        let quiet = ConsoleSink::new(ScanProgress::hidden(), false);
        let verbose = ConsoleSink::new(ScanProgress::hidden(), true);
        assert_eq!(quiet.render(&hit), "[200] api.example.com size: 10 bytes");
        assert_eq!(verbose.render(&hit), "[200] api.example.com size: 10 bytes title: \"API\" server: nginx (truncated)");
    }
}

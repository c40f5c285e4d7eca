use indicatif::{ProgressBar, ProgressStyle};

use crate::stats::RunStats;

/// Progress line on stderr. Display only: nothing reads it back.
#[derive(Clone)]
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    /// Bar over `total` candidates. Stays hidden when stderr is not a terminal.
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] Testing vhosts... {pos}/{len} ({percent}%) | [{msg}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self { bar: ProgressBar::hidden() }
    }

    pub fn update(&self, stats: &RunStats) {
        if self.bar.is_hidden() {
            return;
        }
        self.bar.set_position(stats.attempts());
        self.bar.set_message(stats.tally());
    }

    /// Print a result line to stdout without tearing the bar.
    pub fn println(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::Verdict;

    #[test]
    fn test_hidden_progress_is_inert() {
        let progress = ScanProgress::hidden();
        let stats = RunStats::new(2);
        stats.record(Verdict::Counted { visible: true }, 200);
        progress.update(&stats);
        progress.finish();
        assert_eq!(stats.attempts(), 1);
    }
}

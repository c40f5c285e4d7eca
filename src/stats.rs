use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::analyze::Verdict;

/// Shared tallies for one run, written by every worker.
#[derive(Debug)]
pub struct RunStats {
    total: u64,
    attempts: AtomicU64,
    failed: AtomicU64,
    baseline_matched: AtomicU64,
    filtered_size: AtomicU64,
    filtered_keyword: AtomicU64,
    visible: AtomicU64,
    status_counts: Mutex<AHashMap<u16, u64>>,
}

impl RunStats {
    pub fn new(total: usize) -> Self {
        Self {
            total: total as u64,
            attempts: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            baseline_matched: AtomicU64::new(0),
            filtered_size: AtomicU64::new(0),
            filtered_keyword: AtomicU64::new(0),
            visible: AtomicU64::new(0),
            status_counts: Mutex::new(AHashMap::new()),
        }
    }

    /// Record one finished probe. The bucket is bumped before the attempt count.
    pub fn record(&self, verdict: Verdict, status: u16) {
        match verdict {
            Verdict::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            Verdict::BaselineMatch => {
                self.baseline_matched.fetch_add(1, Ordering::Relaxed);
            }
            Verdict::FilteredSize => {
                self.filtered_size.fetch_add(1, Ordering::Relaxed);
            }
            Verdict::FilteredKeyword => {
                self.filtered_keyword.fetch_add(1, Ordering::Relaxed);
            }
            Verdict::Counted { visible } => {
                *self.status_counts.lock().entry(status).or_insert(0) += 1;
                if visible {
                    self.visible.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.attempts.fetch_add(1, Ordering::AcqRel);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Status tally sorted by code, e.g. `200:2 404:17`.
    pub fn tally(&self) -> String {
        let counts = self.status_counts.lock();
        let mut codes: Vec<_> = counts.iter().collect();
        codes.sort_by_key(|(code, _)| **code);
        codes
            .iter()
            .map(|(code, count)| format!("{}:{}", code, count))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn summary(&self, elapsed: Duration, cancelled: bool) -> RunSummary {
        RunSummary {
            total_words: self.total,
            attempts: self.attempts(),
            failed: self.failed.load(Ordering::Relaxed),
            baseline_matched: self.baseline_matched.load(Ordering::Relaxed),
            filtered_size: self.filtered_size.load(Ordering::Relaxed),
            filtered_keyword: self.filtered_keyword.load(Ordering::Relaxed),
            visible: self.visible.load(Ordering::Relaxed),
            status_counts: self.status_counts.lock().iter().map(|(k, v)| (*k, *v)).collect(),
            elapsed_ms: elapsed.as_millis() as u64,
            cancelled,
        }
    }
}

/// Final counts of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_words: u64,
    pub attempts: u64,
    pub failed: u64,
    pub baseline_matched: u64,
    pub filtered_size: u64,
    pub filtered_keyword: u64,
    pub visible: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub elapsed_ms: u64,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn counted(&self) -> u64 {
        self.status_counts.values().sum()
    }

    pub fn filtered(&self) -> u64 {
        self.filtered_size + self.filtered_keyword
    }

    pub fn print_summary(&self) {
        println!("\n\n  Total results:");
        if self.status_counts.is_empty() {
            println!("    (no responses beyond the baseline)");
        }
        for (code, count) in &self.status_counts {
            println!("    {} : {}", code, count);
        }

        println!("\n  Attempts: {}/{}", self.attempts, self.total_words);
        println!("    shown            : {}", self.visible);
        println!("    baseline matches : {}", self.baseline_matched);
        println!("    filtered (size)  : {}", self.filtered_size);
        println!("    filtered (kw)    : {}", self.filtered_keyword);
        println!("    failed           : {}", self.failed);
        println!("  Elapsed: {:.2}s", self.elapsed_ms as f64 / 1000.0);
        if self.cancelled {
            println!("  [!] Scan was cancelled before the wordlist was exhausted");
        }
    }
}

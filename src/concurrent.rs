use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::analyze::{Baseline, BaselineProber, ResponseClassifier};
use crate::config::ScanConfig;
use crate::error::Result;
use crate::http_client::create_scan_client;
use crate::output::{ResultSink, VhostHit};
use crate::probe::{Prober, RateLimiter};
use crate::progress::ScanProgress;
use crate::stats::{RunStats, RunSummary};

/// Concurrent vhost probing engine.
pub struct Scanner {
    config: ScanConfig,
    prober: Prober,
    cancel: CancellationToken,
}

/// Everything the workers of one run share. Dropped when the last worker returns.
struct RunContext {
    prober: Prober,
    domain: String,
    classifier: ResponseClassifier,
    limiter: Option<RateLimiter>,
    stats: RunStats,
    sink: Arc<dyn ResultSink>,
    progress: ScanProgress,
    cancel: CancellationToken,
}

type WorkQueue = Arc<Mutex<mpsc::Receiver<String>>>;

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let client = create_scan_client(&config)?;
        let prober = Prober::new(client, &config);
        Ok(Self {
            config,
            prober,
            cancel: CancellationToken::new(),
        })
    }

    /// Use an external token to abort the baseline phase or a running scan.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub async fn establish_baseline(&self) -> Result<Baseline> {
        let fingerprint = self.config.strategy.fingerprint();
        BaselineProber::new(&self.prober, &self.config.domain, fingerprint, self.config.baseline_probe_count())
            .establish(&self.cancel)
            .await
    }

    /// Baseline, then the full run.
    pub async fn scan(&self, words: Vec<String>, sink: Arc<dyn ResultSink>, progress: ScanProgress) -> Result<RunSummary> {
        let baseline = self.establish_baseline().await?;
        Ok(self.run(baseline, words, sink, progress).await)
    }

    /// Probe every candidate once with `threads` workers sharing one bounded queue.
    /// Returns when the queue is drained and all workers are done, or on cancellation.
    pub async fn run(&self, baseline: Baseline, words: Vec<String>, sink: Arc<dyn ResultSink>, progress: ScanProgress) -> RunSummary {
        let started = Instant::now();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let threads = self.config.worker_count();

        let ctx = Arc::new(RunContext {
            prober: self.prober.clone(),
            domain: self.config.domain.clone(),
            classifier: ResponseClassifier::new(baseline, self.config.filters.clone()),
            limiter: RateLimiter::new(self.config.rate_limit, self.config.burst, &self.cancel),
            stats: RunStats::new(words.len()),
            sink,
            progress,
            cancel: self.cancel.clone(),
        });

        tracing::info!(
            candidates = words.len(),
            threads,
            rate_limit = self.config.rate_limit,
            baseline = ctx.classifier.baseline().strategy(),
            signatures = ctx.classifier.baseline().signatures().len(),
            "starting vhost scan"
        );

        let (tx, rx) = mpsc::channel::<String>(threads);
        let queue: WorkQueue = Arc::new(Mutex::new(rx));

        let mut workers = FuturesUnordered::new();
        for id in 0..threads {
            workers.push(tokio::spawn(worker(id, ctx.clone(), queue.clone())));
        }
        drop(queue);

        for word in words {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = tx.send(word) => {
                    if sent.is_err() {
                        tracing::error!("all workers exited early, stopping feed");
                        break;
                    }
                }
            }
        }
        drop(tx);

        while let Some(joined) = workers.next().await {
            match joined {
                Ok(handled) => tracing::debug!(handled, "worker finished"),
                Err(e) => tracing::error!(error = %e, "worker task failed"),
            }
        }

        ctx.progress.finish();
        let cancelled = self.cancel.is_cancelled() && ctx.stats.attempts() < ctx.stats.total();
        ctx.stats.summary(started.elapsed(), cancelled)
    }
}

/// Pull candidates until the queue closes or the run is cancelled. Returns how many were probed.
async fn worker(id: usize, ctx: Arc<RunContext>, queue: WorkQueue) -> usize {
    let mut handled = 0usize;
    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => None,
                word = rx.recv() => word,
            }
        };
        let Some(candidate) = next else { break };

        if let Some(ref limiter) = ctx.limiter {
            if limiter.acquire().await.is_err() {
                break;
            }
        }

        let host = format!("{}.{}", candidate, ctx.domain);
        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            outcome = ctx.prober.probe(&host) => outcome,
        };

        let verdict = ctx.classifier.classify(&outcome);
        ctx.stats.record(verdict, outcome.status);
        tracing::debug!(
            worker = id,
            host = %host,
            status = outcome.status,
            size = outcome.size(),
            verdict = verdict.label(),
            "probe classified"
        );

        if verdict.is_visible() {
            let size = outcome.size();
            let hit = VhostHit {
                host: outcome.host,
                status: outcome.status,
                size,
                title: outcome.title,
                server: outcome.server,
                truncated: outcome.truncated,
            };
            ctx.sink.record(&hit).await;
        }

        ctx.progress.update(&ctx.stats);
        handled += 1;
    }
    handled
}

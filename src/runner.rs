use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use vhost_hunter::config::ScanConfig;
use vhost_hunter::output::{ConsoleSink, FileSink, ResultSink};
use vhost_hunter::progress::ScanProgress;
use vhost_hunter::Scanner;

use crate::cli::Cli;

fn print_banner(cli: &Cli, cfg: &ScanConfig, words: usize) {
    println!(r#"
   .   , .           .
   |  /  |           |
   | /   |-. . . ;-. |-  ,-. ;-.
   |/    | | | | | | |   |-' |
   '     ' ' `-` ' ' `-' `-' '   vhost_hunter v{}
    "#, env!("CARGO_PKG_VERSION"));
    println!("─────────────────────┬──────────────────────");
    println!("     Target URL      │ {}", cfg.target);
    println!("     Domain          │ {}", cfg.domain);
    println!("     Threads         │ {}", cfg.worker_count());
    println!("     Wordlist        │ {} ({} words)", cli.wordlist.display(), words);
    println!("     HTTP Method     │ {}", cfg.method);
    println!("     Timeout (sec)   │ {}", cfg.timeout.as_secs());
    println!("     Baseline        │ {} ({} probes)", cfg.strategy.fingerprint().name(), cfg.baseline_probe_count());
    println!(
        "     Output File     │ {}",
        cli.output.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "none".to_string())
    );
    println!("     Verbose Mode    │ {}", cli.verbose);
    if let Some(size) = cfg.filters.exact_size {
        println!("     Filter Size     │ {} bytes", size);
    }
    if let Some(ref keyword) = cfg.filters.ignore_keyword {
        println!("     Filter Keyword  │ {}", keyword);
    }
    if cfg.rate_limit > 0 {
        println!("     Rate Limit      │ {} req/sec", cfg.rate_limit);
    }
    if !cfg.filters.only_codes.is_empty() {
        println!("     Show Codes      │ {}", join_codes(cfg.filters.only_codes.iter()));
    } else if !cfg.filters.ignore_codes.is_empty() {
        println!("     Filter Codes    │ {}", join_codes(cfg.filters.ignore_codes.iter()));
    } else {
        println!("     Show Codes      │ all");
    }
    println!("─────────────────────┴──────────────────────");
}

fn join_codes<'a>(codes: impl Iterator<Item = &'a u16>) -> String {
    let mut codes: Vec<_> = codes.copied().collect();
    codes.sort_unstable();
    let codes: Vec<String> = codes.iter().map(u16::to_string).collect();
    format!("[{}]", codes.join(", "))
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Our crate at the requested level, HTTP internals kept quiet.
    // Logs go to stderr so stdout only carries results.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!(
        "vhost_hunter={level},reqwest=info,hyper=info,rustls=warn",
        level = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .init();

    let cfg = cli.scan_config()?;
    let words = vhost_hunter::utils::read_wordlist(&cli.wordlist)?;

    let (file_sink, writer) = match cli.output {
        Some(ref path) => {
            let (sink, writer) = FileSink::create(path, cli.format).await?;
            (Some(sink), Some(writer))
        }
        None => (None, None),
    };

    print_banner(&cli, &cfg, words.len());

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n[!] Interrupted, stopping workers...");
                cancel.cancel();
            }
        });
    }

    let scanner = Scanner::new(cfg)
        .context("failed to set up scanner")?
        .with_cancellation(cancel);

    println!("[*] Sending baseline requests to {} ...", scanner.config().domain);
    let baseline = scanner.establish_baseline().await?;
    println!("[+] Baseline recorded ({} signature(s), {})", baseline.signatures().len(), baseline.strategy());

    let progress = if cli.no_progress {
        ScanProgress::hidden()
    } else {
        ScanProgress::new(words.len() as u64)
    };
    let console = ConsoleSink::new(progress.clone(), cli.verbose);
    let sink: Arc<dyn ResultSink> = Arc::new((console, file_sink));

    let summary = scanner.run(baseline, words, sink, progress).await;

    if let Some(writer) = writer {
        writer.finish().await;
    }

    summary.print_summary();
    Ok(())
}

//! `headcheck fetch-headers` – probe eligible items and commit the results.

use anyhow::Result;
use headcheck_core::config::{HeadcheckConfig, RunParams};
use headcheck_core::fetch_head::{CurlProber, ProbeOptions};
use headcheck_core::fetcher::Fetcher;
use headcheck_core::pipeline::fetch_content;
use headcheck_core::rate_limit::RateLimiter;
use headcheck_core::retry::RetryPolicy;
use headcheck_core::stats::Stats;
use headcheck_core::store::{EligibleQuery, ItemDb};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Command-line overrides for one run.
#[derive(Debug, Clone, Default)]
pub struct FetchArgs {
    pub workers: Option<usize>,
    pub recheck: bool,
    pub rate_limit: Option<i64>,
    pub batch_size: Option<usize>,
}

pub async fn run_fetch_headers(db: &ItemDb, cfg: &HeadcheckConfig, args: FetchArgs) -> Result<()> {
    let params = RunParams::from_config(
        cfg,
        args.workers,
        args.recheck,
        args.rate_limit,
        args.batch_size,
    );
    params.validate()?;
    if let Some(retry) = &cfg.retry {
        retry.validate()?;
    }
    let filter = cfg.filter("headers")?;
    if !filter.is_empty() {
        tracing::info!(?filter, "restricting run to configured filter");
    }

    let policy = cfg
        .retry
        .as_ref()
        .map(RetryPolicy::from)
        .unwrap_or_default();
    let prober = CurlProber::new(ProbeOptions::from(&cfg.probe));
    let fetcher = Fetcher::new(
        Arc::new(prober),
        params.workers,
        RateLimiter::new(params.rate_limit),
    )
    .with_retry_policy(policy);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight probes");
            eprintln!("Interrupted; committing finished probes...");
            on_signal.cancel();
        }
    });

    let mut stats = Stats::new();
    let res = fetch_content(
        Arc::new(db.clone()),
        &fetcher,
        &EligibleQuery::new(params.recheck, filter),
        params.batch_size,
        cancel,
        &mut stats,
    )
    .await;
    signal_task.abort();

    // Counts of committed results are printed whether or not the run finished.
    println!("{stats}");
    res?;
    Ok(())
}

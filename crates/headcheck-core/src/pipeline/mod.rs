//! Header fetch run: eligible items → worker pool → batched commits.
//!
//! A feeder task pages eligible items out of the store into the pool's
//! bounded input. The calling task is the only committer: it gathers results
//! into batches of `batch_size`, commits each batch in one transaction and
//! only then counts it in the run's [`Stats`].

use anyhow::anyhow;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::fetcher::{FetchError, FetchResult, Fetcher};
use crate::item::FetchItem;
use crate::stats::Stats;
use crate::store::{next_eligible, EligibleQuery, ItemStore};

/// Why a run stopped before processing every eligible item.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Reading the next page of eligible items failed.
    #[error("eligible item query failed: {0:#}")]
    Query(anyhow::Error),
    /// A batch could not be committed; it was not counted.
    #[error("batch commit failed: {0:#}")]
    Commit(anyhow::Error),
    /// The run was cancelled from outside; finished work was committed.
    #[error("interrupted")]
    Interrupted,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Probe every eligible item and persist the results.
///
/// Committed results are recorded in `stats`, also when an error is
/// returned, so the caller can always report what was done.
pub async fn fetch_content<S: ItemStore>(
    store: Arc<S>,
    fetcher: &Fetcher,
    query: &EligibleQuery,
    batch_size: usize,
    cancel: CancellationToken,
    stats: &mut Stats,
) -> Result<(), PipelineError> {
    let batch_size = batch_size.max(1);
    let page_size = fetcher.workers();
    // Child token: a commit failure stops this run without touching the caller's token.
    let run = cancel.child_token();

    tracing::info!(
        workers = fetcher.workers(),
        batch_size,
        recheck = query.include_not_found,
        unlimited = fetcher.limiter().is_unlimited(),
        rate_interval = ?fetcher.limiter().interval(),
        "starting header fetch"
    );

    let (tx, rx) = mpsc::channel(page_size);
    let feeder = spawn_feeder(
        Arc::clone(&store),
        query.clone(),
        page_size,
        tx,
        run.clone(),
    );
    let mut results = fetcher.spawn(rx, run.clone());

    let mut committer = Committer::new(store.as_ref(), batch_size);
    let mut failure = None;
    while let Some(result) = results.next().await {
        if let Err(e) = committer.push(result, stats).await {
            run.cancel();
            failure = Some(e);
            break;
        }
    }
    if failure.is_none() {
        if let Err(e) = committer.flush(stats).await {
            failure = Some(e);
        }
    }

    let joined = results.join().await;
    let fed = feeder.await;

    if let Some(e) = failure {
        tracing::error!(error = %e, committed = committer.committed, "aborting header fetch");
        return Err(e);
    }
    joined?;
    let feed = match fed {
        Ok(Ok(feed)) => feed,
        Ok(Err(e)) => {
            tracing::error!(error = %e, committed = committer.committed, "eligible item query failed");
            return Err(PipelineError::Query(e));
        }
        Err(join) => return Err(PipelineError::Query(anyhow!("feeder task failed: {join}"))),
    };
    // A cancel that lands after the last item was fed and committed does not
    // interrupt anything.
    if cancel.is_cancelled() && (!feed.exhausted || committer.committed < feed.fed) {
        tracing::warn!(
            fed = feed.fed,
            committed = committer.committed,
            "header fetch interrupted"
        );
        return Err(PipelineError::Interrupted);
    }

    tracing::info!(
        fed = feed.fed,
        committed = committer.committed,
        batches = committer.batches,
        "header fetch finished"
    );
    Ok(())
}

/// What the feeder handed to the pool.
#[derive(Debug, Clone, Copy)]
struct Feed {
    fed: u64,
    /// The eligible stream ran to its end.
    exhausted: bool,
}

/// Forward eligible items into the pool until the stream ends, the run is
/// cancelled, or the pool stops listening.
fn spawn_feeder<S: ItemStore>(
    store: Arc<S>,
    query: EligibleQuery,
    page_size: usize,
    tx: mpsc::Sender<FetchItem>,
    cancel: CancellationToken,
) -> JoinHandle<anyhow::Result<Feed>> {
    tokio::spawn(async move {
        let mut items = std::pin::pin!(next_eligible(store, query, page_size));
        let mut feed = Feed {
            fed: 0,
            exhausted: false,
        };
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = items.next() => next,
            };
            let Some(item) = next.transpose()? else {
                feed.exhausted = true;
                break;
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = tx.send(item) => if sent.is_err() { break },
            }
            feed.fed += 1;
        }
        Ok(feed)
    })
}

/// Accumulates results and commits them in fixed-size batches.
struct Committer<'a, S> {
    store: &'a S,
    batch: Vec<FetchResult>,
    batch_size: usize,
    committed: u64,
    batches: u64,
}

impl<'a, S: ItemStore> Committer<'a, S> {
    fn new(store: &'a S, batch_size: usize) -> Self {
        Self {
            store,
            batch: Vec::new(),
            batch_size,
            committed: 0,
            batches: 0,
        }
    }

    async fn push(&mut self, result: FetchResult, stats: &mut Stats) -> Result<(), PipelineError> {
        self.batch.push(result);
        if self.batch.len() >= self.batch_size {
            self.flush(stats).await?;
        }
        Ok(())
    }

    async fn flush(&mut self, stats: &mut Stats) -> Result<(), PipelineError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.store
            .commit_batch(&self.batch)
            .await
            .map_err(PipelineError::Commit)?;
        for r in &self.batch {
            stats.record(r.outcome.stat_key());
        }
        self.committed += self.batch.len() as u64;
        self.batches += 1;
        tracing::info!(
            size = self.batch.len(),
            committed = self.committed,
            "committed batch"
        );
        self.batch.clear();
        Ok(())
    }
}

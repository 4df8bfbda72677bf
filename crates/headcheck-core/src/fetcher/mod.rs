//! Bounded worker pool issuing rate-limited HEAD probes.
//!
//! `W` workers pull items from a shared bounded channel (so the producer is
//! only advanced as fast as workers free up), acquire a permit from the
//! run's single `RateLimiter`, probe, and push one `FetchResult` per item onto
//! the result channel. Results arrive in completion order, not input order.

mod outcome;
mod worker;

pub use outcome::{FetchOutcome, FetchResult};

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::fetch_head::Prober;
use crate::item::FetchItem;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;

use worker::Worker;

/// Error surfaced when the pool itself misbehaves.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("probe worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Fixed-size pool of probe workers sharing one rate limiter.
pub struct Fetcher {
    prober: Arc<dyn Prober>,
    workers: usize,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Pool of `workers` (at least one) probing through `prober`.
    pub fn new(prober: Arc<dyn Prober>, workers: usize, limiter: RateLimiter) -> Self {
        Self {
            prober,
            workers: workers.max(1),
            limiter: Arc::new(limiter),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Start the workers on a pull-based input channel.
    ///
    /// The returned handle yields results until every worker has exited,
    /// which happens once `items` is closed and drained, or `cancel` fires.
    pub fn spawn(&self, items: mpsc::Receiver<FetchItem>, cancel: CancellationToken) -> FetchHandle {
        let input = Arc::new(Mutex::new(items));
        let (tx, rx) = mpsc::channel(self.workers);
        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            let worker = Worker {
                prober: Arc::clone(&self.prober),
                limiter: Arc::clone(&self.limiter),
                policy: self.policy,
                cancel: cancel.clone(),
            };
            workers.spawn(worker.run(id, Arc::clone(&input), tx.clone()));
        }
        drop(tx);
        FetchHandle {
            results: rx,
            workers,
        }
    }

    /// Like [`Fetcher::spawn`] for an arbitrary stream of items.
    pub fn fetch<S>(&self, items: S, cancel: CancellationToken) -> FetchHandle
    where
        S: Stream<Item = FetchItem> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.workers);
        let feeder_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut items = std::pin::pin!(items);
            while let Some(item) = items.next().await {
                tokio::select! {
                    biased;
                    _ = feeder_cancel.cancelled() => break,
                    sent = tx.send(item) => if sent.is_err() { break },
                }
            }
        });
        self.spawn(rx, cancel)
    }
}

/// Receiving end of a running pool.
pub struct FetchHandle {
    results: mpsc::Receiver<FetchResult>,
    workers: JoinSet<()>,
}

impl FetchHandle {
    /// Next result in arrival order; `None` once all workers have exited.
    pub async fn next(&mut self) -> Option<FetchResult> {
        self.results.recv().await
    }

    /// Stop receiving and wait for every worker to exit.
    pub async fn join(mut self) -> Result<(), FetchError> {
        self.results.close();
        let mut panicked = None;
        while let Some(res) = self.workers.join_next().await {
            if let Err(e) = res {
                if e.is_panic() && panicked.is_none() {
                    panicked = Some(e.to_string());
                }
            }
        }
        match panicked {
            Some(msg) => Err(FetchError::WorkerPanicked(msg)),
            None => Ok(()),
        }
    }

    /// Drain every result, then join the workers.
    pub async fn collect(mut self) -> Result<Vec<FetchResult>, FetchError> {
        let mut out = Vec::new();
        while let Some(r) = self.next().await {
            out.push(r);
        }
        self.join().await?;
        Ok(out)
    }
}

//! One probe worker: pull an item, probe it under the rate limit, retry
//! transient failures, emit exactly one result.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::fetch_head::{ProbeError, Prober};
use crate::item::FetchItem;
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryDecision, RetryPolicy};

use super::outcome::{FetchOutcome, FetchResult};

/// Per-item probe state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Step {
    /// Waiting for a permit before attempt number `attempt`.
    Ready {
        attempt: u32,
        previous: Option<FetchOutcome>,
    },
    /// Attempt `attempt` failed transiently; sleeping before the next one.
    Backoff {
        attempt: u32,
        delay: Duration,
        outcome: FetchOutcome,
    },
    /// Final outcome.
    Done { attempts: u32, outcome: FetchOutcome },
    /// Cancelled before any attempt was made.
    Abandoned,
}

impl Step {
    pub(super) fn start() -> Self {
        Step::Ready {
            attempt: 1,
            previous: None,
        }
    }
}

/// Transition after attempt `attempt` produced `outcome`.
pub(super) fn after_attempt(policy: &RetryPolicy, attempt: u32, outcome: FetchOutcome) -> Step {
    let decision = match outcome.retry_kind() {
        Some(kind) => policy.decide(attempt, kind),
        None => RetryDecision::NoRetry,
    };
    match decision {
        RetryDecision::NoRetry => Step::Done {
            attempts: attempt,
            outcome,
        },
        RetryDecision::RetryAfter(delay) => Step::Backoff {
            attempt,
            delay,
            outcome,
        },
    }
}

/// Transition when the run is cancelled while in `step`.
pub(super) fn on_cancel(step: Step) -> Step {
    match step {
        Step::Ready {
            previous: None, ..
        } => Step::Abandoned,
        Step::Ready {
            attempt,
            previous: Some(outcome),
        } => Step::Done {
            attempts: attempt - 1,
            outcome,
        },
        Step::Backoff {
            attempt, outcome, ..
        } => Step::Done {
            attempts: attempt,
            outcome,
        },
        done => done,
    }
}

pub(super) struct Worker {
    pub(super) prober: Arc<dyn Prober>,
    pub(super) limiter: Arc<RateLimiter>,
    pub(super) policy: RetryPolicy,
    pub(super) cancel: CancellationToken,
}

impl Worker {
    /// Pull items until the input closes, the run is cancelled, or nobody
    /// listens for results any more.
    pub(super) async fn run(
        self,
        id: usize,
        input: Arc<Mutex<mpsc::Receiver<FetchItem>>>,
        output: mpsc::Sender<FetchResult>,
    ) {
        let mut probed = 0u64;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                item = async { input.lock().await.recv().await } => item,
            };
            let Some(item) = next else { break };
            let Some(result) = self.probe(item).await else {
                break;
            };
            probed += 1;
            if output.send(result).await.is_err() {
                break;
            }
        }
        tracing::trace!(worker = id, probed, "probe worker exiting");
    }

    /// Drive the state machine for one item. `None` only if cancelled before
    /// the first attempt.
    pub(super) async fn probe(&self, item: FetchItem) -> Option<FetchResult> {
        let mut step = Step::start();
        loop {
            step = match step {
                Step::Ready { attempt, previous } => {
                    let cancelled = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => true,
                        _ = self.limiter.acquire() => false,
                    };
                    if cancelled {
                        on_cancel(Step::Ready { attempt, previous })
                    } else {
                        let outcome = self.attempt(&item.url).await;
                        after_attempt(&self.policy, attempt, outcome)
                    }
                }
                Step::Backoff {
                    attempt,
                    delay,
                    outcome,
                } => {
                    tracing::debug!(
                        hash = %item.hash,
                        attempt,
                        ?delay,
                        status = ?outcome.status(),
                        "transient probe failure, retrying"
                    );
                    let cancelled = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => true,
                        _ = tokio::time::sleep(delay) => false,
                    };
                    if cancelled {
                        on_cancel(Step::Backoff {
                            attempt,
                            delay,
                            outcome,
                        })
                    } else {
                        Step::Ready {
                            attempt: attempt + 1,
                            previous: Some(outcome),
                        }
                    }
                }
                Step::Done { attempts, outcome } => {
                    return Some(FetchResult {
                        item,
                        outcome,
                        attempts,
                    });
                }
                Step::Abandoned => return None,
            };
        }
    }

    async fn attempt(&self, url: &str) -> FetchOutcome {
        let prober = Arc::clone(&self.prober);
        let url = url.to_string();
        match tokio::task::spawn_blocking(move || prober.head(&url)).await {
            Ok(Ok(resp)) => FetchOutcome::from_response(resp),
            Ok(Err(e)) => FetchOutcome::from_probe_error(&e),
            Err(join) => FetchOutcome::from_probe_error(&ProbeError::Task(join.to_string())),
        }
    }
}

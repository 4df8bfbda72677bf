//! Retry and backoff policy for probes.
//!
//! Classifies HTTP statuses and curl errors into outcome classes and decides
//! whether (and after how long) a transient failure is retried.

mod classify;
mod policy;

pub use classify::{classify_curl_error, classify_status, StatusClass};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};

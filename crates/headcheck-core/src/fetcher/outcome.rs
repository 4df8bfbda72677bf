//! Probe outcomes and their classification.

use crate::fetch_head::{ProbeError, ProbeResponse, ResponseHeaders};
use crate::item::FetchItem;
use crate::objects::{hash_from_etag, ContentId};
use crate::retry::{classify_curl_error, classify_status, ErrorKind, StatusClass};
use crate::stats::StatKey;

/// Final result of probing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response. `etag_hash` is the identifier recovered from the ETag, if any.
    Found {
        status: u16,
        etag_hash: Option<ContentId>,
        headers: ResponseHeaders,
    },
    /// 404 or 410.
    NotFound { status: u16 },
    /// Retryable failure that survived the retry budget.
    TransientError {
        status: Option<u16>,
        kind: ErrorKind,
        reason: String,
    },
    /// Failure that retrying will not fix (403, bad URL, ...).
    PermanentError { status: Option<u16>, reason: String },
}

impl FetchOutcome {
    /// Classify a completed HTTP exchange.
    pub fn from_response(resp: ProbeResponse) -> Self {
        let status = resp.status;
        match classify_status(status) {
            StatusClass::Found => {
                let etag_hash = resp.headers.etag().and_then(hash_from_etag);
                FetchOutcome::Found {
                    status,
                    etag_hash,
                    headers: resp.headers,
                }
            }
            StatusClass::NotFound => FetchOutcome::NotFound { status },
            StatusClass::Transient(kind) => FetchOutcome::TransientError {
                status: Some(status),
                kind,
                reason: format!("HTTP {status}"),
            },
            StatusClass::Permanent => FetchOutcome::PermanentError {
                status: Some(status),
                reason: format!("HTTP {status}"),
            },
        }
    }

    /// Classify a transport failure.
    pub fn from_probe_error(e: &ProbeError) -> Self {
        let kind = match e {
            ProbeError::Curl(ce) => classify_curl_error(ce),
            ProbeError::Task(_) => ErrorKind::Other,
        };
        match kind {
            ErrorKind::Other => FetchOutcome::PermanentError {
                status: None,
                reason: e.to_string(),
            },
            kind => FetchOutcome::TransientError {
                status: None,
                kind,
                reason: e.to_string(),
            },
        }
    }

    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchOutcome::Found { status, .. } | FetchOutcome::NotFound { status } => Some(*status),
            FetchOutcome::TransientError { status, .. }
            | FetchOutcome::PermanentError { status, .. } => *status,
        }
    }

    pub fn stat_key(&self) -> StatKey {
        self.status().map(StatKey::Status).unwrap_or(StatKey::Error)
    }

    /// True for outcomes that leave the item unchecked.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            FetchOutcome::TransientError { .. } | FetchOutcome::PermanentError { .. }
        )
    }

    /// Error kind to feed the retry policy, for transient failures only.
    pub(crate) fn retry_kind(&self) -> Option<ErrorKind> {
        match self {
            FetchOutcome::TransientError { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// An item paired with its outcome; what the committer receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub item: FetchItem,
    pub outcome: FetchOutcome,
    /// Number of probe attempts made (1 when no retry happened).
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch_head::ResponseHeaders;

    fn response(status: u16, etag: Option<&str>) -> ProbeResponse {
        let mut headers = ResponseHeaders::new();
        if let Some(e) = etag {
            headers.insert("ETag", e);
        }
        ProbeResponse { status, headers }
    }

    #[test]
    fn found_extracts_etag_hash() {
        let out = FetchOutcome::from_response(response(
            200,
            Some("\"A1B2C3D4E5F60718293A4B5C6D7E8F90-1\""),
        ));
        match out {
            FetchOutcome::Found {
                status, etag_hash, ..
            } => {
                assert_eq!(status, 200);
                assert_eq!(
                    etag_hash.as_ref().map(ContentId::as_str),
                    Some("a1b2c3d4e5f60718293a4b5c6d7e8f90")
                );
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn found_without_usable_etag() {
        let out = FetchOutcome::from_response(response(200, Some("\"opaque\"")));
        assert!(matches!(out, FetchOutcome::Found { etag_hash: None, .. }));
        let out = FetchOutcome::from_response(response(204, None));
        assert!(matches!(out, FetchOutcome::Found { etag_hash: None, .. }));
    }

    #[test]
    fn status_mapping_and_keys() {
        let gone = FetchOutcome::from_response(response(410, None));
        assert_eq!(gone, FetchOutcome::NotFound { status: 410 });
        assert_eq!(gone.stat_key(), StatKey::Status(410));
        assert!(!gone.is_error());

        let throttled = FetchOutcome::from_response(response(429, None));
        assert_eq!(throttled.retry_kind(), Some(ErrorKind::Throttled));
        assert!(throttled.is_error());

        let forbidden = FetchOutcome::from_response(response(403, None));
        assert!(matches!(
            forbidden,
            FetchOutcome::PermanentError {
                status: Some(403),
                ..
            }
        ));
        assert_eq!(forbidden.retry_kind(), None);
    }

    #[test]
    fn task_failure_is_permanent_error_without_status() {
        let out = FetchOutcome::from_probe_error(&ProbeError::Task("panicked".into()));
        assert!(matches!(out, FetchOutcome::PermanentError { status: None, .. }));
        assert_eq!(out.stat_key(), StatKey::Error);
    }
}

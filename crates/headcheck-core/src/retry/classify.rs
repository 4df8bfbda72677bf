//! Classify HTTP status codes and curl errors.
//!
//! Status table:
//!
//! | status                  | class                  |
//! |-------------------------|------------------------|
//! | 200–299                 | Found                  |
//! | 404, 410                | NotFound               |
//! | 408                     | Transient(Timeout)     |
//! | 429, 503                | Transient(Throttled)   |
//! | other 500–599           | Transient(Http5xx)     |
//! | everything else         | Permanent              |

use super::policy::ErrorKind;

/// What a response status means for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Found,
    NotFound,
    Transient(ErrorKind),
    Permanent,
}

/// Map a final HTTP status (after redirects) to its class.
pub fn classify_status(code: u16) -> StatusClass {
    match code {
        200..=299 => StatusClass::Found,
        404 | 410 => StatusClass::NotFound,
        408 => StatusClass::Transient(ErrorKind::Timeout),
        429 | 503 => StatusClass::Transient(ErrorKind::Throttled),
        500..=599 => StatusClass::Transient(ErrorKind::Http5xx(code)),
        _ => StatusClass::Permanent,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

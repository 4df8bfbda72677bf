//! Parse HTTP response header lines into ResponseHeaders.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headers of one response, names lowercased. Repeated headers are joined with ", ".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseHeaders(BTreeMap<String, String>);

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        self.0
            .entry(name)
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    pub fn etag(&self) -> Option<&str> {
        self.get("etag")
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.get("last-modified")
    }

    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length").and_then(|v| v.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse collected header lines. With redirects curl reports every hop; a
/// status line starts a new response, so only the last one's headers are kept.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHeaders {
    let mut headers = ResponseHeaders::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers = ResponseHeaders::new();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name, value);
        }
    }

    headers
}

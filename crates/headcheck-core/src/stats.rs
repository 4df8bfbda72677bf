//! Aggregate response counts for one run.

use std::collections::BTreeMap;
use std::fmt;

/// Classification key. Statuses sort before the error sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    /// The probe got an HTTP response with this status.
    Status(u16),
    /// The probe failed without any HTTP status.
    Error,
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKey::Status(code) => write!(f, "{code}"),
            StatKey::Error => f.write_str("error"),
        }
    }
}

/// Count of committed results per key. Only the committer writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    counts: BTreeMap<StatKey, u64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: StatKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: StatKey) -> u64 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatKey, u64)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }

    /// One `key count` line per key, ordered by key.
    pub fn summary(&self) -> String {
        if self.counts.is_empty() {
            return "no responses".to_string();
        }
        self.iter()
            .map(|(k, v)| format!("{k:>5} {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_total() {
        let mut s = Stats::new();
        assert!(s.is_empty());
        s.record(StatKey::Status(200));
        s.record(StatKey::Status(200));
        s.record(StatKey::Error);
        assert_eq!(s.get(StatKey::Status(200)), 2);
        assert_eq!(s.get(StatKey::Status(404)), 0);
        assert_eq!(s.total(), 3);
    }

    #[test]
    fn summary_is_ordered_by_key() {
        let mut s = Stats::new();
        s.record(StatKey::Error);
        s.record(StatKey::Status(503));
        s.record(StatKey::Status(404));
        s.record(StatKey::Status(200));
        s.record(StatKey::Status(404));
        assert_eq!(s.summary(), "  200 1\n  404 2\n  503 1\nerror 1");
        assert_eq!(s.to_string(), s.summary());
    }

    #[test]
    fn empty_summary() {
        assert_eq!(Stats::new().summary(), "no responses");
    }
}

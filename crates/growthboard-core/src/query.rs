//! Query descriptors and their tagged outcomes.

use std::fmt;

use serde::Serialize;

use crate::window::TimeWindow;

/// What an analytics query counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricKind {
    /// First-time users in the window.
    NewUsers,
    /// Occurrences of one named event.
    NamedEvent(String),
    /// Page views whose path contains the pattern.
    PagePathFilter(String),
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::NewUsers => f.write_str("new_users"),
            MetricKind::NamedEvent(name) => write!(f, "event:{name}"),
            MetricKind::PagePathFilter(pattern) => write!(f, "page_path:{pattern}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub kind: MetricKind,
    pub window: TimeWindow,
}

impl MetricQuery {
    pub fn new(kind: MetricKind, window: TimeWindow) -> Self {
        Self { kind, window }
    }
}

/// Outcome of one count query.
///
/// `Unavailable` is kept distinct from `Value(0)` until the snapshot is built,
/// where both render as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricResult {
    Value(u64),
    Unavailable,
}

impl MetricResult {
    pub fn is_available(self) -> bool {
        matches!(self, MetricResult::Value(_))
    }

    pub fn value_or_zero(self) -> u64 {
        match self {
            MetricResult::Value(v) => v,
            MetricResult::Unavailable => 0,
        }
    }
}

impl From<u64> for MetricResult {
    fn from(value: u64) -> Self {
        MetricResult::Value(value)
    }
}

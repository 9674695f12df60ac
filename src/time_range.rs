//! Timestamp ranges used as activation windows and tick payloads

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp in nanoseconds
pub type Timestamp = u64;

/// A pair of optional begin/end timestamps
///
/// Ordering is lexicographic on `(begin, end)`; an unset bound sorts before
/// any set bound.
///
/// # Example
/// ```
/// use tracewindow::TimeRange;
///
/// let range: TimeRange = "[10,20]".parse()?;
/// assert_eq!(range, TimeRange::new(Some(10), Some(20)));
/// assert!(range.contains(15));
/// # Ok::<(), tracewindow::AnalysisError>(())
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeRange {
    #[serde(default)]
    pub begin: Option<Timestamp>,
    #[serde(default)]
    pub end: Option<Timestamp>,
}

impl TimeRange {
    pub const fn new(begin: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Self { begin, end }
    }

    /// Range with both bounds set
    pub const fn bounded(begin: Timestamp, end: Timestamp) -> Self {
        Self::new(Some(begin), Some(end))
    }

    /// Range with neither bound set (all time)
    pub const fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// Check the `begin <= end` invariant
    pub fn is_valid(&self) -> bool {
        match (self.begin, self.end) {
            (Some(b), Some(e)) => b <= e,
            _ => true,
        }
    }

    /// Whether `ts` lies within the range, treating unset bounds as open
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.begin.map_or(true, |b| ts >= b) && self.end.map_or(true, |e| ts <= e)
    }

    /// Whether the range is over by the time `ts` is seen
    pub fn ends_before(&self, ts: Timestamp) -> bool {
        self.end.is_some_and(|e| ts > e)
    }

    /// Whether `ts` has not reached the begin bound yet
    pub fn begins_after(&self, ts: Timestamp) -> bool {
        self.begin.is_some_and(|b| b > ts)
    }

    /// Length in nanoseconds when both bounds are set
    pub fn duration(&self) -> Option<u64> {
        match (self.begin, self.end) {
            (Some(b), Some(e)) => Some(e.saturating_sub(b)),
            _ => None,
        }
    }
}

fn fmt_bound(bound: Option<Timestamp>) -> String {
    bound.map(|ts| ts.to_string()).unwrap_or_default()
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", fmt_bound(self.begin), fmt_bound(self.end))
    }
}

fn parse_bound(raw: &str, input: &str) -> Result<Option<Timestamp>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Timestamp>().map(Some).map_err(|e| {
        AnalysisError::InvalidTimeRange(format!("bad timestamp '{}' in '{}': {}", raw, input, e))
    })
}

impl FromStr for TimeRange {
    type Err = AnalysisError;

    /// Parse `[begin,end]` or `begin,end`; an empty side leaves that bound unset
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let inner = match (trimmed.starts_with('['), trimmed.ends_with(']')) {
            (true, true) if trimmed.len() >= 2 => &trimmed[1..trimmed.len() - 1],
            (false, false) => trimmed,
            _ => {
                return Err(AnalysisError::InvalidTimeRange(format!(
                    "unbalanced brackets in '{}'",
                    s
                )))
            }
        };

        let (begin, end) = inner.split_once(',').ok_or_else(|| {
            AnalysisError::InvalidTimeRange(format!("expected 'begin,end', got '{}'", s))
        })?;

        let range = Self::new(parse_bound(begin, s)?, parse_bound(end, s)?);
        if !range.is_valid() {
            return Err(AnalysisError::InvalidTimeRange(format!(
                "begin is after end in '{}'",
                s
            )));
        }
        Ok(range)
    }
}

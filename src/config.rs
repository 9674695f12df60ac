//! Analysis configuration record
//!
//! One record per analysis run. It enumerates every activation mode and
//! static filter; it carries no behaviour of its own and is never mutated by
//! the engine.

use crate::error::{AnalysisError, Result};
use crate::time_range::TimeRange;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Activation and filter options for one analysis run
///
/// Activation precedence is fixed: `range_ts` gates everything, and
/// `period_begin_ev_name` overrides `refresh_period`. Conflicting options are
/// not rejected.
///
/// # Example TOML
/// ```toml
/// range_ts = [{ begin = 10, end = 20 }, { begin = 30, end = 40 }]
/// refresh_period = 1000000000
/// proc_list = ["bash"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Explicit activation windows, consumed in order
    pub range_ts: Vec<TimeRange>,

    pub period_begin_ev_name: Option<String>,
    pub period_end_ev_name: Option<String>,
    pub period_begin_key_fields: Vec<String>,
    /// Falls back to `period_begin_key_fields` when empty
    pub period_end_key_fields: Vec<String>,
    /// Restrict keyed periods to this key, compared as strings
    pub period_key_value: Option<Vec<String>>,

    /// Fixed tick length in nanoseconds
    pub refresh_period: Option<u64>,

    /// Keep accumulators across range-list window boundaries
    pub accumulate: bool,

    /// Passed through to concrete analyses, not interpreted here
    pub min_duration: Option<u64>,
    pub max_duration: Option<u64>,

    pub proc_list: Option<HashSet<String>>,
    pub tid_list: Option<HashSet<u64>>,
    pub cpu_list: Option<HashSet<u64>>,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, or fails
    /// [`validate`](Self::validate).
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| {
            AnalysisError::ConfigRead {
                path: path.as_ref().to_path_buf(),
                source,
            }
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_ranges(mut self, ranges: impl IntoIterator<Item = TimeRange>) -> Self {
        self.range_ts = ranges.into_iter().collect();
        self.range_ts.sort();
        self
    }

    pub fn with_refresh_period(mut self, period_ns: u64) -> Self {
        self.refresh_period = Some(period_ns);
        self
    }

    /// Configure keyed-period markers
    ///
    /// Without an end event name, a second matching begin event rotates the
    /// period.
    pub fn with_period_markers(
        mut self,
        begin_ev_name: impl Into<String>,
        end_ev_name: Option<&str>,
        begin_key_fields: &[&str],
        end_key_fields: &[&str],
    ) -> Self {
        self.period_begin_ev_name = Some(begin_ev_name.into());
        self.period_end_ev_name = end_ev_name.map(str::to_string);
        self.period_begin_key_fields = begin_key_fields.iter().map(|f| f.to_string()).collect();
        self.period_end_key_fields = end_key_fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_period_key_value(mut self, values: &[&str]) -> Self {
        self.period_key_value = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_accumulate(mut self, accumulate: bool) -> Self {
        self.accumulate = accumulate;
        self
    }

    pub fn with_durations(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_duration = min;
        self.max_duration = max;
        self
    }

    pub fn with_proc_list<S: Into<String>>(mut self, procs: impl IntoIterator<Item = S>) -> Self {
        self.proc_list = Some(procs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tid_list(mut self, tids: impl IntoIterator<Item = u64>) -> Self {
        self.tid_list = Some(tids.into_iter().collect());
        self
    }

    pub fn with_cpu_list(mut self, cpus: impl IntoIterator<Item = u64>) -> Self {
        self.cpu_list = Some(cpus.into_iter().collect());
        self
    }

    /// Key fields used to match a period's closing (or rotating) event
    pub fn end_key_fields(&self) -> &[String] {
        if self.period_end_key_fields.is_empty() {
            &self.period_begin_key_fields
        } else {
            &self.period_end_key_fields
        }
    }

    /// Whether keyed-period markers drive the windows
    pub fn is_keyed_period(&self) -> bool {
        self.period_begin_ev_name.is_some()
    }

    /// Check the record for values the engine can't act on
    ///
    /// Precedence conflicts between activation modes are allowed.
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.range_ts.iter().find(|r| !r.is_valid()) {
            return Err(AnalysisError::InvalidTimeRange(format!(
                "begin is after end in {}",
                bad
            )));
        }

        if self.refresh_period == Some(0) {
            return Err(AnalysisError::InvalidConfig(
                "refresh_period must be > 0".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (self.min_duration, self.max_duration) {
            if min > max {
                return Err(AnalysisError::InvalidConfig(format!(
                    "min_duration ({}) is greater than max_duration ({})",
                    min, max
                )));
            }
        }

        if self.period_begin_ev_name.is_some() && self.period_begin_key_fields.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "period_begin_ev_name requires period_begin_key_fields".to_string(),
            ));
        }

        if self.period_begin_ev_name.is_none() && self.period_end_ev_name.is_some() {
            return Err(AnalysisError::InvalidConfig(
                "period_end_ev_name requires period_begin_ev_name".to_string(),
            ));
        }

        if let Some(values) = &self.period_key_value {
            if values.len() != self.period_begin_key_fields.len() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "period_key_value has {} values but {} key fields are configured",
                    values.len(),
                    self.period_begin_key_fields.len()
                )));
            }
        }

        Ok(())
    }
}

//! CLI argument parsing for analysis options
//!
//! Flags map one-to-one onto [`AnalysisConfig`] fields and are layered over
//! an optional TOML file given with `--config`.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::time_range::{TimeRange, Timestamp};
use clap::{Args, Parser};
use std::path::PathBuf;

/// Activation and filter options shared by every analysis
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Load options from a TOML file (flags override it)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Start of the analysis range (ns)
    #[arg(long = "begin", value_name = "TS")]
    pub begin: Option<Timestamp>,

    /// End of the analysis range (ns)
    #[arg(long = "end", value_name = "TS")]
    pub end: Option<Timestamp>,

    /// Analysis range as [begin,end]; repeatable
    #[arg(long = "timerange", value_name = "RANGE")]
    pub timerange: Vec<TimeRange>,

    /// Event name opening a keyed period
    #[arg(long = "period-begin", value_name = "EVENT")]
    pub period_begin: Option<String>,

    /// Event name closing a keyed period (default: begin event rotates)
    #[arg(long = "period-end", value_name = "EVENT")]
    pub period_end: Option<String>,

    /// Comma-separated fields forming the period key on begin events
    #[arg(long = "period-begin-key", value_name = "FIELDS", value_delimiter = ',')]
    pub period_begin_key: Vec<String>,

    /// Comma-separated fields matched on end events (default: begin key)
    #[arg(long = "period-end-key", value_name = "FIELDS", value_delimiter = ',')]
    pub period_end_key: Vec<String>,

    /// Only open periods whose key equals these comma-separated values
    #[arg(long = "period-key-value", value_name = "VALUES", value_delimiter = ',')]
    pub period_key_value: Vec<String>,

    /// Fixed tick length (ns)
    #[arg(long = "refresh", value_name = "NS")]
    pub refresh: Option<u64>,

    /// Keep accumulating across range boundaries
    #[arg(long = "accumulate")]
    pub accumulate: bool,

    /// Only report these command names
    #[arg(long = "procname", value_name = "NAMES", value_delimiter = ',')]
    pub procname: Vec<String>,

    /// Only report these thread ids
    #[arg(long = "tid", value_name = "TIDS", value_delimiter = ',')]
    pub tid: Vec<u64>,

    /// Only report these CPUs
    #[arg(long = "cpu", value_name = "CPUS", value_delimiter = ',')]
    pub cpu: Vec<u64>,

    /// Minimum duration passed to the analysis (ns)
    #[arg(long = "min", value_name = "NS")]
    pub min: Option<u64>,

    /// Maximum duration passed to the analysis (ns)
    #[arg(long = "max", value_name = "NS")]
    pub max: Option<u64>,
}

impl AnalysisArgs {
    /// Build a validated [`AnalysisConfig`], flags taking priority over the file
    pub fn into_config(self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_toml(path)?,
            None => AnalysisConfig::default(),
        };

        let mut ranges = self.timerange;
        if self.begin.is_some() || self.end.is_some() {
            let range = TimeRange::new(self.begin, self.end);
            if !range.is_valid() {
                return Err(AnalysisError::InvalidTimeRange(format!(
                    "--begin is after --end in {}",
                    range
                )));
            }
            ranges.push(range);
        }
        if !ranges.is_empty() {
            config = config.with_ranges(ranges);
        }

        if self.period_begin.is_some() {
            config.period_begin_ev_name = self.period_begin;
        }
        if self.period_end.is_some() {
            config.period_end_ev_name = self.period_end;
        }
        if !self.period_begin_key.is_empty() {
            config.period_begin_key_fields = self.period_begin_key;
        }
        if !self.period_end_key.is_empty() {
            config.period_end_key_fields = self.period_end_key;
        }
        if !self.period_key_value.is_empty() {
            config.period_key_value = Some(self.period_key_value);
        }
        if self.refresh.is_some() {
            config.refresh_period = self.refresh;
        }
        config.accumulate |= self.accumulate;
        if !self.procname.is_empty() {
            config = config.with_proc_list(self.procname);
        }
        if !self.tid.is_empty() {
            config = config.with_tid_list(self.tid);
        }
        if !self.cpu.is_empty() {
            config = config.with_cpu_list(self.cpu);
        }
        if self.min.is_some() {
            config.min_duration = self.min;
        }
        if self.max.is_some() {
            config.max_duration = self.max;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Parser, Debug)]
#[command(name = "tracewindow")]
#[command(version)]
#[command(
    about = "Count trace events per analysis window (events as JSON lines on stdin)",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Only count events with these names (default: all)
    #[arg(short = 'e', long = "event", value_name = "NAMES", value_delimiter = ',')]
    pub events: Vec<String>,

    /// Print one JSON object per tick instead of text
    #[arg(long = "json")]
    pub json: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

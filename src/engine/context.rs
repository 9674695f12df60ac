use crate::config::AnalysisConfig;
use crate::filter::{AnalysisFilter, ProcessInfo};
use crate::time_range::Timestamp;

/// Read-only view of the engine handed to per-event callbacks
///
/// Filtering is the callback's job; the engine only exposes the predicates.
#[derive(Debug, Clone, Copy)]
pub struct CallbackContext<'a> {
    config: &'a AnalysisConfig,
    filter: &'a AnalysisFilter,
    period_start_ts: Option<Timestamp>,
    last_event_ts: Option<Timestamp>,
}

impl<'a> CallbackContext<'a> {
    pub fn new(
        config: &'a AnalysisConfig,
        filter: &'a AnalysisFilter,
        period_start_ts: Option<Timestamp>,
        last_event_ts: Option<Timestamp>,
    ) -> Self {
        Self {
            config,
            filter,
            period_start_ts,
            last_event_ts,
        }
    }

    pub fn config(&self) -> &'a AnalysisConfig {
        self.config
    }

    /// Start of the window the event belongs to
    pub fn period_start_ts(&self) -> Option<Timestamp> {
        self.period_start_ts
    }

    pub fn last_event_ts(&self) -> Option<Timestamp> {
        self.last_event_ts
    }

    pub fn filter_process(&self, proc: Option<&ProcessInfo>) -> bool {
        self.filter.filter_process(proc)
    }

    pub fn filter_cpu(&self, cpu: u64) -> bool {
        self.filter.filter_cpu(cpu)
    }

    /// Check a duration against `min_duration` / `max_duration`
    pub fn filter_duration(&self, duration_ns: u64) -> bool {
        self.config.min_duration.map_or(true, |min| duration_ns >= min)
            && self.config.max_duration.map_or(true, |max| duration_ns <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_duration_bounds() {
        let config = AnalysisConfig::new().with_durations(Some(10), Some(20));
        let filter = AnalysisFilter::from_config(&config);
        let ctx = CallbackContext::new(&config, &filter, Some(0), Some(5));
        assert!(!ctx.filter_duration(9));
        assert!(ctx.filter_duration(10));
        assert!(ctx.filter_duration(20));
        assert!(!ctx.filter_duration(21));
        assert_eq!(ctx.period_start_ts(), Some(0));
        assert_eq!(ctx.last_event_ts(), Some(5));
    }

    #[test]
    fn test_predicates_delegate_to_filter() {
        let config = AnalysisConfig::new().with_proc_list(["bash"]).with_cpu_list([1]);
        let filter = AnalysisFilter::from_config(&config);
        let ctx = CallbackContext::new(&config, &filter, None, None);
        assert!(ctx.filter_process(Some(&ProcessInfo::new("bash", 1))));
        assert!(!ctx.filter_process(Some(&ProcessInfo::new("vim", 1))));
        assert!(ctx.filter_cpu(1));
        assert!(!ctx.filter_cpu(0));
        assert!(ctx.filter_duration(u64::MAX));
    }
}

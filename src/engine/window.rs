use super::{Analysis, CallbackContext};
use crate::config::AnalysisConfig;
use crate::dispatch::{
    EventCallback, EventCallbacks, FallbackRule, Notification, NotificationCallback,
    NotificationRegistry, TICK,
};
use crate::error::Result;
use crate::event::{self, Event, PeriodKey};
use crate::filter::AnalysisFilter;
use crate::time_range::{TimeRange, Timestamp};
use tracing::{debug, trace, warn};

/// Coarse activation state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    NotStarted,
    Started,
    /// Range list exhausted; terminal for the run
    Ended,
}

/// The windowing state machine wrapped around one concrete analysis
///
/// # Example
/// ```
/// use tracewindow::{
///     Analysis, AnalysisConfig, CallbackContext, TimeRange, TraceEvent, WindowEngine,
/// };
///
/// #[derive(Default)]
/// struct Count(u64);
///
/// impl Analysis for Count {
///     fn reset(&mut self) {
///         self.0 = 0;
///     }
/// }
///
/// let config = AnalysisConfig::new().with_ranges([TimeRange::bounded(100, 200)]);
/// let mut engine = WindowEngine::new(config, Count::default());
/// engine.register_callback(
///     "sched_switch",
///     Box::new(|count: &mut Count, _ctx: &CallbackContext<'_>, _ev: &TraceEvent| count.0 += 1),
/// );
///
/// for ts in [0, 50, 150, 180] {
///     engine.process_event(&TraceEvent::new("sched_switch", ts));
/// }
/// engine.end();
/// assert_eq!(engine.analysis().0, 2);
/// ```
pub struct WindowEngine<A, E> {
    config: AnalysisConfig,
    /// Sorted copy of `config.range_ts`
    ranges: Vec<TimeRange>,
    filter: AnalysisFilter,
    analysis: A,
    callbacks: EventCallbacks<A, E>,
    notifications: NotificationRegistry,

    started: bool,
    ended: bool,
    /// Index into `ranges`, set on first use
    current_range: Option<usize>,
    period_key: Option<PeriodKey>,
    period_start_ts: Option<Timestamp>,
    last_event_ts: Option<Timestamp>,
}

impl<A: Analysis, E: Event> WindowEngine<A, E> {
    pub fn new(config: AnalysisConfig, analysis: A) -> Self {
        let mut ranges = config.range_ts.clone();
        ranges.sort();
        let filter = AnalysisFilter::from_config(&config);

        Self {
            config,
            ranges,
            filter,
            analysis,
            callbacks: EventCallbacks::new(),
            notifications: NotificationRegistry::new(),
            started: false,
            ended: false,
            current_range: None,
            period_key: None,
            period_start_ts: None,
            last_event_ts: None,
        }
    }

    /// Like [`new`](Self::new), but rejects configurations the engine can't act on
    pub fn try_new(config: AnalysisConfig, analysis: A) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config, analysis))
    }

    /// Feed one event; returns whether it fell inside an active window
    pub fn process_event(&mut self, ev: &E) -> bool {
        let ts = ev.timestamp();
        if let Some(last) = self.last_event_ts {
            if ts < last {
                warn!(ts, last, event = ev.name(), "event out of timestamp order");
            }
        }
        self.last_event_ts = Some(ts);

        self.open_implicit_window(ts);
        self.check_ranges(ts);
        if !self.started || self.ended {
            return false;
        }

        // Period markers take priority over the refresh interval
        if self.config.is_keyed_period() {
            self.handle_period_event(ev);
        } else if let Some(refresh) = self.config.refresh_period {
            self.check_refresh(ts, refresh);
        }

        self.dispatch(ev);
        true
    }

    /// Finalize the run, closing any window still open
    pub fn end(&mut self) {
        if self.period_start_ts.is_some() {
            self.end_period();
            self.period_start_ts = None;
            self.period_key = None;
        }
    }

    /// Replace the per-event callback table
    pub fn register_cbs(&mut self, cbs: impl IntoIterator<Item = (String, EventCallback<A, E>)>) {
        self.callbacks.replace(cbs);
    }

    pub fn register_callback(&mut self, name: impl Into<String>, cb: EventCallback<A, E>) {
        self.callbacks.insert(name, cb);
    }

    /// Add a prefix-style fallback, consulted after the syscall ones
    pub fn add_fallback(&mut self, rule: FallbackRule) {
        self.callbacks.push_fallback(rule);
    }

    /// Add notification subscribers; additive across calls
    pub fn register_notification_cbs(
        &mut self,
        cbs: impl IntoIterator<Item = (String, NotificationCallback)>,
    ) {
        self.notifications.register(cbs);
    }

    pub fn register_notification(&mut self, name: impl Into<String>, cb: NotificationCallback) {
        self.notifications.register([(name.into(), cb)]);
    }

    /// Publish a notification to every subscriber of `name`
    pub fn send_notification(&mut self, name: &str, notification: &Notification) {
        self.notifications.send(name, notification);
    }

    pub fn state(&self) -> WindowState {
        if self.ended {
            WindowState::Ended
        } else if self.started {
            WindowState::Started
        } else {
            WindowState::NotStarted
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn period_key(&self) -> Option<&PeriodKey> {
        self.period_key.as_ref()
    }

    pub fn period_start_ts(&self) -> Option<Timestamp> {
        self.period_start_ts
    }

    pub fn last_event_ts(&self) -> Option<Timestamp> {
        self.last_event_ts
    }

    /// Index of the current entry in the (sorted) range list
    pub fn current_range(&self) -> Option<usize> {
        self.current_range
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn filter(&self) -> &AnalysisFilter {
        &self.filter
    }

    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    pub fn analysis_mut(&mut self) -> &mut A {
        &mut self.analysis
    }

    pub fn into_analysis(self) -> A {
        self.analysis
    }

    /// Without a range list (or when its first range has no begin bound), the
    /// run starts on the very first event.
    fn open_implicit_window(&mut self, ts: Timestamp) {
        if self.started || self.ended || self.current_range.is_some() {
            return;
        }
        if self.ranges.first().is_some_and(|r| r.begin.is_some()) {
            return;
        }

        self.started = true;
        // Marker events own period boundaries in keyed mode
        if !self.config.is_keyed_period() && self.period_start_ts.is_none() {
            self.period_start_ts = Some(ts);
        }
        debug!(ts, "analysis started");
    }

    fn check_ranges(&mut self, ts: Timestamp) {
        if self.ranges.is_empty() || self.ended {
            return;
        }

        let idx = *self.current_range.get_or_insert(0);
        let Some(range) = self.ranges.get(idx).copied() else {
            return;
        };

        if self.started {
            // An unset end keeps the window open indefinitely
            if !range.ends_before(ts) {
                return;
            }

            let mut next = idx + 1;
            while self.ranges.get(next).is_some_and(|r| r.ends_before(ts)) {
                next += 1;
            }
            self.current_range = Some(next);
            debug!(ts, finished = %range, next, "range boundary crossed");

            self.end_period();
            if !self.config.accumulate {
                self.period_start_ts = None;
                self.analysis.reset();
            }

            match self.ranges.get(next) {
                None => {
                    self.ended = true;
                    self.period_start_ts = None;
                    debug!(ts, "range list exhausted, analysis ended");
                }
                Some(r) if r.begins_after(ts) => {
                    self.started = false;
                    debug!(ts, upcoming = %r, "waiting for next range");
                }
                Some(_) => {
                    if !self.config.accumulate {
                        self.period_start_ts = Some(ts);
                    }
                }
            }
        } else {
            if range.begin.is_none() || range.begins_after(ts) {
                return;
            }

            self.started = true;
            debug!(ts, range = %range, "entered range");
            if self.period_start_ts.is_none() {
                self.period_start_ts = Some(ts);
                self.analysis.reset();
            }
        }
    }

    fn handle_period_event(&mut self, ev: &E) {
        let name = ev.name();
        let is_begin = self.config.period_begin_ev_name.as_deref() == Some(name);
        let is_end = self.config.period_end_ev_name.as_deref() == Some(name);
        if !is_begin && !is_end {
            return;
        }

        if self.period_key.is_some() {
            let Some(key) = event::period_key(ev, self.config.end_key_fields()) else {
                return;
            };
            if self.period_key.as_ref() != Some(&key) {
                trace!(event = name, "period key mismatch, ignoring");
                return;
            }

            if self.config.period_end_ev_name.is_some() {
                if is_end {
                    self.end_period();
                    self.period_key = None;
                    self.period_start_ts = None;
                }
            } else if is_begin {
                // Begin marker reused as a rotation point
                self.end_period();
                self.begin_period(key, ev.timestamp());
            }
        } else if is_begin {
            let Some(key) = event::period_key(ev, &self.config.period_begin_key_fields) else {
                return;
            };
            if let Some(expected) = &self.config.period_key_value {
                let matches = expected.len() == key.len()
                    && expected.iter().zip(&key).all(|(want, got)| *want == got.to_string());
                if !matches {
                    trace!(event = name, "period key value mismatch, ignoring");
                    return;
                }
            }
            self.begin_period(key, ev.timestamp());
        }
    }

    fn check_refresh(&mut self, ts: Timestamp, refresh: u64) {
        match self.period_start_ts {
            None => self.period_start_ts = Some(ts),
            // Close and reopen only; clearing per-tick state is the analysis' call
            Some(start) if ts >= start.saturating_add(refresh) => {
                self.end_period();
                self.period_start_ts = Some(ts);
            }
            Some(_) => {}
        }
    }

    fn begin_period(&mut self, key: PeriodKey, ts: Timestamp) {
        debug!(ts, key = ?key, "period begin");
        self.period_key = Some(key);
        self.period_start_ts = Some(ts);
        self.analysis.reset();
    }

    fn end_period(&mut self) {
        let window = TimeRange::new(self.period_start_ts, self.last_event_ts);
        debug!(window = %window, "period end");
        self.analysis.on_period_end(window);
        self.notifications.send(TICK, &Notification::Tick(window));
        self.flush_notifications();
    }

    fn dispatch(&mut self, ev: &E) {
        let ctx = CallbackContext::new(
            &self.config,
            &self.filter,
            self.period_start_ts,
            self.last_event_ts,
        );
        if self
            .callbacks
            .dispatch(ev.name(), &mut self.analysis, &ctx, ev)
        {
            self.flush_notifications();
        }
    }

    fn flush_notifications(&mut self) {
        for (name, notification) in self.analysis.take_notifications() {
            self.notifications.send(&name, &notification);
        }
    }
}

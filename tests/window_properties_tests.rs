//! End-to-end window behaviour through the public API
//!
//! Each test drives a `WindowEngine` the way an analysis front-end would:
//! register callbacks and a tick subscriber, feed events, call `end()`.

use std::cell::RefCell;
use std::rc::Rc;
use tracewindow::{
    Analysis, AnalysisConfig, CallbackContext, EventCallback, Notification, ProcessInfo,
    TimeRange, TraceEvent, WindowEngine, WindowState, TICK,
};

/// Per-window syscall entry/exit counts
#[derive(Debug, Default)]
struct SyscallCount {
    entries: u64,
    exits: u64,
    resets: usize,
    closed: Vec<(TimeRange, u64)>,
}

impl Analysis for SyscallCount {
    fn reset(&mut self) {
        self.entries = 0;
        self.exits = 0;
        self.resets += 1;
    }

    fn on_period_end(&mut self, period: TimeRange) {
        self.closed.push((period, self.entries));
    }
}

fn on_entry(count: &mut SyscallCount, _ctx: &CallbackContext<'_>, _ev: &TraceEvent) {
    count.entries += 1;
}

fn on_exit(count: &mut SyscallCount, _ctx: &CallbackContext<'_>, _ev: &TraceEvent) {
    count.exits += 1;
}

type Callback = EventCallback<SyscallCount, TraceEvent>;

struct Harness {
    engine: WindowEngine<SyscallCount, TraceEvent>,
    ticks: Rc<RefCell<Vec<TimeRange>>>,
}

impl Harness {
    fn new(config: AnalysisConfig) -> Self {
        let mut engine = WindowEngine::new(config, SyscallCount::default());
        engine.register_cbs([
            ("syscall_entry".to_string(), Box::new(on_entry) as Callback),
            ("syscall_exit".to_string(), Box::new(on_exit) as Callback),
        ]);

        let ticks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ticks);
        engine.register_notification(
            TICK,
            Box::new(move |n: &Notification| sink.borrow_mut().extend(n.as_tick())),
        );
        Self { engine, ticks }
    }

    fn feed(&mut self, name: &str, ts: u64) -> bool {
        self.engine.process_event(&TraceEvent::new(name, ts))
    }

    fn ticks(&self) -> Vec<TimeRange> {
        self.ticks.borrow().clone()
    }
}

#[test]
fn test_last_event_ts_follows_stream() {
    let mut h = Harness::new(AnalysisConfig::default());
    for ts in [1, 1, 5, 9, 9, 20] {
        h.feed("sched_switch", ts);
        assert_eq!(h.engine.last_event_ts(), Some(ts));
    }
}

#[test]
fn test_all_time_window_closes_only_on_end() {
    let mut h = Harness::new(AnalysisConfig::default());
    for ts in 0..50 {
        assert!(h.feed("syscall_entry_read", ts * 10));
        assert!(h.engine.is_started());
    }
    assert!(h.ticks().is_empty());

    h.engine.end();
    assert_eq!(h.ticks(), vec![TimeRange::bounded(0, 490)]);
    assert_eq!(h.engine.analysis().entries, 50);
}

#[test]
fn test_range_list_states() {
    let config = AnalysisConfig::new()
        .with_ranges([TimeRange::bounded(10, 20), TimeRange::bounded(30, 40)]);
    let mut h = Harness::new(config);

    let expected = [
        (5, WindowState::NotStarted),
        (10, WindowState::Started),
        (15, WindowState::Started),
        (25, WindowState::NotStarted),
        (30, WindowState::Started),
        (35, WindowState::Started),
        (45, WindowState::Ended),
    ];
    for (ts, state) in expected {
        h.feed("syscall_entry_open", ts);
        assert_eq!(h.engine.state(), state, "state after t={}", ts);
    }

    assert_eq!(
        h.ticks(),
        vec![TimeRange::bounded(10, 25), TimeRange::bounded(30, 45)]
    );
    // Entries at 10, 15 in the first window; 30, 35 in the second
    let closed = &h.engine.analysis().closed;
    assert_eq!(closed[0].1, 2);
    assert_eq!(closed[1].1, 2);
}

#[test]
fn test_range_list_accumulate() {
    let config = AnalysisConfig::new()
        .with_ranges([TimeRange::bounded(10, 20), TimeRange::bounded(30, 40)])
        .with_accumulate(true);
    let mut h = Harness::new(config);

    for ts in [5, 10, 15, 25, 35, 45] {
        h.feed("syscall_entry_open", ts);
    }
    h.engine.end();

    let analysis = h.engine.analysis();
    assert!(analysis.resets <= 1);
    assert_eq!(h.ticks().len(), 2);
    // Accumulators survive the boundary: the second close sees all three entries
    assert_eq!(analysis.closed[0].1, 2);
    assert_eq!(analysis.closed[1].1, 3);
}

#[test]
fn test_keyed_period_key_mismatch_does_not_close() {
    let config = AnalysisConfig::new().with_period_markers(
        "lttng_ust_period:begin",
        Some("lttng_ust_period:end"),
        &["id"],
        &["id"],
    );
    let mut h = Harness::new(config);

    let begin = TraceEvent::new("lttng_ust_period:begin", 100).with_field("id", "A");
    let end_b = TraceEvent::new("lttng_ust_period:end", 150).with_field("id", "B");
    let end_a = TraceEvent::new("lttng_ust_period:end", 200).with_field("id", "A");

    h.engine.process_event(&begin);
    h.feed("syscall_entry_read", 120);
    h.engine.process_event(&end_b);
    assert!(h.ticks().is_empty());

    h.engine.process_event(&end_a);
    assert_eq!(h.ticks(), vec![TimeRange::bounded(100, 200)]);
    assert_eq!(h.engine.analysis().closed[0].1, 1);
}

#[test]
fn test_keyed_period_rotation() {
    let config = AnalysisConfig::new().with_period_markers("frame_begin", None, &["frame"], &[]);
    let mut h = Harness::new(config);

    h.engine
        .process_event(&TraceEvent::new("frame_begin", 10).with_field("frame", 1u64));
    h.engine
        .process_event(&TraceEvent::new("frame_begin", 30).with_field("frame", 1u64));

    assert_eq!(h.ticks(), vec![TimeRange::bounded(10, 30)]);
    assert_eq!(h.engine.period_start_ts(), Some(30));
    // One reset per open: the first begin and the rotation
    assert_eq!(h.engine.analysis().resets, 2);
}

#[test]
fn test_refresh_period_ticks() {
    let mut h = Harness::new(AnalysisConfig::new().with_refresh_period(100));

    h.feed("syscall_entry_read", 0);
    h.feed("syscall_entry_read", 50);
    assert!(h.ticks().is_empty());
    h.feed("syscall_entry_read", 150);
    assert_eq!(h.ticks(), vec![TimeRange::bounded(0, 150)]);
    h.feed("syscall_entry_read", 260);
    assert_eq!(
        h.ticks(),
        vec![TimeRange::bounded(0, 150), TimeRange::bounded(150, 260)]
    );
}

#[test]
fn test_syscall_fallback_dispatch() {
    let mut h = Harness::new(AnalysisConfig::default());
    h.feed("sys_open", 1);
    h.feed("syscall_entry_read", 2);
    h.feed("exit_syscall", 3);
    h.feed("syscall_exit_read", 4);
    h.feed("sched_switch", 5);

    let analysis = h.engine.analysis();
    assert_eq!(analysis.entries, 2);
    assert_eq!(analysis.exits, 2);
}

#[test]
fn test_process_filter_via_context() {
    let config = AnalysisConfig::new().with_proc_list(["bash"]);
    let mut engine: WindowEngine<Execs, TraceEvent> = WindowEngine::new(config, Execs::default());
    engine.register_callback(
        "sched_process_exec",
        Box::new(|execs: &mut Execs, ctx: &CallbackContext<'_>, ev: &TraceEvent| {
            let comm = ev.fields.get("comm").map(|c| c.to_string());
            let proc = ProcessInfo::from_parts(comm.clone(), None);
            if ctx.filter_process(proc.as_ref()) {
                execs.0.push(comm.unwrap_or_else(|| "<none>".to_string()));
            }
        }),
    );

    for comm in ["bash", "zsh", "bash"] {
        engine.process_event(&TraceEvent::new("sched_process_exec", 1).with_field("comm", comm));
    }
    engine.process_event(&TraceEvent::new("sched_process_exec", 2));

    assert_eq!(engine.analysis().0, vec!["bash", "bash", "<none>"]);
}

#[derive(Debug, Default)]
struct Execs(Vec<String>);

impl Analysis for Execs {
    fn reset(&mut self) {
        self.0.clear();
    }
}

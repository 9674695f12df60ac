use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use tracewindow::cli::Cli;
use tracewindow::{
    Analysis, AnalysisConfig, CallbackContext, Event, FallbackRule, Notification, ProcessInfo,
    TimeRange, TraceEvent, WindowEngine, TICK,
};
use tracing_subscriber::EnvFilter;

/// Callback name catching every event without an exact-name handler
const ANY_EVENT: &str = "*";
const WINDOW_REPORT: &str = "window_report";

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

#[derive(Debug, Clone, Serialize)]
struct WindowReport {
    begin_ns: Option<u64>,
    end_ns: Option<u64>,
    total: u64,
    counts: BTreeMap<String, u64>,
}

/// Per-window event counts
#[derive(Debug, Default)]
struct EventCounter {
    counts: BTreeMap<String, u64>,
    total: u64,
    /// Refresh ticks leave clearing to the analysis
    clear_on_tick: bool,
    outbox: Vec<(String, Notification)>,
}

impl EventCounter {
    fn new(config: &AnalysisConfig) -> Self {
        Self {
            clear_on_tick: config.refresh_period.is_some() && !config.accumulate,
            ..Self::default()
        }
    }

    fn record(&mut self, ctx: &CallbackContext<'_>, ev: &TraceEvent) {
        let proc = ProcessInfo::from_parts(
            ev.field("comm").ok().map(|comm| comm.to_string()),
            ev.field("tid").ok().and_then(|tid| tid.as_u64()),
        );
        if !ctx.filter_process(proc.as_ref()) {
            return;
        }
        if let Some(cpu) = ev.field("cpu_id").ok().and_then(|v| v.as_u64()) {
            if !ctx.filter_cpu(cpu) {
                return;
            }
        }

        *self.counts.entry(ev.name().to_string()).or_default() += 1;
        self.total += 1;
    }
}

impl Analysis for EventCounter {
    fn reset(&mut self) {
        self.counts.clear();
        self.total = 0;
    }

    fn on_period_end(&mut self, period: TimeRange) {
        let report = WindowReport {
            begin_ns: period.begin,
            end_ns: period.end,
            total: self.total,
            counts: self.counts.clone(),
        };
        match serde_json::to_value(&report) {
            Ok(value) => self
                .outbox
                .push((WINDOW_REPORT.to_string(), Notification::Custom(value))),
            Err(e) => tracing::warn!("Failed to serialize window report: {}", e),
        }
        if self.clear_on_tick {
            self.reset();
        }
    }

    fn take_notifications(&mut self) -> Vec<(String, Notification)> {
        std::mem::take(&mut self.outbox)
    }
}

fn print_report(value: &serde_json::Value, json: bool) {
    if json {
        println!("{}", value);
        return;
    }

    let bound = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_u64())
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    println!(
        "[{}, {}] total={}",
        bound("begin_ns"),
        bound("end_ns"),
        value.get("total").and_then(|v| v.as_u64()).unwrap_or(0)
    );
    if let Some(counts) = value.get("counts").and_then(|c| c.as_object()) {
        for (name, count) in counts {
            println!("  {:<32} {}", name, count);
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = args
        .analysis
        .into_config()
        .context("Invalid analysis options")?;
    let counter = EventCounter::new(&config);
    let mut engine: WindowEngine<EventCounter, TraceEvent> = WindowEngine::new(config, counter);

    if args.events.is_empty() {
        engine.register_callback(ANY_EVENT, Box::new(EventCounter::record));
        engine.add_fallback(FallbackRule {
            matches: |_: &str| true,
            handler: ANY_EVENT,
        });
    } else {
        for name in &args.events {
            engine.register_callback(name.clone(), Box::new(EventCounter::record));
        }
    }

    let json = args.json;
    engine.register_notification(
        WINDOW_REPORT,
        Box::new(move |n: &Notification| {
            if let Notification::Custom(value) = n {
                print_report(value, json);
            }
        }),
    );
    engine.register_notification(
        TICK,
        Box::new(|n: &Notification| {
            if let Some(window) = n.as_tick() {
                tracing::debug!(window = %window, "tick");
            }
        }),
    );

    let stdin = io::stdin();
    for (lineno, line) in stdin.lock().lines().enumerate() {
        let line = line.context("Failed to read event stream")?;
        if line.trim().is_empty() {
            continue;
        }
        let ev: TraceEvent = serde_json::from_str(&line)
            .with_context(|| format!("Invalid event on line {}", lineno + 1))?;
        engine.process_event(&ev);
    }
    engine.end();

    Ok(())
}

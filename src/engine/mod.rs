// Window Engine: temporal bookkeeping for trace analyses
//
// Decides, for every event of an ordered stream, whether it falls inside an
// active analysis window and when a window boundary (a "tick") is crossed.
// Concrete analyses only say WHAT to compute, through the `Analysis` trait and
// per-event callbacks; this module owns WHEN.
//
// Activation strategies, applied in fixed precedence on every event:
// - range list: explicit [begin, end] windows, gating everything else
// - keyed period: begin/end marker events correlated by a tuple of fields
// - refresh: fixed-length ticks
//
// Single-threaded: events arrive one at a time with non-decreasing
// timestamps. Nothing is buffered or sorted.

mod context;
mod window;

pub use context::CallbackContext;
pub use window::{WindowEngine, WindowState};

use crate::dispatch::Notification;
use crate::time_range::TimeRange;

/// Hooks a concrete analysis provides to the engine
///
/// `reset` has no default: every analysis must say how to clear its
/// per-window accumulators.
pub trait Analysis {
    /// Clear per-window state; called whenever a fresh window opens
    fn reset(&mut self);

    /// Finalize a window before the `tick` notification goes out
    fn on_period_end(&mut self, _period: TimeRange) {}

    /// Notifications the analysis wants published, drained after each
    /// dispatched event and each window close
    fn take_notifications(&mut self) -> Vec<(String, Notification)> {
        Vec::new()
    }
}

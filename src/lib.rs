//! Tracewindow - windowing and period tracking for ordered trace event streams
//!
//! This library decides *when* an analysis is active and when a window
//! boundary (a tick) is crossed: explicit time ranges, keyed begin/end marker
//! events, and fixed refresh intervals, plus static process/thread/CPU
//! filters. Concrete analyses supply *what* to compute through the
//! [`Analysis`] trait and per-event callbacks.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod syscalls;
pub mod time_range;

pub use config::AnalysisConfig;
pub use dispatch::{EventCallback, FallbackRule, Notification, NotificationCallback, TICK};
pub use engine::{Analysis, CallbackContext, WindowEngine, WindowState};
pub use error::{AnalysisError, Result};
pub use event::{Event, FieldValue, PeriodKey, TraceEvent};
pub use filter::{AnalysisFilter, ProcessInfo};
pub use time_range::{TimeRange, Timestamp};

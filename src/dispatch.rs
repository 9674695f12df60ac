//! Callback registries: per-event dispatch and named notification fan-out
//!
//! Per-event lookup is two-level: an exact-name table first, then an ordered
//! list of prefix fallback rules consulted only on a miss. At most one
//! callback fires per event.

use crate::engine::CallbackContext;
use crate::syscalls::SyscallPhase;
use crate::time_range::TimeRange;
use std::collections::HashMap;

/// Per-event callback: gets the analysis, the engine context, and the raw event
pub type EventCallback<A, E> = Box<dyn FnMut(&mut A, &CallbackContext<'_>, &E)>;

/// Notification subscriber
pub type NotificationCallback = Box<dyn FnMut(&Notification)>;

/// Name of the window-close notification
pub const TICK: &str = "tick";

/// Payload delivered to notification subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A window closed; `begin` is its start, `end` the last event seen
    Tick(TimeRange),
    /// Analysis-defined payload
    Custom(serde_json::Value),
}

impl Notification {
    pub fn tick(begin_ns: Option<u64>, end_ns: Option<u64>) -> Self {
        Self::Tick(TimeRange::new(begin_ns, end_ns))
    }

    /// Window bounds when this is a tick
    pub fn as_tick(&self) -> Option<TimeRange> {
        match self {
            Self::Tick(range) => Some(*range),
            Self::Custom(_) => None,
        }
    }
}

/// Fallback consulted when no exact-name callback exists
#[derive(Debug, Clone, Copy)]
pub struct FallbackRule {
    /// Whether the rule applies to an event name
    pub matches: fn(&str) -> bool,
    /// Callback name to use when it does
    pub handler: &'static str,
}

fn is_syscall_entry(name: &str) -> bool {
    SyscallPhase::Entry.matches(name)
}

fn is_syscall_exit(name: &str) -> bool {
    SyscallPhase::Exit.matches(name)
}

/// Syscall entry/exit fallbacks, in evaluation order
pub fn syscall_fallbacks() -> Vec<FallbackRule> {
    vec![
        FallbackRule {
            matches: is_syscall_entry,
            handler: SyscallPhase::Entry.handler_name(),
        },
        FallbackRule {
            matches: is_syscall_exit,
            handler: SyscallPhase::Exit.handler_name(),
        },
    ]
}

/// Event-name → callback table with prefix fallbacks
pub struct EventCallbacks<A, E> {
    exact: HashMap<String, EventCallback<A, E>>,
    fallbacks: Vec<FallbackRule>,
}

impl<A, E> Default for EventCallbacks<A, E> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            fallbacks: syscall_fallbacks(),
        }
    }
}

impl<A, E> EventCallbacks<A, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole table
    pub fn replace(&mut self, cbs: impl IntoIterator<Item = (String, EventCallback<A, E>)>) {
        self.exact = cbs.into_iter().collect();
    }

    /// Add or overwrite one entry
    pub fn insert(&mut self, name: impl Into<String>, cb: EventCallback<A, E>) {
        self.exact.insert(name.into(), cb);
    }

    pub fn push_fallback(&mut self, rule: FallbackRule) {
        self.fallbacks.push(rule);
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Name of the callback that would handle `event_name`
    pub fn resolve(&self, event_name: &str) -> Option<&str> {
        if let Some((name, _)) = self.exact.get_key_value(event_name) {
            return Some(name.as_str());
        }
        self.fallbacks
            .iter()
            .find(|rule| self.exact.contains_key(rule.handler) && (rule.matches)(event_name))
            .map(|rule| rule.handler)
    }

    /// Run the callback for `event_name`, if any; returns whether one fired
    pub fn dispatch(
        &mut self,
        event_name: &str,
        analysis: &mut A,
        ctx: &CallbackContext<'_>,
        ev: &E,
    ) -> bool {
        let Some(handler) = self.resolve(event_name).map(str::to_string) else {
            tracing::trace!(event = event_name, "no callback registered");
            return false;
        };
        match self.exact.get_mut(&handler) {
            Some(cb) => {
                cb(analysis, ctx, ev);
                true
            }
            None => false,
        }
    }
}

/// Notification name → ordered subscribers
#[derive(Default)]
pub struct NotificationRegistry {
    subscribers: HashMap<String, Vec<NotificationCallback>>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append subscribers; registering a name again adds to its list
    pub fn register(&mut self, cbs: impl IntoIterator<Item = (String, NotificationCallback)>) {
        for (name, cb) in cbs {
            self.subscribers.entry(name).or_default().push(cb);
        }
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscribers.get(name).map_or(0, Vec::len)
    }

    /// Invoke every subscriber of `name` in registration order
    pub fn send(&mut self, name: &str, notification: &Notification) {
        if let Some(cbs) = self.subscribers.get_mut(name) {
            for cb in cbs.iter_mut() {
                cb(notification);
            }
        }
    }
}

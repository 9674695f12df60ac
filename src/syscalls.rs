//! Syscall event naming conventions
//!
//! Kernel tracers name syscall events either with the older `sys_*` /
//! `exit_syscall` scheme or the newer `syscall_entry_*` / `syscall_exit_*`
//! one. Dispatch falls back on these prefixes when no exact-name callback is
//! registered.

/// Fallback handler name for syscall entry events
pub const SYSCALL_ENTRY: &str = "syscall_entry";
/// Fallback handler name for syscall exit events
pub const SYSCALL_EXIT: &str = "syscall_exit";

pub const ENTRY_PREFIXES: &[&str] = &["sys_", "syscall_entry_"];
pub const EXIT_PREFIXES: &[&str] = &["exit_syscall", "syscall_exit_"];

/// Which side of a syscall an event marks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallPhase {
    Entry,
    Exit,
}

impl SyscallPhase {
    /// Name of the fallback callback for this phase
    pub fn handler_name(self) -> &'static str {
        match self {
            Self::Entry => SYSCALL_ENTRY,
            Self::Exit => SYSCALL_EXIT,
        }
    }

    pub fn prefixes(self) -> &'static [&'static str] {
        match self {
            Self::Entry => ENTRY_PREFIXES,
            Self::Exit => EXIT_PREFIXES,
        }
    }

    pub fn matches(self, event_name: &str) -> bool {
        self.prefixes().iter().any(|p| event_name.starts_with(p))
    }
}

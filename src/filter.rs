//! Static process / thread / CPU filters
//!
//! The engine never drops events on these; callbacks call the predicates
//! themselves through their [`CallbackContext`](crate::engine::CallbackContext).

use crate::config::AnalysisConfig;
use std::collections::HashSet;

/// Process identity as seen by a filter
///
/// Either part may be unknown; an unknown part is not checked against its
/// include set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Command name
    pub comm: Option<String>,
    pub tid: Option<u64>,
}

impl ProcessInfo {
    pub fn new(comm: impl Into<String>, tid: u64) -> Self {
        Self {
            comm: Some(comm.into()),
            tid: Some(tid),
        }
    }

    /// Build from whatever the event carries; `None` when it carries neither
    pub fn from_parts(comm: Option<String>, tid: Option<u64>) -> Option<Self> {
        if comm.is_none() && tid.is_none() {
            return None;
        }
        Some(Self { comm, tid })
    }
}

/// Include-set filters taken from an [`AnalysisConfig`]
///
/// An unset or empty set means "no restriction".
#[derive(Debug, Clone, Default)]
pub struct AnalysisFilter {
    procs: Option<HashSet<String>>,
    tids: Option<HashSet<u64>>,
    cpus: Option<HashSet<u64>>,
}

fn non_empty<T>(set: &Option<HashSet<T>>) -> Option<HashSet<T>>
where
    T: Clone + Eq + std::hash::Hash,
{
    set.as_ref().filter(|s| !s.is_empty()).cloned()
}

impl AnalysisFilter {
    /// Create a filter that lets everything through
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            procs: non_empty(&config.proc_list),
            tids: non_empty(&config.tid_list),
            cpus: non_empty(&config.cpu_list),
        }
    }

    /// Check if a process passes the command-name and thread-id include sets
    ///
    /// No process at all always passes.
    pub fn filter_process(&self, proc: Option<&ProcessInfo>) -> bool {
        let Some(proc) = proc else {
            return true;
        };
        if let (Some(procs), Some(comm)) = (&self.procs, &proc.comm) {
            if !procs.contains(comm) {
                return false;
            }
        }
        if let (Some(tids), Some(tid)) = (&self.tids, proc.tid) {
            if !tids.contains(&tid) {
                return false;
            }
        }
        true
    }

    /// Check if a CPU passes the CPU include set
    pub fn filter_cpu(&self, cpu: u64) -> bool {
        match &self.cpus {
            None => true,
            Some(set) => set.contains(&cpu),
        }
    }
}

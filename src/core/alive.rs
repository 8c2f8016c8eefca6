//! # Process liveness table.
//!
//! Maps interpreter pids to a liveness flag, in spawn order. More than one
//! record exists only transiently (a second `run` before the first process
//! exited, or a restart racing the old process's exit).
//!
//! ## Rules
//! - `insert_live` on spawn, `mark_exited` on exit notification
//! - `mark_exited` ignores pids that are no longer recorded (stale exits
//!   arriving after a cleanup must not resurrect records)
//! - "first live" means earliest spawned among live records

use indexmap::IndexMap;

/// Owned by the supervisor loop; not shared.
#[derive(Debug, Default)]
pub struct ProcessTable {
    records: IndexMap<u32, bool>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_live(&mut self, pid: u32) {
        self.records.insert(pid, true);
    }

    /// Flips `pid` to not-live. Returns false if the pid is unknown.
    pub fn mark_exited(&mut self, pid: u32) -> bool {
        match self.records.get_mut(&pid) {
            Some(live) => {
                *live = false;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_exited(&mut self) {
        for live in self.records.values_mut() {
            *live = false;
        }
    }

    pub fn any_live(&self) -> bool {
        self.records.values().any(|live| *live)
    }

    pub fn first_live(&self) -> Option<u32> {
        self.records
            .iter()
            .find(|(_, live)| **live)
            .map(|(pid, _)| *pid)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn snapshot(&self) -> Vec<(u32, bool)> {
        self.records.iter().map(|(p, l)| (*p, *l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_live_follows_spawn_order() {
        let mut t = ProcessTable::new();
        t.insert_live(30);
        t.insert_live(10);
        assert_eq!(t.first_live(), Some(30));

        t.mark_exited(30);
        assert_eq!(t.first_live(), Some(10));
        assert!(t.any_live());

        t.mark_exited(10);
        assert_eq!(t.first_live(), None);
        assert!(!t.any_live());
        assert_eq!(t.snapshot(), [(30, false), (10, false)]);
    }

    #[test]
    fn test_unknown_pid_is_not_inserted() {
        let mut t = ProcessTable::new();
        assert!(!t.mark_exited(7));
        assert!(t.snapshot().is_empty());
    }

    #[test]
    fn test_mark_all_exited() {
        let mut t = ProcessTable::new();
        t.insert_live(1);
        t.insert_live(2);
        t.mark_all_exited();
        assert!(!t.any_live());
        t.clear();
        assert!(t.snapshot().is_empty());
    }
}

//! Deferred voice decommission
//!
//! Each release schedules one task keyed by voice id and stamped with the
//! voice's generation. Recreating the voice cancels the task; a task that
//! fires anyway only destroys a voice whose generation still matches.

use std::fmt;

/// Monotonically increasing identity of one voice allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct GenerationCounter {
    next: u64,
}

impl GenerationCounter {
    pub fn next(&mut self) -> Generation {
        self.next += 1;
        Generation(self.next)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decommission {
    pub id: String,
    pub generation: Generation,
    pub due: f64,
}

#[derive(Debug, Default)]
pub struct DecommissionQueue {
    tasks: Vec<Decommission>,
}

impl DecommissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a decommission, replacing any pending one for the same id.
    pub fn schedule(&mut self, id: &str, generation: Generation, due: f64) {
        self.cancel(id);
        self.tasks.push(Decommission {
            id: id.to_string(),
            generation,
            due,
        });
    }

    /// Returns true if a pending task was removed.
    pub fn cancel(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        before != self.tasks.len()
    }

    pub fn due_time(&self, id: &str) -> Option<f64> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.due)
    }

    /// Remove and return every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<Decommission> {
        if !self.tasks.iter().any(|t| t.due <= now) {
            return Vec::new();
        }
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due));
        due
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

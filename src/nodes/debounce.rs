//! Quiet-period timer for slot renames

use std::time::{Duration, Instant};

/// How a rename reached the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameEdit {
    /// Keystroke while editing; waits for the quiet period
    Typing,
    /// Edit committed; re-evaluates immediately
    Accepted,
}

/// Identifies one pending deadline; superseded tokens never fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceToken(u64);

/// Single-shot timer restarted by every trigger
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    deadline: Option<(Instant, u64)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start (or restart) the quiet period, invalidating any earlier token
    pub fn trigger(&mut self, now: Instant) -> DebounceToken {
        self.generation += 1;
        self.deadline = Some((now + self.delay, self.generation));
        DebounceToken(self.generation)
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether `token` is the most recent trigger and has not fired yet
    pub fn is_current(&self, token: DebounceToken) -> bool {
        matches!(self.deadline, Some((_, generation)) if generation == token.0)
    }

    /// Fires at most once per trigger, when `now` has reached the deadline
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some((deadline, _)) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

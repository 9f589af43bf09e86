//! Idle detection from a stream of activity signals.
//!
//! The detector is driven entirely by timestamps handed to it, so it never
//! reads a clock itself. A runtime keeps at most one timer armed for
//! [`IdleDetector::deadline_ms`] and calls [`IdleDetector::tick`] when it
//! fires (or on every periodic tick, whichever comes first).

use std::time::Duration;

/// A change in presence reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTransition {
    /// No activity within the idle timeout.
    Idle,
    /// Activity arrived while idle.
    Resumed,
}

/// Tracks whether the user is present.
#[derive(Debug, Clone)]
pub struct IdleDetector {
    timeout_ms: i64,
    coalesce_ms: i64,
    active: bool,
    deadline_ms: Option<i64>,
    last_signal_ms: Option<i64>,
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

impl IdleDetector {
    /// Creates a detector that starts out idle and unarmed.
    pub fn new(idle_timeout: Duration, coalesce_window: Duration) -> Self {
        Self {
            timeout_ms: duration_ms(idle_timeout),
            coalesce_ms: duration_ms(coalesce_window),
            active: false,
            deadline_ms: None,
            last_signal_ms: None,
        }
    }

    /// Marks the user present and arms the first deadline, without reporting
    /// a transition.
    pub fn arm(&mut self, now_ms: i64) {
        self.active = true;
        self.last_signal_ms = Some(now_ms);
        self.deadline_ms = Some(now_ms.saturating_add(self.timeout_ms));
    }

    /// Records an activity signal.
    ///
    /// Signals arriving within the coalescing window of the last evaluated
    /// signal are dropped while active. Returns [`IdleTransition::Resumed`]
    /// only when this signal ends an idle period.
    pub fn record_activity(&mut self, now_ms: i64) -> Option<IdleTransition> {
        let coalesced = self.active
            && self
                .last_signal_ms
                .is_some_and(|last| now_ms.saturating_sub(last) < self.coalesce_ms);
        if coalesced {
            return None;
        }

        self.last_signal_ms = Some(now_ms);
        self.deadline_ms = Some(now_ms.saturating_add(self.timeout_ms));

        if self.active {
            None
        } else {
            self.active = true;
            tracing::debug!(now_ms, "activity after idle");
            Some(IdleTransition::Resumed)
        }
    }

    /// Checks the deadline. Reports [`IdleTransition::Idle`] once per idle
    /// period; further ticks while idle are no-ops.
    pub fn tick(&mut self, now_ms: i64) -> Option<IdleTransition> {
        match self.deadline_ms {
            Some(deadline) if self.active && now_ms >= deadline => {
                self.active = false;
                self.deadline_ms = None;
                tracing::debug!(now_ms, deadline, "idle timeout reached");
                Some(IdleTransition::Idle)
            }
            _ => None,
        }
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The pending idle deadline, if the detector is active.
    pub const fn deadline_ms(&self) -> Option<i64> {
        self.deadline_ms
    }
}

//! Capture debounce state machine.
//!
//! `Idle --(capture accepted)--> Cooling { until }`
//! `Cooling --(clock reaches until)--> Idle`
//!
//! There is no early cancellation. A capture request arriving while cooling
//! is dropped, not queued. Time comes from an injected `Clock` so tests can
//! step through the cooldown without sleeping.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default cooldown after a capture.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-independent clock backed by `Instant::now`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Cooling { until: Instant },
}

/// Debounce flag shared by the filter (read) and the pipeline (write).
#[derive(Clone, Debug)]
pub struct CaptureState {
    phase: Phase,
    cooldown: Duration,
}

impl CaptureState {
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            cooldown,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// True while a cooldown window is active, as of the last `refresh`.
    pub fn capturing(&self) -> bool {
        matches!(self.phase, Phase::Cooling { .. })
    }

    /// Expire the cooldown if the clock has reached its end.
    ///
    /// Returns true when this call moved the state back to `Idle`.
    pub fn refresh(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Cooling { until } if now >= until => {
                self.phase = Phase::Idle;
                true
            }
            _ => false,
        }
    }

    /// Enter `Cooling` if idle. Returns false (and changes nothing) when a
    /// cooldown is already running.
    pub fn begin_cooldown(&mut self, now: Instant) -> bool {
        self.refresh(now);
        if self.capturing() {
            return false;
        }
        self.phase = Phase::Cooling {
            until: now + self.cooldown,
        };
        true
    }

    /// Time left in the current cooldown.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.phase {
            Phase::Cooling { until } => until.saturating_duration_since(now),
            Phase::Idle => Duration::ZERO,
        }
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::new()
    }
}

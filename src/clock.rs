use std::time::Instant;

/// One-second tick source consumed by the session controller.
///
/// At most one interval is active: `start` on a running clock and `stop` on
/// a stopped clock do nothing. A stopped clock never reports due seconds.
pub trait Clock {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_active(&self) -> bool;
    /// Whole seconds that came due since the previous call
    fn due_seconds(&mut self) -> u32;
}

/// Wall clock backed by `Instant`; seconds are derived by subtraction so
/// polling jitter does not accumulate.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    started: Option<Instant>,
    emitted: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for MonotonicClock {
    fn start(&mut self) {
        if self.started.is_some() {
            return;
        }
        self.started = Some(Instant::now());
        self.emitted = 0;
    }

    fn stop(&mut self) {
        self.started = None;
        self.emitted = 0;
    }

    fn is_active(&self) -> bool {
        self.started.is_some()
    }

    fn due_seconds(&mut self) -> u32 {
        let Some(started) = self.started else {
            return 0;
        };
        let whole = started.elapsed().as_secs();
        let due = whole.saturating_sub(self.emitted);
        self.emitted = whole;
        u32::try_from(due).unwrap_or(u32::MAX)
    }
}

/// Hand-cranked clock for tests and headless drivers
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    active: bool,
    pending: u32,
    starts: usize,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `secs` seconds pass. Ignored while stopped.
    pub fn advance(&mut self, secs: u32) {
        if self.active {
            self.pending += secs;
        }
    }

    /// How many times the clock went from stopped to running
    pub fn starts(&self) -> usize {
        self.starts
    }
}

impl Clock for ManualClock {
    fn start(&mut self) {
        if !self.active {
            self.active = true;
            self.starts += 1;
        }
    }

    fn stop(&mut self) {
        self.active = false;
        self.pending = 0;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn due_seconds(&mut self) -> u32 {
        std::mem::take(&mut self.pending)
    }
}

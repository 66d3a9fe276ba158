//! "Rendering in progress" flag with a calm-down period
//!
//! Input-driven actions (wheel zoom, wheel paging) are suppressed while a
//! draw is in flight and for a short while after the last one settled.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DEFAULT_CALM_DOWN: Duration = Duration::from_millis(150);

/// Monotonic time source
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall clock, measured from construction
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Counts running draws; once the last one stops the gate stays closed
/// until the calm-down deadline passes.
pub struct BusyGate {
    clock: Box<dyn Clock>,
    calm_down: Duration,
    running: usize,
    quiet_until: Option<Duration>,
}

impl BusyGate {
    pub fn new(clock: impl Clock + 'static, calm_down: Duration) -> Self {
        Self {
            clock: Box::new(clock),
            calm_down,
            running: 0,
            quiet_until: None,
        }
    }

    pub fn start(&mut self) {
        self.running += 1;
    }

    pub fn stop(&mut self) {
        self.running = self.running.saturating_sub(1);
        if self.running == 0 {
            self.quiet_until = Some(self.clock.now() + self.calm_down);
        }
    }

    /// Forget running draws whose results will never be reported, keeping
    /// the gate closed for one more calm-down period.
    pub fn reset(&mut self) {
        if self.running > 0 {
            self.running = 0;
            self.quiet_until = Some(self.clock.now() + self.calm_down);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.running > 0 || self.quiet_until.is_some_and(|until| self.clock.now() < until)
    }

    pub fn running(&self) -> usize {
        self.running
    }

    pub fn calm_down(&self) -> Duration {
        self.calm_down
    }
}

impl std::fmt::Debug for BusyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusyGate")
            .field("calm_down", &self.calm_down)
            .field("running", &self.running)
            .field("quiet_until", &self.quiet_until)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> (BusyGate, ManualClock) {
        let clock = ManualClock::new();
        (BusyGate::new(clock.clone(), DEFAULT_CALM_DOWN), clock)
    }

    #[test]
    fn idle_gate_is_open() {
        let (gate, _) = gate();
        assert!(!gate.is_busy());
    }

    #[test]
    fn stays_busy_through_calm_down() {
        let (mut gate, clock) = gate();
        gate.start();
        clock.advance(Duration::from_secs(2));
        assert!(gate.is_busy());

        gate.stop();
        clock.advance(Duration::from_millis(149));
        assert!(gate.is_busy());
        clock.advance(Duration::from_millis(1));
        assert!(!gate.is_busy());
    }

    #[test]
    fn overlapping_draws_keep_gate_closed() {
        let (mut gate, clock) = gate();
        gate.start();
        gate.start();
        gate.stop();
        clock.advance(Duration::from_secs(1));
        assert!(gate.is_busy(), "one draw still running");

        gate.stop();
        clock.advance(DEFAULT_CALM_DOWN);
        assert!(!gate.is_busy());
    }

    #[test]
    fn unmatched_stop_does_not_underflow() {
        let (mut gate, clock) = gate();
        gate.stop();
        assert_eq!(gate.running(), 0);
        clock.advance(DEFAULT_CALM_DOWN);
        assert!(!gate.is_busy());
    }

    #[test]
    fn reset_drops_running_draws() {
        let (mut gate, clock) = gate();
        gate.start();
        gate.reset();
        assert_eq!(gate.running(), 0);
        assert!(gate.is_busy());
        clock.advance(DEFAULT_CALM_DOWN);
        assert!(!gate.is_busy());
    }
}

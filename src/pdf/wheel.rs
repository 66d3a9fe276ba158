//! Mouse wheel gating for zoom and paging
//!
//! Trackpads emit bursts of small deltas. Each accepted step doubles the
//! threshold the next delta has to exceed; each rejected delta halves it,
//! never below the initial value.

/// Threshold a fresh gesture has to exceed
pub const INITIAL_THRESHOLD: f32 = 0.25;
pub const THRESHOLD_FACTOR: f32 = 2.0;

/// Outcome of a wheel delta
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelStep {
    /// Wheel rolled up: zoom in, previous page
    Backward,
    /// Wheel rolled down: zoom out, next page
    Forward,
    /// Below threshold
    Absorbed,
}

#[derive(Clone, Copy, Debug)]
pub struct WheelThrottle {
    threshold: f32,
}

impl Default for WheelThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl WheelThrottle {
    pub fn new() -> Self {
        Self {
            threshold: INITIAL_THRESHOLD,
        }
    }

    /// Classify a normalized delta (see [`normalize`]) and adapt the threshold
    pub fn process(&mut self, delta: f32) -> WheelStep {
        let step = if delta < -self.threshold {
            self.threshold *= THRESHOLD_FACTOR;
            WheelStep::Backward
        } else if delta > self.threshold {
            self.threshold *= THRESHOLD_FACTOR;
            WheelStep::Forward
        } else {
            self.threshold /= THRESHOLD_FACTOR;
            WheelStep::Absorbed
        };
        self.threshold = self.threshold.max(INITIAL_THRESHOLD);
        step
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Map raw wheel event fields onto `-1.0..=1.0`, positive meaning rolled down.
///
/// `wheel_delta` is the legacy 120-per-notch value (positive when rolled
/// up), `detail` the line count (positive when rolled down).
/// Large deltas are compressed so fast flicks do not saturate immediately.
pub fn normalize(detail: f32, wheel_delta: f32) -> f32 {
    let mut notches = if wheel_delta != 0.0 {
        wheel_delta / 120.0
    } else {
        -detail / 3.0
    };
    if notches.abs() > 1.0 {
        notches = notches.signum() * (notches * notches + 224.0) / 225.0;
    }
    -(notches / 2.0).clamp(-1.0, 1.0)
}

//! Scheduled parameter automation
//!
//! An `AudioParam` holds a value plus at most one pending exponential ramp,
//! stamped on the audio clock. Scheduling a new ramp cancels whatever is in
//! flight and starts from the value the parameter has at that moment, so the
//! most recent request always wins.

/// Exponential ramps cannot reach zero; targets and start points are floored here.
pub const RAMP_FLOOR: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ramp {
    start_time: f64,
    start_value: f64,
    end_time: f64,
    end_value: f64,
}

impl Ramp {
    fn value_at(&self, time: f64) -> f64 {
        if time <= self.start_time {
            return self.start_value;
        }
        if time >= self.end_time {
            return self.end_value;
        }
        let progress = (time - self.start_time) / (self.end_time - self.start_time);
        self.start_value * (self.end_value / self.start_value).powf(progress)
    }
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f64,
    ramp: Option<Ramp>,
}

impl AudioParam {
    pub fn new(value: f64) -> Self {
        Self { value, ramp: None }
    }

    /// Value at `time` on the audio clock.
    pub fn value_at(&self, time: f64) -> f64 {
        match &self.ramp {
            Some(ramp) => ramp.value_at(time),
            None => self.value,
        }
    }

    /// Value the parameter is heading towards.
    pub fn target(&self) -> f64 {
        match &self.ramp {
            Some(ramp) => ramp.end_value,
            None => self.value,
        }
    }

    pub fn is_ramping(&self, time: f64) -> bool {
        self.ramp.is_some_and(|r| time < r.end_time)
    }

    /// Cancel automation and jump to `value`.
    pub fn set_value(&mut self, value: f64) {
        self.ramp = None;
        self.value = value;
    }

    /// Cancel automation after `now`, hold the current value, then ramp
    /// exponentially to `target` over `duration` seconds.
    pub fn exponential_ramp(&mut self, now: f64, target: f64, duration: f64) {
        let start_value = self.value_at(now).max(RAMP_FLOOR);
        let end_value = target.max(RAMP_FLOOR);

        if !duration.is_finite() || duration <= 0.0 {
            self.set_value(end_value);
            return;
        }

        self.value = start_value;
        self.ramp = Some(Ramp {
            start_time: now,
            start_value,
            end_time: now + duration,
            end_value,
        });
    }

    /// Collapse a finished ramp into a plain value.
    pub fn settle(&mut self, time: f64) {
        if let Some(ramp) = self.ramp {
            if time >= ramp.end_time {
                self.value = ramp.end_value;
                self.ramp = None;
            }
        }
    }
}

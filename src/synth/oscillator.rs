//! Phase-accumulating sine oscillator

use std::f64::consts::TAU;

#[derive(Debug, Clone, Default)]
pub struct SineOscillator {
    phase: f64, // cycles, in [0, 1)
}

impl SineOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce one sample at `frequency` and advance the phase.
    pub fn next_sample(&mut self, frequency: f64, sample_rate: f64) -> f32 {
        let out = (self.phase * TAU).sin();
        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        out as f32
    }
}

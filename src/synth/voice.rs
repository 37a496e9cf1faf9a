//! A single sounding harmonic: sine oscillator into its own gain

use super::oscillator::SineOscillator;
use super::param::AudioParam;
use super::schedule::Generation;
use serde::Serialize;

pub struct Voice {
    id: String,
    ratio: f64,
    generation: Generation,
    oscillator: SineOscillator,
    frequency: AudioParam,
    gain: AudioParam,
    releasing: bool,
}

impl Voice {
    /// A new voice starts silent; callers ramp it in.
    pub fn new(id: &str, ratio: f64, fundamental: f64, generation: Generation) -> Self {
        Self {
            id: id.to_string(),
            ratio,
            generation,
            oscillator: SineOscillator::new(),
            frequency: AudioParam::new(fundamental * ratio),
            gain: AudioParam::new(0.0),
            releasing: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_releasing(&self) -> bool {
        self.releasing
    }

    pub(crate) fn set_releasing(&mut self, releasing: bool) {
        self.releasing = releasing;
    }

    pub(crate) fn gain_mut(&mut self) -> &mut AudioParam {
        &mut self.gain
    }

    pub(crate) fn frequency_mut(&mut self) -> &mut AudioParam {
        &mut self.frequency
    }

    /// Render one sample at `time` on the audio clock.
    pub fn process(&mut self, time: f64, sample_rate: f64) -> f32 {
        let frequency = self.frequency.value_at(time);
        let gain = self.gain.value_at(time);
        self.oscillator.next_sample(frequency, sample_rate) * gain as f32
    }

    pub(crate) fn settle(&mut self, time: f64) {
        self.frequency.settle(time);
        self.gain.settle(time);
    }

    pub fn state(&self, time: f64) -> VoiceState {
        VoiceState {
            id: self.id.clone(),
            ratio: self.ratio,
            generation: self.generation.get(),
            frequency: self.frequency.value_at(time),
            target_frequency: self.frequency.target(),
            gain: self.gain.value_at(time),
            target_gain: self.gain.target(),
            releasing: self.releasing,
        }
    }
}

/// Copy of a voice's state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceState {
    pub id: String,
    pub ratio: f64,
    pub generation: u64,
    pub frequency: f64,
    pub target_frequency: f64,
    pub gain: f64,
    pub target_gain: f64,
    pub releasing: bool,
}

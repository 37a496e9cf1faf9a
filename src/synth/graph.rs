//! The signal graph rendered by the audio stream
//!
//! ```text
//! voice osc -> voice gain --+
//! voice osc -> voice gain --+--> master bus --+--> dry (0.7) ------------+--> limiter --> out
//! drone osc -> drone level -+                 +--> send (0.3) -> reverb -+ (x0.5)
//! ```
//!
//! All parameter changes are stamped on the graph's own clock (frames rendered
//! divided by sample rate). Deferred decommissions are checked every
//! `CONTROL_BLOCK` frames.

use super::limiter::Limiter;
use super::oscillator::SineOscillator;
use super::param::{AudioParam, RAMP_FLOOR};
use super::reverb::{self, ConvolutionReverb};
use super::schedule::{DecommissionQueue, GenerationCounter};
use super::voice::{Voice, VoiceState};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub const DRY_WEIGHT: f32 = 0.7;
pub const SEND_WEIGHT: f32 = 0.3;
pub const WET_RETURN: f32 = 0.5;

/// Extra time after a release fade before the voice is torn down.
pub const DECOMMISSION_MARGIN: f64 = 0.1;

/// Fade applied to every voice and the drone on teardown.
pub const TEARDOWN_FADE: f64 = 0.05;

/// Frames between checks of the decommission queue.
pub const CONTROL_BLOCK: usize = 64;

#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub sample_rate: f64,
    pub fundamental: f64,
    pub master_volume: f64,
    pub drone_level: f64,
    pub reverb_seed: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            fundamental: 110.0,
            master_volume: 0.7,
            drone_level: 0.02,
            reverb_seed: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphState {
    Running,
    TearingDown { closes_at: f64 },
    Closed,
}

struct Drone {
    oscillator: SineOscillator,
    frequency: AudioParam,
    level: AudioParam,
}

impl Drone {
    fn process(&mut self, time: f64, sample_rate: f64) -> f32 {
        let frequency = self.frequency.value_at(time);
        self.oscillator.next_sample(frequency, sample_rate) * self.level.value_at(time) as f32
    }
}

pub struct SignalGraph {
    sample_rate: f64,
    frame: u64,
    state: GraphState,
    fundamental: f64,
    master: AudioParam,
    voices: BTreeMap<String, Voice>,
    generations: GenerationCounter,
    decommissions: DecommissionQueue,
    drone: Option<Drone>,
    reverb: ConvolutionReverb,
    limiter: Limiter,
}

/// Lock the shared graph, recovering it if a previous holder panicked.
pub fn lock_graph(graph: &Mutex<SignalGraph>) -> MutexGuard<'_, SignalGraph> {
    graph.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn valid_frequency(freq: f64) -> bool {
    freq.is_finite() && freq > 0.0
}

fn seconds(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

impl SignalGraph {
    /// Build the graph and start the drone.
    pub fn new(settings: &GraphSettings) -> Self {
        let sample_rate = if valid_frequency(settings.sample_rate) {
            settings.sample_rate
        } else {
            GraphSettings::default().sample_rate
        };
        let fundamental = if valid_frequency(settings.fundamental) {
            settings.fundamental
        } else {
            GraphSettings::default().fundamental
        };

        let ir = reverb::impulse_response(sample_rate, reverb::IMPULSE_SECONDS, settings.reverb_seed);
        info!(
            "Signal graph at {} Hz, fundamental {} Hz, reverb {} partitions",
            sample_rate,
            fundamental,
            ir.len().div_ceil(reverb::BLOCK_SIZE)
        );

        Self {
            sample_rate,
            frame: 0,
            state: GraphState::Running,
            fundamental,
            master: AudioParam::new(settings.master_volume.max(0.0)),
            voices: BTreeMap::new(),
            generations: GenerationCounter::default(),
            decommissions: DecommissionQueue::new(),
            drone: Some(Drone {
                oscillator: SineOscillator::new(),
                frequency: AudioParam::new(fundamental),
                level: AudioParam::new(settings.drone_level.max(0.0)),
            }),
            reverb: ConvolutionReverb::new(&ir),
            limiter: Limiter::new(sample_rate as f32),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Current time on the audio clock, in seconds.
    pub fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn fundamental(&self) -> f64 {
        self.fundamental
    }

    pub fn master_volume(&self) -> f64 {
        self.master.value_at(self.now())
    }

    pub fn has_drone(&self) -> bool {
        self.drone.is_some()
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, id: &str) -> Option<VoiceState> {
        let now = self.now();
        self.voices.get(id).map(|v| v.state(now))
    }

    /// Ids of allocated voices, sorted.
    pub fn voice_ids(&self) -> Vec<String> {
        self.voices.keys().cloned().collect()
    }

    pub fn pending_decommissions(&self) -> usize {
        self.decommissions.len()
    }

    /// Return the voice for `id`, allocating it if needed.
    ///
    /// A voice that is fading out after a release is revived: its pending
    /// decommission is cancelled and the same oscillator keeps running.
    /// Returns `None` once the graph is being torn down or for an unusable ratio.
    pub fn create_voice(&mut self, id: &str, ratio: f64) -> Option<VoiceState> {
        if self.state != GraphState::Running {
            return None;
        }
        let now = self.now();

        if let Some(voice) = self.voices.get_mut(id) {
            if voice.is_releasing() {
                self.decommissions.cancel(id);
                voice.set_releasing(false);
                debug!("Voice {} {} revived before decommission", id, voice.generation());
            }
            return Some(voice.state(now));
        }

        if !valid_frequency(ratio) {
            warn!("Ignoring voice {} with ratio {}", id, ratio);
            return None;
        }

        let generation = self.generations.next();
        let voice = Voice::new(id, ratio, self.fundamental, generation);
        let state = voice.state(now);
        self.voices.insert(id.to_string(), voice);
        debug!(
            "Voice {} {} created at {:.3} Hz",
            id, generation, state.frequency
        );
        Some(state)
    }

    /// Ramp a voice's gain to `amplitude` (floored above zero) over `ramp` seconds.
    ///
    /// An audible amplitude on a releasing voice takes it back: the pending
    /// decommission is cancelled so the voice is never cut while loud.
    /// Ignored while the graph is being torn down.
    pub fn set_voice_amplitude(&mut self, id: &str, amplitude: f64, ramp: f64) {
        if self.state != GraphState::Running {
            return;
        }
        let now = self.now();
        let Some(voice) = self.voices.get_mut(id) else {
            return;
        };
        let amplitude = if amplitude.is_nan() { 0.0 } else { amplitude.max(0.0) };
        if voice.is_releasing() && amplitude > RAMP_FLOOR {
            self.decommissions.cancel(id);
            voice.set_releasing(false);
            debug!("Voice {} {} revived by amplitude {:.4}", id, voice.generation(), amplitude);
        }
        voice
            .gain_mut()
            .exponential_ramp(now, amplitude.max(RAMP_FLOOR), seconds(ramp));
    }

    /// Fade a voice out over `fade` seconds and schedule its teardown.
    pub fn release_voice(&mut self, id: &str, fade: f64) {
        let now = self.now();
        let Some(voice) = self.voices.get_mut(id) else {
            return;
        };
        let fade = seconds(fade);
        voice.gain_mut().exponential_ramp(now, RAMP_FLOOR, fade);
        voice.set_releasing(true);
        let generation = voice.generation();
        self.decommissions
            .schedule(id, generation, now + fade + DECOMMISSION_MARGIN);
        debug!("Voice {} {} releasing over {:.3}s", id, generation, fade);
    }

    /// Retune the drone and every voice to the new fundamental.
    pub fn set_fundamental(&mut self, freq: f64, ramp: f64) {
        if !valid_frequency(freq) {
            warn!("Ignoring fundamental {}", freq);
            return;
        }
        let now = self.now();
        let ramp = seconds(ramp);
        self.fundamental = freq;

        if let Some(drone) = self.drone.as_mut() {
            drone.frequency.exponential_ramp(now, freq, ramp);
        }
        for voice in self.voices.values_mut() {
            let target = freq * voice.ratio();
            voice.frequency_mut().exponential_ramp(now, target, ramp);
        }
        info!("Fundamental -> {:.3} Hz over {:.3}s", freq, ramp);
    }

    /// Immediate, unramped master gain.
    pub fn set_master_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        self.master.set_value(volume.max(0.0));
    }

    /// Fade everything out, then close the graph. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.state != GraphState::Running {
            return;
        }
        let now = self.now();
        for voice in self.voices.values_mut() {
            voice.gain_mut().exponential_ramp(now, RAMP_FLOOR, TEARDOWN_FADE);
            voice.set_releasing(true);
        }
        self.decommissions.clear();
        if let Some(drone) = self.drone.as_mut() {
            drone.level.exponential_ramp(now, RAMP_FLOOR, TEARDOWN_FADE);
        }
        let closes_at = now + TEARDOWN_FADE + DECOMMISSION_MARGIN;
        self.state = GraphState::TearingDown { closes_at };
        info!(
            "Tearing down signal graph ({} voices), closing at {:.3}s",
            self.voices.len(),
            closes_at
        );
    }

    fn run_control(&mut self) {
        let now = self.now();

        for task in self.decommissions.take_due(now) {
            let current = self.voices.get(&task.id).is_some_and(|v| {
                v.generation() == task.generation && v.is_releasing()
            });
            if current {
                self.voices.remove(&task.id);
                debug!("Voice {} {} decommissioned", task.id, task.generation);
            } else {
                debug!("Stale decommission for {} {} ignored", task.id, task.generation);
            }
        }

        if let GraphState::TearingDown { closes_at } = self.state {
            if now >= closes_at {
                self.voices.clear();
                self.drone = None;
                self.limiter.reset();
                self.state = GraphState::Closed;
                info!("Signal graph closed");
            }
        }
    }

    fn next_sample(&mut self) -> f32 {
        let time = self.now();
        self.frame += 1;
        if self.state == GraphState::Closed {
            return 0.0;
        }

        let sample_rate = self.sample_rate;
        let mut bus: f32 = self
            .voices
            .values_mut()
            .map(|v| v.process(time, sample_rate))
            .sum();
        if let Some(drone) = self.drone.as_mut() {
            bus += drone.process(time, sample_rate);
        }

        let master = bus * self.master.value_at(time) as f32;
        let wet = self.reverb.process(master * SEND_WEIGHT) * WET_RETURN;
        self.limiter.process(master * DRY_WEIGHT + wet)
    }

    /// Render mono frames, advancing the clock by `out.len()` frames.
    pub fn process(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(CONTROL_BLOCK) {
            self.run_control();
            for sample in chunk.iter_mut() {
                *sample = self.next_sample();
            }
            let now = self.now();
            for voice in self.voices.values_mut() {
                voice.settle(now);
            }
        }
        self.run_control();
    }

    /// Render `frames` mono samples into a new buffer.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.process(&mut out);
        out
    }
}

//! Interaction coordinator
//!
//! Turns pointer, scroll and key events into field updates and voice
//! commands. The decision of what should sound is a pure function of the
//! proximity results and the previously active map, so it can be tested
//! without audio; [`Coordinator`] applies those decisions.

use crate::config::ExplorerConfig;
use crate::field::HarmonicField;
use crate::harmonic::{Point, Proximity, MAX_AMPLITUDE};
use crate::synth::VoiceManager;
use std::collections::BTreeMap;
use tracing::debug;

/// Amplitudes below this are treated as silent.
pub const SILENCE_THRESHOLD: f64 = 1e-3;

/// Fundamental range reachable from the keyboard.
pub const MIN_FUNDAMENTAL: f64 = 20.0;
pub const MAX_FUNDAMENTAL: f64 = 2000.0;

/// Harmonic id to its current target amplitude.
pub type ActiveMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Up one tempered semitone
    Up,
    /// Down one tempered semitone
    Down,
    /// Shallower
    Left,
    /// Deeper
    Right,
    /// Release everything
    Hush,
    /// Toggle master mute
    Mute,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeUpdate {
    pub id: String,
    pub ratio: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmplitudePlan {
    /// The active map after applying this plan
    pub active: ActiveMap,
    /// Harmonics to create (if needed) and ramp, nearest first
    pub updates: Vec<AmplitudeUpdate>,
    /// Harmonics that were sounding and no longer should
    pub releases: Vec<String>,
}

/// Proximity influence scaled down for higher primes, `influence / sqrt(prime / 2)`,
/// clamped to the harmonic amplitude ceiling.
pub fn target_amplitude(influence: f64, prime: u32) -> f64 {
    let scaled = influence / (f64::from(prime.max(1)) / 2.0).sqrt();
    if scaled.is_nan() {
        0.0
    } else {
        scaled.clamp(0.0, MAX_AMPLITUDE)
    }
}

/// Decide which harmonics sound and how loudly.
pub fn compute_target_amplitudes(near: &[Proximity], active: &ActiveMap) -> AmplitudePlan {
    let mut plan = AmplitudePlan::default();

    for hit in near {
        let amplitude = target_amplitude(hit.influence, hit.harmonic.prime);
        if amplitude < SILENCE_THRESHOLD {
            continue;
        }
        plan.active.insert(hit.harmonic.id.clone(), amplitude);
        plan.updates.push(AmplitudeUpdate {
            id: hit.harmonic.id.clone(),
            ratio: hit.harmonic.ratio,
            amplitude,
        });
    }

    plan.releases = active
        .keys()
        .filter(|id| !plan.active.contains_key(*id))
        .cloned()
        .collect();
    plan
}

pub struct Coordinator {
    field: HarmonicField,
    voices: VoiceManager,
    config: ExplorerConfig,
    active: ActiveMap,
    pointer: Option<Point>,
    muted: bool,
}

impl Coordinator {
    pub fn new(config: ExplorerConfig, voices: VoiceManager) -> Self {
        Self {
            field: HarmonicField::new(config.width, config.height),
            voices,
            config,
            active: ActiveMap::new(),
            pointer: None,
            muted: false,
        }
    }

    pub fn field(&self) -> &HarmonicField {
        &self.field
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn active(&self) -> &ActiveMap {
        &self.active
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.pointer = Some(Point::new(x, y));
        let near = self.field.near(x, y, self.config.proximity_radius);
        let plan = compute_target_amplitudes(&near, &self.active);
        self.apply(plan);
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        self.hush();
    }

    /// Scroll by `notches`; positive goes deeper.
    pub fn scroll(&mut self, notches: f64) {
        if notches.is_finite() {
            self.set_depth(self.field.depth() + notches * self.config.depth_step);
        }
    }

    /// Change depth, releasing whatever it hides and picking up whatever
    /// it reveals under the pointer.
    pub fn set_depth(&mut self, depth: f64) {
        self.field.set_depth(depth);
        match self.pointer {
            Some(p) => self.pointer_moved(p.x, p.y),
            None => {
                let hidden: Vec<String> = self
                    .active
                    .keys()
                    .filter(|id| !self.field.is_visible(id))
                    .cloned()
                    .collect();
                for id in hidden {
                    self.active.remove(&id);
                    self.release(&id);
                }
            }
        }
    }

    pub fn key(&mut self, key: Key) {
        match key {
            Key::Up => self.shift_fundamental(1.0),
            Key::Down => self.shift_fundamental(-1.0),
            Key::Left => self.scroll(-1.0),
            Key::Right => self.scroll(1.0),
            Key::Hush => self.hush(),
            Key::Mute => {
                self.muted = !self.muted;
                let volume = if self.muted { 0.0 } else { self.config.master_volume };
                self.voices.set_master_volume(volume);
            }
        }
    }

    /// Re-lay the field, then re-evaluate what sounds under the pointer.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.field.resize(width, height);
        if let Some(p) = self.pointer {
            self.pointer_moved(p.x, p.y);
        }
    }

    /// Animation frame.
    pub fn tick(&mut self, dt: f64) {
        self.field.tick(dt);
    }

    /// Release every sounding harmonic.
    pub fn hush(&mut self) {
        let ids: Vec<String> = std::mem::take(&mut self.active).into_keys().collect();
        for id in ids {
            self.release(&id);
        }
    }

    /// Tear down the synthesis engine.
    pub fn shutdown(&mut self) {
        self.hush();
        self.voices.destroy();
    }

    fn shift_fundamental(&mut self, semitones: f64) {
        let current = self.voices.fundamental();
        let target = (current * 2f64.powf(semitones / 12.0)).clamp(MIN_FUNDAMENTAL, MAX_FUNDAMENTAL);
        self.voices.set_fundamental(target, self.config.retune_seconds);
    }

    fn release(&mut self, id: &str) {
        self.field.set_amplitude(id, 0.0);
        self.voices.release_voice(id, self.config.release_seconds);
    }

    fn apply(&mut self, plan: AmplitudePlan) {
        for id in &plan.releases {
            debug!("Releasing {}", id);
            self.release(id);
        }
        for update in &plan.updates {
            self.field.set_amplitude(&update.id, update.amplitude);
            self.voices.create_voice(&update.id, update.ratio);
            self.voices.set_voice_amplitude(
                &update.id,
                update.amplitude * self.config.voice_level,
                self.config.attack_seconds,
            );
        }
        self.active = plan.active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmonic::HarmonicSnapshot;
    use crate::ratios::{self, Hsl};

    fn hit(prime: u32, influence: f64) -> Proximity {
        let ratio = ratios::octave_reduce(u64::from(prime));
        Proximity {
            harmonic: HarmonicSnapshot {
                id: format!("h{}x1", prime),
                prime,
                ratio,
                pure_ratio: prime,
                cents: ratios::cents(ratio),
                position: Point::default(),
                size: 20.0,
                color: Hsl::new(0.0, 0.0, 0.0),
                amplitude: 0.0,
                glow: 0.0,
                is_exotic: ratios::is_exotic(prime),
                visibility_depth: 0.0,
            },
            distance: 0.0,
            influence,
        }
    }

    #[test]
    fn test_target_amplitude_scaling() {
        assert_eq!(target_amplitude(1.0, 2), MAX_AMPLITUDE);
        assert!((target_amplitude(0.5, 2) - 0.5).abs() < 1e-12);
        assert!((target_amplitude(0.5, 8) - 0.25).abs() < 1e-12);
        assert_eq!(target_amplitude(f64::NAN, 3), 0.0);
        assert_eq!(target_amplitude(-1.0, 3), 0.0);
    }

    #[test]
    fn test_plan_releases_departed_harmonics() {
        let mut active = ActiveMap::new();
        active.insert("h3x1".to_string(), 0.4);
        active.insert("h5x1".to_string(), 0.2);

        let plan = compute_target_amplitudes(&[hit(5, 0.6), hit(7, 0.3)], &active);
        assert_eq!(plan.releases, vec!["h3x1".to_string()]);
        assert_eq!(plan.updates.len(), 2);
        assert_eq!(plan.updates[0].id, "h5x1");
        assert_eq!(plan.updates[1].ratio, 1.75);
        assert!(plan.active.contains_key("h7x1"));
        assert!(!plan.active.contains_key("h3x1"));
    }

    #[test]
    fn test_plan_skips_silent_targets() {
        let plan = compute_target_amplitudes(&[hit(3, 0.0)], &ActiveMap::new());
        assert!(plan.updates.is_empty());
        assert!(plan.active.is_empty());
    }
}

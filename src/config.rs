//! Explorer configuration
//!
//! Defaults, optionally overlaid by a TOML file; the CLI overlays its flags on
//! top. Every key is optional.

use crate::error::Result;
use crate::synth::graph::GraphSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Initial fundamental in Hz
    pub fundamental: f64,
    pub width: f64,
    pub height: f64,
    /// Offline render rate; live output uses the device rate
    pub sample_rate: u32,
    pub master_volume: f64,
    pub drone_level: f64,
    /// Scale from harmonic amplitude to voice gain
    pub voice_level: f64,
    pub proximity_radius: f64,
    pub attack_seconds: f64,
    pub release_seconds: f64,
    pub retune_seconds: f64,
    /// Depth change per scroll notch or arrow key
    pub depth_step: f64,
    pub reverb_seed: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            fundamental: 110.0,
            width: 1280.0,
            height: 800.0,
            sample_rate: 44100,
            master_volume: 0.7,
            drone_level: 0.02,
            voice_level: 0.25,
            proximity_radius: 120.0,
            attack_seconds: 0.1,
            release_seconds: 0.5,
            retune_seconds: 0.3,
            depth_step: 0.05,
            reverb_seed: 7,
        }
    }
}

impl ExplorerConfig {
    /// Parse a TOML document and sanitise it.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ExplorerConfig = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Replace unusable values with defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        for (name, value, default) in [
            ("fundamental", &mut self.fundamental, defaults.fundamental),
            ("width", &mut self.width, defaults.width),
            ("height", &mut self.height, defaults.height),
            ("proximity_radius", &mut self.proximity_radius, defaults.proximity_radius),
        ] {
            fall_back(name, value, default, positive);
        }
        for (name, value, default) in [
            ("master_volume", &mut self.master_volume, defaults.master_volume),
            ("drone_level", &mut self.drone_level, defaults.drone_level),
            ("voice_level", &mut self.voice_level, defaults.voice_level),
            ("attack_seconds", &mut self.attack_seconds, defaults.attack_seconds),
            ("release_seconds", &mut self.release_seconds, defaults.release_seconds),
            ("retune_seconds", &mut self.retune_seconds, defaults.retune_seconds),
            ("depth_step", &mut self.depth_step, defaults.depth_step),
        ] {
            fall_back(name, value, default, non_negative);
        }
        if self.sample_rate == 0 {
            self.sample_rate = defaults.sample_rate;
        }
        self
    }

    pub fn graph_settings(&self, sample_rate: f64) -> GraphSettings {
        GraphSettings {
            sample_rate,
            fundamental: self.fundamental,
            master_volume: self.master_volume,
            drone_level: self.drone_level,
            reverb_seed: self.reverb_seed,
        }
    }
}

fn fall_back(name: &str, value: &mut f64, default: f64, valid: impl Fn(f64) -> bool) {
    if !valid(*value) {
        warn!("Config {} = {} is out of range, using {}", name, value, default);
        *value = default;
    }
}

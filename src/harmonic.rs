//! Harmonic entities and the read-only snapshot handed to presentation

use crate::ratios::{self, Hsl};
use serde::Serialize;

/// Ceiling for a harmonic's sounding amplitude.
pub const MAX_AMPLITUDE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Stable key for a (prime, octave multiplier) pair.
pub fn harmonic_id(prime: u32, multiplier: u64) -> String {
    format!("h{}x{}", prime, multiplier)
}

/// One prime harmonic placed in the field. Owned by [`crate::field::HarmonicField`].
#[derive(Debug, Clone)]
pub struct Harmonic {
    pub(crate) id: String,
    pub(crate) prime: u32,
    pub(crate) multiplier: u64,
    pub(crate) position: Point,
    pub(crate) base_position: Point,
    pub(crate) size: f64,
    pub(crate) base_size: f64,
    pub(crate) color: Hsl,
    pub(crate) amplitude: f64,
    pub(crate) glow: f64,
    pub(crate) visibility_depth: f64,

    // Animation state
    pub(crate) phase: f64,
    pub(crate) breath_rate: f64,
    pub(crate) wander_angle: f64,
    pub(crate) wander_speed: f64,
}

impl Harmonic {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prime(&self) -> u32 {
        self.prime
    }

    /// Octave-reduced ratio, derived from prime and multiplier on every call.
    pub fn ratio(&self) -> f64 {
        ratios::octave_reduce(u64::from(self.prime).saturating_mul(self.multiplier))
    }

    pub fn pure_ratio(&self) -> u32 {
        self.prime
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn base_position(&self) -> Point {
        self.base_position
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn glow(&self) -> f64 {
        self.glow
    }

    pub fn visibility_depth(&self) -> f64 {
        self.visibility_depth
    }

    pub fn is_exotic(&self) -> bool {
        ratios::is_exotic(self.prime)
    }

    /// Clamp into [0, MAX_AMPLITUDE]. NaN counts as silence.
    pub(crate) fn set_amplitude(&mut self, amplitude: f64) {
        self.amplitude = if amplitude.is_nan() {
            0.0
        } else {
            amplitude.clamp(0.0, MAX_AMPLITUDE)
        };
    }

    pub fn snapshot(&self) -> HarmonicSnapshot {
        let ratio = self.ratio();
        HarmonicSnapshot {
            id: self.id.clone(),
            prime: self.prime,
            ratio,
            pure_ratio: self.prime,
            cents: ratios::cents(ratio),
            position: self.position,
            size: self.size,
            color: self.color,
            amplitude: self.amplitude,
            glow: self.glow,
            is_exotic: self.is_exotic(),
            visibility_depth: self.visibility_depth,
        }
    }
}

/// Presentation-facing copy of a harmonic's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicSnapshot {
    pub id: String,
    pub prime: u32,
    pub ratio: f64,
    pub pure_ratio: u32,
    pub cents: f64,
    pub position: Point,
    pub size: f64,
    pub color: Hsl,
    pub amplitude: f64,
    pub glow: f64,
    pub is_exotic: bool,
    pub visibility_depth: f64,
}

/// A harmonic returned by a proximity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proximity {
    pub harmonic: HarmonicSnapshot,
    pub distance: f64,
    pub influence: f64,
}

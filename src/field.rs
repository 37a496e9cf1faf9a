//! Spatial harmonic model
//!
//! Places one harmonic per supported prime on a golden-angle spiral, animates
//! breathing/wander/glow, gates visibility by depth and answers proximity
//! queries. Harmonics live in an arena indexed by their string id.

use crate::harmonic::{harmonic_id, Harmonic, HarmonicSnapshot, Point, Proximity};
use crate::ratios::{self, SUPPORTED_PRIMES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// How far past the current depth harmonics begin to appear.
pub const VISIBILITY_LOOKAHEAD: f64 = 0.3;

/// Golden ratio.
const PHI: f64 = 1.618_033_988_749_895;

/// Glow follows amplitude with a time constant of 1/GLOW_RATE seconds.
const GLOW_RATE: f64 = 5.0;

/// Linear falloff: 1 at the query point, 0 at `radius + size`.
pub fn influence(distance: f64, radius: f64, size: f64) -> f64 {
    let reach = radius + size;
    if reach <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / reach).max(0.0)
}

/// Depth at which the harmonic of the given rank becomes visible.
pub fn visibility_threshold(rank: usize) -> f64 {
    ((rank as f64 - 4.0) / 15.0).max(0.0)
}

pub struct HarmonicField {
    harmonics: Vec<Harmonic>,
    index: HashMap<String, usize>,
    width: f64,
    height: f64,
    depth: f64,
    elapsed: f64,
}

impl HarmonicField {
    pub fn new(width: f64, height: f64) -> Self {
        let mut field = Self {
            harmonics: Vec::new(),
            index: HashMap::new(),
            width: 0.0,
            height: 0.0,
            depth: 0.0,
            elapsed: 0.0,
        };
        field.resize(width, height);
        field
    }

    /// Regenerate every harmonic for a new surface size.
    ///
    /// Amplitude and glow carry over by id so sounding voices stay in step
    /// with the field.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = sanitize_dimension(width);
        self.height = sanitize_dimension(height);

        let previous: HashMap<String, (f64, f64)> = self
            .harmonics
            .iter()
            .map(|h| (h.id.clone(), (h.amplitude, h.glow)))
            .collect();

        self.harmonics = place_harmonics(self.width, self.height);
        self.index = self
            .harmonics
            .iter()
            .enumerate()
            .map(|(i, h)| (h.id.clone(), i))
            .collect();

        for harmonic in &mut self.harmonics {
            if let Some(&(amplitude, glow)) = previous.get(&harmonic.id) {
                harmonic.set_amplitude(amplitude);
                harmonic.glow = glow;
            }
        }
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Clamp into [0, 1]. NaN leaves depth unchanged.
    pub fn set_depth(&mut self, depth: f64) {
        if depth.is_nan() {
            return;
        }
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Set the amplitude of a harmonic, clamped to [0, 0.8]. Unknown ids are ignored.
    pub fn set_amplitude(&mut self, id: &str, amplitude: f64) {
        if let Some(&i) = self.index.get(id) {
            self.harmonics[i].set_amplitude(amplitude);
        }
    }

    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }

    pub fn harmonic(&self, id: &str) -> Option<&Harmonic> {
        self.index.get(id).map(|&i| &self.harmonics[i])
    }

    pub fn get(&self, id: &str) -> Option<HarmonicSnapshot> {
        self.harmonic(id).map(Harmonic::snapshot)
    }

    /// All harmonics in rank order.
    pub fn harmonics(&self) -> Vec<HarmonicSnapshot> {
        self.harmonics.iter().map(Harmonic::snapshot).collect()
    }

    fn visible_iter(&self) -> impl Iterator<Item = &Harmonic> {
        let limit = self.depth + VISIBILITY_LOOKAHEAD;
        self.harmonics
            .iter()
            .filter(move |h| h.visibility_depth <= limit)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.harmonic(id)
            .is_some_and(|h| h.visibility_depth <= self.depth + VISIBILITY_LOOKAHEAD)
    }

    /// Harmonics visible at the current depth, in rank order.
    pub fn visible_harmonics(&self) -> Vec<HarmonicSnapshot> {
        self.visible_iter().map(Harmonic::snapshot).collect()
    }

    /// Visible harmonics whose edge lies within `radius` of (x, y), nearest first.
    pub fn near(&self, x: f64, y: f64, radius: f64) -> Vec<Proximity> {
        let point = Point::new(x, y);
        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };

        let mut found: Vec<Proximity> = self
            .visible_iter()
            .filter_map(|h| {
                let distance = h.position.distance(point);
                (distance < radius + h.size).then(|| Proximity {
                    harmonic: h.snapshot(),
                    distance,
                    influence: influence(distance, radius, h.size),
                })
            })
            .collect();

        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        found
    }

    /// Advance breathing, wander and glow by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        let t = self.elapsed;
        let glow_step = (dt * GLOW_RATE).min(1.0);

        for h in &mut self.harmonics {
            h.size = h.base_size * (1.0 + 0.1 * (h.breath_rate * t + h.phase).sin());

            h.wander_angle = (h.wander_angle + h.wander_speed * dt) % TAU;
            let wander_amount = 3.0 + 5.0 * h.amplitude;
            h.position = Point::new(
                h.base_position.x + h.wander_angle.cos() * wander_amount,
                h.base_position.y + h.wander_angle.sin() * wander_amount,
            );

            h.glow += (h.amplitude - h.glow) * glow_step;
        }
    }
}

fn sanitize_dimension(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

fn place_harmonics(width: f64, height: f64) -> Vec<Harmonic> {
    let center = Point::new(width / 2.0, height / 2.0);
    let base_radius = 0.35 * width.min(height);
    let golden_angle = TAU / (PHI * PHI);
    let count = SUPPORTED_PRIMES.len();

    SUPPORTED_PRIMES
        .iter()
        .enumerate()
        .map(|(i, &prime)| {
            let p = f64::from(prime);
            let angle = i as f64 * golden_angle + p * 0.1;
            let spread = i as f64 / (count - 1).max(1) as f64;
            let distance = base_radius * (0.25 + 0.5 * spread + 0.1 * (0.7 * p).sin());
            let base_position = Point::new(
                center.x + angle.cos() * distance,
                center.y + angle.sin() * distance,
            );
            let base_size = (30.0 - 0.8 * i as f64).max(12.0);

            // Seeded by prime so a resize reproduces the same motion
            let mut rng = StdRng::seed_from_u64(u64::from(prime));

            Harmonic {
                id: harmonic_id(prime, 1),
                prime,
                multiplier: 1,
                position: base_position,
                base_position,
                size: base_size,
                base_size,
                color: ratios::prime_color(prime),
                amplitude: 0.0,
                glow: 0.0,
                visibility_depth: visibility_threshold(i),
                phase: rng.gen_range(0.0..TAU),
                breath_rate: rng.gen_range(0.5..1.5),
                wander_angle: rng.gen_range(0.0..TAU),
                wander_speed: rng.gen_range(0.2..0.6),
            }
        })
        .collect()
}

//! Prime ratio math
//!
//! Exact just-intonation ratios for prime overtones of a fundamental, octave
//! folding, and the per-prime color table used by the field.

use serde::Serialize;

/// The primes the field places, in rank order.
pub const SUPPORTED_PRIMES: [u32; 20] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
];

/// Hue (degrees), saturation and lightness (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    pub const fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }
}

/// Color for primes outside [`PRIME_COLORS`].
pub const DEFAULT_COLOR: Hsl = Hsl::new(0.0, 0.0, 80.0);

/// Artistic color per prime family. Warm for the familiar low primes,
/// shading through greens and blues into violet for the exotic ones.
pub const PRIME_COLORS: [(u32, Hsl); 15] = [
    (2, Hsl::new(45.0, 90.0, 65.0)),
    (3, Hsl::new(30.0, 85.0, 60.0)),
    (5, Hsl::new(15.0, 80.0, 60.0)),
    (7, Hsl::new(160.0, 70.0, 55.0)),
    (11, Hsl::new(185.0, 75.0, 55.0)),
    (13, Hsl::new(200.0, 80.0, 60.0)),
    (17, Hsl::new(220.0, 75.0, 62.0)),
    (19, Hsl::new(240.0, 70.0, 65.0)),
    (23, Hsl::new(260.0, 70.0, 65.0)),
    (29, Hsl::new(275.0, 65.0, 62.0)),
    (31, Hsl::new(290.0, 65.0, 60.0)),
    (37, Hsl::new(305.0, 60.0, 62.0)),
    (41, Hsl::new(320.0, 60.0, 65.0)),
    (43, Hsl::new(335.0, 55.0, 68.0)),
    (47, Hsl::new(350.0, 55.0, 70.0)),
];

/// Look up the color for a prime, falling back to [`DEFAULT_COLOR`].
pub fn prime_color(prime: u32) -> Hsl {
    PRIME_COLORS
        .iter()
        .find(|(p, _)| *p == prime)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_COLOR)
}

/// Halve `n` while it is at least 4. The result lies in [1, 4) for every
/// positive integer.
pub fn fold_ratio(n: u64) -> f64 {
    let mut r = n.max(1) as f64;
    while r >= 4.0 {
        r /= 2.0;
    }
    r
}

/// Reduce a ratio into a single octave, [1, 2).
///
/// This is the ratio a voice actually sounds: 7 becomes 7/4, 11 becomes 11/8.
pub fn octave_reduce(n: u64) -> f64 {
    let mut r = fold_ratio(n);
    while r >= 2.0 {
        r /= 2.0;
    }
    r
}

/// Size of a ratio in cents.
pub fn cents(ratio: f64) -> f64 {
    1200.0 * ratio.log2()
}

/// Signed distance in cents from `ratio` to the nearest equal-tempered
/// semitone. Always within [-50, 50].
pub fn tempered_deviation(ratio: f64) -> f64 {
    let c = cents(ratio);
    c - (c / 100.0).round() * 100.0
}

/// Harmonics with no equal-tempered analogue.
pub fn is_exotic(prime: u32) -> bool {
    prime >= 7
}

/// Conventional name of the interval a prime produces once octave reduced.
pub fn interval_name(prime: u32) -> Option<&'static str> {
    let name = match prime {
        2 => "octave",
        3 => "perfect fifth",
        5 => "major third",
        7 => "septimal minor seventh",
        11 => "undecimal tritone",
        13 => "tridecimal neutral sixth",
        17 => "septendecimal semitone",
        19 => "undevicesimal minor third",
        23 => "vicesimotertial tritone",
        29 => "vicesimononal minor seventh",
        31 => "tricesimoprimal major seventh",
        37 => "37th harmonic neutral second",
        41 => "41st harmonic minor third",
        43 => "43rd harmonic fourth",
        47 => "47th harmonic tritone",
        _ => return None,
    };
    Some(name)
}

/// One octave of a prime's harmonic ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OctaveHarmonic {
    pub multiplier: u64,
    pub raw_ratio: u64,
    pub frequency: f64,
    pub folded_ratio: f64,
}

/// Iterator over successive octaves of one prime, see [`enumerate_harmonics`].
#[derive(Debug, Clone)]
pub struct HarmonicLadder {
    prime: u64,
    fundamental: f64,
    max_frequency: f64,
    multiplier: Option<u64>,
}

impl Iterator for HarmonicLadder {
    type Item = OctaveHarmonic;

    fn next(&mut self) -> Option<Self::Item> {
        let multiplier = self.multiplier?;
        let raw_ratio = self.prime.checked_mul(multiplier);
        let frequency = raw_ratio.map(|r| self.fundamental * r as f64);
        match (raw_ratio, frequency) {
            (Some(raw_ratio), Some(frequency)) if frequency <= self.max_frequency => {
                self.multiplier = multiplier.checked_mul(2);
                Some(OctaveHarmonic {
                    multiplier,
                    raw_ratio,
                    frequency,
                    folded_ratio: fold_ratio(raw_ratio),
                })
            }
            _ => {
                self.multiplier = None;
                None
            }
        }
    }
}

/// Enumerate `prime`, `2·prime`, `4·prime`, ... over `fundamental`, stopping
/// before the first frequency above `max_frequency`.
///
/// The ladder is a pure function of its inputs; calling again restarts it.
/// A non-positive or non-finite fundamental yields an empty ladder.
pub fn enumerate_harmonics(prime: u32, fundamental: f64, max_frequency: f64) -> HarmonicLadder {
    let valid = prime > 0 && fundamental.is_finite() && fundamental > 0.0;
    HarmonicLadder {
        prime: u64::from(prime),
        fundamental,
        max_frequency,
        multiplier: valid.then_some(1),
    }
}

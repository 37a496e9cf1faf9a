//! Output limiter
//!
//! Peak envelope follower with fast attack and slow release. Gain is reduced
//! so the envelope never exceeds the threshold; anything that slips through
//! the attack is clamped at the ceiling.
//!
//! ```text
//! level    = |x|
//! envelope = level > envelope ? attack-smoothed : release-smoothed
//! gain     = envelope > threshold ? threshold / envelope : 1
//! y        = clamp(x * gain, -ceiling, ceiling)
//! ```

pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[derive(Debug, Clone)]
pub struct Limiter {
    threshold: f32,
    ceiling: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
}

impl Limiter {
    pub const THRESHOLD_DB: f32 = -3.0;
    pub const CEILING_DB: f32 = -0.1;
    pub const ATTACK_SECONDS: f32 = 0.003;
    pub const RELEASE_SECONDS: f32 = 0.25;

    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(
            sample_rate,
            Self::THRESHOLD_DB,
            Self::CEILING_DB,
            Self::ATTACK_SECONDS,
            Self::RELEASE_SECONDS,
        )
    }

    pub fn with_params(
        sample_rate: f32,
        threshold_db: f32,
        ceiling_db: f32,
        attack: f32,
        release: f32,
    ) -> Self {
        let coeff = |time: f32| (-1.0 / (time.max(1e-4) * sample_rate)).exp();
        Self {
            threshold: db_to_linear(threshold_db),
            ceiling: db_to_linear(ceiling_db),
            attack_coeff: coeff(attack),
            release_coeff: coeff(release),
            envelope: 0.0,
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let level = input.abs();
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * level;

        let gain = if self.envelope > self.threshold {
            self.threshold / self.envelope
        } else {
            1.0
        };
        (input * gain).clamp(-self.ceiling, self.ceiling)
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

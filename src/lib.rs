//! # Primefield - Prime Harmonics Explorer
//!
//! An interactive field of harmonics, one per small prime, each sounding at
//! its octave-reduced ratio over a shared fundamental. Moving a pointer
//! through the field fades nearby harmonics in and out; depth reveals the
//! higher, more exotic primes.
//!
//! ## Layers
//!
//! - [`ratios`]: pure prime-ratio math (folding, cents, colours, harmonic ladders)
//! - [`field`]: the spatial model (placement, animation, visibility, proximity)
//! - [`synth`]: sine voices on a shared bus with reverb send, limiter and drone
//! - [`interaction`]: turns pointer and key events into field and voice updates
//! - [`render`]: offline rendering of a scripted gesture to WAV
//!
//! ## Quick Start
//!
//! ```rust
//! use primefield::{Coordinator, ExplorerConfig, VoiceManager};
//!
//! let config = ExplorerConfig {
//!     sample_rate: 8000,
//!     ..ExplorerConfig::default()
//! };
//! let voices = VoiceManager::headless(&config);
//! let mut explorer = Coordinator::new(config, voices);
//!
//! let first = explorer.field().visible_harmonics()[0].clone();
//! explorer.pointer_moved(first.position.x, first.position.y);
//! assert!(explorer.active().contains_key(&first.id));
//!
//! let mut block = vec![0.0f32; 512];
//! explorer.voices().render(&mut block);
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod field;
pub mod harmonic;
pub mod interaction;
pub mod ratios;
pub mod render;
pub mod synth;

pub use config::ExplorerConfig;
pub use error::{PrimefieldError, Result};
pub use field::HarmonicField;
pub use harmonic::{Harmonic, HarmonicSnapshot, Point, Proximity};
pub use interaction::{compute_target_amplitudes, Coordinator, Key};
pub use synth::VoiceManager;

//! Synthesis engine: sine voices on a shared bus with reverb send and limiter

pub mod graph;
pub mod limiter;
pub mod manager;
pub mod oscillator;
pub mod param;
pub mod reverb;
pub mod schedule;
pub mod voice;

pub use graph::{GraphSettings, GraphState, SignalGraph};
pub use manager::{VoiceManager, DEFAULT_AMPLITUDE_RAMP, DEFAULT_RELEASE_FADE};
pub use voice::VoiceState;

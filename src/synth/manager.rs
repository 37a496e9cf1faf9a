//! Voice Manager
//!
//! Public face of the synthesis engine. Owns the shared signal graph and,
//! when initialised against a device, the output stream that renders it.
//! Every operation only schedules automation on the graph's clock and
//! returns immediately.

use super::graph::{lock_graph, GraphState, SignalGraph, CONTROL_BLOCK};
use super::voice::VoiceState;
use crate::audio::{AudioDevice, AudioOutput};
use crate::config::ExplorerConfig;
use crate::error::Result;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Default gain ramp for amplitude changes.
pub const DEFAULT_AMPLITUDE_RAMP: f64 = 0.1;

/// Default fade for a released voice.
pub const DEFAULT_RELEASE_FADE: f64 = 0.5;

pub struct VoiceManager {
    graph: Arc<Mutex<SignalGraph>>,
    output: Option<AudioOutput>,
}

impl VoiceManager {
    /// Open the default output device and start rendering.
    ///
    /// Platforms that gate audio behind a user gesture expect this to be
    /// called only after one; sequencing it is the caller's job.
    pub fn init(config: &ExplorerConfig) -> Result<Self> {
        let device = AudioDevice::default_output()?;
        let settings = config.graph_settings(f64::from(device.sample_rate()));
        let graph = Arc::new(Mutex::new(SignalGraph::new(&settings)));
        let output = device.start(Arc::clone(&graph))?;
        info!("Voice manager live at {} Hz", output.sample_rate());
        Ok(Self {
            graph,
            output: Some(output),
        })
    }

    /// The same graph without a device. Time only moves when [`render`](Self::render) is called.
    pub fn headless(config: &ExplorerConfig) -> Self {
        let settings = config.graph_settings(f64::from(config.sample_rate));
        Self {
            graph: Arc::new(Mutex::new(SignalGraph::new(&settings))),
            output: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.output.is_some()
    }

    /// Shared handle to the graph, for hosts that drive rendering themselves.
    pub fn graph(&self) -> Arc<Mutex<SignalGraph>> {
        Arc::clone(&self.graph)
    }

    /// Idempotent per id: an existing voice is returned unchanged, and one
    /// that is still fading out is kept alive.
    pub fn create_voice(&self, id: &str, ratio: f64) -> Option<VoiceState> {
        lock_graph(&self.graph).create_voice(id, ratio)
    }

    pub fn set_voice_amplitude(&self, id: &str, amplitude: f64, ramp_seconds: f64) {
        lock_graph(&self.graph).set_voice_amplitude(id, amplitude, ramp_seconds);
    }

    pub fn release_voice(&self, id: &str, fade_seconds: f64) {
        lock_graph(&self.graph).release_voice(id, fade_seconds);
    }

    pub fn set_fundamental(&self, freq: f64, ramp_seconds: f64) {
        lock_graph(&self.graph).set_fundamental(freq, ramp_seconds);
    }

    pub fn set_master_volume(&self, volume: f64) {
        lock_graph(&self.graph).set_master_volume(volume);
    }

    /// Fade out every voice and the drone, then close the graph.
    pub fn destroy(&self) {
        lock_graph(&self.graph).destroy();
    }

    pub fn is_closed(&self) -> bool {
        lock_graph(&self.graph).state() == GraphState::Closed
    }

    pub fn fundamental(&self) -> f64 {
        lock_graph(&self.graph).fundamental()
    }

    pub fn master_volume(&self) -> f64 {
        lock_graph(&self.graph).master_volume()
    }

    pub fn current_time(&self) -> f64 {
        lock_graph(&self.graph).now()
    }

    pub fn sample_rate(&self) -> f64 {
        lock_graph(&self.graph).sample_rate()
    }

    pub fn active_voice_count(&self) -> usize {
        lock_graph(&self.graph).active_voice_count()
    }

    pub fn voice(&self, id: &str) -> Option<VoiceState> {
        lock_graph(&self.graph).voice(id)
    }

    pub fn voice_ids(&self) -> Vec<String> {
        lock_graph(&self.graph).voice_ids()
    }

    /// Render mono frames into `out`, advancing the graph clock.
    pub fn render(&self, out: &mut [f32]) {
        lock_graph(&self.graph).process(out);
    }

    /// Advance the clock by `seconds` worth of frames, discarding the audio.
    /// Non-finite or non-positive durations are ignored.
    pub fn advance(&self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        let mut graph = lock_graph(&self.graph);
        let mut remaining = (seconds * graph.sample_rate()).round() as u64;
        let mut scratch = [0.0f32; CONTROL_BLOCK];
        while remaining > 0 {
            let frames = remaining.min(CONTROL_BLOCK as u64) as usize;
            graph.process(&mut scratch[..frames]);
            remaining -= frames as u64;
        }
    }
}

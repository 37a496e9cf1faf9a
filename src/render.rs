//! Offline rendering
//!
//! Drives a coordinator along a scripted pointer orbit while rendering the
//! signal graph headless, and writes the result as a 32-bit float mono WAV.

use crate::config::ExplorerConfig;
use crate::error::Result;
use crate::harmonic::Point;
use crate::interaction::Coordinator;
use crate::synth::VoiceManager;
use std::f64::consts::TAU;
use std::path::Path;
use tracing::{info, warn};

/// Longest orbit or tail a single render accepts.
pub const MAX_GESTURE_SECONDS: f64 = 600.0;

/// Finite, clamped into [0, MAX_GESTURE_SECONDS]; anything else is zero.
fn gesture_seconds(name: &str, value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, MAX_GESTURE_SECONDS)
    } else {
        warn!("Gesture {} = {} is not finite, using 0", name, value);
        0.0
    }
}

/// Scripted gesture for an offline render
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Length of the orbit in seconds
    pub duration: f64,
    /// Silence-bound tail after the pointer leaves
    pub tail: f64,
    /// Frames rendered between control updates
    pub block_size: usize,
    /// Full turns around the field centre
    pub revolutions: f64,
    /// Orbit radius as a fraction of the shorter surface side
    pub orbit_scale: f64,
    /// Depth swept linearly over the orbit
    pub start_depth: f64,
    pub end_depth: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            duration: 8.0,
            tail: 1.0,
            block_size: 512,
            revolutions: 1.0,
            orbit_scale: 0.175,
            start_depth: 0.0,
            end_depth: 0.5,
        }
    }
}

impl GestureConfig {
    /// Pointer position at `progress` in [0, 1] along the orbit.
    pub fn orbit_point(&self, width: f64, height: f64, progress: f64) -> Point {
        let radius = self.orbit_scale * width.min(height);
        let angle = progress * self.revolutions * TAU;
        Point::new(
            width / 2.0 + angle.cos() * radius,
            height / 2.0 + angle.sin() * radius,
        )
    }

    pub fn depth_at(&self, progress: f64) -> f64 {
        self.start_depth + (self.end_depth - self.start_depth) * progress.clamp(0.0, 1.0)
    }
}

/// Render the gesture to memory.
pub fn render_gesture(config: &ExplorerConfig, gesture: &GestureConfig) -> (Vec<f32>, RenderStats) {
    let voices = VoiceManager::headless(config);
    let sample_rate = voices.sample_rate();
    let mut coordinator = Coordinator::new(config.clone(), voices);

    let block_size = gesture.block_size.max(1);
    let orbit_frames = (gesture_seconds("duration", gesture.duration) * sample_rate).round() as usize;
    let tail_frames = (gesture_seconds("tail", gesture.tail) * sample_rate).round() as usize;
    let total_frames = orbit_frames.checked_add(tail_frames).unwrap_or(orbit_frames);
    let tail_frames = total_frames - orbit_frames;
    let block_seconds = block_size as f64 / sample_rate;

    let mut samples = vec![0.0f32; total_frames];
    let mut peak_voices = 0;
    let (width, height) = coordinator.field().dimensions();

    for (index, block) in samples[..orbit_frames].chunks_mut(block_size).enumerate() {
        let progress = (index * block_size) as f64 / orbit_frames.max(1) as f64;
        let pointer = gesture.orbit_point(width, height, progress);

        coordinator.set_depth(gesture.depth_at(progress));
        coordinator.pointer_moved(pointer.x, pointer.y);
        coordinator.tick(block_seconds);
        coordinator.voices().render(block);

        peak_voices = peak_voices.max(coordinator.voices().active_voice_count());
    }

    coordinator.pointer_left();
    for block in samples[orbit_frames..orbit_frames + tail_frames].chunks_mut(block_size) {
        coordinator.tick(block_seconds);
        coordinator.voices().render(block);
    }

    let mut stats = RenderStats::from_samples(&samples, sample_rate);
    stats.peak_voices = peak_voices;
    (samples, stats)
}

/// Render the gesture and write it to `path`.
pub fn render_gesture_to_file(
    config: &ExplorerConfig,
    gesture: &GestureConfig,
    path: &Path,
) -> Result<RenderStats> {
    let (samples, stats) = render_gesture(config, gesture);
    write_wav(path, config.sample_rate, &samples)?;
    info!("Rendered {:.2}s to {}", stats.duration, path.display());
    Ok(stats)
}

/// Write mono samples as 32-bit float WAV.
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Statistics about rendered audio
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    pub duration: f64,
    pub sample_count: usize,
    pub rms: f32,
    pub peak: f32,
    pub dc_offset: f32,
    pub zero_crossings: usize,
    /// Most voices sounding at once
    pub peak_voices: usize,
}

impl RenderStats {
    pub fn from_samples(samples: &[f32], sample_rate: f64) -> Self {
        let sample_count = samples.len();
        if sample_count == 0 {
            return Self::default();
        }

        let sum_squares: f32 = samples.iter().map(|x| x * x).sum();
        let rms = (sum_squares / sample_count as f32).sqrt();
        let peak = samples.iter().map(|x| x.abs()).fold(0.0f32, f32::max);
        let dc_offset = samples.iter().sum::<f32>() / sample_count as f32;
        let zero_crossings = samples
            .windows(2)
            .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
            .count();

        Self {
            duration: sample_count as f64 / sample_rate,
            sample_count,
            rms,
            peak,
            dc_offset,
            zero_crossings,
            peak_voices: 0,
        }
    }

    pub fn print_summary(&self) {
        println!("Render Statistics:");
        println!("  Duration:       {:.3} seconds", self.duration);
        println!("  Samples:        {}", self.sample_count);
        println!("  RMS:            {:.4}", self.rms);
        println!("  Peak:           {:.4}", self.peak);
        println!("  DC Offset:      {:.6}", self.dc_offset);
        println!("  Zero Crossings: {}", self.zero_crossings);
        println!("  Peak Voices:    {}", self.peak_voices);
    }
}

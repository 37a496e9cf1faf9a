//! Offline gesture rendering to WAV

use primefield::render::{render_gesture, render_gesture_to_file, write_wav, GestureConfig};
use primefield::ExplorerConfig;
use tempfile::tempdir;

fn config() -> ExplorerConfig {
    ExplorerConfig {
        sample_rate: 8000,
        ..ExplorerConfig::default()
    }
}

fn short_gesture() -> GestureConfig {
    GestureConfig {
        duration: 1.0,
        tail: 0.5,
        ..GestureConfig::default()
    }
}

#[test]
fn test_gesture_produces_bounded_audio() {
    let (samples, stats) = render_gesture(&config(), &short_gesture());

    assert_eq!(samples.len(), 12000);
    assert_eq!(stats.sample_count, 12000);
    assert!((stats.duration - 1.5).abs() < 1e-9);
    assert!(stats.rms > 0.001, "orbit should be audible, rms {}", stats.rms);
    assert!(stats.peak <= 0.99);
    assert!(stats.peak_voices > 0);
    assert!(samples.iter().all(|s| s.is_finite()));
}

#[test]
fn test_gesture_is_deterministic() {
    let (a, _) = render_gesture(&config(), &short_gesture());
    let (b, _) = render_gesture(&config(), &short_gesture());
    assert_eq!(a, b);
}

#[test]
fn test_render_to_file_writes_float_wav() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("orbit.wav");

    let stats = render_gesture_to_file(&config(), &short_gesture(), &path).unwrap();

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 8000);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);

    let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), stats.sample_count);
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    assert!((peak - stats.peak).abs() < 1e-6);
}

#[test]
fn test_write_wav_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("out.wav");
    assert!(write_wav(&path, 8000, &[0.0, 0.5]).is_err());
}

#[test]
fn test_empty_gesture() {
    let gesture = GestureConfig {
        duration: 0.0,
        tail: 0.0,
        ..GestureConfig::default()
    };
    let (samples, stats) = render_gesture(&config(), &gesture);
    assert!(samples.is_empty());
    assert_eq!(stats.sample_count, 0);
}

#[test]
fn test_non_finite_gesture_lengths_render_nothing() {
    let gesture = GestureConfig {
        duration: f64::INFINITY,
        tail: f64::NAN,
        ..GestureConfig::default()
    };
    let (samples, stats) = render_gesture(&config(), &gesture);
    assert!(samples.is_empty());
    assert_eq!(stats.sample_count, 0);
}

#[test]
fn test_infinite_tail_keeps_the_orbit() {
    let gesture = GestureConfig {
        duration: 0.5,
        tail: f64::INFINITY,
        ..GestureConfig::default()
    };
    let (samples, _) = render_gesture(&config(), &gesture);
    assert_eq!(samples.len(), 4000);
}

//! Voice manager lifecycle on a headless graph
//!
//! Time only advances when frames are rendered, so every test drives the
//! clock explicitly with `advance`/`render`.

use primefield::synth::graph::{DECOMMISSION_MARGIN, TEARDOWN_FADE};
use primefield::synth::param::RAMP_FLOOR;
use primefield::{ExplorerConfig, VoiceManager};

fn manager() -> VoiceManager {
    let config = ExplorerConfig {
        sample_rate: 8000,
        ..ExplorerConfig::default()
    };
    VoiceManager::headless(&config)
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn test_new_voice_is_silent_and_tuned() {
    let vm = manager();
    let state = vm.create_voice("h7x1", 1.75).expect("voice created");
    assert_eq!(state.frequency, 192.5);
    assert_eq!(state.gain, 0.0);
    assert!(!state.releasing);
    assert_eq!(vm.active_voice_count(), 1);

    let eleven = vm.create_voice("h11x1", 1.375).unwrap();
    assert_eq!(eleven.frequency, 151.25);
}

#[test]
fn test_create_is_idempotent() {
    let vm = manager();
    let first = vm.create_voice("h3x1", 1.5).unwrap();
    let second = vm.create_voice("h3x1", 1.5).unwrap();
    assert_eq!(first.generation, second.generation);
    assert_eq!(vm.active_voice_count(), 1);
}

#[test]
fn test_amplitude_ramp_reaches_target() {
    let vm = manager();
    vm.create_voice("h3x1", 1.5);
    vm.set_voice_amplitude("h3x1", 0.5, 0.1);

    let start = vm.voice("h3x1").unwrap();
    assert_eq!(start.gain, RAMP_FLOOR);
    assert_eq!(start.target_gain, 0.5);

    vm.advance(0.05);
    let mid = vm.voice("h3x1").unwrap().gain;
    assert!(mid > RAMP_FLOOR && mid < 0.5);

    vm.advance(0.1);
    assert!((vm.voice("h3x1").unwrap().gain - 0.5).abs() < 1e-9);
}

#[test]
fn test_latest_amplitude_call_wins() {
    let vm = manager();
    vm.create_voice("h5x1", 1.25);
    vm.set_voice_amplitude("h5x1", 0.6, 1.0);
    vm.advance(0.02);
    vm.set_voice_amplitude("h5x1", 0.1, 0.05);
    vm.advance(0.2);
    assert!((vm.voice("h5x1").unwrap().gain - 0.1).abs() < 1e-9);
}

#[test]
fn test_zero_amplitude_is_floored() {
    let vm = manager();
    vm.create_voice("h5x1", 1.25);
    vm.set_voice_amplitude("h5x1", 0.0, 0.01);
    vm.advance(0.1);
    assert_eq!(vm.voice("h5x1").unwrap().gain, RAMP_FLOOR);
}

#[test]
fn test_release_decommissions_after_fade() {
    let vm = manager();
    vm.create_voice("h3x1", 1.5);
    vm.set_voice_amplitude("h3x1", 0.4, 0.01);
    vm.advance(0.05);

    vm.release_voice("h3x1", 0.2);
    assert!(vm.voice("h3x1").unwrap().releasing);

    vm.advance(0.2);
    assert_eq!(vm.active_voice_count(), 1, "still fading");

    vm.advance(DECOMMISSION_MARGIN + 0.05);
    assert_eq!(vm.active_voice_count(), 0);
    assert!(vm.voice("h3x1").is_none());
}

#[test]
fn test_recreate_survives_stale_decommission() {
    let vm = manager();
    let original = vm.create_voice("h3x1", 1.5).unwrap();
    vm.set_voice_amplitude("h3x1", 0.4, 0.01);
    vm.release_voice("h3x1", 0.1);

    let revived = vm.create_voice("h3x1", 1.5).unwrap();
    assert_eq!(revived.generation, original.generation);
    assert!(!revived.releasing);
    vm.set_voice_amplitude("h3x1", 0.4, 0.05);

    vm.advance(1.0);
    let state = vm.voice("h3x1").expect("voice outlives its stale decommission");
    assert!((state.gain - 0.4).abs() < 1e-9);
}

#[test]
fn test_raising_a_releasing_voice_keeps_it_sounding() {
    let vm = manager();
    vm.create_voice("h3x1", 1.5);
    vm.set_voice_amplitude("h3x1", 0.5, 0.01);
    vm.advance(0.05);

    vm.release_voice("h3x1", 0.2);
    vm.set_voice_amplitude("h3x1", 0.5, 0.01);

    vm.advance(0.25);
    let state = vm.voice("h3x1").unwrap();
    assert!(!state.releasing);
    assert!((state.gain - 0.5).abs() < 1e-9);

    // Past the deadline of the cancelled release
    vm.advance(0.2);
    let state = vm.voice("h3x1").expect("loud voice is never decommissioned");
    assert!((state.gain - 0.5).abs() < 1e-9);
}

#[test]
fn test_release_recreate_release_removes() {
    let vm = manager();
    vm.create_voice("h3x1", 1.5);
    vm.release_voice("h3x1", 0.1);
    vm.create_voice("h3x1", 1.5);
    vm.release_voice("h3x1", 0.3);

    vm.advance(0.1 + DECOMMISSION_MARGIN + 0.02);
    assert_eq!(vm.active_voice_count(), 1, "first release was superseded");

    vm.advance(0.3);
    assert_eq!(vm.active_voice_count(), 0);
}

#[test]
fn test_new_generation_after_decommission() {
    let vm = manager();
    let first = vm.create_voice("h3x1", 1.5).unwrap();
    vm.release_voice("h3x1", 0.0);
    vm.advance(DECOMMISSION_MARGIN + 0.05);
    let second = vm.create_voice("h3x1", 1.5).unwrap();
    assert!(second.generation > first.generation);
}

#[test]
fn test_unknown_ids_are_ignored() {
    let vm = manager();
    vm.set_voice_amplitude("ghost", 0.5, 0.1);
    vm.release_voice("ghost", 0.1);
    vm.advance(0.1);
    assert_eq!(vm.active_voice_count(), 0);
}

#[test]
fn test_fundamental_retunes_without_touching_gain() {
    let vm = manager();
    vm.create_voice("h7x1", 1.75);
    vm.set_voice_amplitude("h7x1", 0.3, 0.5);
    vm.set_fundamental(220.0, 0.2);
    assert_eq!(vm.fundamental(), 220.0);

    let state = vm.voice("h7x1").unwrap();
    assert_eq!(state.target_frequency, 385.0);
    assert_eq!(state.target_gain, 0.3);

    vm.advance(0.25);
    let state = vm.voice("h7x1").unwrap();
    assert!((state.frequency - 385.0).abs() < 1e-9);
    assert!(state.gain < 0.3, "gain ramp still in flight");

    vm.set_fundamental(f64::NAN, 0.1);
    vm.set_fundamental(-5.0, 0.1);
    assert_eq!(vm.fundamental(), 220.0);
}

#[test]
fn test_new_voices_follow_the_new_fundamental() {
    let vm = manager();
    vm.set_fundamental(200.0, 0.0);
    let state = vm.create_voice("h3x1", 1.5).unwrap();
    assert_eq!(state.frequency, 300.0);
}

#[test]
fn test_master_volume_is_immediate() {
    let vm = manager();
    vm.set_master_volume(0.0);
    assert_eq!(vm.master_volume(), 0.0);

    let mut out = vec![1.0f32; 4000];
    vm.render(&mut out);
    assert!(out.iter().all(|&s| s == 0.0));

    vm.set_master_volume(0.5);
    assert_eq!(vm.master_volume(), 0.5);
}

#[test]
fn test_drone_sounds_on_its_own() {
    let vm = manager();
    let mut out = vec![0.0f32; 8000];
    vm.render(&mut out);
    assert!(rms(&out) > 0.0);
    assert!(rms(&out) < 0.05);
}

#[test]
fn test_output_stays_under_ceiling() {
    let vm = manager();
    for (i, ratio) in [1.0, 1.25, 1.5, 1.75, 1.375, 1.625].iter().enumerate() {
        let id = format!("v{}", i);
        vm.create_voice(&id, *ratio);
        vm.set_voice_amplitude(&id, 1.0, 0.01);
    }
    let mut out = vec![0.0f32; 16000];
    vm.render(&mut out);
    let peak = out.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    assert!(peak <= 0.99, "peak {}", peak);
    assert!(peak > 0.5);
}

#[test]
fn test_destroy_fades_and_closes() {
    let vm = manager();
    vm.create_voice("h3x1", 1.5);
    vm.set_voice_amplitude("h3x1", 0.5, 0.01);
    vm.advance(0.1);

    vm.destroy();
    vm.destroy();
    assert!(!vm.is_closed());
    assert!(vm.create_voice("h5x1", 1.25).is_none());

    vm.advance(TEARDOWN_FADE + DECOMMISSION_MARGIN + 0.02);
    assert!(vm.is_closed());
    assert_eq!(vm.active_voice_count(), 0);

    let mut out = vec![1.0f32; 512];
    vm.render(&mut out);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn test_destroy_without_voices() {
    let vm = manager();
    vm.destroy();
    vm.advance(0.5);
    assert!(vm.is_closed());
}

#[test]
fn test_advance_ignores_unusable_durations() {
    let vm = manager();
    vm.advance(f64::INFINITY);
    vm.advance(f64::NAN);
    vm.advance(-1.0);
    vm.advance(0.0);
    assert_eq!(vm.current_time(), 0.0);

    vm.advance(0.25);
    assert_eq!(vm.current_time(), 0.25);
}

#[test]
fn test_clock_follows_rendered_frames() {
    let vm = manager();
    assert_eq!(vm.current_time(), 0.0);
    let mut out = vec![0.0f32; 4000];
    vm.render(&mut out);
    assert_eq!(vm.current_time(), 0.5);
    assert_eq!(vm.sample_rate(), 8000.0);
    assert!(!vm.is_live());
}

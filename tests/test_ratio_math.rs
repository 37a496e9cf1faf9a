//! Prime ratio math: folding, ladders, colours and interval metadata

use primefield::ratios::{
    cents, enumerate_harmonics, fold_ratio, interval_name, is_exotic, octave_reduce, prime_color,
    tempered_deviation, Hsl, DEFAULT_COLOR, SUPPORTED_PRIMES,
};

#[test]
fn test_fold_ratio_range_and_octave_invariance() {
    for n in 1u64..=10_000 {
        let r = fold_ratio(n);
        assert!((1.0..4.0).contains(&r), "fold_ratio({}) = {} out of [1, 4)", n, r);
        if n >= 4 && n % 2 == 0 {
            assert_eq!(r, fold_ratio(n / 2), "fold_ratio({}) != fold_ratio({})", n, n / 2);
        }
    }
}

#[test]
fn test_fold_ratio_large_inputs() {
    assert_eq!(fold_ratio(u64::MAX), fold_ratio(u64::MAX));
    assert!(fold_ratio(u64::MAX) < 4.0);
    assert_eq!(fold_ratio(1 << 40), 2.0);
}

#[test]
fn test_every_supported_prime_sounds_within_one_octave() {
    for &p in &SUPPORTED_PRIMES {
        let r = octave_reduce(u64::from(p));
        assert!((1.0..2.0).contains(&r), "prime {} reduces to {}", p, r);
        assert_eq!(r * 2f64.powi(fold_ratio(u64::from(p)).log2().floor() as i32), fold_ratio(u64::from(p)));
    }
    assert_eq!(110.0 * octave_reduce(7), 192.5);
    assert_eq!(110.0 * octave_reduce(11), 151.25);
}

#[test]
fn test_ladder_is_finite_and_increasing() {
    for &prime in &SUPPORTED_PRIMES {
        let ladder: Vec<_> = enumerate_harmonics(prime, 110.0, 5000.0).collect();
        for pair in ladder.windows(2) {
            assert!(pair[1].frequency > pair[0].frequency);
            assert_eq!(pair[1].multiplier, pair[0].multiplier * 2);
        }
        if let Some(last) = ladder.last() {
            assert!(last.frequency <= 5000.0);
            assert!(last.frequency * 2.0 > 5000.0);
        } else {
            assert!(110.0 * f64::from(prime) > 5000.0);
        }
    }
}

#[test]
fn test_ladder_fields() {
    let ladder: Vec<_> = enumerate_harmonics(3, 100.0, 1300.0).collect();
    assert_eq!(ladder.len(), 3);
    assert_eq!(ladder[0].raw_ratio, 3);
    assert_eq!(ladder[1].raw_ratio, 6);
    assert_eq!(ladder[2].frequency, 1200.0);
    assert!(ladder.iter().all(|h| h.folded_ratio == 3.0));
}

#[test]
fn test_ladder_restarts() {
    let first: Vec<_> = enumerate_harmonics(5, 110.0, 3000.0).collect();
    let second: Vec<_> = enumerate_harmonics(5, 110.0, 3000.0).collect();
    assert_eq!(first, second);
}

#[test]
fn test_ladder_degenerate_inputs() {
    assert_eq!(enumerate_harmonics(3, 110.0, 100.0).count(), 0);
    assert_eq!(enumerate_harmonics(3, 0.0, 1000.0).count(), 0);
    assert_eq!(enumerate_harmonics(3, f64::NAN, 1000.0).count(), 0);
    assert_eq!(enumerate_harmonics(0, 110.0, 1000.0).count(), 0);
    // Overflow of the multiplier ends the ladder instead of wrapping
    assert!(enumerate_harmonics(3, 1e-300, f64::INFINITY).count() <= 64);
}

#[test]
fn test_colour_table() {
    assert_eq!(prime_color(2), Hsl::new(45.0, 90.0, 65.0));
    assert_eq!(prime_color(7), Hsl::new(160.0, 70.0, 55.0));
    assert_eq!(prime_color(47), Hsl::new(350.0, 55.0, 70.0));
    assert_eq!(prime_color(53), DEFAULT_COLOR);
    assert_eq!(prime_color(4), DEFAULT_COLOR);
}

#[test]
fn test_cents_and_deviation() {
    assert!(cents(1.0).abs() < 1e-9);
    assert!((cents(2.0) - 1200.0).abs() < 1e-9);
    for &p in &SUPPORTED_PRIMES {
        let d = tempered_deviation(octave_reduce(u64::from(p)));
        assert!((-50.0..=50.0).contains(&d));
    }
}

#[test]
fn test_exotic_and_names() {
    assert!(!is_exotic(5));
    assert!(is_exotic(7));
    assert_eq!(interval_name(3), Some("perfect fifth"));
    assert_eq!(interval_name(71), None);
}

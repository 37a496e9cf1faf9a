//! Convolution reverb
//!
//! A fixed synthetic impulse response (random-sign noise under an exponential
//! envelope) convolved with the send bus using uniformly partitioned
//! overlap-save FFT convolution. The input is buffered into blocks of
//! `BLOCK_SIZE`, so the wet signal lags the dry one by one block.

use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Samples per convolution block.
pub const BLOCK_SIZE: usize = 512;

/// Length of the synthetic impulse response.
pub const IMPULSE_SECONDS: f64 = 3.0;

/// Build the impulse response: `e^(-3t/L)` times a random sign per sample,
/// normalised to unit energy.
pub fn impulse_response(sample_rate: f64, seconds: f64, seed: u64) -> Vec<f32> {
    let length = ((sample_rate * seconds) as usize).max(1);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut ir: Vec<f32> = (0..length)
        .map(|i| {
            let decay = (-3.0 * i as f64 / length as f64).exp();
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            (sign * decay) as f32
        })
        .collect();

    let energy: f32 = ir.iter().map(|s| s * s).sum();
    if energy > 0.0 {
        let scale = energy.sqrt().recip();
        for s in ir.iter_mut() {
            *s *= scale;
        }
    }
    ir
}

pub struct ConvolutionReverb {
    r2c: Arc<dyn RealToComplex<f32>>,
    c2r: Arc<dyn ComplexToReal<f32>>,

    // Spectra of the IR partitions, zero-padded to 2 * BLOCK_SIZE
    ir_partitions: Vec<Vec<Complex<f32>>>,

    // Ring of past input-window spectra, newest at `fdl_head`
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_head: usize,

    window: Vec<f32>, // previous block followed by current block
    input_block: Vec<f32>,
    output_block: Vec<f32>,
    position: usize,

    fft_input: Vec<f32>,
    fft_output: Vec<f32>,
    accumulator: Vec<Complex<f32>>,
    forward_scratch: Vec<Complex<f32>>,
    inverse_scratch: Vec<Complex<f32>>,
}

impl ConvolutionReverb {
    pub fn new(impulse_response: &[f32]) -> Self {
        let fft_size = 2 * BLOCK_SIZE;
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        let mut forward_scratch = r2c.make_scratch_vec();
        let ir_partitions: Vec<Vec<Complex<f32>>> = impulse_response
            .chunks(BLOCK_SIZE)
            .map(|chunk| {
                let mut padded = r2c.make_input_vec();
                padded[..chunk.len()].copy_from_slice(chunk);
                let mut spectrum = r2c.make_output_vec();
                if r2c
                    .process_with_scratch(&mut padded, &mut spectrum, &mut forward_scratch)
                    .is_err()
                {
                    spectrum.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
                }
                spectrum
            })
            .collect();

        let partitions = ir_partitions.len().max(1);
        let fdl = vec![r2c.make_output_vec(); partitions];

        Self {
            accumulator: r2c.make_output_vec(),
            fft_input: r2c.make_input_vec(),
            fft_output: c2r.make_output_vec(),
            inverse_scratch: c2r.make_scratch_vec(),
            forward_scratch,
            r2c,
            c2r,
            ir_partitions,
            fdl,
            fdl_head: 0,
            window: vec![0.0; fft_size],
            input_block: vec![0.0; BLOCK_SIZE],
            output_block: vec![0.0; BLOCK_SIZE],
            position: 0,
        }
    }

    pub fn partitions(&self) -> usize {
        self.ir_partitions.len()
    }

    /// Feed one sample, get one wet sample back (delayed by one block).
    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.output_block[self.position];
        self.input_block[self.position] = input;
        self.position += 1;
        if self.position == BLOCK_SIZE {
            self.position = 0;
            self.process_block();
        }
        out
    }

    fn process_block(&mut self) {
        // Slide the two-block window and append the new block
        self.window.copy_within(BLOCK_SIZE.., 0);
        self.window[BLOCK_SIZE..].copy_from_slice(&self.input_block);

        self.fdl_head = (self.fdl_head + self.fdl.len() - 1) % self.fdl.len();
        self.fft_input.copy_from_slice(&self.window);
        let forward = self.r2c.process_with_scratch(
            &mut self.fft_input,
            &mut self.fdl[self.fdl_head],
            &mut self.forward_scratch,
        );
        if forward.is_err() {
            self.output_block.fill(0.0);
            return;
        }

        self.accumulator.fill(Complex::new(0.0, 0.0));
        let len = self.fdl.len();
        for (k, partition) in self.ir_partitions.iter().enumerate() {
            let spectrum = &self.fdl[(self.fdl_head + k) % len];
            for ((acc, x), h) in self.accumulator.iter_mut().zip(spectrum).zip(partition) {
                *acc += x * h;
            }
        }

        // Real input spectra must have purely real DC and Nyquist bins
        if let Some(first) = self.accumulator.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = self.accumulator.last_mut() {
            last.im = 0.0;
        }

        let inverse = self.c2r.process_with_scratch(
            &mut self.accumulator,
            &mut self.fft_output,
            &mut self.inverse_scratch,
        );
        if inverse.is_err() {
            self.output_block.fill(0.0);
            return;
        }

        let scale = 1.0 / (2 * BLOCK_SIZE) as f32;
        for (out, y) in self
            .output_block
            .iter_mut()
            .zip(&self.fft_output[BLOCK_SIZE..])
        {
            *out = y * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_response_shape() {
        let ir = impulse_response(8000.0, 3.0, 7);
        assert_eq!(ir.len(), 24000);
        let energy: f32 = ir.iter().map(|s| s * s).sum();
        assert!((energy - 1.0).abs() < 1e-3);

        // Random sign, exponential envelope
        assert!(ir.iter().any(|s| *s > 0.0) && ir.iter().any(|s| *s < 0.0));
        let head = ir[0].abs();
        let tail = ir[ir.len() - 1].abs();
        assert!((tail / head - (-3.0f32).exp()).abs() < 1e-3);
    }

    #[test]
    fn test_impulse_response_is_deterministic() {
        assert_eq!(impulse_response(1000.0, 1.0, 3), impulse_response(1000.0, 1.0, 3));
        assert_ne!(impulse_response(1000.0, 1.0, 3), impulse_response(1000.0, 1.0, 4));
    }

    #[test]
    fn test_convolution_matches_direct() {
        let ir: Vec<f32> = (0..1300).map(|i| ((i * 37 % 11) as f32 - 5.0) / 50.0).collect();
        let input: Vec<f32> = (0..3000).map(|i| ((i * 13 % 7) as f32 - 3.0) / 4.0).collect();

        let mut reverb = ConvolutionReverb::new(&ir);
        assert_eq!(reverb.partitions(), 3);
        let wet: Vec<f32> = input.iter().map(|&x| reverb.process(x)).collect();

        for n in BLOCK_SIZE..input.len() {
            let target = n - BLOCK_SIZE;
            let direct: f32 = (0..=target.min(ir.len() - 1))
                .map(|k| ir[k] * input[target - k])
                .sum();
            assert!(
                (wet[n] - direct).abs() < 1e-3,
                "sample {}: {} vs {}",
                n,
                wet[n],
                direct
            );
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let ir = impulse_response(4000.0, 0.5, 1);
        let mut reverb = ConvolutionReverb::new(&ir);
        for _ in 0..4 * BLOCK_SIZE {
            assert_eq!(reverb.process(0.0), 0.0);
        }
    }
}

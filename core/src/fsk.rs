//! Continuous-phase BFSK modulator and windowed-FFT demodulator.
//!
//! One tone per bit (17 kHz for 0, 18.5 kHz for 1) at 80 ms per bit. The
//! modulator carries its oscillator phase across bit boundaries, so the
//! waveform has no discontinuities at tone switches; the demodulator splits
//! the signal into bit-length windows and compares spectral magnitude at the
//! two tone frequencies.

use std::f64::consts::PI;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

use crate::error::{ModemError, Result};
use crate::{AMPLITUDE, FREQ_ONE, FREQ_ZERO, SAMPLES_PER_BIT, SAMPLE_RATE};

/// CPFSK synthesizer.
///
/// The running phase persists across bits within one packet but must start
/// from zero for each packet, so one modulator instance covers exactly one
/// packet.
pub struct FskModulator {
    phase: f64,
}

impl FskModulator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Synthesize a bit sequence into 16-bit PCM samples,
    /// `SAMPLES_PER_BIT` samples per bit.
    pub fn modulate(&mut self, bits: &[bool]) -> Vec<i16> {
        let mut samples = Vec::with_capacity(bits.len() * SAMPLES_PER_BIT);
        let scale = AMPLITUDE * 32767.0;
        for &bit in bits {
            let freq = if bit { FREQ_ONE } else { FREQ_ZERO };
            let omega = 2.0 * PI * freq / SAMPLE_RATE as f64;
            for _ in 0..SAMPLES_PER_BIT {
                self.phase += omega;
                // Keep the accumulator bounded; sin() is periodic so this
                // does not disturb continuity
                if self.phase > 2.0 * PI {
                    self.phase -= 2.0 * PI;
                }
                samples.push((scale * self.phase.sin()).round() as i16);
            }
        }
        samples
    }
}

impl Default for FskModulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-coherent BFSK detector.
///
/// No phase or bit-timing recovery is attempted: the transmitter's fixed
/// timing plus the frame scanner absorb misalignment of up to roughly half
/// a bit. The FFT plan is built once per instance and reused for every
/// window of a decode call.
pub struct FskDemodulator {
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    bin_zero: usize,
    bin_one: usize,
}

impl FskDemodulator {
    pub fn new() -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(SAMPLES_PER_BIT),
            window: hanning(SAMPLES_PER_BIT),
            bin_zero: nearest_bin(FREQ_ZERO),
            bin_one: nearest_bin(FREQ_ONE),
        }
    }

    /// Recover bits from normalized samples.
    ///
    /// The signal is split into non-overlapping `SAMPLES_PER_BIT` windows
    /// starting at sample 0; a trailing partial window is discarded. Each
    /// window is Hanning-weighted to limit leakage from neighboring bits,
    /// then the magnitudes at the two tone bins decide the bit. Equal
    /// magnitudes (e.g. pure silence) resolve to 0.
    pub fn demodulate(&self, samples: &[f32]) -> Result<Vec<bool>> {
        let mut input = self.fft.make_input_vec();
        let mut spectrum = self.fft.make_output_vec();

        let num_bits = samples.len() / SAMPLES_PER_BIT;
        let mut bits = Vec::with_capacity(num_bits);
        for i in 0..num_bits {
            let start = i * SAMPLES_PER_BIT;
            for (j, slot) in input.iter_mut().enumerate() {
                *slot = samples[start + j] * self.window[j];
            }
            self.fft
                .process(&mut input, &mut spectrum)
                .map_err(|e| ModemError::Fft(format!("forward FFT failed: {:?}", e)))?;

            let energy_zero = spectrum[self.bin_zero].norm();
            let energy_one = spectrum[self.bin_one].norm();
            bits.push(energy_one > energy_zero);
        }
        Ok(bits)
    }
}

impl Default for FskDemodulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert 16-bit PCM to normalized f32 in [-1, 1].
pub fn normalize(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// FFT bin closest to `freq` for a `SAMPLES_PER_BIT`-point transform.
fn nearest_bin(freq: f64) -> usize {
    (freq * SAMPLES_PER_BIT as f64 / SAMPLE_RATE as f64).round() as usize
}

/// Hanning window coefficients.
fn hanning(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| {
            let x = 2.0 * PI * n as f64 / (len - 1) as f64;
            (0.5 - 0.5 * x.cos()) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(bits: &[bool]) -> Vec<bool> {
        let mut modulator = FskModulator::new();
        let samples = modulator.modulate(bits);
        let demodulator = FskDemodulator::new();
        demodulator.demodulate(&normalize(&samples)).unwrap()
    }

    #[test]
    fn test_modulate_sample_count() {
        let mut modulator = FskModulator::new();
        let samples = modulator.modulate(&[true, false, true]);
        assert_eq!(samples.len(), 3 * SAMPLES_PER_BIT);
    }

    #[test]
    fn test_tone_bins_are_distinct() {
        assert_eq!(nearest_bin(FREQ_ZERO), 1360);
        assert_eq!(nearest_bin(FREQ_ONE), 1480);
    }

    #[test]
    fn test_phase_continuity_bounded_slew() {
        let mut modulator = FskModulator::new();
        // Alternating bits maximize the number of tone switches
        let bits: Vec<bool> = (0..16).map(|i| i % 2 == 0).collect();
        let samples = modulator.modulate(&bits);

        // A phase-continuous waveform can never move faster than the
        // steepest slope of the higher tone
        let max_slew = 2.0 * PI * FREQ_ONE / SAMPLE_RATE as f64 * AMPLITUDE * 32767.0;
        for pair in samples.windows(2) {
            let delta = (pair[1] as f64 - pair[0] as f64).abs();
            assert!(
                delta <= max_slew,
                "slew {} exceeds bound {}",
                delta,
                max_slew
            );
        }
    }

    #[test]
    fn test_round_trip_aligned_bits() {
        let patterns: Vec<Vec<bool>> = vec![
            vec![false; 8],
            vec![true; 8],
            (0..32).map(|i| i % 2 == 0).collect(),
            vec![true, true, false, false, true, false, true, false],
        ];
        for bits in patterns {
            assert_eq!(round_trip(&bits), bits, "failed for {:?}", bits);
        }
    }

    #[test]
    fn test_silence_demodulates_to_zero_bits() {
        let demodulator = FskDemodulator::new();
        let samples = vec![0.0; SAMPLES_PER_BIT * 4];
        assert_eq!(
            demodulator.demodulate(&samples).unwrap(),
            vec![false; 4]
        );
    }

    #[test]
    fn test_trailing_partial_window_discarded() {
        let demodulator = FskDemodulator::new();
        let samples = vec![0.0; SAMPLES_PER_BIT * 2 + 100];
        assert_eq!(demodulator.demodulate(&samples).unwrap().len(), 2);
    }

    #[test]
    fn test_round_trip_survives_noise() {
        let mut modulator = FskModulator::new();
        let bits = vec![true, false, false, true, true, false, true, false];
        let samples = modulator.modulate(&bits);
        let mut noisy = normalize(&samples);
        // Deterministic pseudo-noise at 5% of full scale
        for (i, sample) in noisy.iter_mut().enumerate() {
            *sample += 0.05 * ((i as f32) * 0.7).sin();
        }
        let demodulator = FskDemodulator::new();
        assert_eq!(demodulator.demodulate(&noisy).unwrap(), bits);
    }
}

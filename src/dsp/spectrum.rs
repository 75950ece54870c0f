use rustfft::{num_complex::Complex, Fft, FftPlanner, Length};
use std::sync::Arc;

const ENERGY_EPS: f64 = 1e-12;

/// Frequency-domain rate estimate: strongest bin of the real-input spectrum
/// inside `[low_hz, high_hz]`
pub struct SpectralEstimator {
    fft: Option<Arc<dyn Fft<f64>>>,
    sample_rate: f64,
    low_hz: f64,
    high_hz: f64,
    buffer: Vec<Complex<f64>>,
}

impl SpectralEstimator {
    pub fn new(sample_rate: f64, low_hz: f64, high_hz: f64) -> Self {
        Self {
            fft: None,
            sample_rate,
            low_hz,
            high_hz,
            buffer: Vec::new(),
        }
    }

    /// Magnitudes of bins `0..=n/2`
    pub fn magnitude_spectrum(&mut self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }

        // Replan only when the window length changes
        if self.fft.as_ref().map_or(true, |fft| fft.len() != n) {
            self.fft = Some(FftPlanner::new().plan_fft_forward(n));
        }
        let Some(fft) = self.fft.clone() else {
            return Vec::new();
        };
        self.buffer.clear();
        self.buffer.extend(signal.iter().map(|&s| Complex::new(s, 0.0)));
        fft.process(&mut self.buffer);

        self.buffer.iter().take(n / 2 + 1).map(|c| c.norm()).collect()
    }

    /// Frequency in Hz of the in-band bin with the largest magnitude, or
    /// `None` when the band holds no bins or no energy
    pub fn dominant_frequency(&mut self, signal: &[f64]) -> Option<f64> {
        let n = signal.len();
        let spectrum = self.magnitude_spectrum(signal);
        let bin_hz = self.sample_rate / n as f64;

        let mut best: Option<(usize, f64)> = None;
        for (k, &magnitude) in spectrum.iter().enumerate() {
            let freq = k as f64 * bin_hz;
            if freq < self.low_hz || freq > self.high_hz {
                continue;
            }
            if best.map_or(true, |(_, m)| magnitude > m) {
                best = Some((k, magnitude));
            }
        }

        match best {
            Some((k, magnitude)) if magnitude > ENERGY_EPS => Some(k as f64 * bin_hz),
            _ => None,
        }
    }

    pub fn dominant_bpm(&mut self, signal: &[f64]) -> Option<f64> {
        self.dominant_frequency(signal).map(|hz| hz * 60.0)
    }
}

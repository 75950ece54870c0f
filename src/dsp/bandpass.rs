use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::AnalysisError;

const IMAG_EPS: f64 = 1e-12;

/// Odd-extension length used by `filtfilt` for a prototype of `order`
pub fn padding_len(order: usize) -> usize {
    3 * (2 * order + 1)
}

/// Second-order section, `a[0] == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Filter state after an infinitely long unit-step input
    fn step_state(&self) -> [f64; 2] {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let gain = (b0 + b1 + b2) / (1.0 + a1 + a2);
        let z1 = b2 - a2 * gain;
        [b1 - a1 * gain + z1, z1]
    }

    /// Transposed direct form II, in place
    fn run(&self, signal: &mut [f64], mut z: [f64; 2]) {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        for v in signal.iter_mut() {
            let x = *v;
            let y = b0 * x + z[0];
            z[0] = b1 * x - a1 * y + z[1];
            z[1] = b2 * x - a2 * y;
            *v = y;
        }
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = self.a[0] + z_inv * self.a[1] + z_inv2 * self.a[2];
        num / den
    }
}

/// Digital Butterworth bandpass in cascaded second-order sections
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<Biquad>,
    padlen: usize,
}

impl BandpassFilter {
    /// Design via analog prototype, lowpass-to-bandpass transform and a
    /// prewarped bilinear transform. `order` is the prototype order, so the
    /// result has `2 * order` poles in `order` sections.
    pub fn design(order: usize, low_hz: f64, high_hz: f64, sample_rate: f64) -> Result<Self, AnalysisError> {
        let nyquist = sample_rate / 2.0;
        if order == 0 {
            return Err(AnalysisError::FilterDegenerate("filter order is zero".to_string()));
        }
        if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
            return Err(AnalysisError::FilterDegenerate(format!(
                "band [{}, {}] Hz not inside (0, {}) Hz",
                low_hz, high_hz, nyquist
            )));
        }

        let fs2 = 2.0 * sample_rate;
        let warp = |f: f64| fs2 * (PI * f / sample_rate).tan();
        let (wl, wh) = (warp(low_hz), warp(high_hz));
        let bw = wh - wl;
        let w0_sq = wl * wh;

        // Analog bandpass poles
        let mut analog = Vec::with_capacity(2 * order);
        for k in 0..order {
            let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            let p_lp = Complex64::from_polar(1.0, theta) * (bw / 2.0);
            let disc = (p_lp * p_lp - w0_sq).sqrt();
            analog.push(p_lp + disc);
            analog.push(p_lp - disc);
        }

        // Bilinear transform; prototype zeros at s=0 map to z=1, the rest to z=-1
        let mut denom = Complex64::new(1.0, 0.0);
        let mut poles = Vec::with_capacity(analog.len());
        for p in &analog {
            let fs2_c = Complex64::new(fs2, 0.0);
            denom *= fs2_c - p;
            poles.push((fs2_c + p) / (fs2_c - p));
        }
        let gain = (Complex64::new((bw * fs2).powi(order as i32), 0.0) / denom).re;

        for p in &poles {
            if !(p.re.is_finite() && p.im.is_finite()) || p.norm() >= 1.0 {
                return Err(AnalysisError::FilterDegenerate(format!("unstable pole at {}", p)));
            }
        }
        if !gain.is_finite() || gain == 0.0 {
            return Err(AnalysisError::FilterDegenerate(format!("bad gain {}", gain)));
        }

        let sections = pair_sections(&poles, gain);
        if sections.len() != order {
            return Err(AnalysisError::FilterDegenerate(format!(
                "expected {} sections, paired {}",
                order,
                sections.len()
            )));
        }

        Ok(Self {
            sections,
            padlen: padding_len(order),
        })
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn padlen(&self) -> usize {
        self.padlen
    }

    /// Magnitude response at `freq_hz`
    pub fn gain_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
            .norm()
    }

    /// Single forward pass with initial state scaled to `signal[0]`
    fn apply(&self, signal: &mut [f64]) {
        let Some(&x0) = signal.first() else {
            return;
        };

        let mut scale = 1.0;
        for section in &self.sections {
            let [z0, z1] = section.step_state();
            section.run(signal, [z0 * scale * x0, z1 * scale * x0]);
            scale *= section.dc_gain();
        }
    }

    /// Zero-phase filtering: odd-extend, forward pass, backward pass, trim
    pub fn filtfilt(&self, signal: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        let n = signal.len();
        let pad = self.padlen;
        if n <= pad {
            return Err(AnalysisError::FilterDegenerate(format!(
                "{} samples is too short for padding of {}",
                n, pad
            )));
        }

        let mut ext = Vec::with_capacity(n + 2 * pad);
        let (first, last) = (signal[0], signal[n - 1]);
        ext.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        ext.extend_from_slice(signal);
        ext.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

        self.apply(&mut ext);
        ext.reverse();
        self.apply(&mut ext);
        ext.reverse();

        let out: Vec<f64> = ext[pad..pad + n].to_vec();
        if out.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::FilterDegenerate("non-finite filter output".to_string()));
        }
        Ok(out)
    }
}

/// Group conjugate pole pairs (and real poles two at a time) into sections,
/// each with one zero at z=1 and one at z=-1. The overall gain goes on the
/// first section.
fn pair_sections(poles: &[Complex64], gain: f64) -> Vec<Biquad> {
    let mut sections = Vec::new();

    for p in poles.iter().filter(|p| p.im > IMAG_EPS) {
        sections.push(Biquad {
            b: [1.0, 0.0, -1.0],
            a: [1.0, -2.0 * p.re, p.norm_sqr()],
        });
    }

    let mut reals: Vec<f64> = poles
        .iter()
        .filter(|p| p.im.abs() <= IMAG_EPS)
        .map(|p| p.re)
        .collect();
    reals.sort_by(|a, b| a.total_cmp(b));
    for pair in reals.chunks(2) {
        let a = match pair {
            [r1, r2] => [1.0, -(r1 + r2), r1 * r2],
            [r] => [1.0, -r, 0.0],
            _ => continue,
        };
        sections.push(Biquad { b: [1.0, 0.0, -1.0], a });
    }

    if let Some(first) = sections.first_mut() {
        for coeff in first.b.iter_mut() {
            *coeff *= gain;
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn default_filter() -> BandpassFilter {
        BandpassFilter::design(2, 0.7, 4.0, 30.0).unwrap()
    }

    fn sine(freq: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / 30.0).sin()).collect()
    }

    #[test]
    fn test_design_shape() {
        let filter = default_filter();
        assert_eq!(filter.sections().len(), 2);
        assert_eq!(filter.padlen(), 15);
        for section in filter.sections() {
            assert_eq!(section.a[0], 1.0);
        }
    }

    #[test]
    fn test_band_edges_are_half_power() {
        let filter = default_filter();
        let half_power = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(filter.gain_at(0.7, 30.0), half_power, epsilon = 1e-6);
        assert_abs_diff_eq!(filter.gain_at(4.0, 30.0), half_power, epsilon = 1e-6);
    }

    #[test]
    fn test_center_passes_and_edges_reject() {
        let filter = default_filter();
        assert!(filter.gain_at(1.7, 30.0) > 0.95);
        assert!(filter.gain_at(0.0, 30.0) < 1e-9);
        assert!(filter.gain_at(15.0, 30.0) < 1e-9);
        assert!(filter.gain_at(10.0, 30.0) < 0.1);
    }

    #[test]
    fn test_invalid_band() {
        assert!(BandpassFilter::design(2, 4.0, 0.7, 30.0).is_err());
        assert!(BandpassFilter::design(2, 0.7, 15.0, 30.0).is_err());
        assert!(BandpassFilter::design(0, 0.7, 4.0, 30.0).is_err());
    }

    #[test]
    fn test_odd_order_design() {
        let filter = BandpassFilter::design(3, 0.7, 4.0, 30.0).unwrap();
        assert_eq!(filter.sections().len(), 3);
        assert_abs_diff_eq!(
            filter.gain_at(0.7, 30.0),
            std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_filtfilt_preserves_in_band_phase() {
        let filter = default_filter();
        let input = sine(1.5, 300);
        let output = filtfilt_ok(&filter, &input);

        // Away from the edges the zero-phase output tracks the input sample for sample
        for i in 100..200 {
            assert_abs_diff_eq!(output[i], input[i], epsilon = 0.1);
        }
    }

    #[test]
    fn test_filtfilt_attenuates_out_of_band() {
        let filter = default_filter();
        let output = filtfilt_ok(&filter, &sine(12.0, 300));
        let peak = output[50..250].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(peak < 0.01, "residual amplitude {}", peak);
    }

    #[test]
    fn test_filtfilt_zero_in_zero_out() {
        let filter = default_filter();
        let output = filtfilt_ok(&filter, &vec![0.0; 150]);
        assert!(output.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_filtfilt_too_short() {
        let filter = default_filter();
        let err = filter.filtfilt(&[1.0; 15]).unwrap_err();
        assert!(matches!(err, AnalysisError::FilterDegenerate(_)));
    }

    fn filtfilt_ok(filter: &BandpassFilter, input: &[f64]) -> Vec<f64> {
        let output = filter.filtfilt(input).unwrap();
        assert_eq!(output.len(), input.len());
        output
    }
}

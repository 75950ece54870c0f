use crate::error::AnalysisError;

/// Selection rules for `find_peaks`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCriteria {
    /// Minimum index distance between kept peaks (rounded up)
    pub min_distance: f64,

    /// Minimum height above the higher of the two surrounding bases
    pub min_prominence: f64,
}

/// Indices of local maxima that satisfy `criteria`, in ascending order.
///
/// Distance selection runs first, keeping the tallest peak of any crowded
/// group, then the prominence threshold is applied to the survivors.
pub fn find_peaks(signal: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    let candidates = local_maxima(signal);
    let spaced = select_by_distance(signal, &candidates, criteria.min_distance);
    spaced
        .into_iter()
        .filter(|&p| prominence(signal, p) >= criteria.min_prominence)
        .collect()
}

/// Strict local maxima; a flat-topped peak reports the middle of its plateau
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if signal.len() < 3 {
        return peaks;
    }

    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(signal: &[f64], peaks: &[usize], min_distance: f64) -> Vec<usize> {
    let distance = min_distance.ceil().max(1.0) as usize;
    if peaks.len() < 2 || distance <= 1 {
        return peaks.to_vec();
    }

    let mut keep = vec![true; peaks.len()];
    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));

    // Tallest first; each kept peak suppresses its close neighbors
    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Height of `peak` above the higher of its left and right bases. Each base
/// is the minimum reached before the signal rises above the peak or ends.
pub fn prominence(signal: &[f64], peak: usize) -> f64 {
    let height = signal[peak];

    let mut left_min = height;
    for &v in signal[..peak].iter().rev() {
        if v > height {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = height;
    for &v in &signal[peak + 1..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}

/// Outcome of the time-domain path
#[derive(Debug, Clone, PartialEq)]
pub struct PeakEstimate {
    pub peaks: Vec<usize>,
    pub bpm: f64,
    pub snr_db: f64,
}

/// Heart rate from mean inter-peak interval, SNR from peak vs. total power
#[derive(Debug, Clone)]
pub struct PeakEstimator {
    criteria: PeakCriteria,
    sample_rate: f64,
    min_peaks: usize,
}

impl PeakEstimator {
    pub fn new(criteria: PeakCriteria, sample_rate: f64, min_peaks: usize) -> Self {
        Self {
            criteria,
            sample_rate,
            min_peaks: min_peaks.max(2),
        }
    }

    pub fn estimate(&self, filtered: &[f64]) -> Result<PeakEstimate, AnalysisError> {
        let peaks = find_peaks(filtered, &self.criteria);
        if peaks.len() < self.min_peaks {
            return Err(AnalysisError::InsufficientPeaks {
                found: peaks.len(),
                required: self.min_peaks,
            });
        }

        let span = (peaks[peaks.len() - 1] - peaks[0]) as f64;
        let mean_interval = span / (peaks.len() - 1) as f64;
        let bpm = 60.0 * self.sample_rate / mean_interval;
        let snr_db = peak_snr_db(filtered, &peaks);

        Ok(PeakEstimate { peaks, bpm, snr_db })
    }
}

/// `10 log10(signal / noise)` where signal is the mean squared peak value and
/// noise is the mean squared signal minus that; 0 when noise is not positive.
pub fn peak_snr_db(filtered: &[f64], peaks: &[usize]) -> f64 {
    if filtered.is_empty() || peaks.is_empty() {
        return 0.0;
    }

    let signal_power = peaks.iter().map(|&p| filtered[p].powi(2)).sum::<f64>() / peaks.len() as f64;
    let total_power = filtered.iter().map(|v| v * v).sum::<f64>() / filtered.len() as f64;
    let noise_power = total_power - signal_power;

    if noise_power > 0.0 && signal_power > 0.0 {
        10.0 * (signal_power / noise_power).log10()
    } else {
        0.0
    }
}

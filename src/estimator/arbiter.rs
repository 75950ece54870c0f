use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::buffers::SlidingWindow;
use crate::config::EstimatorConfig;
use crate::core::{Estimate, FrameSample, RoiReducer};
use crate::dsp::{detrend_in_place, BandpassFilter, PeakCriteria, PeakEstimator, SpectralEstimator};
use crate::error::{AnalysisError, DecodeError, PulseError};
use crate::estimator::WindowState;
use crate::ingest::{CenterCrop, FrameDecoder};

/// Mean-square level below which a detrended window counts as flat
const FLAT_ENERGY: f64 = 1e-12;

/// Which stage decided a frame's `bpm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatePath {
    /// Window not yet full
    Filling,
    /// Time-domain peak intervals
    Peaks,
    /// Spectral fallback
    Spectral,
    /// Full window, but no usable rate
    Inconclusive,
    /// Sample was not finite and was not stored
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub estimate: Estimate,
    pub path: RatePath,
}

/// Per-session heart-rate estimator.
///
/// Owns the session's sliding window; one instance per session, mutated
/// only through `process_frame` / `ingest` / `push_sample`.
pub struct RateEstimator {
    config: EstimatorConfig,
    decoder: FrameDecoder,
    reducer: Box<dyn RoiReducer>,
    window: SlidingWindow,
    filter: BandpassFilter,
    peaks: PeakEstimator,
    spectral: SpectralEstimator,
    state: WindowState,
    next_sequence: u64,
    scratch: Vec<f64>,
}

impl RateEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, PulseError> {
        let reducer = Box::new(CenterCrop::new(config.roi_half_size));
        Self::with_reducer(config, reducer)
    }

    pub fn with_reducer(config: EstimatorConfig, reducer: Box<dyn RoiReducer>) -> Result<Self, PulseError> {
        config.validate()?;

        let filter = BandpassFilter::design(
            config.filter_order,
            config.low_cut_hz,
            config.high_cut_hz,
            config.sample_rate_hz,
        )?;
        let peaks = PeakEstimator::new(
            PeakCriteria {
                min_distance: config.min_peak_distance(),
                min_prominence: config.min_prominence,
            },
            config.sample_rate_hz,
            config.min_peaks,
        );
        let spectral = SpectralEstimator::new(config.sample_rate_hz, config.low_cut_hz, config.high_cut_hz);

        Ok(Self {
            decoder: FrameDecoder::new(config.accepted_formats.as_slice()),
            reducer,
            window: SlidingWindow::new(config.window_capacity),
            filter,
            peaks,
            spectral,
            state: WindowState::from_fill(0, config.window_capacity),
            next_sequence: 0,
            scratch: Vec::with_capacity(config.window_capacity),
            config,
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Always answers: a frame that cannot be decoded yields the degraded record
    pub fn process_frame(&mut self, bytes: &[u8]) -> Estimate {
        match self.ingest(bytes) {
            Ok(report) => report.estimate,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                Estimate::degraded()
            }
        }
    }

    /// Decode, reduce and push one frame. On error the window is untouched.
    pub fn ingest(&mut self, bytes: &[u8]) -> Result<FrameReport, DecodeError> {
        let image = self.decoder.decode(bytes)?;
        let value = self.reducer.reduce(&image)?;
        Ok(self.push_sample(value))
    }

    pub fn push_sample(&mut self, value: f64) -> FrameReport {
        if !value.is_finite() {
            return FrameReport {
                estimate: Estimate::degraded(),
                path: RatePath::Rejected,
            };
        }

        self.window.push(FrameSample::new(self.next_sequence, value));
        self.next_sequence += 1;

        let next = WindowState::from_fill(self.window.len(), self.window.capacity());
        debug_assert!(self.state.can_transition_to(&next));
        if next.is_ready() && !self.state.is_ready() {
            debug!("Window full after {} samples", self.next_sequence);
        }
        self.state = next;

        let signal_deviation = self.signal_deviation(value);
        if !self.state.is_ready() {
            return FrameReport {
                estimate: Estimate {
                    bpm: None,
                    signal_deviation,
                    snr_db: 0.0,
                },
                path: RatePath::Filling,
            };
        }

        let (bpm, snr_db, path) = match self.analyze() {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("Window inconclusive: {}", e);
                (None, 0.0, RatePath::Inconclusive)
            }
        };

        FrameReport {
            estimate: Estimate {
                bpm,
                signal_deviation,
                snr_db: round_snr(snr_db),
            },
            path,
        }
    }

    fn signal_deviation(&self, current: f64) -> f64 {
        if self.window.len() < self.config.deviation_min_samples {
            return 0.0;
        }
        self.window.mean().map_or(0.0, |mean| current - mean)
    }

    fn is_plausible(&self, bpm: f64) -> bool {
        bpm >= self.config.min_plausible_bpm && bpm <= self.config.max_plausible_bpm
    }

    /// Detrend, filter, peak path, then spectral fallback if needed
    fn analyze(&mut self) -> Result<(Option<u32>, f64, RatePath), AnalysisError> {
        self.window.copy_values_into(&mut self.scratch);
        detrend_in_place(&mut self.scratch);

        let energy = self.scratch.iter().map(|v| v * v).sum::<f64>() / self.scratch.len() as f64;
        if !(energy > FLAT_ENERGY) {
            return Err(AnalysisError::FilterDegenerate("flat window".to_string()));
        }
        let filtered = self.filter.filtfilt(&self.scratch)?;

        let (peak_bpm, snr_db) = match self.peaks.estimate(&filtered) {
            Ok(estimate) => (estimate.bpm, estimate.snr_db),
            Err(e) => {
                debug!("Peak path: {}", e);
                (0.0, 0.0)
            }
        };

        if self.is_plausible(peak_bpm) {
            return Ok((truncate_bpm(peak_bpm), snr_db, RatePath::Peaks));
        }

        // Fallback keeps the SNR the peak path measured on this same window
        match self.spectral.dominant_bpm(&filtered) {
            Some(bpm) => {
                debug!("Spectral fallback: peak path gave {:.1} bpm, spectrum {:.1}", peak_bpm, bpm);
                Ok((truncate_bpm(bpm), snr_db, RatePath::Spectral))
            }
            None => Ok((None, 0.0, RatePath::Inconclusive)),
        }
    }
}

fn truncate_bpm(bpm: f64) -> Option<u32> {
    if bpm.is_finite() && bpm >= 0.0 {
        Some(bpm.trunc() as u32)
    } else {
        None
    }
}

fn round_snr(snr_db: f64) -> f64 {
    if !snr_db.is_finite() {
        return 0.0;
    }
    (snr_db * 100.0).round() / 100.0
}

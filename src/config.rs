use anyhow::Result;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dsp::bandpass::padding_len;
use crate::error::ConfigError;

/// Parameters of the per-session rate estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Assumed camera frame rate
    pub sample_rate_hz: f64,

    /// Number of samples kept in the sliding window
    pub window_capacity: usize,

    pub low_cut_hz: f64,
    pub high_cut_hz: f64,

    /// Butterworth prototype order (the bandpass has twice as many poles)
    pub filter_order: usize,

    /// Highest beat rate the peak picker accepts between adjacent peaks
    pub max_peak_rate_hz: f64,

    pub min_prominence: f64,
    pub min_peaks: usize,

    pub min_plausible_bpm: f64,
    pub max_plausible_bpm: f64,

    /// Samples required before the per-frame deviation is reported
    pub deviation_min_samples: usize,

    /// Half the side of the centered crop, in pixels
    pub roi_half_size: u32,

    /// Lower-case format names accepted by the decoder
    pub accepted_formats: Vec<String>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 30.0,
            window_capacity: 150,
            low_cut_hz: 0.7,
            high_cut_hz: 4.0,
            filter_order: 2,
            max_peak_rate_hz: 2.5,
            min_prominence: 0.1,
            min_peaks: 3,
            min_plausible_bpm: 40.0,
            max_plausible_bpm: 200.0,
            deviation_min_samples: 10,
            roi_half_size: 100,
            accepted_formats: vec!["jpeg".to_string(), "png".to_string(), "webp".to_string()],
        }
    }
}

impl EstimatorConfig {
    /// Minimum distance between accepted peaks, in samples
    pub fn min_peak_distance(&self) -> f64 {
        self.sample_rate_hz / self.max_peak_rate_hz
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let nyquist = self.sample_rate_hz / 2.0;

        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ConfigError::new("sample_rate_hz", "must be positive"));
        }
        if self.window_capacity == 0 {
            return Err(ConfigError::new("window_capacity", "must be non-zero"));
        }
        if self.filter_order == 0 {
            return Err(ConfigError::new("filter_order", "must be non-zero"));
        }
        if !(self.low_cut_hz > 0.0 && self.low_cut_hz < self.high_cut_hz) {
            return Err(ConfigError::new(
                "low_cut_hz",
                format!("band [{}, {}] is empty or inverted", self.low_cut_hz, self.high_cut_hz),
            ));
        }
        if self.high_cut_hz >= nyquist {
            return Err(ConfigError::new(
                "high_cut_hz",
                format!("{} Hz is at or above Nyquist ({} Hz)", self.high_cut_hz, nyquist),
            ));
        }
        if self.window_capacity <= padding_len(self.filter_order) {
            return Err(ConfigError::new(
                "window_capacity",
                format!("must exceed the filter padding of {} samples", padding_len(self.filter_order)),
            ));
        }
        if !(self.max_peak_rate_hz > 0.0) {
            return Err(ConfigError::new("max_peak_rate_hz", "must be positive"));
        }
        if self.min_peaks < 2 {
            return Err(ConfigError::new("min_peaks", "at least two peaks are needed for an interval"));
        }
        if self.min_plausible_bpm >= self.max_plausible_bpm {
            return Err(ConfigError::new("min_plausible_bpm", "plausible range is inverted"));
        }
        if self.roi_half_size == 0 {
            return Err(ConfigError::new("roi_half_size", "region of interest would be empty"));
        }
        if !self
            .accepted_formats
            .iter()
            .any(|name| ImageFormat::from_extension(name).is_some())
        {
            return Err(ConfigError::new(
                "accepted_formats",
                format!("no known image format in {:?}", self.accepted_formats),
            ));
        }
        Ok(())
    }
}

/// Backpressure behavior of a session's inbound frame queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued frame to make room
    DropOldest,

    /// Reject the frame that does not fit
    DropIncoming,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        Self::DropOldest
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,

    /// Size of the shared compute pool; 0 means one per available core
    pub workers: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 8,
            overflow_policy: OverflowPolicy::DropOldest,
            workers: 0,
        }
    }
}

impl SessionConfig {
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::new("queue_capacity", "must be non-zero"));
        }
        Ok(())
    }
}

/// Top-level document: `{ "estimator": {...}, "session": {...} }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub estimator: EstimatorConfig,
    pub session: SessionConfig,
}

impl PulseConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        // Missing sections and fields fall back to defaults
        let parsed: PulseConfig = if config.is_null() {
            PulseConfig::default()
        } else {
            serde_json::from_value(config)?
        };

        parsed.estimator.validate()?;
        parsed.session.validate()?;
        Ok(parsed)
    }
}

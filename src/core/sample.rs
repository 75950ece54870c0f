use serde::{Deserialize, Serialize};

/// One reduced frame: the ROI intensity plus its arrival order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Sequential frame number within the session
    pub sequence_id: u64,

    /// Mean green-channel intensity of the region of interest
    pub value: f64,
}

impl FrameSample {
    pub fn new(sequence_id: u64, value: f64) -> Self {
        Self { sequence_id, value }
    }
}

/// Per-frame output record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Heart rate, absent until the window is full and the analysis is conclusive
    pub bpm: Option<u32>,

    /// Current sample minus window mean
    #[serde(rename = "signal")]
    pub signal_deviation: f64,

    #[serde(rename = "snr")]
    pub snr_db: f64,
}

impl Estimate {
    /// Record returned when a frame could not be used at all
    pub fn degraded() -> Self {
        Self {
            bpm: None,
            signal_deviation: 0.0,
            snr_db: 0.0,
        }
    }
}

impl Default for Estimate {
    fn default() -> Self {
        Self::degraded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_wire_shape() {
        let json = serde_json::to_value(Estimate::degraded()).unwrap();
        assert_eq!(json, serde_json::json!({"bpm": null, "signal": 0.0, "snr": 0.0}));
    }

    #[test]
    fn test_estimate_wire_shape() {
        let estimate = Estimate {
            bpm: Some(72),
            signal_deviation: -0.5,
            snr_db: 3.25,
        };
        let json = serde_json::to_value(estimate).unwrap();
        assert_eq!(json["bpm"], 72);
        assert_eq!(json["signal"], -0.5);
        assert_eq!(json["snr"], 3.25);
    }
}

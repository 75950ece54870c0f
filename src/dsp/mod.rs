pub mod bandpass;
pub mod detrend;
pub mod peaks;
pub mod spectrum;

pub use bandpass::{BandpassFilter, Biquad};
pub use detrend::{detrend_in_place, detrend_linear};
pub use peaks::{find_peaks, PeakCriteria, PeakEstimate, PeakEstimator};
pub use spectrum::SpectralEstimator;

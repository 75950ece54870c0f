pub mod buffers;
pub mod config;
pub mod core;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod ingest;
pub mod observability;

pub use config::{EstimatorConfig, OverflowPolicy, PulseConfig, SessionConfig};
pub use core::{Estimate, FrameSample};
pub use engine::{run_stream, EstimatorPool, Session};
pub use error::{AnalysisError, ConfigError, DecodeError, PulseError};
pub use estimator::{RateEstimator, RatePath};

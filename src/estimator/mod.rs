pub mod arbiter;
pub mod state;

pub use arbiter::{FrameReport, RateEstimator, RatePath};
pub use state::WindowState;

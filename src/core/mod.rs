pub mod reducer;
pub mod sample;

pub use reducer::RoiReducer;
pub use sample::{Estimate, FrameSample};

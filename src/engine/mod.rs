pub mod pool;
pub mod queue;
pub mod stream;

pub use pool::{EstimatorPool, Session};
pub use queue::{Admission, FrameQueue};
pub use stream::{run_stream, EstimateSink, FrameSource, StreamSummary};

pub mod decode;
pub mod roi;
pub mod source;

pub use decode::FrameDecoder;
pub use roi::{CenterCrop, Region};
pub use source::DirectorySource;

pub mod window;

pub use window::SlidingWindow;

use image::RgbImage;

use crate::error::DecodeError;

/// Reduces a decoded frame to the single intensity scalar the window stores.
///
/// The default is a fixed centered crop; a face locator can implement this
/// trait without touching the rest of the pipeline.
pub trait RoiReducer: Send + Sync {
    fn reduce(&self, image: &RgbImage) -> Result<f64, DecodeError>;
}

use image::RgbImage;

use crate::core::RoiReducer;
use crate::error::DecodeError;

/// Pixel rectangle `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Region {
    pub fn pixel_count(&self) -> u64 {
        (self.x1 - self.x0) as u64 * (self.y1 - self.y0) as u64
    }
}

/// Fixed-size square centered on the frame, clamped to the image bounds.
/// Stands in for face localization.
#[derive(Debug, Clone, Copy)]
pub struct CenterCrop {
    half_size: u32,
}

impl CenterCrop {
    pub fn new(half_size: u32) -> Self {
        Self { half_size }
    }

    pub fn region(&self, width: u32, height: u32) -> Option<Region> {
        let (cx, cy) = (width / 2, height / 2);
        let region = Region {
            x0: cx.saturating_sub(self.half_size),
            y0: cy.saturating_sub(self.half_size),
            x1: cx.saturating_add(self.half_size).min(width),
            y1: cy.saturating_add(self.half_size).min(height),
        };

        if region.x0 >= region.x1 || region.y0 >= region.y1 {
            return None;
        }
        Some(region)
    }
}

impl Default for CenterCrop {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RoiReducer for CenterCrop {
    fn reduce(&self, image: &RgbImage) -> Result<f64, DecodeError> {
        let (width, height) = image.dimensions();
        let region = self.region(width, height).ok_or(DecodeError::EmptyRegion)?;

        let mut green_sum = 0u64;
        for y in region.y0..region.y1 {
            for x in region.x0..region.x1 {
                green_sum += image.get_pixel(x, y).0[1] as u64;
            }
        }

        Ok(green_sum as f64 / region.pixel_count() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_region_centered() {
        let crop = CenterCrop::new(100);
        let region = crop.region(640, 480).unwrap();
        assert_eq!(region, Region { x0: 220, y0: 140, x1: 420, y1: 340 });
        assert_eq!(region.pixel_count(), 200 * 200);
    }

    #[test]
    fn test_region_clamped_to_small_image() {
        let crop = CenterCrop::new(100);
        let region = crop.region(50, 30).unwrap();
        assert_eq!(region, Region { x0: 0, y0: 0, x1: 50, y1: 30 });
    }

    #[test]
    fn test_region_of_empty_image() {
        assert!(CenterCrop::new(100).region(0, 0).is_none());
    }

    #[test]
    fn test_green_mean_ignores_outside_pixels() {
        // Green 200 inside the 4x4 center, 0 elsewhere
        let image = RgbImage::from_fn(8, 8, |x, y| {
            if (2..6).contains(&x) && (2..6).contains(&y) {
                Rgb([10, 200, 30])
            } else {
                Rgb([255, 0, 255])
            }
        });
        let value = CenterCrop::new(2).reduce(&image).unwrap();
        assert_eq!(value, 200.0);
    }

    #[test]
    fn test_green_mean_mixed() {
        let image = RgbImage::from_fn(2, 1, |x, _| Rgb([0, if x == 0 { 100 } else { 50 }, 0]));
        let value = CenterCrop::new(10).reduce(&image).unwrap();
        assert_eq!(value, 75.0);
    }
}

use image::{ImageFormat, RgbImage};
use log::warn;

use crate::error::DecodeError;

/// Sniffs and decodes one encoded frame into an RGB pixel grid
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    accepted: Vec<ImageFormat>,
}

impl FrameDecoder {
    /// Build a decoder accepting the named formats (`"jpeg"`, `"png"`, `"webp"`, ...)
    pub fn new<S: AsRef<str>>(format_names: &[S]) -> Self {
        let mut accepted = Vec::with_capacity(format_names.len());
        for name in format_names {
            match ImageFormat::from_extension(name.as_ref()) {
                Some(format) if !accepted.contains(&format) => accepted.push(format),
                Some(_) => {}
                None => warn!("Ignoring unknown image format `{}`", name.as_ref()),
            }
        }
        Self { accepted }
    }

    pub fn accepts(&self, format: ImageFormat) -> bool {
        self.accepted.contains(&format)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<RgbImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        // Magic-number check before handing bytes to a codec
        let format = image::guess_format(bytes).map_err(|_| DecodeError::UnknownFormat)?;
        if !self.accepts(format) {
            return Err(DecodeError::Unsupported {
                format: format_name(format),
            });
        }

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Ok(image.to_rgb8())
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(&["jpeg", "png", "webp"])
    }
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_lowercase()
}

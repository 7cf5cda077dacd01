//! Primary decoder: the `image` crate, magic-byte detection only.

use fast_image_resize as fr;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::DecodeError;
use crate::types::DecodedImage;

use super::clamp::reduced_dimensions;
use super::jpeg;
use super::resize::resize_rgba;

/// Header facts learned without decoding pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// The first decoder a pipeline run tries.
///
/// `probe` answers "is this an image at all", `normalize` produces RGBA8
/// pixels, and `reduce` shrinks by an integer factor. Each step fails with its
/// own [`DecodeError`] class so the pipeline can route the failure.
pub trait PrimaryDecoder: Send + Sync {
    /// Identify the container and read its dimensions.
    ///
    /// Fails with [`DecodeError::Unrecognized`] only.
    fn probe(&self, bytes: &[u8]) -> Result<Probe, DecodeError>;

    /// Decode and convert to RGBA8.
    ///
    /// Fails with [`DecodeError::Malformed`] only.
    fn normalize(&self, bytes: &[u8], probe: &Probe) -> Result<DecodedImage, DecodeError>;

    /// Shrink by `factor` on both axes.
    ///
    /// Fails with [`DecodeError::Malformed`] only; callers keep the input.
    fn reduce(&self, image: &DecodedImage, factor: u32) -> Result<DecodedImage, DecodeError>;
}

/// Production primary decoder backed by `image::ImageReader`.
#[derive(Debug, Clone)]
pub struct ImageCrateDecoder {
    limits: LimitsConfig,
}

impl ImageCrateDecoder {
    /// Create a decoder enforcing the given resource limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    fn decoding_limits(&self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.limits.max_input_dimension);
        limits.max_image_height = Some(self.limits.max_input_dimension);
        limits.max_alloc = Some(self.limits.max_decode_alloc_bytes());
        limits
    }
}

impl PrimaryDecoder for ImageCrateDecoder {
    fn probe(&self, bytes: &[u8]) -> Result<Probe, DecodeError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|_| DecodeError::Unrecognized)?;

        // Content sniffing only: a claimed type or extension is not trusted here
        let format = reader.format().ok_or(DecodeError::Unrecognized)?;

        let (width, height) = reader.into_dimensions().map_err(|e| {
            tracing::debug!("{:?} header unreadable: {}", format, e);
            DecodeError::Unrecognized
        })?;

        Ok(Probe {
            format,
            width,
            height,
        })
    }

    fn normalize(&self, bytes: &[u8], probe: &Probe) -> Result<DecodedImage, DecodeError> {
        if probe.width == 0 || probe.height == 0 {
            return Err(DecodeError::Malformed(format!(
                "image has zero size ({}x{})",
                probe.width, probe.height
            )));
        }

        // The JPEG decoder gray-fills missing scan data instead of failing
        if probe.format == ImageFormat::Jpeg {
            jpeg::check_stream(bytes).map_err(DecodeError::Malformed)?;
        }

        let mut reader = ImageReader::with_format(Cursor::new(bytes), probe.format);
        reader.limits(self.decoding_limits());

        let image = reader
            .decode()
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        Ok(DecodedImage::from_rgba(image.to_rgba8()))
    }

    fn reduce(&self, image: &DecodedImage, factor: u32) -> Result<DecodedImage, DecodeError> {
        let (width, height) = reduced_dimensions(image.width, image.height, factor);
        resize_rgba(image.clone(), width, height, fr::FilterType::Box)
            .map_err(DecodeError::Malformed)
    }
}

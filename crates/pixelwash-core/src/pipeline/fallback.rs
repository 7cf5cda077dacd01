//! Fallback decoder: best effort after the primary decoder gave up.
//!
//! Two routes, tried by content:
//! - JPEG streams go to `zune-jpeg` in non-strict mode with RGBA output. It
//!   tolerates truncated scans and converts CMYK/YCCK to RGB.
//! - Anything else is decoded by the `image` crate with an explicit format
//!   taken from the claimed content type or the file name. This recovers
//!   formats that have no magic bytes (TGA) or whose signature is damaged.
//!
//! The decoded image is scaled straight to the clamp target with a bilinear
//! filter and written as PNG. Any failure on the way is reported as
//! [`DecodeError::FallbackExhausted`]; no partial output escapes.

use fast_image_resize as fr;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

use crate::config::LimitsConfig;
use crate::error::DecodeError;
use crate::types::{DecodedImage, EncodedPng, InputImage};

use super::clamp::clamp;
use super::encode::strip_and_reencode;
use super::resize::resize_rgba;

const JPEG_SOI: &[u8] = &[0xFF, 0xD8];

/// Second-chance decoder used only after primary failure.
pub trait FallbackDecoder: Send + Sync {
    /// Decode, clamp to `max_dimension`, and encode as PNG in one step.
    fn decode_and_sanitize(
        &self,
        input: &InputImage<'_>,
        max_dimension: u32,
    ) -> Result<EncodedPng, DecodeError>;
}

/// Production fallback decoder.
#[derive(Debug, Clone)]
pub struct PermissiveDecoder {
    limits: LimitsConfig,
}

impl PermissiveDecoder {
    /// Create a decoder enforcing the given resource limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    fn decode(&self, input: &InputImage<'_>) -> Result<DecodedImage, String> {
        if input.bytes.starts_with(JPEG_SOI) {
            return self.decode_jpeg(input.bytes);
        }

        let format = hinted_format(input).ok_or("no usable format hint")?;
        self.decode_hinted(input.bytes, format)
    }

    fn decode_jpeg(&self, bytes: &[u8]) -> Result<DecodedImage, String> {
        let max_side = self.limits.max_input_dimension as usize;
        let options = DecoderOptions::default()
            .jpeg_set_out_colorspace(ColorSpace::RGBA)
            .set_strict_mode(false)
            .set_max_width(max_side)
            .set_max_height(max_side);

        let mut decoder = JpegDecoder::new_with_options(bytes, options);
        decoder
            .decode_headers()
            .map_err(|e| format!("jpeg header: {:?}", e))?;

        let (width, height) = decoder.dimensions().ok_or("jpeg has no frame header")?;
        let (width, height) = (
            u32::try_from(width).map_err(|_| "jpeg width out of range")?,
            u32::try_from(height).map_err(|_| "jpeg height out of range")?,
        );
        self.check_alloc(width, height)?;

        let pixels = decoder
            .decode()
            .map_err(|e| format!("jpeg decode: {:?}", e))?;

        expand_to_rgba(pixels, width, height)
    }

    fn decode_hinted(&self, bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, String> {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.limits.max_input_dimension);
        limits.max_image_height = Some(self.limits.max_input_dimension);
        limits.max_alloc = Some(self.limits.max_decode_alloc_bytes());

        let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
        reader.limits(limits);

        let image = reader
            .decode()
            .map_err(|e| format!("{:?} decode: {}", format, e))?;

        Ok(DecodedImage::from_rgba(image.to_rgba8()))
    }

    fn check_alloc(&self, width: u32, height: u32) -> Result<(), String> {
        let needed = u64::from(width)
            .checked_mul(u64::from(height))
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or("pixel count overflows")?;

        if needed > self.limits.max_decode_alloc_bytes() {
            return Err(format!(
                "{}x{} needs {} bytes, budget is {}",
                width,
                height,
                needed,
                self.limits.max_decode_alloc_bytes()
            ));
        }
        Ok(())
    }

    fn sanitize(&self, input: &InputImage<'_>, max_dimension: u32) -> Result<EncodedPng, String> {
        let decoded = self.decode(input)?;

        let target = clamp(decoded.width, decoded.height, max_dimension);
        let resized = if target.needs_resize {
            resize_rgba(decoded, target.width, target.height, fr::FilterType::Bilinear)?
        } else {
            decoded
        };

        strip_and_reencode(resized).map_err(|e| e.to_string())
    }
}

impl FallbackDecoder for PermissiveDecoder {
    fn decode_and_sanitize(
        &self,
        input: &InputImage<'_>,
        max_dimension: u32,
    ) -> Result<EncodedPng, DecodeError> {
        self.sanitize(input, max_dimension).map_err(|reason| {
            tracing::debug!("Fallback decoder gave up: {}", reason);
            DecodeError::FallbackExhausted
        })
    }
}

/// Format claimed by the caller: content type first, then file extension.
fn hinted_format(input: &InputImage<'_>) -> Option<ImageFormat> {
    input
        .content_type
        .and_then(ImageFormat::from_mime_type)
        .or_else(|| input.file_name.and_then(|name| ImageFormat::from_path(name).ok()))
}

/// Widen whatever channel layout the decoder produced to RGBA8.
fn expand_to_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<DecodedImage, String> {
    let count = (width as usize)
        .checked_mul(height as usize)
        .ok_or("pixel count overflows")?;
    if count == 0 {
        return Err(format!("image has zero size ({}x{})", width, height));
    }

    let channels = if pixels.len() % count == 0 {
        pixels.len() / count
    } else {
        0
    };

    let pixels = match channels {
        4 => pixels,
        3 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        2 => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        1 => pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        _ => {
            return Err(format!(
                "unexpected buffer of {} bytes for {}x{}",
                pixels.len(),
                width,
                height
            ))
        }
    };

    Ok(DecodedImage {
        width,
        height,
        pixels,
    })
}

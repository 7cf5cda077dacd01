//! Strip-and-reencode: raw RGBA bytes in, brand-new PNG out.
//!
//! Nothing from the source container reaches the encoder. The pixel bytes are
//! moved into a freshly built buffer and written with a default PNG encoder,
//! so ancillary chunks, EXIF, comments and trailing payloads are dropped.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::DecodeError;
use crate::types::{DecodedImage, EncodedPng};

/// Rebuild an image from its raw pixel bytes and encode it as PNG.
pub fn strip_and_reencode(image: DecodedImage) -> Result<EncodedPng, DecodeError> {
    let expected_len = image
        .expected_len()
        .ok_or_else(|| DecodeError::Malformed("pixel buffer size overflows".to_string()))?;

    if image.pixels.len() != expected_len {
        return Err(DecodeError::Malformed(format!(
            "pixel buffer holds {} bytes, expected {} for {}x{}",
            image.pixels.len(),
            expected_len,
            image.width,
            image.height
        )));
    }

    let rebuilt = RgbaImage::from_raw(image.width, image.height, image.pixels)
        .ok_or_else(|| DecodeError::Malformed("cannot rebuild pixel buffer".to_string()))?;

    encode_png(&rebuilt)
}

/// Encode an RGBA8 buffer as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<EncodedPng, DecodeError> {
    let (width, height) = image.dimensions();
    let mut bytes = Vec::new();

    PngEncoder::new(&mut bytes)
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| DecodeError::Malformed(format!("PNG encoding failed: {}", e)))?;

    Ok(EncodedPng {
        bytes,
        width,
        height,
    })
}

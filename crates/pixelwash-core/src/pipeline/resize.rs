//! RGBA8 resampling on top of `fast_image_resize`.

use fast_image_resize as fr;

use crate::types::DecodedImage;

/// Resample `image` to exactly `width x height` with a convolution filter.
///
/// Alpha is premultiplied during filtering so transparent edges do not bleed.
pub(crate) fn resize_rgba(
    image: DecodedImage,
    width: u32,
    height: u32,
    filter: fr::FilterType,
) -> Result<DecodedImage, String> {
    if image.width == 0 || image.height == 0 || width == 0 || height == 0 {
        return Err(format!(
            "cannot resize {}x{} to {}x{}",
            image.width, image.height, width, height
        ));
    }

    let src = fr::images::Image::from_vec_u8(
        image.width,
        image.height,
        image.pixels,
        fr::PixelType::U8x4,
    )
    .map_err(|e| format!("cannot wrap source pixels: {}", e))?;

    let mut dst = fr::images::Image::new(width, height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(filter));

    resizer
        .resize(&src, &mut dst, Some(&options))
        .map_err(|e| format!("resize failed: {}", e))?;

    Ok(DecodedImage {
        width,
        height,
        pixels: dst.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_resize_solid_color() {
        let src = DecodedImage::from_rgba(RgbaImage::from_pixel(40, 20, Rgba([200, 100, 50, 255])));
        let out = resize_rgba(src, 10, 5, fr::FilterType::Bilinear).unwrap();

        assert_eq!((out.width, out.height), (10, 5));
        assert_eq!(out.pixels.len(), 10 * 5 * 4);
        assert_eq!(&out.pixels[..4], &[200, 100, 50, 255]);
    }

    #[test]
    fn test_resize_rejects_mismatched_buffer() {
        let src = DecodedImage {
            width: 8,
            height: 8,
            pixels: vec![0; 12],
        };
        assert!(resize_rgba(src, 4, 4, fr::FilterType::Box).is_err());
    }

    #[test]
    fn test_resize_rejects_zero_target() {
        let src = DecodedImage::from_rgba(RgbaImage::new(4, 4));
        assert!(resize_rgba(src, 0, 2, fr::FilterType::Box).is_err());
    }
}

//! Dimension math shared by both decoders.
//!
//! Two distinct shrink strategies live here on purpose. The primary path uses
//! an integer reduction factor (cheap box reduction), the fallback path scales
//! straight to the clamp target. Their outputs differ for the same input.

/// Target size for an image that must fit inside `max_dim` on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTarget {
    pub width: u32,
    pub height: u32,
    /// `false` when the source already fits; width and height are then the
    /// source dimensions, unchanged.
    pub needs_resize: bool,
}

/// Fit `width x height` inside `max_dim`, preserving aspect ratio.
///
/// The longer side becomes exactly `max_dim` and the shorter side is scaled by
/// the same ratio, rounded to nearest and never below 1. Images that already
/// fit are returned as-is. Ties (`height == width`) are treated as
/// height-bound, which gives the same result either way.
pub fn clamp(width: u32, height: u32, max_dim: u32) -> ResizeTarget {
    let max_dim = max_dim.max(1);

    if width.max(height) <= max_dim {
        return ResizeTarget {
            width,
            height,
            needs_resize: false,
        };
    }

    if height >= width {
        ResizeTarget {
            width: scale_side(width, height, max_dim),
            height: max_dim,
            needs_resize: true,
        }
    } else {
        ResizeTarget {
            width: max_dim,
            height: scale_side(height, width, max_dim),
            needs_resize: true,
        }
    }
}

/// `round(short * max_dim / long)`, at least 1.
fn scale_side(short: u32, long: u32, max_dim: u32) -> u32 {
    let long = u64::from(long);
    let scaled = (u64::from(short) * u64::from(max_dim) * 2 + long) / (2 * long);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Integer reduction factor for the primary path: `floor(2 * longer / max_dim)`,
/// at least 1.
pub fn reduction_factor(width: u32, height: u32, max_dim: u32) -> u32 {
    let longer = u64::from(width.max(height));
    let factor = 2 * longer / u64::from(max_dim.max(1));
    u32::try_from(factor).unwrap_or(u32::MAX).max(1)
}

/// Dimensions after reducing by `factor`; partial edge blocks count as a pixel.
pub fn reduced_dimensions(width: u32, height: u32, factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    (width.div_ceil(factor), height.div_ceil(factor))
}

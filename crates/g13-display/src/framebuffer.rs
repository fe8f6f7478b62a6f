//! Canvas to LCD payload conversion.
//!
//! The canvas is reduced to luminance, quantized to one bit per pixel, and
//! packed into the panel's eight-row band layout. A pixel is lit when the
//! quantized value is white.

use hid_g13_protocol::{MonoBitmap, ProtocolResult, pack_bands};
use image::imageops::{self, BiLevel};
use image::{GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};

/// How greyscale is reduced to one bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMode {
    /// Error diffusion. Mid-tones become a dot pattern.
    #[default]
    FloydSteinberg,
    /// Lit when luminance is at or above the given level.
    Threshold(u8),
}

/// Quantize a canvas to a 1-bit bitmap of the same size.
pub fn to_monochrome(canvas: &RgbaImage, mode: DitherMode) -> MonoBitmap {
    let mut gray: GrayImage = imageops::grayscale(canvas);
    let lit_at = match mode {
        DitherMode::FloydSteinberg => {
            imageops::dither(&mut gray, &BiLevel);
            u8::MAX
        }
        DitherMode::Threshold(level) => level,
    };
    MonoBitmap::from_fn(gray.width(), gray.height(), |x, y| {
        gray.get_pixel(x, y).0[0] >= lit_at
    })
}

/// Quantize and pack a canvas into an LCD payload.
pub fn encode(canvas: &RgbaImage, mode: DitherMode) -> ProtocolResult<Vec<u8>> {
    pack_bands(&to_monochrome(canvas, mode))
}

/// Expand a bitmap back to an 8-bit greyscale image, lit pixels white.
pub fn bitmap_to_image(bitmap: &MonoBitmap) -> GrayImage {
    GrayImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        Luma([if bitmap.get(x, y) { u8::MAX } else { 0 }])
    })
}

//! Packed monochrome bitmap codec.
//!
//! The LCD takes eight vertically stacked pixels per byte. Rows are grouped
//! into bands of eight; bands are laid out top to bottom, and within a band
//! there is one byte per column, left to right. Bit `k` (LSB first) of the
//! byte at band `r`, column `c` holds pixel `(c, r * 8 + k)`.
//!
//! Polarity: a set bit lights the pixel. An "on" pixel in [`MonoBitmap`]
//! is a light pixel, so a blank (all off) bitmap packs to all zeros.

use crate::{ProtocolError, ProtocolResult};

/// A 1-bit raster, row-major, `true` = lit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonoBitmap {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl MonoBitmap {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![false; len],
        }
    }

    /// Build a bitmap by evaluating `lit(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut lit: impl FnMut(u32, u32) -> bool) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| lit(x, y))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize) * (self.width as usize) + (x as usize))
    }

    /// Out-of-bounds reads are off.
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.index(x, y)
            .and_then(|i| self.pixels.get(i).copied())
            .unwrap_or(false)
    }

    /// Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, lit: bool) {
        if let Some(pixel) = self.index(x, y).and_then(|i| self.pixels.get_mut(i)) {
            *pixel = lit;
        }
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }
}

/// Packed size for a `width` x `height` bitmap.
pub fn packed_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize / 8)
}

fn check_dimensions(width: u32, height: u32) -> ProtocolResult<()> {
    if height % 8 != 0 {
        return Err(ProtocolError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Pack a bitmap into the LCD's band layout.
pub fn pack_bands(bitmap: &MonoBitmap) -> ProtocolResult<Vec<u8>> {
    let (width, height) = (bitmap.width(), bitmap.height());
    check_dimensions(width, height)?;

    let mut out = Vec::with_capacity(packed_len(width, height));
    for band in 0..height / 8 {
        for column in 0..width {
            let byte = (0..8u32)
                .filter(|k| bitmap.get(column, band * 8 + k))
                .fold(0u8, |acc, k| acc | (1 << k));
            out.push(byte);
        }
    }
    Ok(out)
}

/// Inverse of [`pack_bands`].
pub fn unpack_bands(bytes: &[u8], width: u32, height: u32) -> ProtocolResult<MonoBitmap> {
    check_dimensions(width, height)?;
    let expected = packed_len(width, height);
    if bytes.len() != expected {
        return Err(ProtocolError::InvalidPayload {
            expected,
            actual: bytes.len(),
        });
    }

    Ok(MonoBitmap::from_fn(width, height, |x, y| {
        let index = ((y / 8) as usize) * (width as usize) + (x as usize);
        bytes
            .get(index)
            .is_some_and(|byte| byte & (1 << (y % 8)) != 0)
    }))
}

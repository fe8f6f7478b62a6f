//! The renderable unit of a scene.

use image::DynamicImage;

/// An image placed on the canvas. Offsets may be negative or run past the
/// canvas edge; the compositor clips.
#[derive(Debug, Clone)]
pub struct RenderedLayer {
    pub image: DynamicImage,
    pub x: i64,
    pub y: i64,
}

impl RenderedLayer {
    pub fn new(image: impl Into<DynamicImage>, x: i64, y: i64) -> Self {
        Self {
            image: image.into(),
            x,
            y,
        }
    }
}

/// Something that can be drawn onto the LCD canvas.
///
/// Images with an alpha channel are blended; images without one are pasted
/// opaquely.
pub trait Layer: Send {
    /// Produce this layer's image for the current frame, or nothing.
    fn render(&mut self) -> Option<RenderedLayer>;

    /// Whether `render` would produce something different from last time.
    fn is_dirty(&self) -> bool {
        true
    }
}

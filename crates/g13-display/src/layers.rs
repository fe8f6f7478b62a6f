//! Stock layers.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::DisplayResult;
use crate::layer::{Layer, RenderedLayer};

/// A static image at a fixed position. Dirty until rendered, and again after
/// any change.
#[derive(Debug, Clone)]
pub struct ImageLayer {
    image: DynamicImage,
    x: i64,
    y: i64,
    dirty: bool,
}

impl ImageLayer {
    pub fn new(image: impl Into<DynamicImage>, x: i64, y: i64) -> Self {
        Self {
            image: image.into(),
            x,
            y,
            dirty: true,
        }
    }

    /// Load an image file (PNG) and place it at `(x, y)`.
    pub fn open(path: impl AsRef<Path>, x: i64, y: i64) -> DisplayResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)?;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Loaded layer image"
        );
        Ok(Self::new(image, x, y))
    }

    pub fn set_image(&mut self, image: impl Into<DynamicImage>) {
        self.image = image.into();
        self.dirty = true;
    }

    pub fn set_position(&mut self, x: i64, y: i64) {
        if (self.x, self.y) != (x, y) {
            self.x = x;
            self.y = y;
            self.dirty = true;
        }
    }

    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }
}

impl Layer for ImageLayer {
    fn render(&mut self) -> Option<RenderedLayer> {
        self.dirty = false;
        Some(RenderedLayer::new(self.image.clone(), self.x, self.y))
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// An image that fades to black over a fixed number of renders, then
/// disappears.
///
/// Each render advances the fade by one step before drawing. At step `t` of
/// `n` the image is scaled by `255 * (1 - t/n)` and drawn opaque, so it
/// darkens whatever lies beneath it rather than revealing it. From step `n`
/// on the layer renders nothing.
#[derive(Debug, Clone)]
pub struct FadingImageLayer {
    source: GrayImage,
    x: i64,
    y: i64,
    fade_steps: u32,
    step: u32,
    finished: bool,
}

impl FadingImageLayer {
    pub const DEFAULT_FADE_STEPS: u32 = 30;

    pub fn new(image: &DynamicImage, x: i64, y: i64) -> Self {
        Self::with_fade_steps(image, x, y, Self::DEFAULT_FADE_STEPS)
    }

    pub fn with_fade_steps(image: &DynamicImage, x: i64, y: i64, fade_steps: u32) -> Self {
        Self {
            source: image.to_luma8(),
            x,
            y,
            fade_steps: fade_steps.max(1),
            step: 0,
            finished: false,
        }
    }

    /// Brightness multiplier (0..=255) for the given step.
    pub fn alpha_at(&self, step: u32) -> u8 {
        if step >= self.fade_steps {
            return 0;
        }
        let remaining = u64::from(self.fade_steps - step);
        // remaining < fade_steps, so the quotient is below 255.
        ((255 * remaining) / u64::from(self.fade_steps)) as u8
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn step(&self) -> u32 {
        self.step
    }
}

impl Layer for FadingImageLayer {
    fn render(&mut self) -> Option<RenderedLayer> {
        if self.finished {
            return None;
        }

        self.step = self.step.saturating_add(1);
        if self.step >= self.fade_steps {
            self.finished = true;
            return None;
        }

        let alpha = u32::from(self.alpha_at(self.step));
        let faded = GrayImage::from_fn(self.source.width(), self.source.height(), |x, y| {
            let value = u32::from(self.source.get_pixel(x, y).0[0]);
            Luma([((value * alpha) / 255) as u8])
        });
        Some(RenderedLayer::new(faded, self.x, self.y))
    }

    fn is_dirty(&self) -> bool {
        !self.finished
    }
}

/// A filled rectangle, lit or dark.
#[derive(Debug, Clone)]
pub struct SolidLayer {
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    lit: bool,
    dirty: bool,
}

impl SolidLayer {
    pub fn new(x: i64, y: i64, width: u32, height: u32, lit: bool) -> Self {
        Self {
            x,
            y,
            width,
            height,
            lit,
            dirty: true,
        }
    }

    pub fn set_lit(&mut self, lit: bool) {
        if self.lit != lit {
            self.lit = lit;
            self.dirty = true;
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl Layer for SolidLayer {
    fn render(&mut self) -> Option<RenderedLayer> {
        self.dirty = false;
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let value = if self.lit { 255 } else { 0 };
        let image = GrayImage::from_pixel(self.width, self.height, Luma([value]));
        Some(RenderedLayer::new(image, self.x, self.y))
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255])))
    }

    #[test]
    fn image_layer_is_clean_after_render_until_changed() {
        let mut layer = ImageLayer::new(white(4, 4), 0, 0);
        assert!(layer.is_dirty());
        assert!(layer.render().is_some());
        assert!(!layer.is_dirty());

        layer.set_position(0, 0);
        assert!(!layer.is_dirty());

        layer.set_position(3, 1);
        assert!(layer.is_dirty());
        let rendered = layer.render();
        assert!(matches!(rendered, Some(RenderedLayer { x: 3, y: 1, .. })));

        layer.set_image(white(2, 2));
        assert!(layer.is_dirty());
    }

    #[test]
    fn fading_layer_darkens_then_disappears() {
        let mut layer = FadingImageLayer::new(&white(2, 2), 5, 6);

        let mut brightness = Vec::new();
        while let Some(rendered) = layer.render() {
            assert_eq!((rendered.x, rendered.y), (5, 6));
            assert!(!rendered.image.color().has_alpha());
            brightness.push(rendered.image.to_luma8().get_pixel(0, 0).0[0]);
        }

        assert_eq!(brightness.len(), 29);
        assert_eq!(brightness.first(), Some(&246));
        assert!(brightness.windows(2).all(|w| w[0] >= w[1]));
        assert!(layer.is_finished());
        assert!(!layer.is_dirty());
        assert!(layer.render().is_none());
    }

    #[test]
    fn fading_alpha_matches_linear_ramp() {
        let layer = FadingImageLayer::with_fade_steps(&white(1, 1), 0, 0, 30);
        assert_eq!(layer.alpha_at(0), 255);
        assert_eq!(layer.alpha_at(15), 127);
        assert_eq!(layer.alpha_at(29), 8);
        assert_eq!(layer.alpha_at(30), 0);
    }

    #[test]
    fn solid_layer_only_dirty_on_change() {
        let mut layer = SolidLayer::new(0, 0, 10, 2, true);
        let rendered = layer.render();
        assert!(rendered.is_some());
        assert!(!layer.is_dirty());

        layer.set_lit(true);
        assert!(!layer.is_dirty());
        layer.set_lit(false);
        assert!(layer.is_dirty());
    }

    #[test]
    fn empty_solid_layer_renders_nothing() {
        let mut layer = SolidLayer::new(0, 0, 0, 5, true);
        assert!(layer.render().is_none());
    }
}

//! Flattens a stack of layers onto the LCD canvas.

use hid_g13_protocol::ids::lcd;
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use tracing::trace;

use crate::layer::{Layer, RenderedLayer};

/// Layers in paint order, bottom first.
pub type Scene = Vec<Box<dyn Layer>>;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

pub struct Compositor {
    width: u32,
    height: u32,
    scene: Scene,
    canvas: RgbaImage,
    scene_changed: bool,
    renders: u64,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scene: Vec::new(),
            canvas: RgbaImage::from_pixel(width, height, BACKGROUND),
            scene_changed: true,
            renders: 0,
        }
    }

    /// A compositor sized for the G13 panel.
    pub fn g13() -> Self {
        Self::new(lcd::WIDTH, lcd::HEIGHT)
    }

    /// Replace the whole scene. The next [`compose`](Self::compose) repaints.
    pub fn set_scene(&mut self, scene: Scene) {
        trace!(layers = scene.len(), "Scene replaced");
        self.scene = scene;
        self.scene_changed = true;
    }

    pub fn scene_len(&self) -> usize {
        self.scene.len()
    }

    /// True if the scene was replaced or any layer reports itself dirty.
    pub fn needs_render(&self) -> bool {
        self.scene_changed || self.scene.iter().any(|layer| layer.is_dirty())
    }

    /// Number of times the canvas was actually repainted.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Paint the scene onto a black canvas, or return the previous canvas if
    /// nothing changed.
    pub fn compose(&mut self) -> &RgbaImage {
        if !self.needs_render() {
            return &self.canvas;
        }

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        for layer in &mut self.scene {
            if let Some(rendered) = layer.render() {
                paint(&mut canvas, &rendered);
            }
        }

        self.canvas = canvas;
        self.scene_changed = false;
        self.renders += 1;
        &self.canvas
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::g13()
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.scene.len())
            .field("renders", &self.renders)
            .finish()
    }
}

fn paint(canvas: &mut RgbaImage, layer: &RenderedLayer) {
    let has_alpha = layer.image.color().has_alpha();
    let top = match &layer.image {
        DynamicImage::ImageRgba8(image) => image.clone(),
        other => other.to_rgba8(),
    };
    if has_alpha {
        imageops::overlay(canvas, &top, layer.x, layer.y);
    } else {
        imageops::replace(canvas, &top, layer.x, layer.y);
    }
}

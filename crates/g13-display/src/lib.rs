//! LCD composition and output for the G13.
//!
//! A [`Compositor`] flattens a [`Scene`] (an ordered stack of [`Layer`]s)
//! onto a 160x48 canvas. The [`framebuffer`] module reduces that canvas to
//! one bit per pixel and packs it into the device's band layout.
//! [`DisplayOutput`] ties both to the transport on a periodic tick and
//! tracks LED and backlight state.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod compositor;
pub mod framebuffer;
pub mod layer;
pub mod layers;
pub mod output;

pub use compositor::{Compositor, Scene};
pub use framebuffer::{DitherMode, bitmap_to_image, encode, to_monochrome};
pub use layer::{Layer, RenderedLayer};
pub use layers::{FadingImageLayer, ImageLayer, SolidLayer};
pub use output::{DisplayOutput, OutputSink};

use g13_errors::TransportError;
use hid_g13_protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type DisplayResult<T> = Result<T, DisplayError>;

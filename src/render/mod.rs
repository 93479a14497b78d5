pub mod axis;
pub mod glyph;
pub mod renderer;

pub use renderer::{gaussian_weights, quantize, LineFeed, Renderer};

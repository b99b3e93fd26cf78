//! Pixel set domain entities.

pub mod model;

pub use model::Pixels;

//! Rendering settings domain entities.

pub mod model;

pub use model::{NewRenderingSettings, RenderingModel, RenderingSettings};

//! Core type definitions used across the ThumbHub workspace.

pub mod id;

pub use id::*;

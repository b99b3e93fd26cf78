//! Thumbnail dimensions value object.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width and height of a thumbnail, in pixels.
///
/// Ordered by width, then height, so pools iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Dimensions {
    /// Create a dimensions pair.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// The longer of the two sides.
    pub fn longest_side(&self) -> i32 {
        self.width.max(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

//! Image dimensions for exposure planes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of an exposure plane in pixels.
///
/// Array planes use row-major (height, width) shape ordering; this type keeps
/// the conventional width-first presentation for display and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels (columns)
    pub width: usize,
    /// Height in pixels (rows)
    pub height: usize,
}

impl ImageSize {
    /// Create a new ImageSize
    pub fn from_width_height(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Array shape as (rows, columns) for constructing ndarray planes
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

impl From<(usize, usize)> for ImageSize {
    fn from((width, height): (usize, usize)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_is_row_major() {
        let size = ImageSize::from_width_height(640, 480);
        assert_eq!(size.shape(), (480, 640));
        assert_eq!(size.pixel_count(), 640 * 480);
    }

    #[test]
    fn test_display() {
        let size = ImageSize::from_width_height(100, 99);
        assert_eq!(size.to_string(), "100x99");
    }

    #[test]
    fn test_equality() {
        let a = ImageSize::from_width_height(100, 100);
        let b = ImageSize::from((100, 100));
        let c = ImageSize::from_width_height(100, 99);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}

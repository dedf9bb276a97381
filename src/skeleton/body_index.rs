//! Per-pixel body-index frame handed to the visualization collaborator.

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

use crate::skeleton::body::TrackingIndex;

/// Sentinel pixel value meaning "no body owns this pixel".
pub const NO_BODY: u8 = 255;

/// Fixed pixel dimensions of a backend's body-index image.
///
/// Reported by the adapter before the first frame so consumers can allocate
/// their buffers up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    #[inline]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn pixel_count(self) -> usize {
        self.width * self.height
    }
}

/// Raised when a backend delivers a pixel buffer that does not match its
/// advertised image size.
#[derive(Debug, Error)]
#[error("body index buffer holds {actual} pixels, expected {expected} for {width}x{height}")]
pub struct BodyIndexSizeError {
    pub width: usize,
    pub height: usize,
    pub expected: usize,
    pub actual: usize,
}

/// One frame of per-pixel body classification.
///
/// Each pixel holds the [`TrackingIndex`] of the body covering it, or
/// [`NO_BODY`]. Regenerated every delivered frame and never retained by the
/// core.
#[derive(Debug, Clone)]
pub struct BodyIndexFrame {
    pixels: Array2<u8>,
}

impl BodyIndexFrame {
    /// Wrap a row-major pixel buffer of exactly `size.pixel_count()` bytes.
    pub fn from_raw(size: ImageSize, pixels: Vec<u8>) -> Result<Self, BodyIndexSizeError> {
        let actual = pixels.len();
        let pixels = Array2::from_shape_vec((size.height, size.width), pixels).map_err(|_| {
            BodyIndexSizeError {
                width: size.width,
                height: size.height,
                expected: size.pixel_count(),
                actual,
            }
        })?;
        Ok(Self { pixels })
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        let (height, width) = self.pixels.dim();
        ImageSize::new(width, height)
    }

    /// Row-major view of the classification buffer.
    #[inline]
    pub fn pixels(&self) -> ArrayView2<'_, u8> {
        self.pixels.view()
    }

    /// Body index at pixel coordinates, or `None` outside the image.
    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> Option<TrackingIndex> {
        self.pixels.get((y, x)).copied()
    }

    /// Whether this pixel value identifies a body rather than background.
    #[inline]
    pub fn is_body(value: u8) -> bool {
        value != NO_BODY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_checks_length() {
        let size = ImageSize::new(4, 2);
        assert!(BodyIndexFrame::from_raw(size, vec![NO_BODY; 8]).is_ok());
        let err = BodyIndexFrame::from_raw(size, vec![NO_BODY; 7]).unwrap_err();
        assert_eq!(err.expected, 8);
        assert_eq!(err.actual, 7);
    }

    #[test]
    fn test_index_lookup() {
        let size = ImageSize::new(3, 2);
        // Row-major: second row is [1, 1, NO_BODY].
        let frame =
            BodyIndexFrame::from_raw(size, vec![NO_BODY, NO_BODY, NO_BODY, 1, 1, NO_BODY]).unwrap();
        assert_eq!(frame.size(), size);
        assert_eq!(frame.index_at(0, 1), Some(1));
        assert_eq!(frame.index_at(2, 1), Some(NO_BODY));
        assert_eq!(frame.index_at(3, 0), None);
        assert!(BodyIndexFrame::is_body(0));
        assert!(!BodyIndexFrame::is_body(NO_BODY));
    }
}

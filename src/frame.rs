//! # Stereo frames
//!
//! Grayscale floating point images and the rectified left/right pair the matchers consume.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{DynamicImage, GrayImage};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A row-major grayscale image with `f32` intensities.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayFloatImage {
    width: usize,
    height: usize,
    data: Vec<f32>
}

/// A rectified stereo pair. Both images always share the same shape.
#[derive(Clone, Debug)]
pub struct StereoFrame {
    pub left: GrayFloatImage,
    pub right: GrayFloatImage
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl GrayFloatImage {
    /// Create a new black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height]
        }
    }

    /// Wrap a row-major buffer of intensities.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::InvalidImageData {
                expected: width * height,
                actual: data.len()
            });
        }

        Ok(Self { width, height, data })
    }

    /// Convert an 8-bit luma image, keeping intensities on the 0-255 scale.
    pub fn from_luma(img: &GrayImage) -> Self {
        let data = img.pixels().map(|p| p[0] as f32).collect();

        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data
        }
    }

    /// Convert any dynamic image by first reducing it to 8-bit luma.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        Self::from_luma(&img.to_luma8())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Shape as `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Get the intensity at column `x`, row `y`.
    ///
    /// Panics if the coordinates are outside the image.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Set the intensity at column `x`, row `y`.
    pub fn put(&mut self, x: usize, y: usize, val: f32) {
        self.data[y * self.width + x] = val;
    }

    /// Copy out a `width x height` window whose top left corner is at `(left, top)`.
    ///
    /// Returns `None` when any part of the window falls outside the image, so callers decide
    /// whether that means skipping a candidate or abandoning a search round.
    pub fn patch(&self, left: isize, top: isize, width: usize, height: usize) -> Option<Vec<f32>> {
        if left < 0 || top < 0 {
            return None;
        }

        let (left, top) = (left as usize, top as usize);
        let fits_x = left.checked_add(width).map_or(false, |r| r <= self.width);
        let fits_y = top.checked_add(height).map_or(false, |b| b <= self.height);
        if !fits_x || !fits_y {
            return None;
        }

        let mut out = Vec::with_capacity(width * height);
        for y in top..(top + height) {
            let start = y * self.width + left;
            out.extend_from_slice(&self.data[start..(start + width)]);
        }

        Some(out)
    }

    /// Copy out the square window of the given radius centred on `(x, y)`.
    pub fn centred_patch(&self, x: usize, y: usize, radius: usize) -> Option<Vec<f32>> {
        let side = 2 * radius + 1;
        self.patch(
            x as isize - radius as isize,
            y as isize - radius as isize,
            side,
            side
        )
    }
}

impl StereoFrame {
    /// Pair two images, checking that they have the same shape.
    pub fn new(left: GrayFloatImage, right: GrayFloatImage) -> Result<Self> {
        check_shapes(&left, &right)?;
        Ok(Self { left, right })
    }

    pub fn width(&self) -> usize {
        self.left.width()
    }

    pub fn height(&self) -> usize {
        self.left.height()
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Ensure a left/right pair share the same shape.
pub(crate) fn check_shapes(left: &GrayFloatImage, right: &GrayFloatImage) -> Result<()> {
    if left.dimensions() != right.dimensions() {
        return Err(Error::ImageShapeMismatch {
            left: left.dimensions(),
            right: right.dimensions()
        });
    }

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

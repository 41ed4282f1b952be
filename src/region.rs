//! # Region of interest
//!
//! Inclusive bounding boxes used to restrict disparity computation to part of the left image.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// An integer pixel position, `x` being the column and `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize
}

/// An axis-aligned box in left image coordinates. Both corners are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct BoundingBox {
    pub top_left: Point,
    pub bottom_right: Point
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl BoundingBox {
    pub fn new(top_left: Point, bottom_right: Point) -> Self {
        Self { top_left, bottom_right }
    }

    /// Box covering the whole of a `width x height` image.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, since no inclusive box can describe an empty image.
    /// Use [`BoundingBox::new`] followed by [`BoundingBox::validate`] when the shape is not known
    /// to be non-empty.
    pub fn full(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "cannot bound an empty image");
        Self::new(Point::new(0, 0), Point::new(width - 1, height - 1))
    }

    /// Number of columns covered.
    pub fn width(&self) -> usize {
        self.bottom_right.x - self.top_left.x + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> usize {
        self.bottom_right.y - self.top_left.y + 1
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.top_left.x && x <= self.bottom_right.x
            && y >= self.top_left.y && y <= self.bottom_right.y
    }

    /// Check the corners are ordered and lie inside a `width x height` image.
    pub fn validate(&self, width: usize, height: usize) -> Result<()> {
        let ordered = self.top_left.x <= self.bottom_right.x
            && self.top_left.y <= self.bottom_right.y;
        let inside = self.bottom_right.x < width && self.bottom_right.y < height;

        if ordered && inside {
            Ok(())
        }
        else {
            Err(Error::InvalidBoundingBox {
                tl_x: self.top_left.x,
                tl_y: self.top_left.y,
                br_x: self.bottom_right.x,
                br_y: self.bottom_right.y,
                width,
                height
            })
        }
    }

    /// Clip the half-open span `[start, start + len)` along x to the box, returning the columns
    /// that remain.
    pub(crate) fn clip_cols(&self, start: usize, len: usize) -> std::ops::RangeInclusive<usize> {
        start..=start.saturating_add(len - 1).min(self.bottom_right.x)
    }

    /// Row equivalent of `clip_cols`.
    pub(crate) fn clip_rows(&self, start: usize, len: usize) -> std::ops::RangeInclusive<usize> {
        start..=start.saturating_add(len - 1).min(self.bottom_right.y)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

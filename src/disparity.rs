//! # General disparity objects
//!
//! This module provides generic disparity traits and structures for use by different algorithms.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use crate::error::*;
use crate::frame::StereoFrame;
use crate::region::BoundingBox;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// An integer disparity map with the same shape as the left image it was computed from.
///
/// Pixels outside the computed region hold `0`. Use [`DisparityMap::get_checked`] to tell them
/// apart from a genuine zero disparity.
#[derive(Clone, Debug, PartialEq)]
pub struct DisparityMap {
    width: usize,
    height: usize,
    data: Vec<u32>,
    region: BoundingBox,
    pub max_disp: Option<u32>,
    pub min_disp: Option<u32>
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait DisparityAlgorithm {
    /// Compute the disparity map of the given stereo frame inside the bounding box.
    fn compute(&self, frame: &StereoFrame, bbox: &BoundingBox) -> Result<DisparityMap>;
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    /// Create an all-zero map which will be filled inside `region`.
    pub fn new(width: usize, height: usize, region: BoundingBox) -> Self {
        DisparityMap {
            width,
            height,
            data: vec![0; width * height],
            region,
            min_disp: None,
            max_disp: None
        }
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

    /// The region the map was computed over.
    pub fn region(&self) -> &BoundingBox {
        &self.region
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.width + x]
    }

    /// Get the disparity at `(x, y)`, or `None` if the pixel was never computed.
    pub fn get_checked(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height && self.region.contains(x, y) {
            Some(self.get(x, y))
        }
        else {
            None
        }
    }

    pub fn put(&mut self, x: usize, y: usize, val: u32) {
        self.data[y * self.width + x] = val;
    }

    /// Raw row-major disparities.
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    /// Write `val` to every pixel of the inclusive rectangle.
    pub(crate) fn fill(
        &mut self,
        cols: std::ops::RangeInclusive<usize>,
        rows: std::ops::RangeInclusive<usize>,
        val: u32
    ) {
        for y in rows {
            let row = y * self.width;
            for x in cols.clone() {
                self.data[row + x] = val;
            }
        }
    }

    /// Recompute `min_disp` and `max_disp` over the computed region.
    pub(crate) fn update_stats(&mut self) {
        let mut min_disp = None;
        let mut max_disp = None;

        for y in self.region.top_left.y..=self.region.bottom_right.y {
            for x in self.region.top_left.x..=self.region.bottom_right.x {
                let d = self.get(x, y);
                min_disp = Some(min_disp.map_or(d, |m: u32| m.min(d)));
                max_disp = Some(max_disp.map_or(d, |m: u32| m.max(d)));
            }
        }

        self.min_disp = min_disp;
        self.max_disp = max_disp;
    }

    /// Converts the map into a Luma8 image, clamping disparities above 255.
    pub fn to_luma(&self) -> GrayImage {

        let mut new = image::GrayImage::new(self.width as u32, self.height as u32);

        for y in 0..new.height() {
            for x in 0..new.width() {
                let val = self.get(x as usize, y as usize).min(255);
                *new.get_pixel_mut(x, y) = image::Luma([val as u8]);
            }
        }

        new
    }

    /// Converts the map to a normalised GrayImage.
    ///
    /// Normalises by the maximum observed disparity in the map. If the maximum disparity is not
    /// set, or is zero, then the function is equivalent to `.to_luma()`.
    pub fn to_luma_normalised(&self) -> GrayImage {

        let mut new = image::GrayImage::new(self.width as u32, self.height as u32);

        let mult = match self.max_disp {
            Some(d) if d > 0 => 255.0 / d as f32,
            _ => 1.0
        };

        for y in 0..new.height() {
            for x in 0..new.width() {
                let mut val = self.get(x as usize, y as usize) as f32 * mult;

                if val > 255.0 {
                    val = 255.0;
                }

                *new.get_pixel_mut(x, y) = image::Luma([val as u8]);
            }
        }

        new
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

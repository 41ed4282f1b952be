//! Synthetic stereo scenes shared by the integration tests.

#![allow(dead_code)]

use cv_stereo_match::prelude::*;
use image::{GrayImage, Luma};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

/// Brightness of the square drawn by `square_pair`.
pub const SQUARE_LUMA: u8 = 200;

/// A 20x20 black pair with a bright 5x5 square at columns 10..15, rows 10..15 of the left image,
/// moved `shift` columns to the left in the right image.
pub fn square_pair(shift: i32) -> (GrayFloatImage, GrayFloatImage) {
    let mut left = GrayImage::new(20, 20);
    draw_filled_rect_mut(&mut left, Rect::at(10, 10).of_size(5, 5), Luma([SQUARE_LUMA]));

    let mut right = GrayImage::new(20, 20);
    draw_filled_rect_mut(&mut right, Rect::at(10 - shift, 10).of_size(5, 5), Luma([SQUARE_LUMA]));

    (GrayFloatImage::from_luma(&left), GrayFloatImage::from_luma(&right))
}

/// Pseudo-random 8-bit texture, repeatable for a given seed.
pub fn texture(width: usize, height: usize, seed: u64) -> GrayImage {
    let mut state = seed;
    GrayImage::from_fn(width as u32, height as u32, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        Luma([(state >> 56) as u8])
    })
}

/// A textured pair where every left pixel appears `shift` columns further left in the right
/// image.
pub fn textured_pair(width: usize, height: usize, shift: usize) -> (GrayFloatImage, GrayFloatImage) {
    let base = texture(width + shift, height, 7);

    let left = GrayImage::from_fn(width as u32, height as u32, |x, y| *base.get_pixel(x, y));
    let right = GrayImage::from_fn(width as u32, height as u32, |x, y| {
        *base.get_pixel(x + shift as u32, y)
    });

    (GrayFloatImage::from_luma(&left), GrayFloatImage::from_luma(&right))
}

/// Assert every pixel outside the map's bounding box holds the zero sentinel.
pub fn assert_zero_outside(map: &DisparityMap, bbox: &BoundingBox) {
    for y in 0..map.height() {
        for x in 0..map.width() {
            if !bbox.contains(x, y) {
                assert_eq!(map.get(x, y), 0, "pixel ({}, {}) outside the box was written", x, y);
                assert_eq!(map.get_checked(x, y), None);
            }
        }
    }
}

/// Assert every pixel inside the box lies in `0..=max_disparity`.
pub fn assert_in_range(map: &DisparityMap, bbox: &BoundingBox, max_disparity: usize) {
    for y in bbox.top_left.y..=bbox.bottom_right.y {
        for x in bbox.top_left.x..=bbox.bottom_right.x {
            let d = map.get(x, y) as usize;
            assert!(d <= max_disparity, "disparity {} at ({}, {}) exceeds {}", d, x, y, max_disparity);
        }
    }
}

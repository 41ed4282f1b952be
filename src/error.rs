//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the stereo matching crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Left image is {left:?} (w, h) but right image is {right:?}")]
    ImageShapeMismatch {
        left: (usize, usize),
        right: (usize, usize)
    },

    #[error(
        "Bounding box ({tl_x}, {tl_y})..=({br_x}, {br_y}) is invalid for a {width}x{height} image"
    )]
    InvalidBoundingBox {
        tl_x: usize,
        tl_y: usize,
        br_x: usize,
        br_y: usize,
        width: usize,
        height: usize
    },

    #[error("Invalid matcher parameters: {0}")]
    InvalidParams(String),

    #[error("Image buffer holds {actual} samples but {expected} were expected")]
    InvalidImageData {
        expected: usize,
        actual: usize
    }
}

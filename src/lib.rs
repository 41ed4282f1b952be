//! # Stereo Matching
//!
//! This crate provides integer disparity map computation for rectified stereo image pairs, over
//! a rectangular region of interest in the left image.
//!
//! Two matchers share the same contract:
//!
//! - [`fast::FastBlockMatcher`] assigns one SAD-matched disparity to each fixed block,
//! - [`adaptive::AdaptiveMatcher`] narrows down candidates with growing windows per tile and
//!   median filters the result.
//!
//! ```no_run
//! use cv_stereo_match::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let left = GrayFloatImage::from_dynamic(&image::open("left.png")?);
//! let right = GrayFloatImage::from_dynamic(&image::open("right.png")?);
//! let bbox = BoundingBox::full(left.width(), left.height());
//!
//! let disp = compute_best(&left, &right, &bbox, 64)?;
//! disp.to_luma_normalised().save("disparity.png")?;
//! # Ok(())
//! # }
//! ```

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod disparity;
mod error;
mod frame;
mod region;
pub mod adaptive;
pub mod fast;
pub mod filter;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::adaptive::{compute_best, AdaptiveMatcher, AdaptiveParams};
    pub use crate::disparity::{DisparityAlgorithm, DisparityMap};
    pub use crate::error::Error;
    pub use crate::fast::{compute_fast, FastBlockMatcher, FastParams};
    pub use crate::frame::{GrayFloatImage, StereoFrame};
    pub use crate::region::{BoundingBox, Point};
}

//! # Fast block matching
//!
//! Splits the region of interest into fixed, non-overlapping square blocks and gives each block
//! the disparity minimising the sum of absolute differences against the right image. There is no
//! post filtering, so expect blocky edges around objects.
//!
//! Blocks which would cross the bottom or right edge of the region are not matched and keep the
//! zero sentinel.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::Deserialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::disparity::{DisparityAlgorithm, DisparityMap};
use crate::error::*;
use crate::frame::{check_shapes, GrayFloatImage, StereoFrame};
use crate::region::BoundingBox;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct FastBlockMatcher {
    params: FastParams
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FastParams {
    pub max_disparity: usize,
    /// Side length of the square blocks, in pixels.
    pub block_size: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for FastParams {
    fn default() -> Self {
        Self {
            max_disparity: 64,
            block_size: 5
        }
    }
}

impl FastParams {
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidParams("block_size must be at least 1".into()));
        }

        Ok(())
    }
}

impl FastBlockMatcher {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: FastParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FastParams {
        &self.params
    }

    /// Compute the disparity map of a left/right pair inside the bounding box.
    pub fn compute_pair(
        &self,
        left: &GrayFloatImage,
        right: &GrayFloatImage,
        bbox: &BoundingBox
    ) -> Result<DisparityMap> {
        self.params.validate()?;
        check_shapes(left, right)?;
        bbox.validate(left.width(), left.height())?;

        debug!(
            "Fast block matching {}x{} image over {:?} with {:?}",
            left.width(), left.height(), bbox, self.params
        );

        let size = self.params.block_size;
        let mut disp_map = DisparityMap::new(left.width(), left.height(), *bbox);

        let cols: Vec<usize> = block_origins(bbox.top_left.x, bbox.bottom_right.x, size).collect();
        let rows: Vec<usize> = block_origins(bbox.top_left.y, bbox.bottom_right.y, size).collect();

        // Each block row is independent, results are written back once all rows are done
        #[cfg(feature = "parallel")]
        let row_iter = rows.par_iter();
        #[cfg(not(feature = "parallel"))]
        let row_iter = rows.iter();

        let row_disps: Vec<(usize, Vec<u32>)> = row_iter
            .map(|&y| {
                trace!("Matching block row {}", y);
                let disps = cols.iter().map(|&x| self.match_block(left, right, x, y)).collect();
                (y, disps)
            })
            .collect();

        for (y, disps) in row_disps {
            for (&x, d) in cols.iter().zip(disps) {
                disp_map.fill(x..=(x + size - 1), y..=(y + size - 1), d);
            }
        }

        disp_map.update_stats();

        debug!(
            "Fast block matching complete, disparity range {:?}..={:?}",
            disp_map.min_disp, disp_map.max_disp
        );

        Ok(disp_map)
    }

    /// Find the disparity of the block whose top left corner is at `(x, y)`.
    ///
    /// Right image candidates are visited from column `x` downwards, so the first candidate is
    /// disparity 0. Only a strictly lower SAD replaces the current best, meaning ties resolve to
    /// the smallest disparity.
    fn match_block(
        &self,
        left: &GrayFloatImage,
        right: &GrayFloatImage,
        x: usize,
        y: usize
    ) -> u32 {
        let size = self.params.block_size;

        let left_patch = match left.patch(x as isize, y as isize, size, size) {
            Some(p) => p,
            None => return 0
        };

        let mut lowest_sad = f32::INFINITY;
        let mut best_disp = 0;

        // Columns left of 0 never yield a window, so the search stops at column 0
        for d in 0..=self.params.max_disparity.min(x) {
            let xr = x as isize - d as isize;

            // Right window is aligned with the candidate column, covering xr..xr + size
            let right_patch = match right.patch(xr, y as isize, size, size) {
                Some(p) => p,
                None => continue
            };

            let sad = sad(&left_patch, &right_patch);
            if sad < lowest_sad {
                lowest_sad = sad;
                best_disp = d as u32;
            }
        }

        best_disp
    }
}

impl DisparityAlgorithm for FastBlockMatcher {
    fn compute(&self, frame: &StereoFrame, bbox: &BoundingBox) -> Result<DisparityMap> {
        self.compute_pair(&frame.left, &frame.right, bbox)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Fast block matching with default parameters and the given maximum disparity.
pub fn compute_fast(
    left: &GrayFloatImage,
    right: &GrayFloatImage,
    bbox: &BoundingBox,
    max_disparity: usize
) -> Result<DisparityMap> {
    FastBlockMatcher::new(FastParams {
        max_disparity,
        ..FastParams::default()
    })
    .compute_pair(left, right, bbox)
}

/// Origins of the blocks of `size` which fit entirely within `start..=end`.
fn block_origins(start: usize, end: usize, size: usize) -> impl Iterator<Item = usize> {
    (start..=end)
        .step_by(size)
        .take_while(move |&o| o.checked_add(size - 1).map_or(false, |last| last <= end))
}

/// Sum of absolute differences between two equally sized patches.
fn sad(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(l, r)| (l - r).abs()).sum()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_origins_skip_partial_blocks() {
        assert_eq!(block_origins(0, 19, 5).collect::<Vec<_>>(), vec![0, 5, 10, 15]);
        assert_eq!(block_origins(0, 18, 5).collect::<Vec<_>>(), vec![0, 5, 10]);
        assert_eq!(block_origins(3, 6, 5).count(), 0);
        assert_eq!(block_origins(4, 4, 1).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn sad_sums_absolute_differences() {
        assert_eq!(sad(&[1.0, 5.0, 2.0], &[3.0, 5.0, 0.0]), 4.0);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let params = FastParams { block_size: 0, ..FastParams::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn ties_resolve_to_smallest_disparity() {
        // Flat images make every candidate cost zero
        let img = GrayFloatImage::from_vec(8, 2, vec![10.0; 16]).unwrap();
        let matcher = FastBlockMatcher::new(FastParams { max_disparity: 4, block_size: 2 });
        assert_eq!(matcher.match_block(&img, &img, 6, 0), 0);
    }

    #[test]
    fn oversized_blocks_fit_nowhere() {
        assert_eq!(block_origins(0, 19, usize::MAX).count(), 0);
        assert_eq!(block_origins(3, usize::MAX, usize::MAX).count(), 0);
    }

    #[test]
    fn search_stops_at_left_edge() {
        // Only disparities 0..=3 can be reached from column 3
        let left = GrayFloatImage::from_vec(8, 1, vec![0.0, 0.0, 0.0, 9.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        let right = GrayFloatImage::from_vec(8, 1, vec![9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        let matcher = FastBlockMatcher::new(FastParams { max_disparity: usize::MAX, block_size: 1 });
        assert_eq!(matcher.match_block(&left, &right, 3, 0), 3);
    }
}

//! # Adaptive window matching
//!
//! The more accurate of the two matchers. For every tile of the region a set of candidate right
//! image columns is narrowed down by comparing ever larger windows around the tile origin, until
//! a single candidate is left or the window reaches its maximum radius. Windows are compared by
//! counting the pixels whose intensities differ by less than a threshold, which is far less
//! sensitive to outliers than SAD.
//!
//! Tiles are assigned a single disparity each, so the finished map is median filtered to remove
//! the steps between neighbouring tiles.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::collections::HashMap;

use log::{debug, trace};
use serde::Deserialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::disparity::{DisparityAlgorithm, DisparityMap};
use crate::error::*;
use crate::filter::{footprint_len, median_filter};
use crate::frame::{check_shapes, GrayFloatImage, StereoFrame};
use crate::region::BoundingBox;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct AdaptiveMatcher {
    params: AdaptiveParams
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AdaptiveParams {
    pub max_disparity: usize,
    /// Distance between tile origins, and the side length of each tile.
    pub tile_stride: usize,
    /// Intensity difference below which two pixels count as matching.
    pub threshold: f32,
    /// Largest window radius tried before giving up on separating candidates.
    pub max_radius: usize,
    /// Side of the median filter footprint applied after all tiles are matched.
    pub filter_size: usize
}

/// Right image windows already extracted for one row of tiles, keyed by column and radius.
///
/// A cached `None` records that the window leaves the image.
#[derive(Debug, Default)]
pub struct MatchCache {
    row: usize,
    windows: HashMap<(usize, usize), Option<Vec<f32>>>
}

/// Outcome of the candidate search for a single tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMatch {
    /// Winning right image column.
    pub column: usize,
    pub disparity: u32,
    /// Size of the candidate set before the first round and after every completed round.
    pub candidate_counts: Vec<usize>,
    /// Whether the search stopped because a window left the image.
    pub aborted: bool
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            max_disparity: 64,
            tile_stride: 3,
            threshold: 5.0,
            max_radius: 7,
            filter_size: 10
        }
    }
}

impl AdaptiveParams {
    pub fn validate(&self) -> Result<()> {
        if self.tile_stride == 0 {
            return Err(Error::InvalidParams("tile_stride must be at least 1".into()));
        }
        footprint_len(self.filter_size)?;
        if !(self.threshold >= 0.0) {
            return Err(Error::InvalidParams(format!(
                "threshold must be a non-negative number, got {}", self.threshold
            )));
        }

        Ok(())
    }
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of windows currently held.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Get the right image window of `radius` centred on `(x, y)`.
    ///
    /// Asking for a different row than the cached one drops everything held so far.
    fn window(&mut self, right: &GrayFloatImage, x: usize, y: usize, radius: usize)
        -> Option<&[f32]>
    {
        if y != self.row {
            self.windows.clear();
            self.row = y;
        }

        self.windows
            .entry((x, radius))
            .or_insert_with(|| right.centred_patch(x, y, radius))
            .as_deref()
    }
}

impl AdaptiveMatcher {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: AdaptiveParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AdaptiveParams {
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
            "Adaptive matching {}x{} image over {:?} with {:?}",
            left.width(), left.height(), bbox, self.params
        );

        let stride = self.params.tile_stride;
        let mut disp_map = DisparityMap::new(left.width(), left.height(), *bbox);

        // ---- TILE SEARCH ----

        let cols: Vec<usize> = (bbox.top_left.x..=bbox.bottom_right.x).step_by(stride).collect();
        let rows: Vec<usize> = (bbox.top_left.y..=bbox.bottom_right.y).step_by(stride).collect();

        // Every row gets its own cache, so rows can be searched independently
        #[cfg(feature = "parallel")]
        let row_iter = rows.par_iter();
        #[cfg(not(feature = "parallel"))]
        let row_iter = rows.iter();

        let row_disps: Vec<(usize, Vec<u32>)> = row_iter
            .map(|&y| {
                let mut cache = MatchCache::new();
                let disps = cols
                    .iter()
                    .map(|&x| search_tile(left, right, x, y, &self.params, &mut cache).disparity)
                    .collect();
                trace!("Matched tile row {}, {} windows cached", y, cache.len());
                (y, disps)
            })
            .collect();

        for (y, disps) in row_disps {
            for (&x, d) in cols.iter().zip(disps) {
                disp_map.fill(bbox.clip_cols(x, stride), bbox.clip_rows(y, stride), d);
            }
        }

        // ---- POST FILTER ----

        let disp_map = self.smooth(&disp_map)?;

        debug!(
            "Adaptive matching complete, disparity range {:?}..={:?}",
            disp_map.min_disp, disp_map.max_disp
        );

        Ok(disp_map)
    }

    /// Median filter a tiled disparity map.
    ///
    /// The filter sees the whole map, but only pixels inside the map's region take the filtered
    /// value. Everything outside keeps the zero sentinel.
    pub fn smooth(&self, map: &DisparityMap) -> Result<DisparityMap> {
        let filtered = median_filter(map, self.params.filter_size)?;
        let region = *map.region();

        let mut out = map.clone();
        for y in region.top_left.y..=region.bottom_right.y {
            for x in region.top_left.x..=region.bottom_right.x {
                out.put(x, y, filtered.get(x, y));
            }
        }
        out.update_stats();

        Ok(out)
    }
}

impl DisparityAlgorithm for AdaptiveMatcher {
    fn compute(&self, frame: &StereoFrame, bbox: &BoundingBox) -> Result<DisparityMap> {
        self.compute_pair(&frame.left, &frame.right, bbox)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Adaptive matching with default parameters and the given maximum disparity.
pub fn compute_best(
    left: &GrayFloatImage,
    right: &GrayFloatImage,
    bbox: &BoundingBox,
    max_disparity: usize
) -> Result<DisparityMap> {
    AdaptiveMatcher::new(AdaptiveParams {
        max_disparity,
        ..AdaptiveParams::default()
    })
    .compute_pair(left, right, bbox)
}

/// Find the best right image column for the tile whose origin is `(xl, yl)`.
///
/// Candidates are generated from `xl` down to `xl - max_disparity`, clamped at column 0, and that
/// order is kept throughout: when several candidates are still tied at the end the first one,
/// the smallest disparity, wins.
///
/// Each round compares windows of the current radius, starting at a single pixel, and keeps only
/// the candidates with the highest tolerance score. If any window of a round would leave the
/// image the round is abandoned with the candidates unchanged. Every wider window would leave the
/// image too, so the search stops there.
pub fn search_tile(
    left: &GrayFloatImage,
    right: &GrayFloatImage,
    xl: usize,
    yl: usize,
    params: &AdaptiveParams,
    cache: &mut MatchCache
) -> TileMatch {
    let mut candidates: Vec<usize> = (xl.saturating_sub(params.max_disparity)..=xl)
        .rev()
        .collect();
    let mut candidate_counts = vec![candidates.len()];
    let mut aborted = false;
    let mut radius = 0;

    while candidates.len() > 1 && radius <= params.max_radius {
        let scores = match score_round(left, right, xl, yl, radius, &candidates, params, cache) {
            Some(s) => s,
            None => {
                trace!("Search at ({}, {}) left the image at radius {}", xl, yl, radius);
                aborted = true;
                break;
            }
        };

        let best = scores.iter().copied().max().unwrap_or(0);
        candidates = candidates
            .iter()
            .zip(&scores)
            .filter(|&(_, &s)| s == best)
            .map(|(&c, _)| c)
            .collect();

        candidate_counts.push(candidates.len());
        radius += 1;
    }

    let column = candidates[0];

    TileMatch {
        column,
        disparity: (xl - column) as u32,
        candidate_counts,
        aborted
    }
}

/// Score every candidate at one radius, or `None` if a window leaves the image.
fn score_round(
    left: &GrayFloatImage,
    right: &GrayFloatImage,
    xl: usize,
    yl: usize,
    radius: usize,
    candidates: &[usize],
    params: &AdaptiveParams,
    cache: &mut MatchCache
) -> Option<Vec<usize>> {
    let left_patch = left.centred_patch(xl, yl, radius)?;

    let mut scores = Vec::with_capacity(candidates.len());
    for &xr in candidates {
        let right_patch = cache.window(right, xr, yl, radius)?;
        scores.push(tolerance_score(&left_patch, right_patch, params.threshold));
    }

    Some(scores)
}

/// Count the pixel pairs whose absolute difference is strictly below `threshold`.
fn tolerance_score(a: &[f32], b: &[f32], threshold: f32) -> usize {
    a.iter()
        .zip(b)
        .filter(|&(l, r)| (l - r).abs() < threshold)
        .count()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> GrayFloatImage {
        let mut img = GrayFloatImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                img.put(x, y, f(x, y));
            }
        }
        img
    }

    #[test]
    fn tolerance_score_is_strict() {
        assert_eq!(tolerance_score(&[0.0, 0.0, 0.0], &[4.9, 5.0, 6.0], 5.0), 1);
    }

    #[test]
    fn cache_reuses_and_resets_per_row() {
        let img = GrayFloatImage::new(10, 10);
        let mut cache = MatchCache::new();

        assert!(cache.window(&img, 4, 4, 1).is_some());
        assert!(cache.window(&img, 4, 4, 1).is_some());
        assert!(cache.window(&img, 0, 4, 1).is_none());
        assert_eq!(cache.len(), 2);

        assert!(cache.window(&img, 4, 5, 0).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn candidates_are_clamped_at_left_edge() {
        let img = GrayFloatImage::new(10, 10);
        let params = AdaptiveParams { max_disparity: 5, ..AdaptiveParams::default() };
        let found = search_tile(&img, &img, 2, 4, &params, &mut MatchCache::new());

        assert_eq!(found.candidate_counts[0], 3);
        assert_eq!(found.disparity, 0);
    }

    #[test]
    fn single_candidate_needs_no_rounds() {
        let img = GrayFloatImage::new(10, 10);
        let params = AdaptiveParams { max_disparity: 5, ..AdaptiveParams::default() };
        let found = search_tile(&img, &img, 0, 0, &params, &mut MatchCache::new());

        assert_eq!(found.candidate_counts, vec![1]);
        assert!(!found.aborted);
        assert_eq!(found.column, 0);
    }

    #[test]
    fn finds_shift_of_textured_row() {
        // A unique pattern so a single candidate survives quickly
        let left = image(30, 9, |x, y| ((x * 37 + y * 11) % 23) as f32 * 10.0);
        let right = image(30, 9, |x, y| ((((x + 4) * 37) + y * 11) % 23) as f32 * 10.0);
        let params = AdaptiveParams { max_disparity: 8, ..AdaptiveParams::default() };

        let found = search_tile(&left, &right, 15, 4, &params, &mut MatchCache::new());
        assert_eq!(found.disparity, 4);
        assert_eq!(found.column, 11);
        assert_eq!(found.candidate_counts.last(), Some(&1));
    }

    #[test]
    fn abort_keeps_candidates() {
        // Flat images never separate candidates, and the window leaves the image at radius 2
        let img = GrayFloatImage::new(10, 10);
        let params = AdaptiveParams { max_disparity: 3, ..AdaptiveParams::default() };
        let found = search_tile(&img, &img, 5, 1, &params, &mut MatchCache::new());

        assert!(found.aborted);
        assert_eq!(found.candidate_counts, vec![4, 4, 4]);
        assert_eq!(found.column, 5);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let base = AdaptiveParams::default();
        assert!(base.validate().is_ok());
        assert!(AdaptiveParams { tile_stride: 0, ..base.clone() }.validate().is_err());
        assert!(AdaptiveParams { filter_size: 0, ..base.clone() }.validate().is_err());
        assert!(AdaptiveParams { filter_size: usize::MAX / 2, ..base.clone() }.validate().is_err());
        assert!(AdaptiveParams { threshold: -1.0, ..base.clone() }.validate().is_err());
        assert!(AdaptiveParams { threshold: f32::NAN, ..base }.validate().is_err());
    }
}

//! # Rank filtering
//!
//! Square rank and median filters over disparity maps, used to smooth out tile boundaries.
//!
//! The footprint is `size x size`. For an even `size` it is offset towards the top left, covering
//! `-size/2 ..= size - 1 - size/2` around the output pixel. Samples falling outside the map are
//! mirrored including the edge pixel (`d c b a | a b c d | d c b a`).

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::disparity::DisparityMap;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Median filter the map. For an even number of samples the upper median is taken.
pub fn median_filter(map: &DisparityMap, size: usize) -> Result<DisparityMap> {
    rank_filter(map, size, footprint_len(size)? / 2)
}

/// Replace every pixel with the `rank`-th smallest value of its `size x size` neighbourhood.
pub fn rank_filter(map: &DisparityMap, size: usize, rank: usize) -> Result<DisparityMap> {
    let len = footprint_len(size)?;
    if rank >= len {
        return Err(Error::InvalidParams(format!(
            "rank {} is outside a {}x{} footprint", rank, size, size
        )));
    }

    let (width, height) = map.dimensions();
    let before = (size / 2) as isize;
    let after = (size - 1 - size / 2) as isize;

    let mut out = DisparityMap::new(width, height, *map.region());
    let mut window = Vec::with_capacity(len);

    for y in 0..height {
        for x in 0..width {
            window.clear();

            for dy in -before..=after {
                let sy = reflect(y as isize + dy, height);
                for dx in -before..=after {
                    let sx = reflect(x as isize + dx, width);
                    window.push(map.get(sx, sy));
                }
            }

            let (_, val, _) = window.select_nth_unstable(rank);
            out.put(x, y, *val);
        }
    }

    out.update_stats();

    Ok(out)
}

/// Number of samples in a `size x size` footprint.
pub(crate) fn footprint_len(size: usize) -> Result<usize> {
    if size == 0 {
        return Err(Error::InvalidParams("filter size must be at least 1".into()));
    }

    size.checked_mul(size).ok_or_else(|| {
        Error::InvalidParams(format!("filter size {} is too large", size))
    })
}

/// Mirror an index into `0..len`, repeating the edge sample.
fn reflect(idx: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let m = idx.rem_euclid(period);

    if m < len {
        m as usize
    }
    else {
        (period - 1 - m) as usize
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BoundingBox;

    #[test]
    fn reflect_repeats_edge() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
        // Wraps again once past the mirrored copy
        assert_eq!(reflect(-5, 4), 3);
        assert_eq!(reflect(9, 4), 1);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn median_removes_isolated_spike() {
        let mut map = DisparityMap::new(5, 5, BoundingBox::full(5, 5));
        map.fill(0..=4, 0..=4, 2);
        map.put(2, 2, 40);

        let out = median_filter(&map, 3).unwrap();
        assert!(out.as_slice().iter().all(|&d| d == 2));
        assert_eq!(out.max_disp, Some(2));
    }

    #[test]
    fn even_size_takes_upper_median() {
        // Half zeros, half ones: the upper median of a 2x2 window is 1 wherever both values
        // appear.
        let mut map = DisparityMap::new(2, 2, BoundingBox::full(2, 2));
        map.put(1, 0, 1);
        map.put(1, 1, 1);

        let out = median_filter(&map, 2).unwrap();
        assert_eq!(out.get(1, 1), 1);
        assert_eq!(out.get(0, 0), 0);
    }

    #[test]
    fn size_one_is_identity() {
        let mut map = DisparityMap::new(3, 2, BoundingBox::full(3, 2));
        map.put(0, 0, 3);
        map.put(2, 1, 8);

        let out = median_filter(&map, 1).unwrap();
        assert_eq!(out.as_slice(), map.as_slice());
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let map = DisparityMap::new(3, 3, BoundingBox::full(3, 3));
        assert!(median_filter(&map, 0).is_err());
        assert!(rank_filter(&map, 2, 4).is_err());
        assert!(rank_filter(&map, 2, 0).is_ok());
        assert!(matches!(
            median_filter(&map, usize::MAX / 2),
            Err(Error::InvalidParams(_))
        ));
    }
}

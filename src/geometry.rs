//! Geometric helper functions for grid layouts on a pallet.
//!
//! Covers fitting a row of equal items into a span, centring the resulting block,
//! grouping coordinates into columns/rows, and AABB overlap checks between placements.

use crate::model::Placement;

/// Number of items of size `item_span` that fit side by side into `available`.
///
/// Non-positive or non-finite sizes fit zero times, as does a negative span.
///
/// # Example
/// ```
/// use pallet_stacker::geometry::fit_count;
///
/// assert_eq!(fit_count(120.0, 30.0), 4);
/// assert_eq!(fit_count(100.0, 0.0), 0);
/// ```
pub fn fit_count(available: f64, item_span: f64) -> usize {
    if item_span <= 0.0 || !item_span.is_finite() || available.is_nan() || available < 0.0 {
        return 0;
    }
    let count = (available / item_span).floor();
    if count.is_finite() { count as usize } else { 0 }
}

/// Offset that centres a block of `block_span` on a pallet edge of `pallet_span`.
///
/// A block at least as large as the pallet edge is not shifted.
pub fn centering_offset(pallet_span: f64, block_span: f64) -> f64 {
    (pallet_span.max(block_span) - block_span) / 2.0
}

/// Calculates the overlap of two intervals in one dimension.
///
/// # Example
/// ```
/// use pallet_stacker::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

/// Checks whether two placements overlap in space.
///
/// Uses axis-aligned bounding boxes; cylinders are treated as their square hull.
/// Touching faces do not count as an intersection.
pub fn intersects(a: &Placement, b: &Placement, epsilon: f64) -> bool {
    let a_far = a.far_corner();
    let b_far = b.far_corner();

    overlap_1d(a.position.x, a_far.x, b.position.x, b_far.x) > epsilon
        && overlap_1d(a.position.y, a_far.y, b.position.y, b_far.y) > epsilon
        && overlap_1d(a.position.z, a_far.z, b.position.z, b_far.z) > epsilon
}

/// Counts distinct values, treating values closer than `epsilon` as equal.
pub fn distinct_count(values: impl Iterator<Item = f64>, epsilon: f64) -> usize {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup_by(|a, b| (*a - *b).abs() < epsilon);
    values.len()
}

/// Minimum and maximum of a sequence, `None` when empty.
pub fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Footprint, Shape};
    use crate::types::Vec3;

    fn unit_cube_at(x: f64, y: f64, z: f64) -> Placement {
        let fp = Footprint {
            length: 10.0,
            width: 10.0,
            height: 10.0,
            weight: 1.0,
            shape: Shape::Box,
        };
        Placement::new(Vec3::new(x, y, z), &fp)
    }

    #[test]
    fn fit_count_floors_and_guards_degenerate_sizes() {
        assert_eq!(fit_count(120.0, 30.0), 4);
        assert_eq!(fit_count(100.0, 25.4), 3);
        assert_eq!(fit_count(115.5, 15.0), 7);
        assert_eq!(fit_count(10.0, 20.0), 0);
        assert_eq!(fit_count(10.0, -2.0), 0);
        assert_eq!(fit_count(10.0, f64::NAN), 0);
        assert_eq!(fit_count(-5.0, 1.0), 0);
    }

    #[test]
    fn centering_offset_splits_slack() {
        assert_eq!(centering_offset(120.0, 100.0), 10.0);
        assert_eq!(centering_offset(120.0, 120.0), 0.0);
        assert_eq!(centering_offset(120.0, 127.0), 0.0);
    }

    #[test]
    fn neighbouring_cells_do_not_intersect() {
        let a = unit_cube_at(0.0, 0.0, 0.0);
        let b = unit_cube_at(10.0, 0.0, 0.0);
        let c = unit_cube_at(5.0, 5.0, 0.0);
        assert!(!intersects(&a, &b, 1e-6));
        assert!(intersects(&a, &c, 1e-6));
        assert!(intersects(&b, &c, 1e-6));
    }

    #[test]
    fn distinct_count_merges_near_values() {
        let values = [0.0, 30.0, 30.0 + 1e-9, 60.0, 0.0];
        assert_eq!(distinct_count(values.into_iter(), 1e-6), 3);
        assert_eq!(distinct_count(std::iter::empty(), 1e-6), 0);
    }

    #[test]
    fn extent_of_empty_is_none() {
        assert_eq!(extent(std::iter::empty()), None);
        assert_eq!(extent([3.0, -1.0, 7.5].into_iter()), Some((-1.0, 7.5)));
    }
}

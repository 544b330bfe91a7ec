use crate::core::models::object::SphereSet;
use nalgebra::Point3;

/// Upper limit on the spheres of one segment unless a system sets its own.
pub const DEFAULT_MAX_SPHERES_PER_SEGMENT: usize = 1000;

/// Number of spheres of `radius` for the segment `start`-`end`, before any cap.
///
/// The count is `floor(distance / (2 * radius))` and never drops below one, so a
/// zero-length segment still occupies space. Huge distances saturate at `usize::MAX`.
pub fn sphere_count(start: &Point3<f64>, end: &Point3<f64>, radius: f64) -> usize {
    let distance = (end - start).norm();
    let count = (distance / (2.0 * radius)).floor();
    if count.is_finite() && count >= 1.0 {
        count as usize
    } else {
        1
    }
}

/// Discretizes a straight segment into a chain of equal spheres.
///
/// Centers are evenly spaced from `start` to `end` inclusive. A single sphere sits on
/// `start`. At most `max_spheres` spheres are placed; a segment that would need more is
/// sampled sparsely instead, which keeps evaluation cost bounded for stretched trial
/// layouts.
pub fn route_segment(
    start: &Point3<f64>,
    end: &Point3<f64>,
    radius: f64,
    max_spheres: usize,
) -> SphereSet {
    let count = sphere_count(start, end, radius).min(max_spheres.max(1));
    let positions = if count == 1 {
        vec![*start]
    } else {
        let last = (count - 1) as f64;
        (0..count)
            .map(|i| start + (end - start) * (i as f64 / last))
            .collect()
    };
    SphereSet::from_parts(positions, vec![radius; count])
}

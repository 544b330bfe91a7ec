use super::aggregation::{kreisselmeier_steinhauser, kreisselmeier_steinhauser_min};
use nalgebra::{Point3, Vector3};

/// An axis-aligned box enclosing a collection of spheres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn extents(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        self.extents().product()
    }
}

/// Exact bounds over the extents of every sphere yielded by `spheres`.
///
/// Returns `None` when the iterator is empty.
pub fn bounding_box<'a, I>(spheres: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = (&'a Point3<f64>, f64)>,
{
    spheres.into_iter().fold(None, |acc, (center, radius)| {
        let lo = center - Vector3::repeat(radius);
        let hi = center + Vector3::repeat(radius);
        Some(match acc {
            None => BoundingBox { min: lo, max: hi },
            Some(b) => BoundingBox {
                min: b.min.inf(&lo),
                max: b.max.sup(&hi),
            },
        })
    })
}

/// Differentiable bounds where each per-axis min and max is replaced by a KS aggregate.
///
/// The smooth box always contains the exact box and converges to it as `rho` grows.
pub fn smooth_bounding_box<'a, I>(spheres: I, rho: f64) -> Option<BoundingBox>
where
    I: IntoIterator<Item = (&'a Point3<f64>, f64)>,
{
    let mut lower: [Vec<f64>; 3] = Default::default();
    let mut upper: [Vec<f64>; 3] = Default::default();
    for (center, radius) in spheres {
        for axis in 0..3 {
            lower[axis].push(center[axis] - radius);
            upper[axis].push(center[axis] + radius);
        }
    }
    if lower[0].is_empty() {
        return None;
    }
    let min = Point3::from(Vector3::from_fn(|axis, _| {
        kreisselmeier_steinhauser_min(&lower[axis], rho)
    }));
    let max = Point3::from(Vector3::from_fn(|axis, _| {
        kreisselmeier_steinhauser(&upper[axis], rho)
    }));
    Some(BoundingBox { min, max })
}

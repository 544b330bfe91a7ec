use nalgebra::Point3;

const PARALLEL_EPSILON: f64 = 1e-12;

/// Minimum distance from `point` to the segment `start`-`end`.
///
/// A zero-length segment degenerates to the point-point distance.
pub fn point_segment_distance(point: &Point3<f64>, start: &Point3<f64>, end: &Point3<f64>) -> f64 {
    let direction = end - start;
    let length_squared = direction.norm_squared();
    if length_squared < PARALLEL_EPSILON {
        return (point - start).norm();
    }
    let t = ((point - start).dot(&direction) / length_squared).clamp(0.0, 1.0);
    (point - (start + direction * t)).norm()
}

/// Minimum distance between the segments `a0`-`a1` and `b0`-`b1`.
///
/// Solves the closest-point system of the two supporting lines. When the lines are
/// parallel, either segment is degenerate, or the unconstrained closest points fall
/// outside either segment, the minimum lies on an endpoint and is found among the four
/// endpoint-to-segment distances.
pub fn segment_segment_distance(
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
) -> f64 {
    let u = a1 - a0;
    let v = b1 - b0;
    let w = a0 - b0;

    let a = u.dot(&u);
    let b = u.dot(&v);
    let c = v.dot(&v);
    let d = u.dot(&w);
    let e = v.dot(&w);
    let denominator = a * c - b * b;

    let endpoint_minimum = || {
        [
            point_segment_distance(a0, b0, b1),
            point_segment_distance(a1, b0, b1),
            point_segment_distance(b0, a0, a1),
            point_segment_distance(b1, a0, a1),
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min)
    };

    if a < PARALLEL_EPSILON || c < PARALLEL_EPSILON || denominator <= PARALLEL_EPSILON * a * c {
        return endpoint_minimum();
    }

    let s = (b * e - c * d) / denominator;
    let t = (a * e - b * d) / denominator;
    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        ((a0 + u * s) - (b0 + v * t)).norm()
    } else {
        endpoint_minimum()
    }
}

/// Signed distance between two spheres: center distance minus the sum of radii.
///
/// Negative values mean the spheres interpenetrate.
#[inline]
pub fn sphere_signed_distance(c1: &Point3<f64>, r1: f64, c2: &Point3<f64>, r2: f64) -> f64 {
    (c1 - c2).norm() - (r1 + r2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn point_beside_segment_interior() {
        let d = point_segment_distance(&p(2.0, 1.0, 2.0), &p(1.0, 1.0, 1.0), &p(2.0, 1.0, 1.0));
        assert!(f64_approx_equal(d, 1.0));
    }

    #[test]
    fn point_on_segment_endpoint() {
        let d = point_segment_distance(&p(4.0, 5.0, 6.0), &p(0.0, 0.0, 0.0), &p(4.0, 5.0, 6.0));
        assert!(f64_approx_equal(d, 0.0));
    }

    #[test]
    fn point_beyond_segment_end_clamps() {
        let d = point_segment_distance(&p(8.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(5.0, 0.0, 0.0));
        assert!(f64_approx_equal(d, 3.0));
    }

    #[test]
    fn point_to_zero_length_segment_is_point_distance() {
        let d = point_segment_distance(&p(3.0, 4.0, 0.0), &p(0.0, 0.0, 0.0), &p(0.0, 0.0, 0.0));
        assert!(f64_approx_equal(d, 5.0));
    }

    #[test]
    fn parallel_segments() {
        let d = segment_segment_distance(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 0.0, 1.0),
            &p(1.0, 0.0, 1.0),
        );
        assert!(f64_approx_equal(d, 1.0));
    }

    #[test]
    fn collinear_overlapping_segments_touch() {
        let d = segment_segment_distance(
            &p(0.0, 0.0, 0.0),
            &p(0.0, 0.0, 4.0),
            &p(0.0, 0.0, 2.0),
            &p(0.0, 0.0, 5.0),
        );
        assert!(f64_approx_equal(d, 0.0));
    }

    #[test]
    fn collinear_disjoint_segments() {
        let d = segment_segment_distance(
            &p(0.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
            &p(0.0, 2.0, 0.0),
            &p(0.0, 4.0, 0.0),
        );
        assert!(f64_approx_equal(d, 1.0));
    }

    #[test]
    fn skew_segments_closest_at_endpoints() {
        let d = segment_segment_distance(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 0.0, 2.0),
            &p(1.0, 0.0, 1.0),
        );
        assert!(f64_approx_equal(d, 1.0));
    }

    #[test]
    fn skew_segments_closest_at_midsections() {
        let d = segment_segment_distance(
            &p(0.0, 0.0, 0.0),
            &p(3.0, 3.0, 0.0),
            &p(0.0, 3.0, 1.0),
            &p(3.0, 0.0, 1.0),
        );
        assert!(f64_approx_equal(d, 1.0));
    }

    #[test]
    fn skew_segments_midsection_closest_to_endpoint() {
        let d = segment_segment_distance(
            &p(0.0, 0.0, 0.0),
            &p(2.0, 2.0, 2.0),
            &p(2.0, 0.0, 3.0),
            &p(2.0, 4.0, 3.0),
        );
        assert!(f64_approx_equal(d, 1.0));
    }

    #[test]
    fn skew_segments_with_negative_coordinates() {
        let d = segment_segment_distance(
            &p(-1.0, -2.0, 0.0),
            &p(-1.0, -2.0, -3.0),
            &p(-3.0, -2.0, 0.0),
            &p(-5.0, -8.0, -3.0),
        );
        assert!(f64_approx_equal(d, 2.0));
    }

    #[test]
    fn degenerate_segment_reduces_to_point_segment() {
        let d = segment_segment_distance(
            &p(0.0, 1.0, 0.0),
            &p(0.0, 1.0, 0.0),
            &p(-1.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
        );
        assert!(f64_approx_equal(d, 1.0));
    }

    #[test]
    fn segment_distance_is_symmetric() {
        let (a0, a1, b0, b1) = (p(0.3, -1.0, 2.0), p(1.5, 2.0, -0.5), p(-2.0, 0.0, 1.0), p(2.0, 1.0, 0.0));
        let ab = segment_segment_distance(&a0, &a1, &b0, &b1);
        let ba = segment_segment_distance(&b0, &b1, &a0, &a1);
        assert!(f64_approx_equal(ab, ba));
    }

    #[test]
    fn sphere_signed_distance_sign_convention() {
        let c1 = p(0.0, 0.0, 0.0);
        let c2 = p(3.0, 0.0, 0.0);
        assert!(f64_approx_equal(sphere_signed_distance(&c1, 1.0, &c2, 1.0), 1.0));
        assert!(f64_approx_equal(sphere_signed_distance(&c1, 1.5, &c2, 1.5), 0.0));
        assert!(sphere_signed_distance(&c1, 2.0, &c2, 2.0) < 0.0);
    }
}

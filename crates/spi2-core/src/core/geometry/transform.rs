use nalgebra::{Matrix4, Point3, Rotation3, Translation3, Vector3};

/// Assembles the 4x4 homogeneous transform for a translation followed by an x, y, z
/// Euler rotation about fixed axes.
pub fn assemble_transformation_matrix(
    translation: &Vector3<f64>,
    rotation: &Vector3<f64>,
) -> Matrix4<f64> {
    let rotation = Rotation3::from_euler_angles(rotation.x, rotation.y, rotation.z);
    Translation3::from(*translation).to_homogeneous() * rotation.to_homogeneous()
}

/// Rotates `points` about `origin` and then translates them.
///
/// The points are shifted so that `origin` sits at zero, the homogeneous transform is
/// applied, and `origin` is added back. An empty slice yields an empty result.
///
/// # Arguments
///
/// * `points` - The points to transform.
/// * `translation` - Displacement applied after rotation.
/// * `rotation` - Euler angles in radians, applied in x, y, z order about fixed axes.
/// * `origin` - The center of rotation.
pub fn transform_points(
    points: &[Point3<f64>],
    translation: &Vector3<f64>,
    rotation: &Vector3<f64>,
    origin: &Point3<f64>,
) -> Vec<Point3<f64>> {
    let matrix = assemble_transformation_matrix(translation, rotation);
    points
        .iter()
        .map(|p| matrix.transform_point(&(p - origin.coords)) + origin.coords)
        .collect()
}

//! Math type re-exports and plane/frame utilities.
//!
//! This module re-exports the `glam` types used across the crate and
//! provides the per-surface transforms the lightmap directory carries.

// Re-export glam types
pub use glam::{
    // Single precision vectors
    Vec2, Vec3, Vec4,
    // Single precision matrices
    Mat3, Mat4,
    // Quaternions
    Quat,
};

/// Plane through three points as `[a, b, c, d]` with `n·p + d = 0`.
///
/// Returns `None` for degenerate (zero-area) triangles.
#[inline]
pub fn plane_from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec4> {
    let n = unit_normal(a, b, c)?;
    Some(n.extend(-n.dot(a)))
}

/// Unit normal of triangle `abc` (counter-clockwise winding).
///
/// Returns `None` when the edges are (near) collinear or zero-length.
/// The cutoff is relative to the edge lengths, so tiny but well-shaped
/// triangles keep their normal.
#[inline]
pub fn unit_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let (ab, ac) = (b - a, c - a);
    let cross = ab.cross(ac);
    let len = cross.length();
    if len.is_finite() && len > 0.0 && len > f32::EPSILON * ab.length() * ac.length() {
        Some(cross / len)
    } else {
        None
    }
}

/// Signed distance of `p` to `plane` (plane normal must be unit length).
#[inline]
pub fn plane_distance(plane: Vec4, p: Vec3) -> f32 {
    plane.truncate().dot(p) + plane.w
}

/// Orthographic projection onto `plane`: `p ↦ p − (n·p + d) n`.
///
/// Column-vector convention (glam). The plane is normalized first so
/// callers may pass unnormalized coefficients.
pub fn flatten_matrix(plane: Vec4) -> Mat4 {
    let norm = plane.truncate().length();
    if norm <= f32::EPSILON {
        return Mat4::IDENTITY;
    }
    let p = plane / norm;
    let (a, b, c, d) = (p.x, p.y, p.z, p.w);

    Mat4::from_cols(
        Vec4::new(1.0 - a * a, -a * b, -a * c, 0.0),
        Vec4::new(-a * b, 1.0 - b * b, -b * c, 0.0),
        Vec4::new(-a * c, -b * c, 1.0 - c * c, 0.0),
        Vec4::new(-a * d, -b * d, -c * d, 1.0),
    )
}

/// Orthonormal surface frame rooted at `origin`.
///
/// `u` follows the `origin → toward` edge, `w = n × u` completes the
/// right-handed basis. Returns `(to_local, to_world)`; `to_local` maps a
/// point on the plane to `(u, w, 0)` coordinates.
pub fn surface_frame(origin: Vec3, toward: Vec3, normal: Vec3) -> (Mat4, Mat4) {
    let u = (toward - origin).normalize_or_zero();
    if u == Vec3::ZERO {
        return (Mat4::IDENTITY, Mat4::IDENTITY);
    }
    let w = normal.cross(u);

    let to_world = Mat4::from_cols(
        u.extend(0.0),
        w.extend(0.0),
        normal.extend(0.0),
        origin.extend(1.0),
    );
    // Rotation part is orthonormal, so the inverse is R^T with -R^T·t.
    let rot_t = Mat3::from_cols(u, w, normal).transpose();
    let to_local = Mat4::from_cols(
        rot_t.x_axis.extend(0.0),
        rot_t.y_axis.extend(0.0),
        rot_t.z_axis.extend(0.0),
        (-(rot_t * origin)).extend(1.0),
    );

    (to_local, to_world)
}

/// Matrix in the transposed layout the lightmap shaders read.
#[inline]
pub fn transposed_cols(m: &Mat4) -> [[f32; 4]; 4] {
    m.transpose().to_cols_array_2d()
}

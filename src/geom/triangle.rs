//! World-space triangle with derived plane data.

use crate::util::{self, Vec3, Vec4};

/// Which side of a plane a point lies on, with a tolerance band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneSide {
    Front,
    Behind,
    On,
}

/// A world-space triangle (counter-clockwise winding defines the front).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub v: [Vec3; 3],
}

impl Triangle {
    #[inline]
    pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { v: [a, b, c] }
    }

    /// Unit normal, or `None` for zero-area triangles.
    #[inline]
    pub fn normal(&self) -> Option<Vec3> {
        util::unit_normal(self.v[0], self.v[1], self.v[2])
    }

    #[inline]
    pub fn centroid(&self) -> Vec3 {
        (self.v[0] + self.v[1] + self.v[2]) / 3.0
    }

    /// Plane coefficients `[a, b, c, d]`, `None` when degenerate.
    #[inline]
    pub fn plane(&self) -> Option<Vec4> {
        util::plane_from_points(self.v[0], self.v[1], self.v[2])
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.normal().is_none()
    }

    pub fn area(&self) -> f32 {
        0.5 * (self.v[1] - self.v[0]).cross(self.v[2] - self.v[0]).length()
    }
}

/// Half-space of `p` relative to the plane through `origin` with `normal`.
#[inline]
pub fn classify(normal: Vec3, origin: Vec3, p: Vec3, epsilon: f32) -> PlaneSide {
    let d = normal.dot(p - origin);
    if d > epsilon {
        PlaneSide::Front
    } else if d < -epsilon {
        PlaneSide::Behind
    } else {
        PlaneSide::On
    }
}

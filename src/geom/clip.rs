//! Coplanar 2D triangle helpers: barycentrics, containment and clipping.
//!
//! All functions operate in a surface's local 2D frame (see
//! [`crate::util::surface_frame`]).

use crate::util::{Vec2, Vec3};
use smallvec::SmallVec;

/// Clipped polygon. Two triangles intersect in at most six vertices.
pub type ClipPolygon = SmallVec<[Vec2; 6]>;

/// Twice the signed area of `abc` (positive when counter-clockwise).
#[inline]
fn signed_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Barycentric coordinates `(u, v, w)` of `p` in triangle `abc`.
///
/// Returns `None` when the triangle is degenerate.
pub fn barycentric2(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> Option<Vec3> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some(Vec3::new(1.0 - v - w, v, w))
}

/// Point-in-triangle test (edges count as inside).
pub fn point_in_triangle2(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    barycentric2(a, b, c, p).is_some_and(|bary| bary.min_element() >= 0.0)
}

/// Intersection point of the infinite lines `a1a2` and `b1b2`.
///
/// `None` when the lines are parallel.
pub fn intersect_lines2(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let da = a2 - a1;
    let db = b2 - b1;
    let denom = da.perp_dot(db);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let t = (b1 - a1).perp_dot(db) / denom;
    Some(a1 + da * t)
}

/// Intersection of two coplanar triangles.
///
/// Returns the convex overlap polygon wound counter-clockwise, or an
/// empty polygon when the triangles are disjoint, touch only along an
/// edge/vertex, or either one is degenerate.
pub fn clip_triangle2(subject: [Vec2; 3], clip: [Vec2; 3]) -> ClipPolygon {
    let subject = match ccw(subject) {
        Some(t) => t,
        None => return ClipPolygon::new(),
    };
    let clip = match ccw(clip) {
        Some(t) => t,
        None => return ClipPolygon::new(),
    };

    // Sutherland-Hodgman against each clip edge; intermediates can exceed six.
    let mut poly: SmallVec<[Vec2; 8]> = SmallVec::from_slice(&subject);
    for i in 0..3 {
        let e0 = clip[i];
        let e1 = clip[(i + 1) % 3];
        let input = std::mem::take(&mut poly);
        if input.is_empty() {
            break;
        }
        for j in 0..input.len() {
            let cur = input[j];
            let prev = input[(j + input.len() - 1) % input.len()];
            let cur_in = signed_area2(e0, e1, cur) >= 0.0;
            let prev_in = signed_area2(e0, e1, prev) >= 0.0;
            if cur_in {
                if !prev_in {
                    if let Some(x) = intersect_lines2(prev, cur, e0, e1) {
                        poly.push(x);
                    }
                }
                poly.push(cur);
            } else if prev_in {
                if let Some(x) = intersect_lines2(prev, cur, e0, e1) {
                    poly.push(x);
                }
            }
        }
    }

    dedup_close(&mut poly);
    if poly.len() < 3 || polygon_area2(&poly) <= f32::EPSILON {
        return ClipPolygon::new();
    }
    poly.into_iter().collect()
}

/// Reorder to counter-clockwise, `None` if degenerate.
fn ccw(t: [Vec2; 3]) -> Option<[Vec2; 3]> {
    let area = signed_area2(t[0], t[1], t[2]);
    if area.abs() <= f32::EPSILON {
        None
    } else if area < 0.0 {
        Some([t[0], t[2], t[1]])
    } else {
        Some(t)
    }
}

fn polygon_area2(poly: &[Vec2]) -> f32 {
    let n = poly.len();
    (0..n).map(|i| poly[i].perp_dot(poly[(i + 1) % n])).sum()
}

/// Drop consecutive (and wrap-around) duplicates produced at shared vertices.
fn dedup_close(poly: &mut SmallVec<[Vec2; 8]>) {
    const TOL: f32 = 1e-6;
    poly.dedup_by(|a, b| a.distance_squared(*b) <= TOL * TOL);
    while poly.len() > 1 && poly[0].distance_squared(poly[poly.len() - 1]) <= TOL * TOL {
        poly.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> [Vec2; 3] {
        [Vec2::new(a.0, a.1), Vec2::new(b.0, b.1), Vec2::new(c.0, c.1)]
    }

    fn area(poly: &[Vec2]) -> f32 {
        polygon_area2(poly) * 0.5
    }

    #[test]
    fn test_barycentric_vertices() {
        let [a, b, c] = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        assert_eq!(barycentric2(a, b, c, a), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(barycentric2(a, b, c, b), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert!(barycentric2(a, a, a, b).is_none());
    }

    #[test]
    fn test_point_in_triangle() {
        let [a, b, c] = tri((0.0, 0.0), (4.0, 0.0), (0.0, 4.0));
        assert!(point_in_triangle2(a, b, c, Vec2::new(1.0, 1.0)));
        assert!(point_in_triangle2(a, b, c, Vec2::new(2.0, 0.0)));
        assert!(!point_in_triangle2(a, b, c, Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn test_intersect_lines() {
        let x = intersect_lines2(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0),
        );
        assert_eq!(x, Some(Vec2::new(1.0, 1.0)));
        assert!(intersect_lines2(Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_clip_contained() {
        let outer = tri((0.0, 0.0), (10.0, 0.0), (0.0, 10.0));
        let inner = tri((1.0, 1.0), (2.0, 1.0), (1.0, 2.0));
        let poly = clip_triangle2(inner, outer);
        assert_eq!(poly.len(), 3);
        assert!((area(&poly) - 0.5).abs() < 1e-5);
        // Symmetric: clipping the big one by the small one gives the small one.
        let poly = clip_triangle2(outer, inner);
        assert!((area(&poly) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_clip_hexagon() {
        // Star of David: two opposing triangles overlap in a hexagon.
        let up = tri((0.0, 2.0), (-1.732_050_8, -1.0), (1.732_050_8, -1.0));
        let down = tri((0.0, -2.0), (1.732_050_8, 1.0), (-1.732_050_8, 1.0));
        let poly = clip_triangle2(up, down);
        assert_eq!(poly.len(), 6);
        assert!(area(&poly) > 0.0, "result must be counter-clockwise");
    }

    #[test]
    fn test_clip_disjoint_and_clockwise_input() {
        let a = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        let b = tri((5.0, 5.0), (6.0, 5.0), (5.0, 6.0));
        assert!(clip_triangle2(a, b).is_empty());

        let cw = tri((0.0, 0.0), (0.0, 1.0), (1.0, 0.0));
        let poly = clip_triangle2(cw, a);
        assert_eq!(poly.len(), 3);
        assert!(area(&poly) > 0.0);
    }

    #[test]
    fn test_clip_degenerate() {
        let a = tri((0.0, 0.0), (1.0, 0.0), (2.0, 0.0));
        let b = tri((0.0, 0.0), (1.0, 0.0), (0.0, 1.0));
        assert!(clip_triangle2(a, b).is_empty());
        assert!(clip_triangle2(b, a).is_empty());
    }
}

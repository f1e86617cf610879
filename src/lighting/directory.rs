//! Per-surface lightmap directory.

use smallvec::SmallVec;

use crate::geom::Triangle;
use crate::scene::Material;
use crate::util::{self, Mat4, Vec3, Vec4};

/// Everything the lighting core knows about one triangle.
///
/// Static data (geometry, material, transforms, visibility) is filled by
/// the visibility pass; `light_refs` is appended to while the light tree
/// is built and read-only afterwards.
#[derive(Clone, Debug)]
pub struct SurfaceDirectory {
    /// World-space vertices.
    pub vertices: [Vec3; 3],
    /// Base albedo.
    pub color: Vec3,
    pub emissive_strength: f32,
    /// Unit normal, `None` for degenerate triangles.
    pub normal: Option<Vec3>,
    pub centroid: Vec3,
    /// `[a, b, c, d]` with `n·p + d = 0`; zero when degenerate.
    pub plane: Vec4,
    /// Projects world points onto the surface plane.
    pub flatten: Mat4,
    /// Plane to local 2D frame (origin at the first vertex).
    pub to_local: Mat4,
    /// Local 2D frame back to the plane.
    pub to_world: Mat4,
    /// Objects whose bounds are not entirely behind the plane.
    pub visible_objects: SmallVec<[u32; 8]>,
    /// Triangles of visible objects with at least one vertex in front.
    pub visible_surfaces: Vec<u32>,
    /// Jumble map indices of RDF nodes landing on this surface.
    pub light_refs: Vec<u32>,
}

impl SurfaceDirectory {
    /// Static directory for a triangle; visibility and lights start empty.
    pub fn new(tri: &Triangle, material: &Material) -> Self {
        let normal = tri.normal();
        let (plane, flatten, to_local, to_world) = match normal {
            Some(n) => {
                let plane = n.extend(-n.dot(tri.v[0]));
                let (to_local, to_world) = util::surface_frame(tri.v[0], tri.v[1], n);
                (plane, util::flatten_matrix(plane), to_local, to_world)
            }
            None => (Vec4::ZERO, Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY),
        };

        Self {
            vertices: tri.v,
            color: material.albedo,
            emissive_strength: material.emissive_intensity,
            normal,
            centroid: tri.centroid(),
            plane,
            flatten,
            to_local,
            to_world,
            visible_objects: SmallVec::new(),
            visible_surfaces: Vec::new(),
            light_refs: Vec::new(),
        }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.normal.is_none()
    }
}

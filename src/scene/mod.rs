//! Scene description consumed by the lighting core.
//!
//! The lighting code only talks to a scene through [`SceneGeometry`], so a
//! render frontend can plug in its own storage. [`Scene`] is the built-in
//! arena implementation, loadable from JSON via [`load_scene`].

mod loader;
mod model;

use std::ops::Range;

use crate::geom::{Aabb, Triangle};

pub use loader::{load_scene, parse_scene};
pub use model::{Camera, Material, Mesh, Scene, SceneBuilder, SceneObject};

/// Read-only view of static scene geometry, indexed by global triangle index.
///
/// Implementations must keep the global index → (object, face) mapping
/// stable for as long as a light tree built from them is in use.
pub trait SceneGeometry: Send + Sync {
    /// Total number of triangles across all objects.
    fn triangle_count(&self) -> usize;

    /// World-space triangle at a global index.
    ///
    /// # Panics
    /// On an out-of-range index. A mismatched index is an integration bug
    /// and must not be masked by a zero triangle.
    fn triangle(&self, index: usize) -> Triangle;

    /// Material of the object owning the triangle.
    fn material(&self, index: usize) -> Material;

    fn object_count(&self) -> usize;

    /// World-space bounds of an object.
    fn object_bounding_box(&self, object: usize) -> Aabb;

    /// Object owning a global triangle index.
    fn object_index_of(&self, index: usize) -> usize;

    /// Global triangle index range of an object.
    fn object_triangles(&self, object: usize) -> Range<usize>;
}

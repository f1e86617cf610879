//! Geometry primitives consumed by the lighting core.
//!
//! - [`Triangle`] - world-space triangle with normal/centroid/plane
//! - [`Aabb`] - object bounds, corner enumeration and ray slab test
//! - [`clip`] - coplanar 2D triangle clipping helpers

mod aabb;
pub mod clip;
mod triangle;

pub use aabb::Aabb;
pub use triangle::{classify, PlaneSide, Triangle};

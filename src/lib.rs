//! # Kenos
//!
//! Light-tree global illumination for static triangle scenes.
//!
//! Emissive triangles seed a tree of radiance distribution function (RDF)
//! nodes that is propagated across a precomputed per-triangle visibility
//! graph, then flattened into two GPU-ready buffers: a per-surface
//! directory and a per-surface list of incoming lights.
//!
//! ## Modules
//!
//! - [`util`] - Errors, glam re-exports, plane and frame math
//! - [`geom`] - Triangles, bounding boxes, 2D clipping helpers
//! - [`scene`] - Scene model, JSON loader, [`SceneGeometry`] trait
//! - [`lighting`] - Visibility oracle, light tree, lightmap packer
//!
//! ## Example
//!
//! ```ignore
//! use kenos::prelude::*;
//!
//! let scene = kenos::scene::load_scene("room.json")?;
//! let mut engine = LightingEngine::new(LightingConfig::default())?;
//! engine.build_light_tree(&scene);
//! let buffers = engine.update_final_rdf_buffer(&scene)?;
//! upload(buffers.directories_bytes(), buffers.lights_bytes());
//! ```

pub mod util;
pub mod geom;
pub mod scene;
pub mod lighting;

// Re-export commonly used types
pub use util::{Error, Result};
pub use scene::{Scene, SceneGeometry};
pub use lighting::{LightingConfig, LightingEngine};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, Vec3};
    pub use crate::geom::{Aabb, Triangle};
    pub use crate::scene::{Camera, Material, Mesh, Scene, SceneBuilder, SceneGeometry, SceneObject};
    pub use crate::lighting::{
        LightTree, LightingConfig, LightingEngine, LightmapBuffers, PackedDirectory, SurfLight,
    };
}

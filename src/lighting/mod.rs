//! Light-transport core.
//!
//! - [`visibility`] - per-triangle visibility oracle
//! - [`tree`] - RDF light tree construction over the visibility graph
//! - [`packer`] - flattening the tree into GPU-ready buffers
//!
//! [`LightingEngine`] ties the three together and publishes immutable
//! buffer snapshots for a render frontend.

pub mod config;
pub mod directory;
pub mod packer;
pub mod tree;
pub mod visibility;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::scene::SceneGeometry;
use crate::util::{Error, Result};

pub use config::LightingConfig;
pub use directory::SurfaceDirectory;
pub use packer::{flatten, FlattenStats, LightmapBuffers, PackedDirectory, SurfLight};
pub use tree::{build_light_tree, JumbleMap, LightTree, Rdf};
pub use visibility::{build_directories, compute_visibility, visibility_for, Visibility};

/// Owns one build of the light tree and the last published buffers.
///
/// Building needs `&mut self`; publishing and reading snapshots only need
/// `&self`, so a render thread can keep reading while a new buffer pair is
/// swapped in. A snapshot never changes after it is handed out.
pub struct LightingEngine {
    config: LightingConfig,
    directories: Vec<SurfaceDirectory>,
    tree: LightTree,
    published: RwLock<Arc<LightmapBuffers>>,
}

impl LightingEngine {
    pub fn new(config: LightingConfig) -> Result<Self> {
        config.validate()?;
        let empty = LightmapBuffers::empty(config.max_surface_lights);
        Ok(Self {
            config,
            directories: Vec::new(),
            tree: LightTree::default(),
            published: RwLock::new(Arc::new(empty)),
        })
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn directories(&self) -> &[SurfaceDirectory] {
        &self.directories
    }

    pub fn light_tree(&self) -> &LightTree {
        &self.tree
    }

    /// Full rebuild: visibility for every triangle, then the light tree.
    ///
    /// Published buffers are untouched until [`update_final_rdf_buffer`].
    ///
    /// [`update_final_rdf_buffer`]: Self::update_final_rdf_buffer
    pub fn build_light_tree<S: SceneGeometry + ?Sized>(&mut self, scene: &S) -> &LightTree {
        self.directories = build_directories(scene, &self.config);
        self.tree = build_light_tree(&mut self.directories, &self.config);
        &self.tree
    }

    /// Incremental invalidation hook for one object. Currently does nothing;
    /// callers must use [`build_light_tree`](Self::build_light_tree) after any change.
    pub fn update_light_tree(&mut self, object_index: usize) {
        tracing::debug!(object_index, "incremental light tree update not implemented");
    }

    /// Flatten the current tree and publish it as the new snapshot.
    ///
    /// Fails if `scene` no longer matches the triangle count the tree was
    /// built for.
    pub fn update_final_rdf_buffer<S: SceneGeometry + ?Sized>(
        &self,
        scene: &S,
    ) -> Result<Arc<LightmapBuffers>> {
        let count = scene.triangle_count();
        if count != self.directories.len() {
            return Err(Error::other(format!(
                "light tree built for {} triangles, scene has {count}",
                self.directories.len()
            )));
        }

        let buffers = Arc::new(flatten(&self.tree.jumble, &self.directories, &self.config)?);
        *self.published.write() = Arc::clone(&buffers);
        Ok(buffers)
    }

    /// Last published buffer pair.
    pub fn snapshot(&self) -> Arc<LightmapBuffers> {
        Arc::clone(&self.published.read())
    }

    /// Copy of the published directory buffer.
    pub fn directory_buffer(&self) -> Vec<PackedDirectory> {
        self.snapshot().directories.clone()
    }

    /// Copy of the published light slot array
    /// (`triangle * max_surface_lights + slot`).
    pub fn final_lightmap_buffer(&self) -> Vec<SurfLight> {
        self.snapshot().lights.clone()
    }

    pub fn lights_by_surface(&self) -> BTreeMap<u32, Vec<SurfLight>> {
        self.snapshot().lights_by_surface()
    }
}

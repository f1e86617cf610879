//! Lightmap packer: flattens the light tree into GPU-ready buffers.
//!
//! Two buffers come out:
//! - one [`PackedDirectory`] per triangle (geometry, light count, matrices)
//! - a fixed-capacity [`SurfLight`] slot array, `max_surface_lights` per triangle
//!
//! Matrices are stored transposed; the consumer reads them row-major.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

use crate::util::{self, Error, Result, Vec3};

use super::config::LightingConfig;
use super::directory::SurfaceDirectory;
use super::tree::JumbleMap;

/// Per-surface directory record (288 bytes).
///
/// Every vec3 is padded to 16 bytes with a scalar or explicit padding so the
/// layout matches std430 without reordering.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PackedDirectory {
    pub v0: [f32; 3],
    pub emissive: f32,
    pub v1: [f32; 3],
    /// Filled light slots, never above the per-surface capacity.
    pub num_lights: u32,
    pub v2: [f32; 3],
    pub _pad0: u32,
    pub color: [f32; 3],
    pub _pad1: u32,
    /// Zero for degenerate triangles.
    pub normal: [f32; 3],
    pub _pad2: u32,
    /// `[a, b, c, d]` with `n·p + d = 0`.
    pub plane: [f32; 4],
    pub flatten: [[f32; 4]; 4],
    pub to_local: [[f32; 4]; 4],
    pub to_world: [[f32; 4]; 4],
}

const _: () = assert!(std::mem::size_of::<PackedDirectory>() == 288);

impl PackedDirectory {
    pub fn new(dir: &SurfaceDirectory, num_lights: u32) -> Self {
        let [v0, v1, v2] = dir.vertices.map(|v| v.to_array());
        Self {
            v0,
            emissive: dir.emissive_strength,
            v1,
            num_lights,
            v2,
            _pad0: 0,
            color: dir.color.to_array(),
            _pad1: 0,
            normal: dir.normal.unwrap_or(Vec3::ZERO).to_array(),
            _pad2: 0,
            plane: dir.plane.to_array(),
            flatten: util::transposed_cols(&dir.flatten),
            to_local: util::transposed_cols(&dir.to_local),
            to_world: util::transposed_cols(&dir.to_world),
        }
    }
}

/// One incoming light on a receiver surface (8 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SurfLight {
    /// Triangle the light arrives from.
    pub caster_index: u32,
    pub brightness: f32,
}

/// Counters from one flatten pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenStats {
    pub surfaces: usize,
    /// Lights written into slots.
    pub lights: usize,
    /// Lights past a surface's capacity, in processing order.
    pub dropped_lights: usize,
    /// Root references skipped (an emitter is never its own light).
    pub skipped_roots: usize,
}

/// Immutable output of one flatten pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LightmapBuffers {
    pub directories: Vec<PackedDirectory>,
    /// Slot array indexed `triangle * max_lights_per_surface + slot`.
    /// Slots past `num_lights` are zeroed.
    pub lights: Vec<SurfLight>,
    pub max_lights_per_surface: usize,
    pub stats: FlattenStats,
}

impl LightmapBuffers {
    /// Buffers for an empty scene.
    pub fn empty(max_lights_per_surface: usize) -> Self {
        Self {
            directories: Vec::new(),
            lights: Vec::new(),
            max_lights_per_surface,
            stats: FlattenStats::default(),
        }
    }

    pub fn surface_count(&self) -> usize {
        self.directories.len()
    }

    /// Filled light slots of one surface.
    pub fn lights_for(&self, triangle: usize) -> &[SurfLight] {
        let Some(dir) = self.directories.get(triangle) else {
            return &[];
        };
        let start = triangle * self.max_lights_per_surface;
        &self.lights[start..start + dir.num_lights as usize]
    }

    /// Map form: surfaces with at least one light, keyed by triangle index.
    pub fn lights_by_surface(&self) -> BTreeMap<u32, Vec<SurfLight>> {
        (0..self.surface_count())
            .filter_map(|i| {
                let lights = self.lights_for(i);
                (!lights.is_empty()).then(|| (i as u32, lights.to_vec()))
            })
            .collect()
    }

    /// Directory records as bytes.
    pub fn directories_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.directories)
    }

    /// Light slot array as bytes.
    pub fn lights_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lights)
    }
}

/// Pack directories and their light references.
///
/// Each light reference on a receiver is the receiver-side RDF node; the
/// caster is the triangle owning that node's *parent*. References without a
/// parent (roots) are skipped. Lights beyond the per-surface capacity are
/// dropped in processing order, not by brightness.
///
/// Fails with [`Error::InvalidConfig`] when the slot array size
/// (`surfaces × max_surface_lights`) is not representable.
///
/// # Panics
/// If a light reference is not a valid index into `jumble`.
#[tracing::instrument(skip_all, fields(surfaces = directories.len()))]
pub fn flatten(
    jumble: &JumbleMap,
    directories: &[SurfaceDirectory],
    config: &LightingConfig,
) -> Result<LightmapBuffers> {
    let cap = config.max_surface_lights;
    let slot_count = directories.len().checked_mul(cap).ok_or_else(|| {
        Error::invalid_config(format!(
            "{} surfaces x maxSurfaceLights {cap} overflows the light buffer",
            directories.len()
        ))
    })?;
    let mut out = LightmapBuffers {
        directories: Vec::with_capacity(directories.len()),
        lights: vec![SurfLight::zeroed(); slot_count],
        max_lights_per_surface: cap,
        stats: FlattenStats {
            surfaces: directories.len(),
            ..FlattenStats::default()
        },
    };

    for (receiver, dir) in directories.iter().enumerate() {
        let slots = &mut out.lights[receiver * cap..(receiver + 1) * cap];
        let mut count = 0;
        let mut dropped = 0;

        for &light_ref in &dir.light_refs {
            let node = &jumble[light_ref];
            let Some(parent) = node.parent else {
                out.stats.skipped_roots += 1;
                continue;
            };
            if count == cap {
                dropped += 1;
                continue;
            }
            slots[count] = SurfLight {
                caster_index: jumble[parent].directory,
                brightness: node.light_brightness,
            };
            count += 1;
        }

        if dropped > 0 {
            tracing::debug!(receiver, dropped, cap, "surface light slots full");
        }
        out.stats.lights += count;
        out.stats.dropped_lights += dropped;
        out.directories.push(PackedDirectory::new(dir, count as u32));
    }

    if out.stats.dropped_lights > 0 {
        tracing::warn!(
            dropped = out.stats.dropped_lights,
            cap,
            "lights dropped past per-surface capacity"
        );
    }
    tracing::debug!(lights = out.stats.lights, "lightmap flattened");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Triangle;
    use crate::lighting::tree::{build_light_tree, Rdf};
    use crate::scene::Material;
    use crate::util::Vec4;

    fn dir(emissive: f32, visible: Vec<u32>) -> SurfaceDirectory {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y);
        let mut d = SurfaceDirectory::new(&tri, &Material::emissive(Vec3::ONE, emissive));
        d.visible_surfaces = visible;
        d
    }

    fn config(cap: usize) -> LightingConfig {
        LightingConfig {
            max_surface_lights: cap,
            parallel: false,
            ..LightingConfig::default()
        }
    }

    #[test]
    fn test_caster_is_parent_owner() {
        // Hand-built jumble: root on triangle 2, child on triangle 0.
        // The receiver's own node lives on triangle 0; the caster must be 2.
        let mut dirs = vec![dir(0.0, vec![]), dir(0.0, vec![]), dir(1.0, vec![])];
        let mut jumble = JumbleMap::new();
        let root = jumble.push(Rdf::root(2, &dirs[2]));
        let child = jumble.push(Rdf {
            directory: 0,
            bounce: 1,
            parent: Some(root),
            children: Vec::new(),
            color: Vec3::ONE,
            light_brightness: 0.75,
            lightness: 1.0,
            shadows: Vec::new(),
        });
        dirs[2].light_refs.push(root);
        dirs[0].light_refs.push(child);

        let out = flatten(&jumble, &dirs, &config(4)).unwrap();
        assert_eq!(
            out.lights_for(0),
            &[SurfLight {
                caster_index: 2,
                brightness: 0.75
            }]
        );
        assert!(out.lights_for(2).is_empty(), "root reference skipped");
        assert_eq!(out.stats.skipped_roots, 1);
        assert_eq!(out.directories[2].emissive, 1.0);
    }

    #[test]
    fn test_capacity_drops_in_order() {
        let mut dirs = vec![
            dir(1.0, vec![3]),
            dir(1.0, vec![3]),
            dir(1.0, vec![3]),
            dir(0.0, vec![]),
        ];
        let cfg = config(2);
        let tree = build_light_tree(&mut dirs, &cfg);
        let out = flatten(&tree.jumble, &dirs, &cfg).unwrap();

        assert_eq!(out.directories[3].num_lights, 2);
        let casters: Vec<u32> = out.lights_for(3).iter().map(|l| l.caster_index).collect();
        assert_eq!(casters, vec![0, 1]);
        assert_eq!(out.stats.dropped_lights, 1);
        assert_eq!(out.lights.len(), 4 * 2);
    }

    #[test]
    fn test_empty_slots_zeroed() {
        let mut dirs = vec![dir(1.0, vec![1]), dir(0.0, vec![])];
        let cfg = config(3);
        let tree = build_light_tree(&mut dirs, &cfg);
        let out = flatten(&tree.jumble, &dirs, &cfg).unwrap();
        assert_eq!(out.directories[1].num_lights, 1);
        assert_eq!(out.lights[4], SurfLight::zeroed());
        assert_eq!(out.lights[5], SurfLight::zeroed());
        assert!(out.lights[..3].iter().all(|l| *l == SurfLight::zeroed()));
    }

    #[test]
    fn test_idempotent_bytes() {
        let mut dirs = vec![dir(1.0, vec![1, 2]), dir(0.0, vec![0]), dir(0.5, vec![0])];
        let cfg = config(4);
        let tree = build_light_tree(&mut dirs, &cfg);
        let a = flatten(&tree.jumble, &dirs, &cfg).unwrap();
        let b = flatten(&tree.jumble, &dirs, &cfg).unwrap();
        assert_eq!(a.directories_bytes(), b.directories_bytes());
        assert_eq!(a.lights_bytes(), b.lights_bytes());
        assert_eq!(a.directories_bytes().len(), 3 * 288);
        assert_eq!(a.lights_bytes().len(), 3 * 4 * 8);
    }

    #[test]
    fn test_packed_layout() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 0.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        );
        let d = SurfaceDirectory::new(&tri, &Material::diffuse(Vec3::new(0.2, 0.4, 0.6)));
        let p = PackedDirectory::new(&d, 3);
        assert_eq!(p.v1, [1.0, 0.0, 2.0]);
        assert_eq!(p.num_lights, 3);
        assert_eq!(p.normal, [0.0, 0.0, 1.0]);
        assert_eq!(p.plane, [0.0, 0.0, 1.0, -2.0]);
        assert_eq!(p.color, [0.2, 0.4, 0.6]);
        // Transposed: the flatten translation lands in the last row.
        assert_eq!(p.flatten[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(p.flatten[2][3], 2.0);

        let degenerate = SurfaceDirectory::new(
            &Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X),
            &Material::default(),
        );
        let p = PackedDirectory::new(&degenerate, 0);
        assert_eq!(p.normal, [0.0; 3]);
        assert_eq!(p.plane, Vec4::ZERO.to_array());
    }

    #[test]
    fn test_oversized_slot_array_rejected() {
        let dirs = vec![dir(0.0, vec![]), dir(0.0, vec![])];
        let cfg = config(usize::MAX / 2 + 1);
        assert!(matches!(
            flatten(&JumbleMap::new(), &dirs, &cfg),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_lights_by_surface() {
        let mut dirs = vec![dir(1.0, vec![1]), dir(0.0, vec![]), dir(0.0, vec![])];
        let cfg = config(2);
        let tree = build_light_tree(&mut dirs, &cfg);
        let out = flatten(&tree.jumble, &dirs, &cfg).unwrap();
        let map = out.lights_by_surface();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1][0].caster_index, 0);
        assert!(out.lights_for(99).is_empty());
    }
}

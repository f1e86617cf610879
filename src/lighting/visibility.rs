//! Visibility oracle: which objects and triangles each triangle can light.
//!
//! For a caster triangle C with normal `n` and centroid `m`:
//! 1. Coarse cull: an object is a candidate if any of its eight bounding
//!    box corners satisfies `n·(corner − m) > 0`. This never rejects an
//!    object that has a vertex in front of C.
//! 2. Fine test on candidate objects: receiver R is visible if not all of
//!    its vertices are behind C's plane and at least one is in front.
//!
//! Visibility is computed independently per caster (no symmetry reuse),
//! which makes the pass embarrassingly parallel: every caster writes only
//! its own directory slot.

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::geom::{classify, PlaneSide};
use crate::scene::SceneGeometry;
use crate::util::Vec3;

use super::config::LightingConfig;
use super::directory::SurfaceDirectory;

/// Visibility sets of one caster triangle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Visibility {
    pub visible_objects: SmallVec<[u32; 8]>,
    pub visible_surfaces: Vec<u32>,
}

/// Visibility of a single caster.
///
/// Degenerate casters see nothing; degenerate receivers and the caster
/// itself are never reported.
pub fn visibility_for<S: SceneGeometry + ?Sized>(
    scene: &S,
    caster: usize,
    epsilon: f32,
) -> Visibility {
    let tri = scene.triangle(caster);
    let Some(normal) = tri.normal() else {
        return Visibility::default();
    };
    let origin = tri.centroid();

    let mut vis = Visibility::default();
    for object in 0..scene.object_count() {
        if !object_in_front(scene, object, normal, origin) {
            continue;
        }
        vis.visible_objects.push(object as u32);

        for receiver in scene.object_triangles(object) {
            if receiver == caster {
                continue;
            }
            let r = scene.triangle(receiver);
            if r.is_degenerate() {
                continue;
            }
            if receiver_visible(normal, origin, &r.v, epsilon) {
                vis.visible_surfaces.push(receiver as u32);
            }
        }
    }
    vis
}

/// Coarse object cull against the caster plane.
fn object_in_front<S: SceneGeometry + ?Sized>(
    scene: &S,
    object: usize,
    normal: Vec3,
    origin: Vec3,
) -> bool {
    let bounds = scene.object_bounding_box(object);
    if bounds.is_empty() {
        return false;
    }
    bounds
        .corners()
        .iter()
        .any(|&corner| normal.dot(corner - origin) > 0.0)
}

/// Fine half-space test for one receiver.
fn receiver_visible(normal: Vec3, origin: Vec3, vertices: &[Vec3; 3], epsilon: f32) -> bool {
    let mut front = 0;
    let mut behind = 0;
    for &v in vertices {
        match classify(normal, origin, v, epsilon) {
            PlaneSide::Front => front += 1,
            PlaneSide::Behind => behind += 1,
            PlaneSide::On => {}
        }
    }
    behind < 3 && front > 0
}

/// Visibility sets for every triangle in the scene.
#[tracing::instrument(skip_all, fields(triangles = scene.triangle_count()))]
pub fn compute_visibility<S: SceneGeometry + ?Sized>(
    scene: &S,
    config: &LightingConfig,
) -> Vec<Visibility> {
    let n = scene.triangle_count();
    let eps = config.plane_epsilon;
    if config.parallel {
        (0..n)
            .into_par_iter()
            .map(|caster| visibility_for(scene, caster, eps))
            .collect()
    } else {
        (0..n).map(|caster| visibility_for(scene, caster, eps)).collect()
    }
}

/// Build every surface directory with its visibility sets filled in.
///
/// `light_refs` are left empty for the light tree to populate.
#[tracing::instrument(skip_all, fields(triangles = scene.triangle_count()))]
pub fn build_directories<S: SceneGeometry + ?Sized>(
    scene: &S,
    config: &LightingConfig,
) -> Vec<SurfaceDirectory> {
    let n = scene.triangle_count();
    let eps = config.plane_epsilon;
    let make = |index: usize| {
        let mut dir = SurfaceDirectory::new(&scene.triangle(index), &scene.material(index));
        let vis = visibility_for(scene, index, eps);
        dir.visible_objects = vis.visible_objects;
        dir.visible_surfaces = vis.visible_surfaces;
        dir
    };

    let dirs: Vec<SurfaceDirectory> = if config.parallel {
        (0..n).into_par_iter().map(make).collect()
    } else {
        (0..n).map(make).collect()
    };

    let pairs: usize = dirs.iter().map(|d| d.visible_surfaces.len()).sum();
    let degenerate = dirs.iter().filter(|d| d.is_degenerate()).count();
    if degenerate > 0 {
        tracing::warn!(degenerate, "degenerate triangles excluded from light transport");
    }
    tracing::debug!(pairs, "visibility computed");
    dirs
}

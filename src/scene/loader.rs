//! JSON scene description loader.
//!
//! Geometry is inline (vertex and face arrays); external mesh formats are
//! not read here.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::util::{Error, Result, Vec3};

use super::model::{Camera, Material, Mesh, Scene, SceneObject};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneFile {
    scene_name: String,
    #[serde(default)]
    scene_description: String,
    #[serde(default)]
    materials: Vec<MaterialDesc>,
    #[serde(default)]
    meshes: Vec<MeshDesc>,
    #[serde(default)]
    objects: Vec<ObjectDesc>,
    #[serde(default)]
    camera: Option<CameraDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialDesc {
    name: String,
    #[serde(default)]
    roughness: f32,
    #[serde(default = "white")]
    albedo: [f32; 3],
    #[serde(default)]
    emissive_intensity: f32,
}

#[derive(Debug, Deserialize)]
struct MeshDesc {
    name: String,
    vertices: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
}

#[derive(Debug, Deserialize)]
struct ObjectDesc {
    mesh: String,
    material: String,
    #[serde(default)]
    position: [f32; 3],
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    scale: [f32; 3],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CameraDesc {
    #[serde(default)]
    position: [f32; 3],
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default = "unit_focal")]
    focal_length: f32,
}

fn white() -> [f32; 3] {
    [1.0; 3]
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

fn unit_focal() -> f32 {
    1.0
}

/// Load a scene description from a JSON file.
pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    tracing::info!(path = %path.display(), "loading scene");
    parse_scene(&text)
}

/// Parse a scene description from JSON text.
pub fn parse_scene(json: &str) -> Result<Scene> {
    let file: SceneFile = serde_json::from_str(json)?;

    let mut builder = Scene::builder(file.scene_name);
    builder.set_description(file.scene_description);
    if let Some(cam) = file.camera {
        builder.set_camera(Camera {
            position: Vec3::from(cam.position),
            rotation: Vec3::from(cam.rotation),
            focal_length: cam.focal_length,
        });
    }

    let mut material_ids = HashMap::with_capacity(file.materials.len());
    for m in file.materials {
        let id = builder.add_material(Material {
            albedo: Vec3::from(m.albedo),
            roughness: m.roughness,
            emissive_intensity: m.emissive_intensity,
        });
        material_ids.insert(m.name, id);
    }

    let mut mesh_ids = HashMap::with_capacity(file.meshes.len());
    for m in file.meshes {
        let vertices = m.vertices.into_iter().map(Vec3::from).collect();
        let id = builder.add_mesh(Mesh::new(m.name.clone(), vertices, m.faces));
        mesh_ids.insert(m.name, id);
    }

    for o in file.objects {
        let mesh = *mesh_ids
            .get(&o.mesh)
            .ok_or_else(|| Error::MeshNotFound(o.mesh.clone()))?;
        let material = *material_ids
            .get(&o.material)
            .ok_or_else(|| Error::MaterialNotFound(o.material.clone()))?;
        builder.add_object(
            SceneObject::new(mesh, material)
                .with_position(Vec3::from(o.position))
                .with_rotation(Vec3::from(o.rotation))
                .with_scale(Vec3::from(o.scale)),
        );
    }

    builder.build()
}

//! Arena-backed scene: meshes, materials, objects and camera.
//!
//! Objects reference meshes and materials by index into the scene's own
//! arrays. World-space triangles, the global triangle index table and
//! per-object bounds are computed once in [`SceneBuilder::build`] and stay
//! immutable for the lifetime of the scene.

use std::ops::Range;

use glam::EulerRot;

use crate::geom::{Aabb, Triangle};
use crate::util::{Error, Mat4, Quat, Result, Vec3};

use super::SceneGeometry;

/// Surface material. Only the diffuse terms take part in light transport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub albedo: Vec3,
    pub roughness: f32,
    pub emissive_intensity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vec3::ONE,
            roughness: 0.0,
            emissive_intensity: 0.0,
        }
    }
}

impl Material {
    /// Diffuse, non-emissive material.
    pub fn diffuse(albedo: Vec3) -> Self {
        Self {
            albedo,
            ..Self::default()
        }
    }

    /// Emissive material with the given intensity.
    pub fn emissive(albedo: Vec3, intensity: f32) -> Self {
        Self {
            albedo,
            roughness: 0.0,
            emissive_intensity: intensity,
        }
    }
}

/// Indexed triangle mesh in object space.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            name: name.into(),
            vertices,
            faces,
        }
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn validate(&self) -> Result<()> {
        let count = self.vertices.len();
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&v| v as usize >= count) {
                return Err(Error::invalid_mesh(
                    &self.name,
                    format!("face {i} references vertex {bad} (vertex count {count})"),
                ));
            }
        }
        Ok(())
    }
}

/// Placed instance of a mesh with a material.
#[derive(Clone, Copy, Debug)]
pub struct SceneObject {
    /// Index into the scene's mesh array.
    pub mesh: usize,
    /// Index into the scene's material array.
    pub material: usize,
    pub position: Vec3,
    /// Euler angles in radians: x = pitch, y = yaw, z = roll.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl SceneObject {
    pub fn new(mesh: usize, material: usize) -> Self {
        Self {
            mesh,
            material,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Scale, then yaw/pitch/roll rotation, then translation.
    pub fn world_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, euler_quat(self.rotation), self.position)
    }

    /// World-space position of vertex `i` of `mesh`.
    pub fn final_vertex(&self, mesh: &Mesh, i: usize) -> Option<Vec3> {
        mesh.vertices
            .get(i)
            .map(|&v| self.world_transform().transform_point3(v))
    }
}

/// Rotation from (pitch, yaw, roll): roll about Z first, then pitch, then yaw.
#[inline]
fn euler_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z)
}

/// Scene camera. Carried for the render frontend; light transport ignores it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Euler angles in radians: x = pitch, y = yaw, z = roll.
    pub rotation: Vec3,
    pub focal_length: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            focal_length: 1.0,
        }
    }
}

impl Camera {
    /// Vertical field of view used by [`Camera::projection_matrix`].
    pub const FOV_Y: f32 = 40.0 / 360.0 * std::f32::consts::TAU;
    pub const NEAR: f32 = 0.01;
    pub const FAR: f32 = 100.0;

    /// Point the camera looks at, `focal_length` ahead along rotated +Z.
    pub fn look_at(&self) -> Vec3 {
        self.position + euler_quat(self.rotation) * Vec3::new(0.0, 0.0, self.focal_length)
    }

    /// Right-handed view matrix with +Y up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at(), Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(Self::FOV_Y, aspect, Self::NEAR, Self::FAR)
    }
}

/// Immutable scene with global triangle indexing.
///
/// Global triangle indices concatenate each object's faces in object order.
#[derive(Clone, Debug)]
pub struct Scene {
    name: String,
    description: String,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    objects: Vec<SceneObject>,
    camera: Camera,

    /// World-space triangles in global index order.
    triangles: Vec<Triangle>,
    /// `offsets[i]..offsets[i + 1]` is object `i`'s global triangle range.
    offsets: Vec<usize>,
    bounds: Vec<Aabb>,
}

impl Scene {
    pub fn builder(name: impl Into<String>) -> SceneBuilder {
        SceneBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// All world-space triangles in global index order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Checked triangle lookup.
    pub fn try_triangle(&self, index: usize) -> Result<Triangle> {
        self.triangles
            .get(index)
            .copied()
            .ok_or(Error::TriangleOutOfRange {
                index,
                count: self.triangles.len(),
            })
    }

    /// Checked object lookup.
    pub fn try_object(&self, index: usize) -> Result<&SceneObject> {
        self.objects.get(index).ok_or(Error::ObjectOutOfRange {
            index,
            count: self.objects.len(),
        })
    }

    /// Map a global triangle index to `(object, local face)`.
    pub fn locate(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.triangles.len() {
            return Err(Error::TriangleOutOfRange {
                index,
                count: self.triangles.len(),
            });
        }
        // Last offset <= index; empty objects share offsets and are skipped.
        let object = self.offsets.partition_point(|&start| start <= index) - 1;
        Ok((object, index - self.offsets[object]))
    }

    #[track_caller]
    fn expect_located(&self, index: usize) -> (usize, usize) {
        match self.locate(index) {
            Ok(loc) => loc,
            Err(e) => panic!("scene '{}': {e}", self.name),
        }
    }
}

impl SceneGeometry for Scene {
    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn triangle(&self, index: usize) -> Triangle {
        match self.try_triangle(index) {
            Ok(t) => t,
            Err(e) => panic!("scene '{}': {e}", self.name),
        }
    }

    fn material(&self, index: usize) -> Material {
        let (object, _) = self.expect_located(index);
        self.materials[self.objects[object].material]
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn object_bounding_box(&self, object: usize) -> Aabb {
        self.bounds[object]
    }

    fn object_index_of(&self, index: usize) -> usize {
        self.expect_located(index).0
    }

    fn object_triangles(&self, object: usize) -> Range<usize> {
        self.offsets[object]..self.offsets[object + 1]
    }
}

/// Incremental scene construction; validates references on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct SceneBuilder {
    name: String,
    description: String,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    objects: Vec<SceneObject>,
    camera: Camera,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Add a mesh, returning its arena index.
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Add a material, returning its arena index.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add an object, returning its object index.
    pub fn add_object(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Convenience: one single-triangle object with its own mesh and material.
    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, material: Material) -> usize {
        let name = format!("tri{}", self.meshes.len());
        let mesh = self.add_mesh(Mesh::new(name, vec![a, b, c], vec![[0, 1, 2]]));
        let material = self.add_material(material);
        self.add_object(SceneObject::new(mesh, material))
    }

    pub fn build(self) -> Result<Scene> {
        for mesh in &self.meshes {
            mesh.validate()?;
        }

        let mut triangles = Vec::new();
        let mut offsets = Vec::with_capacity(self.objects.len() + 1);
        let mut bounds = Vec::with_capacity(self.objects.len());
        offsets.push(0);

        for (i, obj) in self.objects.iter().enumerate() {
            let mesh = self
                .meshes
                .get(obj.mesh)
                .ok_or_else(|| Error::MeshNotFound(format!("object {i} mesh index {}", obj.mesh)))?;
            if obj.material >= self.materials.len() {
                return Err(Error::MaterialNotFound(format!(
                    "object {i} material index {}",
                    obj.material
                )));
            }

            let xf = obj.world_transform();
            let world: Vec<Vec3> = mesh.vertices.iter().map(|&v| xf.transform_point3(v)).collect();

            // Bounds cover referenced vertices only, so stray vertices never widen the cull.
            let mut aabb = Aabb::EMPTY;
            for face in &mesh.faces {
                let [a, b, c] = face.map(|v| world[v as usize]);
                aabb.grow_point(a);
                aabb.grow_point(b);
                aabb.grow_point(c);
                triangles.push(Triangle::new(a, b, c));
            }
            bounds.push(aabb);
            offsets.push(triangles.len());
        }

        tracing::debug!(
            scene = %self.name,
            objects = self.objects.len(),
            triangles = triangles.len(),
            "scene built"
        );

        Ok(Scene {
            name: self.name,
            description: self.description,
            meshes: self.meshes,
            materials: self.materials,
            objects: self.objects,
            camera: self.camera,
            triangles,
            offsets,
            bounds,
        })
    }
}

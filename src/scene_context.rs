use crate::gfx;
use crate::image;
use crate::image::ImageData;
use crate::material::MaterialCache;
use crate::mesh::VboMesh;
use crate::scene::{FileTexture, MaterialId, MeshId, NodeAttribute, NodeId, Scene, TextureId};
use crate::Error;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A loaded scene and the records cached for its textures, materials and meshes.
/// Records are built once per scene object and keyed by its id
pub struct SceneContext<D: gfx::Device> {
    path: PathBuf,
    scene: Scene,
    cameras: Vec<NodeId>,
    textures: HashMap<TextureId, ImageData>,
    materials: HashMap<MaterialId, MaterialCache>,
    meshes: HashMap<MeshId, VboMesh<D>>,
    default_material: MaterialCache,
}

/// The last component of a file name authored on any platform
fn bare_file_name(file_name: &str) -> &str {
    file_name.rsplit(['/', '\\']).next().unwrap_or(file_name)
}

/// Tries the authored file name, then the relative name and finally the bare file name next to the scene
fn load_texture(scene_folder: &Path, texture: &FileTexture) -> Result<ImageData, Error> {
    let candidates = [
        PathBuf::from(&texture.file_name),
        scene_folder.join(&texture.relative_file_name),
        scene_folder.join(bare_file_name(&texture.file_name)),
    ];
    let mut last_error = Error::asset(format!("dive::scene_context: no file name for texture '{}'", texture.file_name));
    for candidate in candidates.iter().filter(|c| c.file_name().is_some()) {
        match image::load_from_file(candidate) {
            Ok(image) => return Ok(image),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

impl<D: gfx::Device> SceneContext<D> {
    /// Loads the scene at `path` and caches everything it references on `device`
    pub fn load(path: &Path, device: &mut D) -> Result<Self, Error> {
        let scene = Scene::load_from_file(path)?;
        Self::from_scene(path, scene, device)
    }

    /// Caches an already loaded scene, `path` locates textures relative to the scene file
    pub fn from_scene(path: &Path, scene: Scene, device: &mut D) -> Result<Self, Error> {
        let mut ctx = SceneContext {
            path: path.to_path_buf(),
            scene,
            cameras: Vec::new(),
            textures: HashMap::new(),
            materials: HashMap::new(),
            meshes: HashMap::new(),
            default_material: MaterialCache::default_material(),
        };
        ctx.fill_camera_array();
        ctx.load_textures();
        let root = ctx.scene.root;
        ctx.cache_node_recursive(device, root);
        log::info!(
            "dive::scene_context: cached {} textures, {} materials, {} meshes, {} cameras from {}",
            ctx.textures.len(),
            ctx.materials.len(),
            ctx.meshes.len(),
            ctx.cameras.len(),
            ctx.path.display()
        );
        Ok(ctx)
    }

    fn fill_camera_array(&mut self) {
        let mut cameras = Vec::new();
        self.scene.visit_depth_first(|id, node| {
            if matches!(node.attribute, NodeAttribute::Camera(_)) {
                cameras.push(id);
            }
        });
        self.cameras = cameras;
    }

    fn load_textures(&mut self) {
        let scene_folder = std::fs::canonicalize(&self.path)
            .unwrap_or_else(|_| self.path.clone())
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        for (index, texture) in self.scene.textures.iter().enumerate() {
            let id = TextureId(index);
            if self.textures.contains_key(&id) {
                continue;
            }
            if !image::is_supported(Path::new(&texture.file_name)) {
                log::warn!("dive::scene_context: only tga textures are supported: {}", texture.file_name);
                continue;
            }
            match load_texture(&scene_folder, texture) {
                Ok(image) => {
                    self.textures.insert(id, image);
                }
                Err(e) => log::warn!("dive::scene_context: failed to load texture file {}: {}", texture.file_name, e),
            }
        }
    }

    /// Builds records for the materials and mesh of `node` which are not cached yet
    fn cache_node(&mut self, device: &mut D, node_id: NodeId) {
        let Some(node) = self.scene.get_node(node_id) else {
            return;
        };

        for material_id in &node.materials {
            if self.materials.contains_key(material_id) {
                continue;
            }
            if let Some(material) = self.scene.get_material(*material_id) {
                self.materials.insert(*material_id, MaterialCache::create(material, &self.textures));
            }
        }

        // lights and cameras have no records
        let NodeAttribute::Mesh { mesh } = node.attribute else {
            return;
        };
        if self.meshes.contains_key(&mesh) {
            return;
        }
        let Some(scene_mesh) = self.scene.get_mesh(mesh) else {
            return;
        };
        match VboMesh::create(device, scene_mesh) {
            Ok(vbo) => {
                self.meshes.insert(mesh, vbo);
            }
            Err(e) => log::warn!("dive::scene_context: skipping mesh '{}': {}", scene_mesh.name, e),
        }
    }

    fn cache_node_recursive(&mut self, device: &mut D, root: NodeId) {
        let mut order = Vec::new();
        self.scene.visit_depth_first(|id, _| order.push(id));
        let mut in_subtree = vec![false; self.scene.nodes.len()];
        if let Some(flag) = in_subtree.get_mut(root.0) {
            *flag = true;
        }
        for id in order {
            if !in_subtree[id.0] {
                continue;
            }
            if let Some(node) = self.scene.get_node(id) {
                for child in &node.children {
                    if let Some(flag) = in_subtree.get_mut(child.0) {
                        *flag = true;
                    }
                }
            }
            self.cache_node(device, id);
        }
    }

    /// Drops the cached material and mesh records of `node` so they are rebuilt by `reload_node`
    pub fn invalidate_node(&mut self, node_id: NodeId) {
        let Some(node) = self.scene.get_node(node_id) else {
            return;
        };
        for material_id in &node.materials {
            self.materials.remove(material_id);
        }
        if let NodeAttribute::Mesh { mesh } = node.attribute {
            self.meshes.remove(&mesh);
        }
    }

    /// Invalidates and rebuilds the records of `node` and its children
    pub fn reload_node(&mut self, device: &mut D, node_id: NodeId) {
        self.invalidate_node(node_id);
        self.cache_node_recursive(device, node_id);
    }

    /// Drops all gpu buffers, the cpu side data is kept for `restore_device_resources`
    pub fn release_device_resources(&mut self) {
        for mesh in self.meshes.values_mut() {
            mesh.release();
        }
    }

    /// Uploads all cached meshes to a new device
    pub fn restore_device_resources(&mut self, device: &mut D) -> Result<(), Error> {
        for mesh in self.meshes.values_mut() {
            mesh.upload(device)?;
        }
        Ok(())
    }

    /// Moves the vertices of a cached mesh, `positions` has one entry per control point
    pub fn update_vertex_positions(&mut self, device: &mut D, mesh_id: MeshId, positions: &[[f64; 3]]) -> Result<(), Error> {
        let scene_mesh = self
            .scene
            .get_mesh(mesh_id)
            .ok_or_else(|| Error::asset(format!("dive::scene_context: invalid mesh {}", mesh_id.0)))?;
        let vbo = self
            .meshes
            .get_mut(&mesh_id)
            .ok_or_else(|| Error::asset(format!("dive::scene_context: mesh {} is not cached", mesh_id.0)))?;
        vbo.update_vertex_positions(device, scene_mesh, positions)
    }

    /// Draws all cached meshes in scene order, the pipeline state must already be set
    pub fn draw(&self, device: &mut D) {
        for index in 0..self.scene.meshes.len() {
            if let Some(mesh) = self.meshes.get(&MeshId(index)) {
                mesh.draw(device);
            }
        }
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn get_scene(&self) -> &Scene {
        &self.scene
    }

    /// Camera nodes in depth first order
    pub fn get_cameras(&self) -> &[NodeId] {
        &self.cameras
    }

    pub fn get_texture(&self, id: TextureId) -> Option<&ImageData> {
        self.textures.get(&id)
    }

    pub fn get_material(&self, id: MaterialId) -> Option<&MaterialCache> {
        self.materials.get(&id)
    }

    pub fn get_mesh(&self, id: MeshId) -> Option<&VboMesh<D>> {
        self.meshes.get(&id)
    }

    /// Material drawn for sub mesh `sub_mesh` of `node`, nodes without materials use the default material
    pub fn get_sub_mesh_material(&self, node: NodeId, sub_mesh: usize) -> &MaterialCache {
        self.scene
            .get_node(node)
            .and_then(|n| n.materials.get(sub_mesh))
            .and_then(|id| self.materials.get(id))
            .unwrap_or(&self.default_material)
    }

    pub fn get_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn get_material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn get_mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

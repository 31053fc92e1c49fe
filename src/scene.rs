use crate::Error;

use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::path::Path;

/// Index of a node in `Scene::nodes`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Index of a mesh in `Scene::meshes`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub usize);

/// Index of a material in `Scene::materials`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub usize);

/// Index of a file texture in `Scene::textures`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub usize);

/// How the elements of a layer are mapped onto the surface of a mesh
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MappingMode {
    /// The layer has no mapping and is treated as absent
    #[default]
    None,
    /// One element per control point
    ByControlPoint,
    /// One element per polygon corner
    ByPolygonVertex,
    /// One element per polygon
    ByPolygon,
    /// A single element for the whole surface
    AllSame,
}

/// How mapped values are looked up in the direct array
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// The mapped index addresses the direct array
    #[default]
    Direct,
    /// The mapped index addresses the index array, which addresses the direct array
    IndexToDirect,
}

/// A per mesh attribute channel (normals, uvs)
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerElement<T> {
    #[serde(default)]
    pub mapping_mode: MappingMode,
    #[serde(default)]
    pub reference_mode: ReferenceMode,
    pub direct: Vec<T>,
    #[serde(default)]
    pub index: Vec<u32>,
}

impl<T: Copy> LayerElement<T> {
    /// Resolves the value for corner `polygon_vertex` (running index over all polygon corners)
    /// of `polygon`, which references `control_point`
    pub fn get(&self, polygon: usize, polygon_vertex: usize, control_point: usize) -> Option<T> {
        let mapped = match self.mapping_mode {
            MappingMode::None => return None,
            MappingMode::ByControlPoint => control_point,
            MappingMode::ByPolygonVertex => polygon_vertex,
            MappingMode::ByPolygon => polygon,
            MappingMode::AllSame => 0,
        };
        let direct_index = match self.reference_mode {
            ReferenceMode::Direct => mapped,
            ReferenceMode::IndexToDirect => *self.index.get(mapped)? as usize,
        };
        self.direct.get(direct_index).copied()
    }

    /// True when the element is present and usable
    pub fn is_mapped(&self) -> bool {
        self.mapping_mode != MappingMode::None
    }

    /// Rebuilds the mapped array after polygons have been split, `sources[i]` is the
    /// old element the new element `i` copies
    fn remap(&mut self, sources: &[usize]) {
        match self.reference_mode {
            ReferenceMode::Direct => {
                let direct = &self.direct;
                self.direct = sources.iter().filter_map(|s| direct.get(*s).copied()).collect();
            }
            ReferenceMode::IndexToDirect => {
                let index = &self.index;
                self.index = sources.iter().filter_map(|s| index.get(*s).copied()).collect();
            }
        }
    }
}

/// Material assignment of a mesh, indices address the owning node's material list
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialElement {
    #[serde(default)]
    pub mapping_mode: MappingMode,
    #[serde(default)]
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub name: String,
    pub control_points: Vec<[f64; 3]>,
    /// Control point indices of each polygon
    pub polygons: Vec<Vec<u32>>,
    #[serde(default)]
    pub normals: Option<LayerElement<[f64; 3]>>,
    #[serde(default)]
    pub uvs: Option<LayerElement<[f64; 2]>>,
    #[serde(default)]
    pub materials: Option<MaterialElement>,
    /// Node that instances this mesh, assigned when the scene is loaded
    #[serde(skip)]
    pub node: Option<NodeId>,
    /// Number of materials on the instancing node, assigned when the scene is loaded
    #[serde(skip)]
    pub material_count: usize,
}

impl Mesh {
    pub fn get_polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn get_control_points_count(&self) -> usize {
        self.control_points.len()
    }

    /// True when every polygon has exactly three corners
    pub fn is_triangle_mesh(&self) -> bool {
        self.polygons.iter().all(|p| p.len() == 3)
    }

    /// Control point index of corner `vertex` of `polygon`
    pub fn get_polygon_vertex(&self, polygon: usize, vertex: usize) -> Option<u32> {
        self.polygons.get(polygon)?.get(vertex).copied()
    }

    /// Running corner index of corner `vertex` of `polygon`
    fn polygon_vertex_index(&self, polygon: usize, vertex: usize) -> usize {
        self.polygons[..polygon].iter().map(|p| p.len()).sum::<usize>() + vertex
    }

    pub fn get_polygon_vertex_normal(&self, polygon: usize, vertex: usize) -> Option<[f64; 3]> {
        let control_point = self.get_polygon_vertex(polygon, vertex)? as usize;
        let polygon_vertex = self.polygon_vertex_index(polygon, vertex);
        self.normals.as_ref()?.get(polygon, polygon_vertex, control_point)
    }

    pub fn get_polygon_vertex_uv(&self, polygon: usize, vertex: usize) -> Option<[f64; 2]> {
        let control_point = self.get_polygon_vertex(polygon, vertex)? as usize;
        let polygon_vertex = self.polygon_vertex_index(polygon, vertex);
        self.uvs.as_ref()?.get(polygon, polygon_vertex, control_point)
    }

    /// Splits polygons with more than three corners into triangle fans, re-expanding
    /// per corner and per polygon attributes to follow
    pub fn triangulate(&mut self) {
        if self.is_triangle_mesh() {
            return;
        }
        let mut polygons = Vec::new();
        let mut corner_sources = Vec::new();
        let mut polygon_sources = Vec::new();
        let mut first_corner = 0;
        for (pi, polygon) in self.polygons.iter().enumerate() {
            if polygon.len() < 3 {
                log::warn!("dive::scene: dropping degenerate polygon {} of mesh '{}'", pi, self.name);
            }
            else {
                for i in 1..polygon.len() - 1 {
                    polygons.push(vec![polygon[0], polygon[i], polygon[i + 1]]);
                    corner_sources.extend([first_corner, first_corner + i, first_corner + i + 1]);
                    polygon_sources.push(pi);
                }
            }
            first_corner += polygon.len();
        }
        self.polygons = polygons;

        if let Some(normals) = self.normals.as_mut() {
            match normals.mapping_mode {
                MappingMode::ByPolygonVertex => normals.remap(&corner_sources),
                MappingMode::ByPolygon => normals.remap(&polygon_sources),
                _ => (),
            }
        }
        if let Some(uvs) = self.uvs.as_mut() {
            match uvs.mapping_mode {
                MappingMode::ByPolygonVertex => uvs.remap(&corner_sources),
                MappingMode::ByPolygon => uvs.remap(&polygon_sources),
                _ => (),
            }
        }
        if let Some(materials) = self.materials.as_mut() {
            if materials.mapping_mode == MappingMode::ByPolygon {
                let indices = &materials.indices;
                materials.indices = polygon_sources.iter().filter_map(|s| indices.get(*s).copied()).collect();
            }
        }
    }
}

/// Value of a material property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Colour([f64; 3]),
    Scalar(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperty {
    pub value: PropertyValue,
    /// File textures connected to the property
    #[serde(default)]
    pub textures: Vec<TextureId>,
}

/// Well known material property names
pub mod property {
    pub const EMISSIVE: &str = "EmissiveColor";
    pub const EMISSIVE_FACTOR: &str = "EmissiveFactor";
    pub const AMBIENT: &str = "AmbientColor";
    pub const AMBIENT_FACTOR: &str = "AmbientFactor";
    pub const DIFFUSE: &str = "DiffuseColor";
    pub const DIFFUSE_FACTOR: &str = "DiffuseFactor";
    pub const SPECULAR: &str = "SpecularColor";
    pub const SPECULAR_FACTOR: &str = "SpecularFactor";
    pub const SHININESS: &str = "ShininessExponent";
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: HashMap<String, MaterialProperty>,
}

impl Material {
    pub fn find_property(&self, name: &str) -> Option<&MaterialProperty> {
        self.properties.get(name)
    }
}

/// A texture referenced by file name
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileTexture {
    /// Absolute file name as authored
    #[serde(default)]
    pub file_name: String,
    /// File name relative to the scene file
    #[serde(default)]
    pub relative_file_name: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: [f64; 3],
    pub interest: [f64; 3],
    #[serde(default = "default_field_of_view")]
    pub field_of_view: f64,
}

fn default_field_of_view() -> f64 {
    70.0
}

/// Attribute attached to a node
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeAttribute {
    #[default]
    None,
    Mesh {
        mesh: MeshId,
    },
    Camera(Camera),
    Light,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attribute: NodeAttribute,
    #[serde(default)]
    pub materials: Vec<MaterialId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

/// Interchange scene graph, objects are stored in arenas and referenced by id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scene {
    pub root: NodeId,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub textures: Vec<FileTexture>,
}

impl Scene {
    /// Loads a scene from a json file, validating references and triangulating meshes
    pub fn load_from_file(path: &Path) -> Result<Scene, Error> {
        log::info!("dive::scene: loading: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Scene, Error> {
        let mut scene: Scene = serde_json::from_str(json)?;
        scene.prepare()?;
        Ok(scene)
    }

    /// Validates ids, assigns mesh nodes and triangulates all meshes
    pub fn prepare(&mut self) -> Result<(), Error> {
        if self.root.0 >= self.nodes.len() {
            return Err(Error::asset(format!("dive::scene: root node {} out of range", self.root.0)));
        }
        for (ni, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                if child.0 >= self.nodes.len() {
                    return Err(Error::asset(format!("dive::scene: node {} has invalid child {}", ni, child.0)));
                }
            }
            for material in &node.materials {
                if material.0 >= self.materials.len() {
                    return Err(Error::asset(format!("dive::scene: node {} has invalid material {}", ni, material.0)));
                }
            }
            if let NodeAttribute::Mesh { mesh } = node.attribute {
                if mesh.0 >= self.meshes.len() {
                    return Err(Error::asset(format!("dive::scene: node {} has invalid mesh {}", ni, mesh.0)));
                }
            }
        }
        for (mi, material) in self.materials.iter().enumerate() {
            for property in material.properties.values() {
                if let Some(texture) = property.textures.iter().find(|t| t.0 >= self.textures.len()) {
                    return Err(Error::asset(format!(
                        "dive::scene: material {} has invalid texture {}",
                        mi, texture.0
                    )));
                }
            }
        }

        for mesh in &mut self.meshes {
            mesh.node = None;
            mesh.material_count = 0;
        }
        for (ni, node) in self.nodes.iter().enumerate() {
            if let NodeAttribute::Mesh { mesh } = node.attribute {
                let mesh = &mut self.meshes[mesh.0];
                if mesh.node.is_none() {
                    mesh.node = Some(NodeId(ni));
                    mesh.material_count = node.materials.len();
                }
            }
        }
        for mesh in &mut self.meshes {
            mesh.triangulate();
        }
        Ok(())
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn get_mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn get_material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn get_texture(&self, id: TextureId) -> Option<&FileTexture> {
        self.textures.get(id.0)
    }

    /// Visits nodes depth first starting at the root, children in order
    pub fn visit_depth_first<F: FnMut(NodeId, &Node)>(&self, mut visit: F) {
        let mut stack = vec![self.root];
        let mut visited = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            if std::mem::replace(&mut visited[id.0], true) {
                log::warn!("dive::scene: node {} is reachable more than once, skipping", id.0);
                continue;
            }
            visit(id, node);
            stack.extend(node.children.iter().rev());
        }
    }
}

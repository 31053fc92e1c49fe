use crate::gfx;
use crate::scene;
use crate::scene::MappingMode;
use crate::Error;

/// Number of vertices in each polygon of a triangulated mesh
pub const TRIANGLE_VERTEX_COUNT: usize = 3;

/// Interleaved vertex of a scene mesh, position and colour match the layout of `primitives::VertexPositionColor`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Full input layout of `Vertex`
pub fn vertex_input_layout() -> Vec<gfx::InputElementInfo> {
    let element = |semantic: &str, format: gfx::Format, aligned_byte_offset: u32| gfx::InputElementInfo {
        semantic: semantic.to_string(),
        index: 0,
        format,
        input_slot: 0,
        aligned_byte_offset,
    };
    vec![
        element("POSITION", gfx::Format::RGB32f, 0),
        element("COLOR", gfx::Format::RGB32f, 12),
        element("NORMAL", gfx::Format::RGB32f, 24),
        element("TEXCOORD", gfx::Format::RG32f, 36),
    ]
}

/// A contiguous range of the index buffer drawn with a single material
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubMesh {
    pub index_offset: u32,
    pub triangle_count: u32,
}

/// Cpu side vertex and index data of a mesh, grouped by material
#[derive(Clone, Debug)]
pub struct MeshBuffers {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub sub_meshes: Vec<SubMesh>,
    pub has_normal: bool,
    pub has_uv: bool,
    /// One vertex per control point and indices address control points, otherwise one vertex per triangle corner
    pub all_by_control_point: bool,
}

fn to_f32_3(v: [f64; 3]) -> [f32; 3] {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

fn to_f32_2(v: [f64; 2]) -> [f32; 2] {
    [v[0] as f32, v[1] as f32]
}

/// Counts triangles per material and turns the counts into index offsets. Returns the material of each polygon
fn partition_by_material(mesh: &scene::Mesh) -> Result<(Vec<SubMesh>, Vec<usize>), Error> {
    let polygon_count = mesh.get_polygon_count();
    let by_polygon = mesh.materials.as_ref().filter(|m| m.mapping_mode == MappingMode::ByPolygon);

    let material_indices = match by_polygon {
        Some(materials) if materials.indices.len() == polygon_count => {
            materials.indices.iter().map(|i| *i as usize).collect()
        }
        Some(materials) => {
            log::warn!(
                "dive::mesh: '{}' has {} material indices for {} polygons, using a single material",
                mesh.name,
                materials.indices.len(),
                polygon_count
            );
            vec![0; polygon_count]
        }
        None => vec![0; polygon_count],
    };

    // a node without materials still draws its mesh with the default material in slot 0
    let material_slots = mesh.material_count.max(1);
    if let Some(material) = material_indices.iter().find(|m| **m >= material_slots) {
        return Err(Error::asset(format!(
            "dive::mesh: '{}' uses material {} but its node has {}",
            mesh.name, material, mesh.material_count
        )));
    }

    // gaps in the material indices become empty sub meshes
    let sub_mesh_count = material_indices.iter().max().map(|m| m + 1).unwrap_or(1);
    let mut sub_meshes = vec![SubMesh::default(); sub_mesh_count];
    for material in &material_indices {
        sub_meshes[*material].triangle_count += 1;
    }

    // counts are reset, they are used as the fill cursor while writing indices
    let mut offset = 0;
    for sub_mesh in &mut sub_meshes {
        sub_mesh.index_offset = offset;
        offset += sub_mesh.triangle_count * TRIANGLE_VERTEX_COUNT as u32;
        sub_mesh.triangle_count = 0;
    }

    Ok((sub_meshes, material_indices))
}

impl MeshBuffers {
    /// Converts a triangulated scene mesh into flat vertex and index arrays
    pub fn build(mesh: &scene::Mesh) -> Result<Self, Error> {
        if mesh.node.is_none() {
            return Err(Error::asset(format!("dive::mesh: '{}' is not attached to a node", mesh.name)));
        }
        if mesh.get_polygon_count() == 0 {
            return Err(Error::asset(format!("dive::mesh: '{}' has no polygons", mesh.name)));
        }
        if !mesh.is_triangle_mesh() {
            return Err(Error::asset(format!("dive::mesh: '{}' is not triangulated", mesh.name)));
        }
        let control_point_count = mesh.get_control_points_count();
        if mesh.polygons.iter().flatten().any(|cp| *cp as usize >= control_point_count) {
            return Err(Error::asset(format!(
                "dive::mesh: '{}' references a control point out of range",
                mesh.name
            )));
        }

        let (mut sub_meshes, material_indices) = partition_by_material(mesh)?;

        let normals = mesh.normals.as_ref().filter(|n| n.is_mapped());
        let uvs = mesh.uvs.as_ref().filter(|u| u.is_mapped());
        let has_normal = normals.is_some();
        let has_uv = uvs.is_some();
        let all_by_control_point = normals.map(|n| n.mapping_mode == MappingMode::ByControlPoint).unwrap_or(true)
            && uvs.map(|u| u.mapping_mode == MappingMode::ByControlPoint).unwrap_or(true);

        let polygon_count = mesh.get_polygon_count();
        let mut indices = vec![0u32; polygon_count * TRIANGLE_VERTEX_COUNT];
        let mut vertices = Vec::new();

        if all_by_control_point {
            vertices = mesh
                .control_points
                .iter()
                .enumerate()
                .map(|(cp, position)| Vertex {
                    position: to_f32_3(*position),
                    color: [1.0, 1.0, 1.0],
                    normal: normals.and_then(|n| n.get(0, 0, cp)).map(to_f32_3).unwrap_or_default(),
                    uv: uvs.and_then(|u| u.get(0, 0, cp)).map(to_f32_2).unwrap_or_default(),
                })
                .collect();
        }
        else {
            vertices.reserve(polygon_count * TRIANGLE_VERTEX_COUNT);
        }

        for (polygon, material) in material_indices.iter().enumerate() {
            let sub_mesh = &mut sub_meshes[*material];
            let index_offset = (sub_mesh.index_offset + sub_mesh.triangle_count * TRIANGLE_VERTEX_COUNT as u32) as usize;
            for vertex in 0..TRIANGLE_VERTEX_COUNT {
                let control_point = mesh.polygons[polygon][vertex];
                let polygon_vertex = polygon * TRIANGLE_VERTEX_COUNT + vertex;
                if all_by_control_point {
                    indices[index_offset + vertex] = control_point;
                }
                else {
                    indices[index_offset + vertex] = vertices.len() as u32;
                    vertices.push(Vertex {
                        position: to_f32_3(mesh.control_points[control_point as usize]),
                        color: [1.0, 1.0, 1.0],
                        normal: normals
                            .and_then(|n| n.get(polygon, polygon_vertex, control_point as usize))
                            .map(to_f32_3)
                            .unwrap_or_default(),
                        uv: uvs
                            .and_then(|u| u.get(polygon, polygon_vertex, control_point as usize))
                            .map(to_f32_2)
                            .unwrap_or_default(),
                    });
                }
            }
            sub_mesh.triangle_count += 1;
        }

        log::debug!(
            "dive::mesh: built '{}' with {} vertices, {} indices, {} sub meshes",
            mesh.name,
            vertices.len(),
            indices.len(),
            sub_meshes.len()
        );

        Ok(MeshBuffers {
            vertices,
            indices,
            sub_meshes,
            has_normal,
            has_uv,
            all_by_control_point,
        })
    }

    /// Rewrites only the positions, `positions` holds one entry per control point of `mesh`
    pub fn update_vertex_positions(&mut self, mesh: &scene::Mesh, positions: &[[f64; 3]]) -> Result<(), Error> {
        if positions.len() != mesh.get_control_points_count() {
            return Err(Error::asset(format!(
                "dive::mesh: '{}' expects {} positions, got {}",
                mesh.name,
                mesh.get_control_points_count(),
                positions.len()
            )));
        }
        if self.all_by_control_point {
            for (vertex, position) in self.vertices.iter_mut().zip(positions) {
                vertex.position = to_f32_3(*position);
            }
        }
        else {
            let corners = mesh.polygons.iter().flat_map(|p| p.iter().take(TRIANGLE_VERTEX_COUNT));
            for (vertex, control_point) in self.vertices.iter_mut().zip(corners) {
                let position = positions
                    .get(*control_point as usize)
                    .ok_or_else(|| Error::asset("dive::mesh: control point out of range"))?;
                vertex.position = to_f32_3(*position);
            }
        }
        Ok(())
    }

    pub fn get_sub_mesh_count(&self) -> usize {
        self.sub_meshes.len()
    }

    pub fn get_index_count(&self) -> usize {
        self.indices.len()
    }
}

/// Gpu buffers of a scene mesh, the cpu side data is kept so the buffers can be recreated after device loss
pub struct VboMesh<D: gfx::Device> {
    buffers: MeshBuffers,
    vertex_buffer: Option<D::Buffer>,
    index_buffer: Option<D::Buffer>,
}

impl<D: gfx::Device> VboMesh<D> {
    /// Builds the mesh buffers and uploads them to `device`
    pub fn create(device: &mut D, mesh: &scene::Mesh) -> Result<Self, Error> {
        let mut vbo = VboMesh {
            buffers: MeshBuffers::build(mesh)?,
            vertex_buffer: None,
            index_buffer: None,
        };
        vbo.upload(device)?;
        Ok(vbo)
    }

    /// Creates the gpu buffers from the cpu side data
    pub fn upload(&mut self, device: &mut D) -> Result<(), Error> {
        let vertex_buffer = device.create_buffer(
            &gfx::BufferInfo {
                usage: gfx::BufferUsage::Vertex,
                cpu_access: gfx::CpuAccessFlags::WRITE,
                format: gfx::Format::Unknown,
                stride: std::mem::size_of::<Vertex>(),
                num_elements: self.buffers.vertices.len(),
            },
            Some(self.buffers.vertices.as_slice()),
        )?;
        let index_buffer = device.create_buffer(
            &gfx::BufferInfo {
                usage: gfx::BufferUsage::Index,
                cpu_access: gfx::CpuAccessFlags::NONE,
                format: gfx::Format::R32u,
                stride: std::mem::size_of::<u32>(),
                num_elements: self.buffers.indices.len(),
            },
            Some(self.buffers.indices.as_slice()),
        )?;
        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
        Ok(())
    }

    /// Drops the gpu buffers, the mesh can be uploaded again later
    pub fn release(&mut self) {
        self.vertex_buffer = None;
        self.index_buffer = None;
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    /// Moves the vertices to `positions` and re-uploads the vertex buffer
    pub fn update_vertex_positions(&mut self, device: &mut D, mesh: &scene::Mesh, positions: &[[f64; 3]]) -> Result<(), Error> {
        self.buffers.update_vertex_positions(mesh, positions)?;
        if let Some(vertex_buffer) = &self.vertex_buffer {
            device.update_buffer(vertex_buffer, self.buffers.vertices.as_slice())?;
        }
        Ok(())
    }

    /// Binds the buffers and draws every non empty sub mesh, the pipeline state must already be set
    pub fn draw(&self, device: &mut D) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&self.vertex_buffer, &self.index_buffer) else {
            return;
        };
        device.set_vertex_buffer(vertex_buffer, 0);
        device.set_index_buffer(index_buffer);
        for sub_mesh in self.buffers.sub_meshes.iter().filter(|s| s.triangle_count > 0) {
            device.draw_indexed(
                sub_mesh.triangle_count * TRIANGLE_VERTEX_COUNT as u32,
                sub_mesh.index_offset,
                0,
            );
        }
    }

    pub fn get_buffers(&self) -> &MeshBuffers {
        &self.buffers
    }

    pub fn get_sub_meshes(&self) -> &[SubMesh] {
        &self.buffers.sub_meshes
    }

    pub fn get_vertex_buffer(&self) -> Option<&D::Buffer> {
        self.vertex_buffer.as_ref()
    }

    pub fn get_index_buffer(&self) -> Option<&D::Buffer> {
        self.index_buffer.as_ref()
    }
}

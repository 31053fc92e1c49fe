use crate::gfx;
use crate::Error;

/// Position and colour, matches the `POSITION` / `COLOR` input layout of the sample shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexPositionColor {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Indexed mesh with vertex and index buffers
pub struct Mesh<D: gfx::Device> {
    pub vb: D::Buffer,
    pub ib: D::Buffer,
    pub num_indices: u32,
}

/// Vertex layout shared by `VertexPositionColor` and the scene mesh vertices, which begin with the same two members
pub fn position_color_input_layout() -> Vec<gfx::InputElementInfo> {
    vec![
        gfx::InputElementInfo {
            semantic: "POSITION".to_string(),
            index: 0,
            format: gfx::Format::RGB32f,
            input_slot: 0,
            aligned_byte_offset: 0,
        },
        gfx::InputElementInfo {
            semantic: "COLOR".to_string(),
            index: 0,
            format: gfx::Format::RGB32f,
            input_slot: 0,
            aligned_byte_offset: 12,
        },
    ]
}

/// Utility to create meshes with varying index sizes depending on the index requirements
pub fn create_mesh_3d<D: gfx::Device, V: Sized>(dev: &mut D, vertices: &[V], indices: &[u32]) -> Result<Mesh<D>, Error> {
    let index_buffer = if vertices.len() > 65535 {
        dev.create_buffer(
            &gfx::BufferInfo {
                usage: gfx::BufferUsage::Index,
                cpu_access: gfx::CpuAccessFlags::NONE,
                num_elements: indices.len(),
                format: gfx::Format::R32u,
                stride: 4,
            },
            Some(indices),
        )?
    }
    else {
        let indices16: Vec<u16> = indices.iter().map(|i| *i as u16).collect();
        dev.create_buffer(
            &gfx::BufferInfo {
                usage: gfx::BufferUsage::Index,
                cpu_access: gfx::CpuAccessFlags::NONE,
                num_elements: indices16.len(),
                format: gfx::Format::R16u,
                stride: 2,
            },
            Some(indices16.as_slice()),
        )?
    };

    Ok(Mesh {
        vb: dev.create_buffer(
            &gfx::BufferInfo {
                usage: gfx::BufferUsage::Vertex,
                cpu_access: gfx::CpuAccessFlags::NONE,
                num_elements: vertices.len(),
                format: gfx::Format::Unknown,
                stride: std::mem::size_of::<V>(),
            },
            Some(vertices),
        )?,
        ib: index_buffer,
        num_indices: indices.len() as u32,
    })
}

/// Each vertex of the cube has a position and a colour
pub const CUBE_VERTICES: [VertexPositionColor; 8] = [
    VertexPositionColor { position: [-0.5, -0.5, -0.5], color: [0.0, 0.0, 0.0] },
    VertexPositionColor { position: [-0.5, -0.5,  0.5], color: [0.0, 0.0, 1.0] },
    VertexPositionColor { position: [-0.5,  0.5, -0.5], color: [0.0, 1.0, 0.0] },
    VertexPositionColor { position: [-0.5,  0.5,  0.5], color: [0.0, 1.0, 1.0] },
    VertexPositionColor { position: [ 0.5, -0.5, -0.5], color: [1.0, 0.0, 0.0] },
    VertexPositionColor { position: [ 0.5, -0.5,  0.5], color: [1.0, 0.0, 1.0] },
    VertexPositionColor { position: [ 0.5,  0.5, -0.5], color: [1.0, 1.0, 0.0] },
    VertexPositionColor { position: [ 0.5,  0.5,  0.5], color: [1.0, 1.0, 1.0] },
];

/// Each trio of indices represents a triangle to be rendered, 2 triangles per face
pub const CUBE_INDICES: [u32; 36] = [
    0, 2, 1, // -x
    1, 2, 3,

    4, 5, 6, // +x
    5, 7, 6,

    0, 1, 5, // -y
    0, 5, 4,

    2, 6, 7, // +y
    2, 7, 3,

    0, 4, 6, // -z
    0, 6, 2,

    1, 3, 7, // +z
    1, 7, 5,
];

/// Create an indexed unit cube centred on the origin with a distinct colour at each corner
pub fn create_cube_mesh<D: gfx::Device>(dev: &mut D) -> Result<Mesh<D>, Error> {
    create_mesh_3d(dev, &CUBE_VERTICES, &CUBE_INDICES)
}

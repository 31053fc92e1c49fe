use dive_rs::*;

use gfx::null;
use mesh::{MeshBuffers, SubMesh, VboMesh};
use scene::{LayerElement, MappingMode, MaterialElement, NodeId, ReferenceMode};

/// Strip of four triangles over six control points, polygons use materials 0, 1, 0, 2
fn strip_mesh() -> scene::Mesh {
    scene::Mesh {
        name: "strip".to_string(),
        control_points: (0..6).map(|i| [i as f64, (i % 2) as f64, 0.0]).collect(),
        polygons: vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]],
        materials: Some(MaterialElement {
            mapping_mode: MappingMode::ByPolygon,
            indices: vec![0, 1, 0, 2],
        }),
        node: Some(NodeId(0)),
        material_count: 3,
        ..Default::default()
    }
}

fn per_corner_normals(count: usize) -> LayerElement<[f64; 3]> {
    LayerElement {
        mapping_mode: MappingMode::ByPolygonVertex,
        reference_mode: ReferenceMode::Direct,
        direct: (0..count).map(|i| [0.0, 0.0, i as f64]).collect(),
        index: Vec::new(),
    }
}

fn create_device() -> Result<null::Device, Error> {
    use gfx::Device as _;
    null::set_driver(null::Driver::default());
    let info = gfx::DeviceInfo::default();
    let factories = null::Device::create_factories(&info)?;
    null::Device::create(&info, gfx::DriverType::Hardware, &factories)
}

#[test]
fn sub_meshes_are_grouped_by_material() -> Result<(), Error> {
    let buffers = MeshBuffers::build(&strip_mesh())?;
    assert_eq!(
        buffers.sub_meshes,
        vec![
            SubMesh { index_offset: 0, triangle_count: 2 },
            SubMesh { index_offset: 6, triangle_count: 1 },
            SubMesh { index_offset: 9, triangle_count: 1 },
        ]
    );
    assert_eq!(buffers.get_sub_mesh_count(), 3);
    assert_eq!(buffers.get_index_count(), 12);
    Ok(())
}

#[test]
fn control_point_vertices() -> Result<(), Error> {
    let buffers = MeshBuffers::build(&strip_mesh())?;
    assert!(buffers.all_by_control_point);
    assert!(!buffers.has_normal);
    assert!(!buffers.has_uv);
    assert_eq!(buffers.vertices.len(), 6);
    assert_eq!(buffers.indices, vec![0, 1, 2, 2, 3, 4, 1, 2, 3, 3, 4, 5]);
    assert_eq!(buffers.vertices[3].position, [3.0, 1.0, 0.0]);
    assert_eq!(buffers.vertices[3].color, [1.0, 1.0, 1.0]);
    Ok(())
}

#[test]
fn per_corner_vertices() -> Result<(), Error> {
    let mut mesh = strip_mesh();
    mesh.normals = Some(per_corner_normals(12));
    let buffers = MeshBuffers::build(&mesh)?;

    assert!(!buffers.all_by_control_point);
    assert!(buffers.has_normal);
    assert_eq!(buffers.vertices.len(), 12);
    // vertices are written in polygon order, indices in material order
    assert_eq!(buffers.indices, vec![0, 1, 2, 6, 7, 8, 3, 4, 5, 9, 10, 11]);
    assert_eq!(buffers.vertices[3].position, [1.0, 1.0, 0.0]);
    assert_eq!(buffers.vertices[3].normal, [0.0, 0.0, 3.0]);
    Ok(())
}

#[test]
fn no_material_element_uses_one_sub_mesh() -> Result<(), Error> {
    let mut mesh = strip_mesh();
    mesh.materials = None;
    let buffers = MeshBuffers::build(&mesh)?;
    assert_eq!(buffers.sub_meshes, vec![SubMesh { index_offset: 0, triangle_count: 4 }]);
    assert_eq!(buffers.indices, vec![0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4, 5]);
    Ok(())
}

#[test]
fn mismatched_material_element_uses_one_sub_mesh() -> Result<(), Error> {
    let mut mesh = strip_mesh();
    mesh.materials = Some(MaterialElement {
        mapping_mode: MappingMode::ByPolygon,
        indices: vec![1, 0],
    });
    let buffers = MeshBuffers::build(&mesh)?;
    assert_eq!(buffers.get_sub_mesh_count(), 1);
    Ok(())
}

#[test]
fn material_gaps_become_empty_sub_meshes() -> Result<(), Error> {
    let mut mesh = strip_mesh();
    mesh.materials = Some(MaterialElement {
        mapping_mode: MappingMode::ByPolygon,
        indices: vec![2, 2, 0, 0],
    });
    let buffers = MeshBuffers::build(&mesh)?;
    assert_eq!(
        buffers.sub_meshes,
        vec![
            SubMesh { index_offset: 0, triangle_count: 2 },
            SubMesh { index_offset: 6, triangle_count: 0 },
            SubMesh { index_offset: 6, triangle_count: 2 },
        ]
    );
    Ok(())
}

#[test]
fn invalid_meshes_are_rejected() {
    let mut detached = strip_mesh();
    detached.node = None;
    assert_eq!(MeshBuffers::build(&detached).unwrap_err().kind, ErrorKind::Asset);

    let mut empty = strip_mesh();
    empty.polygons.clear();
    assert_eq!(MeshBuffers::build(&empty).unwrap_err().kind, ErrorKind::Asset);

    let mut quads = strip_mesh();
    quads.polygons = vec![vec![0, 1, 3, 2]];
    assert_eq!(MeshBuffers::build(&quads).unwrap_err().kind, ErrorKind::Asset);

    let mut out_of_range = strip_mesh();
    out_of_range.polygons[1] = vec![1, 2, 6];
    assert_eq!(MeshBuffers::build(&out_of_range).unwrap_err().kind, ErrorKind::Asset);
}

#[test]
fn material_indices_are_bounded_by_the_node() {
    let mut unknown = strip_mesh();
    unknown.materials = Some(MaterialElement {
        mapping_mode: MappingMode::ByPolygon,
        indices: vec![0, 1, 3, 0],
    });
    assert_eq!(MeshBuffers::build(&unknown).unwrap_err().kind, ErrorKind::Asset);

    let mut huge = strip_mesh();
    huge.materials = Some(MaterialElement {
        mapping_mode: MappingMode::ByPolygon,
        indices: vec![0, 4_000_000_000, 0, 0],
    });
    assert_eq!(MeshBuffers::build(&huge).unwrap_err().kind, ErrorKind::Asset);

    // no materials on the node, everything draws with the default material
    let mut unassigned = strip_mesh();
    unassigned.material_count = 0;
    unassigned.materials = Some(MaterialElement {
        mapping_mode: MappingMode::ByPolygon,
        indices: vec![0, 0, 0, 0],
    });
    assert!(MeshBuffers::build(&unassigned).is_ok());
    unassigned.materials = Some(MaterialElement {
        mapping_mode: MappingMode::ByPolygon,
        indices: vec![0, 1, 0, 0],
    });
    assert!(MeshBuffers::build(&unassigned).is_err());
}

#[test]
fn large_per_corner_mesh() -> Result<(), Error> {
    // a grid strip of 200k triangles with per corner normals
    let triangle_count = 200_000;
    let control_points: Vec<[f64; 3]> = (0..triangle_count + 2).map(|i| [i as f64, (i % 2) as f64, 0.0]).collect();
    let polygons: Vec<Vec<u32>> = (0..triangle_count as u32).map(|i| vec![i, i + 1, i + 2]).collect();
    let mesh = scene::Mesh {
        name: "large".to_string(),
        control_points,
        polygons,
        normals: Some(per_corner_normals(triangle_count * 3)),
        node: Some(NodeId(0)),
        ..Default::default()
    };

    let buffers = MeshBuffers::build(&mesh)?;
    assert!(!buffers.all_by_control_point);
    assert_eq!(buffers.vertices.len(), triangle_count * 3);
    assert_eq!(buffers.indices.len(), triangle_count * 3);
    let last = buffers.vertices.len() - 1;
    assert_eq!(buffers.vertices[last].normal, [0.0, 0.0, last as f32]);
    assert_eq!(buffers.vertices[last].position, [(triangle_count + 1) as f32, ((triangle_count + 1) % 2) as f32, 0.0]);
    Ok(())
}

#[test]
fn update_positions() -> Result<(), Error> {
    let mesh = strip_mesh();
    let moved: Vec<[f64; 3]> = mesh.control_points.iter().map(|p| [p[0], p[1], 5.0]).collect();

    let mut buffers = MeshBuffers::build(&mesh)?;
    buffers.update_vertex_positions(&mesh, &moved)?;
    assert!(buffers.vertices.iter().all(|v| v.position[2] == 5.0));

    let mut per_corner = strip_mesh();
    per_corner.normals = Some(per_corner_normals(12));
    let mut buffers = MeshBuffers::build(&per_corner)?;
    buffers.update_vertex_positions(&per_corner, &moved)?;
    assert!(buffers.vertices.iter().all(|v| v.position[2] == 5.0));
    // normals are untouched
    assert_eq!(buffers.vertices[11].normal, [0.0, 0.0, 11.0]);

    let err = buffers.update_vertex_positions(&per_corner, &moved[..3]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Asset);
    Ok(())
}

#[test]
fn vbo_mesh_draws_each_sub_mesh() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut mesh = strip_mesh();
    mesh.materials = Some(MaterialElement {
        mapping_mode: MappingMode::ByPolygon,
        indices: vec![0, 0, 2, 2],
    });
    let vbo = VboMesh::create(&mut device, &mesh)?;
    assert!(vbo.is_uploaded());

    let vb = vbo.get_vertex_buffer().unwrap();
    let ib = vbo.get_index_buffer().unwrap();
    assert_eq!(ib.read::<u32>(), vbo.get_buffers().indices);
    assert_eq!(vb.read::<mesh::Vertex>(), vbo.get_buffers().vertices);

    device.clear_commands();
    vbo.draw(&mut device);

    // the empty sub mesh for material 1 is skipped
    assert_eq!(
        device.get_commands(),
        &[
            null::Command::SetVertexBuffer { buffer: vb.id, slot: 0 },
            null::Command::SetIndexBuffer(ib.id),
            null::Command::DrawIndexed { index_count: 6, start_index: 0, base_vertex: 0 },
            null::Command::DrawIndexed { index_count: 6, start_index: 6, base_vertex: 0 },
        ]
    );
    Ok(())
}

#[test]
fn vbo_mesh_release_and_upload() -> Result<(), Error> {
    let mut device = create_device()?;
    let mesh = strip_mesh();
    let mut vbo = VboMesh::create(&mut device, &mesh)?;

    vbo.release();
    assert!(!vbo.is_uploaded());
    device.clear_commands();
    vbo.draw(&mut device);
    assert!(device.get_commands().is_empty());

    vbo.upload(&mut device)?;
    assert!(vbo.is_uploaded());
    Ok(())
}

#[test]
fn vbo_mesh_updates_vertex_buffer() -> Result<(), Error> {
    let mut device = create_device()?;
    let mesh = strip_mesh();
    let mut vbo = VboMesh::create(&mut device, &mesh)?;

    let moved: Vec<[f64; 3]> = mesh.control_points.iter().map(|p| [p[0], p[1], -1.0]).collect();
    vbo.update_vertex_positions(&mut device, &mesh, &moved)?;

    let vertices = vbo.get_vertex_buffer().unwrap().read::<mesh::Vertex>();
    assert!(vertices.iter().all(|v| v.position[2] == -1.0));
    Ok(())
}

use crate::camera;
use crate::device_resources::DeviceResources;
use crate::gfx;
use crate::primitives;
use crate::scene_context::SceneContext;
use crate::timer::{Clock, StepTimer};
use crate::Error;
use crate::ErrorKind;

use maths_rs::mat::*;
use maths_rs::num::*;
use maths_rs::Mat4f;
use maths_rs::Vec3f;

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

/// Compiled vertex shader read from the asset directory
pub const VERTEX_SHADER_FILE: &str = "SampleVertexShader.cso";

/// Compiled pixel shader read from the asset directory
pub const PIXEL_SHADER_FILE: &str = "SamplePixelShader.cso";

/// Constant buffer used to send MVP matrices to the vertex shader, matrices are stored transposed
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelViewProjectionConstantBuffer {
    pub model: [f32; 16],
    pub view: [f32; 16],
    pub projection: [f32; 16],
}

impl Default for ModelViewProjectionConstantBuffer {
    fn default() -> Self {
        let identity = Mat4f::identity().m;
        ModelViewProjectionConstantBuffer {
            model: identity,
            view: identity,
            projection: identity,
        }
    }
}

type ReadTask = JoinHandle<Result<Vec<u8>, Error>>;

/// Reads a whole file on a background thread
fn read_data_async(path: PathBuf) -> ReadTask {
    std::thread::spawn(move || {
        log::debug!("dive::renderer: reading {}", path.display());
        std::fs::read(&path).map_err(|e| Error::asset(format!("dive::renderer: failed to read {}: {}", path.display(), e)))
    })
}

fn join_read_task(task: ReadTask) -> Result<Vec<u8>, Error> {
    task.join()
        .map_err(|_| Error::fatal("dive::renderer: shader read thread panicked"))?
}

struct Pipeline<D: gfx::Device> {
    vertex_shader: D::VertexShader,
    pixel_shader: D::PixelShader,
    input_layout: D::InputLayout,
}

/// Renders a rotating cube and the meshes of a cached scene
pub struct Sample3DRenderer<D: gfx::Device> {
    asset_dir: PathBuf,
    degrees_per_second: f32,
    constant_buffer_data: ModelViewProjectionConstantBuffer,
    shader_tasks: Option<(ReadTask, ReadTask)>,
    pipeline: Option<Pipeline<D>>,
    constant_buffer: Option<D::Buffer>,
    cube: Option<primitives::Mesh<D>>,
}

impl<D: gfx::Device> Sample3DRenderer<D> {
    /// Starts loading shaders from `asset_dir` and creates the cube and constant buffer on `device`
    pub fn create(device: &mut D, asset_dir: &Path, degrees_per_second: f32) -> Result<Self, Error> {
        let mut renderer = Sample3DRenderer {
            asset_dir: asset_dir.to_path_buf(),
            degrees_per_second,
            constant_buffer_data: ModelViewProjectionConstantBuffer::default(),
            shader_tasks: None,
            pipeline: None,
            constant_buffer: None,
            cube: None,
        };
        renderer.create_device_dependent_resources(device)?;
        Ok(renderer)
    }

    /// Kicks off the shader reads and creates the vertex, index and constant buffers
    pub fn create_device_dependent_resources(&mut self, device: &mut D) -> Result<(), Error> {
        self.pipeline = None;
        self.shader_tasks = Some((
            read_data_async(self.asset_dir.join(VERTEX_SHADER_FILE)),
            read_data_async(self.asset_dir.join(PIXEL_SHADER_FILE)),
        ));

        self.constant_buffer = Some(device.create_buffer::<ModelViewProjectionConstantBuffer>(
            &gfx::BufferInfo {
                usage: gfx::BufferUsage::ConstantBuffer,
                cpu_access: gfx::CpuAccessFlags::WRITE,
                format: gfx::Format::Unknown,
                stride: std::mem::size_of::<ModelViewProjectionConstantBuffer>(),
                num_elements: 1,
            },
            None,
        )?);
        self.cube = Some(primitives::create_cube_mesh(device)?);
        Ok(())
    }

    /// Drops everything created from the device, shader reads in flight are abandoned
    pub fn release_device_dependent_resources(&mut self) {
        self.shader_tasks = None;
        self.pipeline = None;
        self.constant_buffer = None;
        self.cube = None;
    }

    /// Rebuilds the projection for the current output size and display orientation
    pub fn create_window_size_dependent_resources(&mut self, device_resources: &DeviceResources<D>) {
        let output_size = device_resources.get_output_size();
        let aspect_ratio = output_size.width / output_size.height;
        let mut fov_angle_y = f32::deg_to_rad(70.0);

        // portrait or snapped view
        if aspect_ratio < 1.0 {
            fov_angle_y *= 2.0;
        }

        let perspective = camera::create_perspective_fov_rh(fov_angle_y, aspect_ratio, 0.01, 100.0);
        let orientation = device_resources.get_orientation_transform_3d();
        self.constant_buffer_data.projection = (perspective * orientation).transpose().m;

        let eye = Vec3f::new(0.0, 0.7, 1.5);
        let at = Vec3f::new(0.0, -0.1, 0.0);
        let up = Vec3f::new(0.0, 1.0, 0.0);
        self.constant_buffer_data.view = camera::create_look_at_rh(eye, at, up).transpose().m;
    }

    /// Advances the cube rotation from the total simulated time
    pub fn update<C: Clock>(&mut self, timer: &StepTimer<C>) {
        let radians_per_second = f32::deg_to_rad(self.degrees_per_second) as f64;
        let total_rotation = timer.get_total_seconds() * radians_per_second;
        let radians = (total_rotation % std::f64::consts::TAU) as f32;
        self.rotate(radians);
    }

    fn rotate(&mut self, radians: f32) {
        self.constant_buffer_data.model = camera::create_rotation_y(radians).transpose().m;
    }

    /// Creates the shader stages once both reads have finished, without blocking
    fn poll_loading(&mut self, device: &mut D) -> Result<(), Error> {
        let finished = match &self.shader_tasks {
            Some((vs, ps)) => vs.is_finished() && ps.is_finished(),
            None => false,
        };
        if !finished {
            return Ok(());
        }
        match self.finish_loading(device) {
            Err(e) if e.kind == ErrorKind::Asset => {
                log::error!("dive::renderer: shaders unavailable, nothing will be drawn: {}", e);
                Ok(())
            }
            result => result,
        }
    }

    /// Blocks until the shaders are read and creates the shader stages
    pub fn wait_for_loading(&mut self, device: &mut D) -> Result<(), Error> {
        self.finish_loading(device)
    }

    fn finish_loading(&mut self, device: &mut D) -> Result<(), Error> {
        let Some((vs_task, ps_task)) = self.shader_tasks.take() else {
            return Ok(());
        };
        let vs_data = join_read_task(vs_task)?;
        let ps_data = join_read_task(ps_task)?;

        let vertex_shader = device.create_vertex_shader(&vs_data)?;
        let input_layout = device.create_input_layout(&primitives::position_color_input_layout(), &vs_data)?;
        let pixel_shader = device.create_pixel_shader(&ps_data)?;
        self.pipeline = Some(Pipeline {
            vertex_shader,
            pixel_shader,
            input_layout,
        });
        log::info!("dive::renderer: shaders loaded from {}", self.asset_dir.display());
        Ok(())
    }

    /// True once the shader stages exist and frames can be drawn
    pub fn is_loading_complete(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Draws one frame, nothing is drawn until loading has completed
    pub fn render(&mut self, device: &mut D, scene: Option<&SceneContext<D>>) -> Result<(), Error> {
        self.poll_loading(device)?;
        let (Some(pipeline), Some(constant_buffer), Some(cube)) = (&self.pipeline, &self.constant_buffer, &self.cube) else {
            return Ok(());
        };

        device.update_buffer(constant_buffer, std::slice::from_ref(&self.constant_buffer_data))?;

        device.set_vertex_buffer(&cube.vb, 0);
        device.set_index_buffer(&cube.ib);
        device.set_primitive_topology(gfx::Topology::TriangleList);
        device.set_input_layout(&pipeline.input_layout);
        device.set_vertex_shader(&pipeline.vertex_shader);
        device.set_vs_constant_buffer(constant_buffer, 0);
        device.set_pixel_shader(&pipeline.pixel_shader);
        device.draw_indexed(cube.num_indices, 0, 0);

        if let Some(scene) = scene {
            scene.draw(device);
        }
        Ok(())
    }

    pub fn get_constant_buffer_data(&self) -> &ModelViewProjectionConstantBuffer {
        &self.constant_buffer_data
    }

    pub fn get_constant_buffer(&self) -> Option<&D::Buffer> {
        self.constant_buffer.as_ref()
    }

    pub fn get_degrees_per_second(&self) -> f32 {
        self.degrees_per_second
    }

    pub fn set_degrees_per_second(&mut self, degrees_per_second: f32) {
        self.degrees_per_second = degrees_per_second;
    }
}

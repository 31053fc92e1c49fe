/// Implements this interface with Direct3D 11 and Direct2D
#[cfg(target_os = "windows")]
pub mod d3d11;

/// Headless recording backend with fault injection, runs on every platform
pub mod null;

use crate::os;
use crate::Error;

use serde::{Deserialize, Serialize};

use std::any::Any;

/// Structure to specify viewport coordinates on a `Device`.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Viewport {
    /// Top left x coordinate.
    pub x: f32,
    /// Top left y coordinate.
    pub y: f32,
    /// Width of the viewport rectangle.
    pub width: f32,
    /// Height of the viewport rectangle (Y is down).
    pub height: f32,
    /// Minimum depth of the viewport. Ranges between 0 and 1.
    pub min_depth: f32,
    /// Maximum depth of the viewport. Ranges between 0 and 1.
    pub max_depth: f32,
}

/// Colour used to clear render targets
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearColour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColour {
    pub fn as_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Which rasterizer a `Device` is created on
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DriverType {
    /// The adapter's own driver
    Hardware,
    /// Windows Advanced Rasterization Platform, the software fallback
    Warp,
}

/// Feature level reported by a created device, ordered from most to least capable
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeatureLevel {
    Level11_1,
    Level11_0,
    Level10_1,
    Level10_0,
    Level9_3,
    Level9_2,
    Level9_1,
}

/// Rotation applied by the swap chain when presenting onto a rotated display
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModeRotation {
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
}

/// Locally unique identifier of a display adapter
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct AdapterLuid {
    pub low: u32,
    pub high: i32,
}

/// Information to create a device
#[derive(Clone, Debug, Default)]
pub struct DeviceInfo {
    /// Enables the sdk debug layers when they are installed
    pub debug_layer: bool,
    /// Skip the hardware driver and create a `DriverType::Warp` device directly
    pub force_warp: bool,
}

/// Format for resource types (textures / buffers).
/// n = normalised unsigned integer,
/// u = unsigned integer,
/// f = float
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    Unknown,
    R16u,
    R32u,
    RG32f,
    RGB32f,
    RGBA32f,
    BGRA8n,
    D24nS8u,
}

impl Format {
    /// Size in bytes of a single element or pixel
    pub fn size_bytes(&self) -> usize {
        match self {
            Format::Unknown => 0,
            Format::R16u => 2,
            Format::R32u => 4,
            Format::RG32f => 8,
            Format::RGB32f => 12,
            Format::RGBA32f => 16,
            Format::BGRA8n => 4,
            Format::D24nS8u => 4,
        }
    }
}

/// Describes how a buffer will be bound
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    ConstantBuffer,
}

bitflags! {
    /// CPU Access flags for buffers or textures.
    pub struct CpuAccessFlags: u8 {
        const NONE = 1 << 0;
        const READ = 1 << 1;
        const WRITE = 1 << 2;
    }
}

bitflags! {
    /// Which parts of a depth stencil view are cleared
    pub struct ClearFlags: u8 {
        const DEPTH = 1 << 0;
        const STENCIL = 1 << 1;
    }
}

/// Information to create a buffer through `Device::create_buffer`.
#[derive(Copy, Clone, Debug)]
pub struct BufferInfo {
    /// Indicates how the buffer will be used on the GPU.
    pub usage: BufferUsage,
    /// Used to indicate if we want to read or write from the CPU, use NONE if possible for best performance
    pub cpu_access: CpuAccessFlags,
    /// Data format of the buffer, only index buffers require this
    pub format: Format,
    /// The stride of a vertex or structure in bytes.
    pub stride: usize,
    /// The number of array elements.
    pub num_elements: usize,
}

impl BufferInfo {
    pub fn size_bytes(&self) -> usize {
        self.stride * self.num_elements
    }
}

/// Information to create a swap chain on a window
#[derive(Copy, Clone, Debug)]
pub struct SwapChainInfo {
    pub num_buffers: u32,
    /// Pixel format of the back buffers
    pub format: Format,
    pub width: u32,
    pub height: u32,
}

/// Describes a single element of a vertex layout
#[derive(Clone, Debug)]
pub struct InputElementInfo {
    pub semantic: String,
    pub index: u32,
    pub format: Format,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
}

/// Primitive assembly mode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
}

/// Affine 2D transform laid out like a Direct2D 3x2 matrix, points are row vectors
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform2D {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Transform2D {
    pub fn identity() -> Self {
        Transform2D {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    /// Clockwise rotation about the origin
    pub fn rotation(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Transform2D {
            m11: c,
            m12: s,
            m21: -s,
            m22: c,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub fn translation(x: f32, y: f32) -> Self {
        Transform2D {
            dx: x,
            dy: y,
            ..Self::identity()
        }
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.m11 + y * self.m21 + self.dx,
            x * self.m12 + y * self.m22 + self.dy,
        )
    }
}

/// `a * b` applies `a` first then `b`
impl std::ops::Mul for Transform2D {
    type Output = Transform2D;

    fn mul(self, b: Transform2D) -> Transform2D {
        let a = self;
        Transform2D {
            m11: a.m11 * b.m11 + a.m12 * b.m21,
            m12: a.m11 * b.m12 + a.m12 * b.m22,
            m21: a.m21 * b.m11 + a.m22 * b.m21,
            m22: a.m21 * b.m12 + a.m22 * b.m22,
            dx: a.dx * b.m11 + a.dy * b.m21 + b.dx,
            dy: a.dx * b.m12 + a.dy * b.m22 + b.dy,
        }
    }
}

/// Graphics device, owns the immediate context and the 2D device context which draws onto the same swap chain
pub trait Device: 'static + Sized + Any {
    type Factories: Clone;
    type SwapChain: SwapChain<Self>;
    type RenderTargetView;
    type DepthStencilView;
    type Buffer: Buffer<Self>;
    type VertexShader;
    type PixelShader;
    type InputLayout;

    /// Creates the device independent factories (2D, text and imaging) which survive device loss
    fn create_factories(info: &DeviceInfo) -> Result<Self::Factories, Error>;
    /// Create a device with the requested driver, fails if the driver is unavailable
    fn create(info: &DeviceInfo, driver_type: DriverType, factories: &Self::Factories) -> Result<Self, Error>;
    fn get_driver_type(&self) -> DriverType;
    fn get_feature_level(&self) -> FeatureLevel;
    /// Luid of the default adapter as seen by the factory this device was created from
    fn get_adapter_luid(&self) -> Result<AdapterLuid, Error>;
    /// Luid of the default adapter as seen by a freshly created factory
    fn get_default_adapter_luid(&self) -> Result<AdapterLuid, Error>;
    /// Returns an error if the device has been removed or reset
    fn get_removed_reason(&self) -> Result<(), Error>;

    fn create_swap_chain(&mut self, window: os::NativeHandle, info: &SwapChainInfo) -> Result<Self::SwapChain, Error>;
    /// Creates a view onto the swap chain back buffer
    fn create_render_target_view(&mut self, swap_chain: &Self::SwapChain) -> Result<Self::RenderTargetView, Error>;
    /// Creates a 24-bit depth, 8-bit stencil target and its view
    fn create_depth_stencil_view(&mut self, width: u32, height: u32) -> Result<Self::DepthStencilView, Error>;
    fn create_buffer<T: Sized>(&mut self, info: &BufferInfo, data: Option<&[T]>) -> Result<Self::Buffer, Error>;
    /// Replaces the whole contents of `buffer`
    fn update_buffer<T: Sized>(&mut self, buffer: &Self::Buffer, data: &[T]) -> Result<(), Error>;
    fn create_vertex_shader(&mut self, byte_code: &[u8]) -> Result<Self::VertexShader, Error>;
    fn create_pixel_shader(&mut self, byte_code: &[u8]) -> Result<Self::PixelShader, Error>;
    fn create_input_layout(&mut self, elements: &[InputElementInfo], vs_byte_code: &[u8]) -> Result<Self::InputLayout, Error>;

    /// Clears bound render targets so size dependent views can be released
    fn unbind_render_targets(&mut self);
    fn flush(&mut self);
    fn set_viewport(&mut self, viewport: &Viewport);
    fn set_render_targets(&mut self, rtv: &Self::RenderTargetView, dsv: Option<&Self::DepthStencilView>);
    fn clear_render_target(&mut self, rtv: &Self::RenderTargetView, colour: &ClearColour);
    fn clear_depth_stencil(&mut self, dsv: &Self::DepthStencilView, flags: ClearFlags, depth: f32, stencil: u8);
    /// Hints that the contents of the view are no longer needed
    fn discard_render_target(&mut self, rtv: &Self::RenderTargetView);
    fn discard_depth_stencil(&mut self, dsv: &Self::DepthStencilView);
    fn set_input_layout(&mut self, layout: &Self::InputLayout);
    fn set_primitive_topology(&mut self, topology: Topology);
    fn set_vertex_buffer(&mut self, buffer: &Self::Buffer, slot: u32);
    fn set_index_buffer(&mut self, buffer: &Self::Buffer);
    fn set_vertex_shader(&mut self, shader: &Self::VertexShader);
    fn set_pixel_shader(&mut self, shader: &Self::PixelShader);
    fn set_vs_constant_buffer(&mut self, buffer: &Self::Buffer, slot: u32);
    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32);
    /// Releases driver allocated temporary memory ahead of suspension
    fn trim(&mut self);

    /// Sets the dots per inch used to map 2D device independent pixels
    fn set_dpi_2d(&mut self, dpi: f32);
    /// Makes the swap chain back buffer the 2D target
    fn bind_target_2d(&mut self, swap_chain: &Self::SwapChain, dpi: f32) -> Result<(), Error>;
    /// Releases the 2D target, must happen before the swap chain buffers are resized
    fn release_target_2d(&mut self);
}

/// Swap chain attached to a window
pub trait SwapChain<D: Device>: 'static + Sized + Any {
    /// Resize existing buffers, fails with a device lost error kind if the device was removed or reset
    fn resize_buffers(&mut self, device: &mut D, num_buffers: u32, width: u32, height: u32, format: Format) -> Result<(), Error>;
    fn set_rotation(&mut self, rotation: ModeRotation) -> Result<(), Error>;
    /// Present the back buffer, `sync_interval` 1 waits for the next vertical blank
    fn present(&mut self, device: &mut D, sync_interval: u32) -> Result<(), Error>;
    fn get_size(&self) -> (u32, u32);
}

/// An interface for buffers created by `Device::create_buffer`
pub trait Buffer<D: Device>: 'static + Sized + Any {
    fn get_info(&self) -> &BufferInfo;
}

/// Take any sized type and return a u8 slice
pub fn as_u8_slice<T: Sized>(p: &T) -> &[u8] {
    unsafe { ::std::slice::from_raw_parts((p as *const T) as *const u8, ::std::mem::size_of::<T>()) }
}

/// Take a slice of any sized type and return a u8 slice covering all of its elements
pub fn slice_as_u8_slice<T: Sized>(p: &[T]) -> &[u8] {
    unsafe { ::std::slice::from_raw_parts(p.as_ptr() as *const u8, std::mem::size_of_val(p)) }
}

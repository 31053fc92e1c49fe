use super::AdapterLuid;
use super::BufferInfo;
use super::ClearColour;
use super::ClearFlags;
use super::DeviceInfo;
use super::DriverType;
use super::FeatureLevel;
use super::Format;
use super::InputElementInfo;
use super::ModeRotation;
use super::SwapChainInfo;
use super::Topology;
use super::Viewport;

use crate::os;
use crate::Error;
use crate::ErrorKind;

use std::cell::Cell;
use std::cell::RefCell;

/// Commands kept by a device, the oldest half is dropped once the log reaches this length
pub const MAX_RECORDED_COMMANDS: usize = 1 << 16;

/// Per thread description of the simulated system, tests configure this before creating devices
#[derive(Copy, Clone, Debug)]
pub struct Driver {
    pub hardware_available: bool,
    pub warp_available: bool,
    pub default_adapter: AdapterLuid,
}

impl Default for Driver {
    fn default() -> Self {
        Driver {
            hardware_available: true,
            warp_available: true,
            default_adapter: AdapterLuid { low: 1, high: 0 },
        }
    }
}

thread_local! {
    static DRIVER: Cell<Driver> = Cell::new(Driver::default());
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Returns the simulated driver configuration for this thread
pub fn get_driver() -> Driver {
    DRIVER.with(|d| d.get())
}

/// Replaces the simulated driver configuration for this thread
pub fn set_driver(driver: Driver) {
    DRIVER.with(|d| d.set(driver))
}

/// Changes the adapter newly created factories enumerate first, as when a gpu is hot swapped
pub fn set_default_adapter(luid: AdapterLuid) {
    let mut driver = get_driver();
    driver.default_adapter = luid;
    set_driver(driver);
}

fn next_id() -> u64 {
    NEXT_ID.with(|id| {
        let v = id.get();
        id.set(v + 1);
        v
    })
}

#[derive(Clone)]
pub struct Factories {
    pub id: u64,
}

/// Recorded immediate context and 2D calls
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    UnbindRenderTargets,
    Flush,
    SetViewport(Viewport),
    SetRenderTargets { rtv: u64, dsv: Option<u64> },
    ClearRenderTarget { rtv: u64, colour: ClearColour },
    ClearDepthStencil { dsv: u64, flags: ClearFlags, depth: f32, stencil: u8 },
    DiscardRenderTarget(u64),
    DiscardDepthStencil(u64),
    SetInputLayout(u64),
    SetPrimitiveTopology(Topology),
    SetVertexBuffer { buffer: u64, slot: u32 },
    SetIndexBuffer(u64),
    SetVertexShader(u64),
    SetPixelShader(u64),
    SetVsConstantBuffer { buffer: u64, slot: u32 },
    DrawIndexed { index_count: u32, start_index: u32, base_vertex: i32 },
    Trim,
    SetDpi2D(f32),
    BindTarget2D { swap_chain: u64, dpi: f32 },
    ReleaseTarget2D,
}

pub struct Device {
    id: u64,
    driver_type: DriverType,
    adapter: AdapterLuid,
    removed: Option<ErrorKind>,
    fail_next_present: Option<ErrorKind>,
    fail_next_resize: Option<ErrorKind>,
    commands: Vec<Command>,
    target_2d: Option<u64>,
    dpi_2d: f32,
}

pub struct SwapChain {
    id: u64,
    window: os::NativeHandle,
    info: SwapChainInfo,
    rotation: ModeRotation,
    present_count: u64,
    resize_count: u64,
}

#[derive(Debug)]
pub struct RenderTargetView {
    pub id: u64,
    pub swap_chain: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct DepthStencilView {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

pub struct Buffer {
    pub id: u64,
    info: BufferInfo,
    data: RefCell<Vec<u8>>,
}

pub struct VertexShader {
    pub id: u64,
}

pub struct PixelShader {
    pub id: u64,
}

pub struct InputLayout {
    pub id: u64,
    pub elements: Vec<InputElementInfo>,
}

impl Device {
    /// Unique id of this device instance, a new device gets a new id
    pub fn get_id(&self) -> u64 {
        self.id
    }

    /// Marks the device removed, all subsequent presents and resizes fail with `kind`
    pub fn remove(&mut self, kind: ErrorKind) {
        self.removed = Some(kind);
    }

    /// The next present fails with `kind` and the device stays removed afterwards
    pub fn remove_on_next_present(&mut self, kind: ErrorKind) {
        self.fail_next_present = Some(kind);
    }

    /// The next swap chain resize fails with `kind` and the device stays removed afterwards
    pub fn remove_on_next_resize(&mut self, kind: ErrorKind) {
        self.fail_next_resize = Some(kind);
    }

    pub fn is_removed(&self) -> bool {
        self.removed.is_some()
    }

    fn record(&mut self, command: Command) {
        if self.commands.len() >= MAX_RECORDED_COMMANDS {
            self.commands.drain(..MAX_RECORDED_COMMANDS / 2);
        }
        self.commands.push(command);
    }

    /// Most recent commands in submission order
    pub fn get_commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn count_commands(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn get_dpi_2d(&self) -> f32 {
        self.dpi_2d
    }

    /// Id of the swap chain bound as the 2D target, if any
    pub fn get_target_2d(&self) -> Option<u64> {
        self.target_2d
    }

    fn check_removed(&self) -> Result<(), Error> {
        match self.removed {
            Some(kind) => Err(Error::new(kind, format!("dive::gfx::null: device {} was removed", self.id))),
            None => Ok(()),
        }
    }

    fn inject(&mut self, pending: Option<ErrorKind>) -> Result<(), Error> {
        if let Some(kind) = pending {
            self.removed = Some(kind);
        }
        self.check_removed()
    }
}

impl Buffer {
    /// Copy of the bytes last written to the buffer
    pub fn get_data(&self) -> Vec<u8> {
        self.data.borrow().clone()
    }

    /// Reinterprets the buffer contents as a vec of `T`
    pub fn read<T: Copy>(&self) -> Vec<T> {
        let data = self.data.borrow();
        let count = data.len() / std::mem::size_of::<T>();
        (0..count)
            .map(|i| unsafe { std::ptr::read_unaligned((data.as_ptr() as *const T).add(i)) })
            .collect()
    }
}

impl SwapChain {
    pub fn get_id(&self) -> u64 {
        self.id
    }

    pub fn get_window(&self) -> os::NativeHandle {
        self.window
    }

    pub fn get_num_buffers(&self) -> u32 {
        self.info.num_buffers
    }

    pub fn get_format(&self) -> Format {
        self.info.format
    }

    pub fn get_rotation(&self) -> ModeRotation {
        self.rotation
    }

    pub fn get_present_count(&self) -> u64 {
        self.present_count
    }

    pub fn get_resize_count(&self) -> u64 {
        self.resize_count
    }
}

impl super::Device for Device {
    type Factories = Factories;
    type SwapChain = SwapChain;
    type RenderTargetView = RenderTargetView;
    type DepthStencilView = DepthStencilView;
    type Buffer = Buffer;
    type VertexShader = VertexShader;
    type PixelShader = PixelShader;
    type InputLayout = InputLayout;

    fn create_factories(_info: &DeviceInfo) -> Result<Factories, Error> {
        Ok(Factories { id: next_id() })
    }

    fn create(_info: &DeviceInfo, driver_type: DriverType, _factories: &Factories) -> Result<Device, Error> {
        let driver = get_driver();
        let available = match driver_type {
            DriverType::Hardware => driver.hardware_available,
            DriverType::Warp => driver.warp_available,
        };
        if !available {
            return Err(Error::fatal(format!("dive::gfx::null: {:?} driver unavailable", driver_type)));
        }
        Ok(Device {
            id: next_id(),
            driver_type,
            adapter: driver.default_adapter,
            removed: None,
            fail_next_present: None,
            fail_next_resize: None,
            commands: Vec::new(),
            target_2d: None,
            dpi_2d: 96.0,
        })
    }

    fn get_driver_type(&self) -> DriverType {
        self.driver_type
    }

    fn get_feature_level(&self) -> FeatureLevel {
        match self.driver_type {
            DriverType::Hardware => FeatureLevel::Level11_1,
            DriverType::Warp => FeatureLevel::Level10_1,
        }
    }

    fn get_adapter_luid(&self) -> Result<AdapterLuid, Error> {
        Ok(self.adapter)
    }

    fn get_default_adapter_luid(&self) -> Result<AdapterLuid, Error> {
        Ok(get_driver().default_adapter)
    }

    fn get_removed_reason(&self) -> Result<(), Error> {
        self.check_removed()
    }

    fn create_swap_chain(&mut self, window: os::NativeHandle, info: &SwapChainInfo) -> Result<SwapChain, Error> {
        self.check_removed()?;
        if info.width == 0 || info.height == 0 {
            return Err(Error::fatal("dive::gfx::null: swap chain dimensions must be non zero"));
        }
        Ok(SwapChain {
            id: next_id(),
            window,
            info: *info,
            rotation: ModeRotation::Identity,
            present_count: 0,
            resize_count: 0,
        })
    }

    fn create_render_target_view(&mut self, swap_chain: &SwapChain) -> Result<RenderTargetView, Error> {
        self.check_removed()?;
        Ok(RenderTargetView {
            id: next_id(),
            swap_chain: swap_chain.id,
            width: swap_chain.info.width,
            height: swap_chain.info.height,
        })
    }

    fn create_depth_stencil_view(&mut self, width: u32, height: u32) -> Result<DepthStencilView, Error> {
        self.check_removed()?;
        Ok(DepthStencilView {
            id: next_id(),
            width,
            height,
        })
    }

    fn create_buffer<T: Sized>(&mut self, info: &BufferInfo, data: Option<&[T]>) -> Result<Buffer, Error> {
        if info.size_bytes() == 0 {
            return Err(Error::fatal("dive::gfx::null: cannot create a zero sized buffer"));
        }
        let mut bytes = vec![0u8; info.size_bytes()];
        if let Some(data) = data {
            let src = super::slice_as_u8_slice(data);
            if src.len() > bytes.len() {
                return Err(Error::fatal(format!(
                    "dive::gfx::null: initial data ({} bytes) exceeds buffer size ({} bytes)",
                    src.len(),
                    bytes.len()
                )));
            }
            bytes[..src.len()].copy_from_slice(src);
        }
        Ok(Buffer {
            id: next_id(),
            info: *info,
            data: RefCell::new(bytes),
        })
    }

    fn update_buffer<T: Sized>(&mut self, buffer: &Buffer, data: &[T]) -> Result<(), Error> {
        let src = super::slice_as_u8_slice(data);
        let mut dst = buffer.data.borrow_mut();
        if src.len() > dst.len() {
            return Err(Error::fatal(format!(
                "dive::gfx::null: update ({} bytes) exceeds buffer size ({} bytes)",
                src.len(),
                dst.len()
            )));
        }
        dst[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn create_vertex_shader(&mut self, byte_code: &[u8]) -> Result<VertexShader, Error> {
        if byte_code.is_empty() {
            return Err(Error::asset("dive::gfx::null: empty vertex shader byte code"));
        }
        Ok(VertexShader { id: next_id() })
    }

    fn create_pixel_shader(&mut self, byte_code: &[u8]) -> Result<PixelShader, Error> {
        if byte_code.is_empty() {
            return Err(Error::asset("dive::gfx::null: empty pixel shader byte code"));
        }
        Ok(PixelShader { id: next_id() })
    }

    fn create_input_layout(&mut self, elements: &[InputElementInfo], vs_byte_code: &[u8]) -> Result<InputLayout, Error> {
        if vs_byte_code.is_empty() {
            return Err(Error::asset("dive::gfx::null: input layout requires vertex shader byte code"));
        }
        Ok(InputLayout {
            id: next_id(),
            elements: elements.to_vec(),
        })
    }

    fn unbind_render_targets(&mut self) {
        self.record(Command::UnbindRenderTargets);
    }

    fn flush(&mut self) {
        self.record(Command::Flush);
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.record(Command::SetViewport(*viewport));
    }

    fn set_render_targets(&mut self, rtv: &RenderTargetView, dsv: Option<&DepthStencilView>) {
        self.record(Command::SetRenderTargets {
            rtv: rtv.id,
            dsv: dsv.map(|d| d.id),
        });
    }

    fn clear_render_target(&mut self, rtv: &RenderTargetView, colour: &ClearColour) {
        self.record(Command::ClearRenderTarget {
            rtv: rtv.id,
            colour: *colour,
        });
    }

    fn clear_depth_stencil(&mut self, dsv: &DepthStencilView, flags: ClearFlags, depth: f32, stencil: u8) {
        self.record(Command::ClearDepthStencil {
            dsv: dsv.id,
            flags,
            depth,
            stencil,
        });
    }

    fn discard_render_target(&mut self, rtv: &RenderTargetView) {
        self.record(Command::DiscardRenderTarget(rtv.id));
    }

    fn discard_depth_stencil(&mut self, dsv: &DepthStencilView) {
        self.record(Command::DiscardDepthStencil(dsv.id));
    }

    fn set_input_layout(&mut self, layout: &InputLayout) {
        self.record(Command::SetInputLayout(layout.id));
    }

    fn set_primitive_topology(&mut self, topology: Topology) {
        self.record(Command::SetPrimitiveTopology(topology));
    }

    fn set_vertex_buffer(&mut self, buffer: &Buffer, slot: u32) {
        self.record(Command::SetVertexBuffer {
            buffer: buffer.id,
            slot,
        });
    }

    fn set_index_buffer(&mut self, buffer: &Buffer) {
        self.record(Command::SetIndexBuffer(buffer.id));
    }

    fn set_vertex_shader(&mut self, shader: &VertexShader) {
        self.record(Command::SetVertexShader(shader.id));
    }

    fn set_pixel_shader(&mut self, shader: &PixelShader) {
        self.record(Command::SetPixelShader(shader.id));
    }

    fn set_vs_constant_buffer(&mut self, buffer: &Buffer, slot: u32) {
        self.record(Command::SetVsConstantBuffer {
            buffer: buffer.id,
            slot,
        });
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        self.record(Command::DrawIndexed {
            index_count,
            start_index,
            base_vertex,
        });
    }

    fn trim(&mut self) {
        self.record(Command::Trim);
    }

    fn set_dpi_2d(&mut self, dpi: f32) {
        self.dpi_2d = dpi;
        self.record(Command::SetDpi2D(dpi));
    }

    fn bind_target_2d(&mut self, swap_chain: &SwapChain, dpi: f32) -> Result<(), Error> {
        self.check_removed()?;
        self.target_2d = Some(swap_chain.id);
        self.record(Command::BindTarget2D {
            swap_chain: swap_chain.id,
            dpi,
        });
        Ok(())
    }

    fn release_target_2d(&mut self) {
        self.target_2d = None;
        self.record(Command::ReleaseTarget2D);
    }
}

impl super::SwapChain<Device> for SwapChain {
    fn resize_buffers(
        &mut self,
        device: &mut Device,
        num_buffers: u32,
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<(), Error> {
        let pending = device.fail_next_resize.take();
        device.inject(pending)?;
        if device.target_2d == Some(self.id) {
            return Err(Error::fatal(
                "dive::gfx::null: swap chain buffers are still referenced by the 2D target",
            ));
        }
        self.info = SwapChainInfo {
            num_buffers,
            format,
            width,
            height,
        };
        self.resize_count += 1;
        Ok(())
    }

    fn set_rotation(&mut self, rotation: ModeRotation) -> Result<(), Error> {
        self.rotation = rotation;
        Ok(())
    }

    fn present(&mut self, device: &mut Device, _sync_interval: u32) -> Result<(), Error> {
        let pending = device.fail_next_present.take();
        device.inject(pending)?;
        self.present_count += 1;
        Ok(())
    }

    fn get_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }
}

impl super::Buffer<Device> for Buffer {
    fn get_info(&self) -> &BufferInfo {
        &self.info
    }
}

use super::AdapterLuid;
use super::BufferInfo;
use super::BufferUsage;
use super::ClearColour;
use super::ClearFlags;
use super::CpuAccessFlags;
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

use std::ffi::c_void;
use std::ffi::CString;

use windows::{
    core::Interface,
    core::PCSTR,
    Win32::Foundation::*,
    Win32::Graphics::Direct2D::Common::*,
    Win32::Graphics::Direct2D::*,
    Win32::Graphics::Direct3D::*,
    Win32::Graphics::Direct3D11::*,
    Win32::Graphics::DirectWrite::*,
    Win32::Graphics::Dxgi::Common::*,
    Win32::Graphics::Dxgi::*,
    Win32::Graphics::Imaging::*,
    Win32::System::Com::*,
};

/// Device independent factories, these survive device loss
#[derive(Clone)]
pub struct Factories {
    pub d2d_factory: ID2D1Factory2,
    pub dwrite_factory: IDWriteFactory2,
    pub wic_factory: IWICImagingFactory2,
}

pub struct Device {
    driver_type: DriverType,
    feature_level: D3D_FEATURE_LEVEL,
    device: ID3D11Device2,
    context: ID3D11DeviceContext2,
    d2d_context: ID2D1DeviceContext1,
    d2d_target_bitmap: Option<ID2D1Bitmap1>,
    _d2d_device: ID2D1Device1,
}

pub struct SwapChain {
    swap_chain: IDXGISwapChain1,
    width: u32,
    height: u32,
}

pub struct RenderTargetView {
    rtv: ID3D11RenderTargetView,
}

pub struct DepthStencilView {
    dsv: ID3D11DepthStencilView,
}

pub struct Buffer {
    buffer: ID3D11Buffer,
    info: BufferInfo,
    dynamic: bool,
}

pub struct VertexShader {
    shader: ID3D11VertexShader,
}

pub struct PixelShader {
    shader: ID3D11PixelShader,
}

pub struct InputLayout {
    layout: ID3D11InputLayout,
}

const FEATURE_LEVELS: [D3D_FEATURE_LEVEL; 7] = [
    D3D_FEATURE_LEVEL_11_1,
    D3D_FEATURE_LEVEL_11_0,
    D3D_FEATURE_LEVEL_10_1,
    D3D_FEATURE_LEVEL_10_0,
    D3D_FEATURE_LEVEL_9_3,
    D3D_FEATURE_LEVEL_9_2,
    D3D_FEATURE_LEVEL_9_1,
];

fn to_dxgi_format(format: Format) -> DXGI_FORMAT {
    match format {
        Format::Unknown => DXGI_FORMAT_UNKNOWN,
        Format::R16u => DXGI_FORMAT_R16_UINT,
        Format::R32u => DXGI_FORMAT_R32_UINT,
        Format::RG32f => DXGI_FORMAT_R32G32_FLOAT,
        Format::RGB32f => DXGI_FORMAT_R32G32B32_FLOAT,
        Format::RGBA32f => DXGI_FORMAT_R32G32B32A32_FLOAT,
        Format::BGRA8n => DXGI_FORMAT_B8G8R8A8_UNORM,
        Format::D24nS8u => DXGI_FORMAT_D24_UNORM_S8_UINT,
    }
}

fn to_dxgi_rotation(rotation: ModeRotation) -> DXGI_MODE_ROTATION {
    match rotation {
        ModeRotation::Identity => DXGI_MODE_ROTATION_IDENTITY,
        ModeRotation::Rotate90 => DXGI_MODE_ROTATION_ROTATE90,
        ModeRotation::Rotate180 => DXGI_MODE_ROTATION_ROTATE180,
        ModeRotation::Rotate270 => DXGI_MODE_ROTATION_ROTATE270,
    }
}

fn to_d3d11_bind_flags(usage: BufferUsage) -> D3D11_BIND_FLAG {
    match usage {
        BufferUsage::Vertex => D3D11_BIND_VERTEX_BUFFER,
        BufferUsage::Index => D3D11_BIND_INDEX_BUFFER,
        BufferUsage::ConstantBuffer => D3D11_BIND_CONSTANT_BUFFER,
    }
}

fn to_feature_level(level: D3D_FEATURE_LEVEL) -> FeatureLevel {
    match level {
        D3D_FEATURE_LEVEL_11_1 => FeatureLevel::Level11_1,
        D3D_FEATURE_LEVEL_11_0 => FeatureLevel::Level11_0,
        D3D_FEATURE_LEVEL_10_1 => FeatureLevel::Level10_1,
        D3D_FEATURE_LEVEL_10_0 => FeatureLevel::Level10_0,
        D3D_FEATURE_LEVEL_9_3 => FeatureLevel::Level9_3,
        D3D_FEATURE_LEVEL_9_2 => FeatureLevel::Level9_2,
        _ => FeatureLevel::Level9_1,
    }
}

fn luid_from_adapter(adapter: &IDXGIAdapter1) -> Result<AdapterLuid, Error> {
    let desc = unsafe { adapter.GetDesc1()? };
    Ok(AdapterLuid {
        low: desc.AdapterLuid.LowPart,
        high: desc.AdapterLuid.HighPart,
    })
}

/// Checks for the sdk layers by creating a null device with the debug flag
fn sdk_layers_available() -> bool {
    unsafe {
        D3D11CreateDevice(
            None,
            D3D_DRIVER_TYPE_NULL,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_DEBUG,
            None,
            D3D11_SDK_VERSION,
            None,
            None,
            None,
        )
        .is_ok()
    }
}

impl Device {
    fn dxgi_device(&self) -> Result<IDXGIDevice3, Error> {
        Ok(self.device.cast::<IDXGIDevice3>()?)
    }

    fn dxgi_factory(&self) -> Result<IDXGIFactory2, Error> {
        unsafe {
            let adapter = self.dxgi_device()?.GetAdapter()?;
            Ok(adapter.GetParent::<IDXGIFactory2>()?)
        }
    }

    /// The Direct2D device context drawing onto the swap chain
    pub fn get_d2d_context(&self) -> &ID2D1DeviceContext1 {
        &self.d2d_context
    }

    pub fn get_d3d11_device(&self) -> &ID3D11Device2 {
        &self.device
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

    fn create_factories(info: &DeviceInfo) -> Result<Factories, Error> {
        unsafe {
            // imaging requires com, S_FALSE when the thread is already initialised
            let _ = CoInitializeEx(None, COINIT_MULTITHREADED);

            let options = D2D1_FACTORY_OPTIONS {
                debugLevel: if info.debug_layer {
                    D2D1_DEBUG_LEVEL_INFORMATION
                }
                else {
                    D2D1_DEBUG_LEVEL_NONE
                },
            };
            let d2d_factory = D2D1CreateFactory::<ID2D1Factory2>(D2D1_FACTORY_TYPE_SINGLE_THREADED, Some(&options))?;
            let dwrite_factory = DWriteCreateFactory::<IDWriteFactory2>(DWRITE_FACTORY_TYPE_SHARED)?;
            let wic_factory: IWICImagingFactory2 =
                CoCreateInstance(&CLSID_WICImagingFactory2, None, CLSCTX_INPROC_SERVER)?;

            Ok(Factories {
                d2d_factory,
                dwrite_factory,
                wic_factory,
            })
        }
    }

    fn create(info: &DeviceInfo, driver_type: DriverType, factories: &Factories) -> Result<Device, Error> {
        let mut flags = D3D11_CREATE_DEVICE_BGRA_SUPPORT;
        if info.debug_layer && sdk_layers_available() {
            flags |= D3D11_CREATE_DEVICE_DEBUG;
        }
        let d3d_driver_type = match driver_type {
            DriverType::Hardware => D3D_DRIVER_TYPE_HARDWARE,
            DriverType::Warp => D3D_DRIVER_TYPE_WARP,
        };

        let mut device: Option<ID3D11Device> = None;
        let mut context: Option<ID3D11DeviceContext> = None;
        let mut feature_level = D3D_FEATURE_LEVEL_9_1;
        unsafe {
            D3D11CreateDevice(
                None,
                d3d_driver_type,
                HMODULE::default(),
                flags,
                Some(&FEATURE_LEVELS),
                D3D11_SDK_VERSION,
                Some(&mut device),
                Some(&mut feature_level),
                Some(&mut context),
            )?;
        }
        let device = device
            .ok_or_else(|| Error::fatal("dive::gfx::d3d11: D3D11CreateDevice returned no device"))?
            .cast::<ID3D11Device2>()?;
        let context = context
            .ok_or_else(|| Error::fatal("dive::gfx::d3d11: D3D11CreateDevice returned no context"))?
            .cast::<ID3D11DeviceContext2>()?;

        let dxgi_device = device.cast::<IDXGIDevice3>()?;
        let (d2d_device, d2d_context) = unsafe {
            let d2d_device = factories.d2d_factory.CreateDevice(&dxgi_device)?;
            let d2d_context = d2d_device.CreateDeviceContext(D2D1_DEVICE_CONTEXT_OPTIONS_NONE)?;
            (d2d_device, d2d_context)
        };

        Ok(Device {
            driver_type,
            feature_level,
            device,
            context,
            d2d_context,
            d2d_target_bitmap: None,
            _d2d_device: d2d_device,
        })
    }

    fn get_driver_type(&self) -> DriverType {
        self.driver_type
    }

    fn get_feature_level(&self) -> FeatureLevel {
        to_feature_level(self.feature_level)
    }

    fn get_adapter_luid(&self) -> Result<AdapterLuid, Error> {
        let adapter = unsafe { self.dxgi_factory()?.EnumAdapters1(0)? };
        luid_from_adapter(&adapter)
    }

    fn get_default_adapter_luid(&self) -> Result<AdapterLuid, Error> {
        unsafe {
            let factory = CreateDXGIFactory1::<IDXGIFactory2>()?;
            let adapter = factory.EnumAdapters1(0)?;
            luid_from_adapter(&adapter)
        }
    }

    fn get_removed_reason(&self) -> Result<(), Error> {
        unsafe { Ok(self.device.GetDeviceRemovedReason()?) }
    }

    fn create_swap_chain(&mut self, window: os::NativeHandle, info: &SwapChainInfo) -> Result<SwapChain, Error> {
        let hwnd = match window {
            os::NativeHandle::Hwnd(hwnd) => HWND(hwnd as *mut c_void),
            os::NativeHandle::Headless(_) => {
                return Err(Error::fatal("dive::gfx::d3d11: swap chains require a win32 window"));
            }
        };
        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: info.width,
            Height: info.height,
            Format: to_dxgi_format(info.format),
            Stereo: false.into(),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: info.num_buffers,
            Scaling: DXGI_SCALING_NONE,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
            AlphaMode: DXGI_ALPHA_MODE_IGNORE,
            Flags: 0,
        };
        unsafe {
            let factory = self.dxgi_factory()?;
            let swap_chain = factory.CreateSwapChainForHwnd(&self.device, hwnd, &desc, None, None)?;
            // at most one queued frame, reduces latency and power
            self.dxgi_device()?.SetMaximumFrameLatency(1)?;
            Ok(SwapChain {
                swap_chain,
                width: info.width,
                height: info.height,
            })
        }
    }

    fn create_render_target_view(&mut self, swap_chain: &SwapChain) -> Result<RenderTargetView, Error> {
        unsafe {
            let back_buffer = swap_chain.swap_chain.GetBuffer::<ID3D11Texture2D>(0)?;
            let mut rtv: Option<ID3D11RenderTargetView> = None;
            self.device.CreateRenderTargetView(&back_buffer, None, Some(&mut rtv))?;
            let rtv = rtv.ok_or_else(|| Error::fatal("dive::gfx::d3d11: failed to create render target view"))?;
            Ok(RenderTargetView { rtv })
        }
    }

    fn create_depth_stencil_view(&mut self, width: u32, height: u32) -> Result<DepthStencilView, Error> {
        let desc = D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT_D24_UNORM_S8_UINT,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: D3D11_BIND_DEPTH_STENCIL.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        };
        unsafe {
            let mut texture: Option<ID3D11Texture2D> = None;
            self.device.CreateTexture2D(&desc, None, Some(&mut texture))?;
            let texture = texture.ok_or_else(|| Error::fatal("dive::gfx::d3d11: failed to create depth stencil texture"))?;
            let mut dsv: Option<ID3D11DepthStencilView> = None;
            self.device.CreateDepthStencilView(&texture, None, Some(&mut dsv))?;
            let dsv = dsv.ok_or_else(|| Error::fatal("dive::gfx::d3d11: failed to create depth stencil view"))?;
            Ok(DepthStencilView { dsv })
        }
    }

    fn create_buffer<T: Sized>(&mut self, info: &BufferInfo, data: Option<&[T]>) -> Result<Buffer, Error> {
        let dynamic = info.cpu_access.contains(CpuAccessFlags::WRITE);
        let desc = D3D11_BUFFER_DESC {
            ByteWidth: info.size_bytes() as u32,
            Usage: if dynamic { D3D11_USAGE_DYNAMIC } else { D3D11_USAGE_DEFAULT },
            BindFlags: to_d3d11_bind_flags(info.usage).0 as u32,
            CPUAccessFlags: if dynamic { D3D11_CPU_ACCESS_WRITE.0 as u32 } else { 0 },
            MiscFlags: 0,
            StructureByteStride: 0,
        };
        let initial_data = data.map(|data| D3D11_SUBRESOURCE_DATA {
            pSysMem: data.as_ptr() as *const c_void,
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });
        unsafe {
            let mut buffer: Option<ID3D11Buffer> = None;
            self.device.CreateBuffer(
                &desc,
                initial_data.as_ref().map(|d| d as *const D3D11_SUBRESOURCE_DATA),
                Some(&mut buffer),
            )?;
            let buffer = buffer.ok_or_else(|| Error::fatal("dive::gfx::d3d11: failed to create buffer"))?;
            Ok(Buffer {
                buffer,
                info: *info,
                dynamic,
            })
        }
    }

    fn update_buffer<T: Sized>(&mut self, buffer: &Buffer, data: &[T]) -> Result<(), Error> {
        let src = super::slice_as_u8_slice(data);
        if src.len() > buffer.info.size_bytes() {
            return Err(Error::fatal("dive::gfx::d3d11: update exceeds buffer size"));
        }
        unsafe {
            if buffer.dynamic {
                let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
                self.context.Map(&buffer.buffer, 0, D3D11_MAP_WRITE_DISCARD, 0, Some(&mut mapped))?;
                std::ptr::copy_nonoverlapping(src.as_ptr(), mapped.pData as *mut u8, src.len());
                self.context.Unmap(&buffer.buffer, 0);
            }
            else {
                self.context.UpdateSubresource(&buffer.buffer, 0, None, src.as_ptr() as *const c_void, 0, 0);
            }
        }
        Ok(())
    }

    fn create_vertex_shader(&mut self, byte_code: &[u8]) -> Result<VertexShader, Error> {
        unsafe {
            let mut shader: Option<ID3D11VertexShader> = None;
            self.device.CreateVertexShader(byte_code, None, Some(&mut shader))?;
            let shader = shader.ok_or_else(|| Error::fatal("dive::gfx::d3d11: failed to create vertex shader"))?;
            Ok(VertexShader { shader })
        }
    }

    fn create_pixel_shader(&mut self, byte_code: &[u8]) -> Result<PixelShader, Error> {
        unsafe {
            let mut shader: Option<ID3D11PixelShader> = None;
            self.device.CreatePixelShader(byte_code, None, Some(&mut shader))?;
            let shader = shader.ok_or_else(|| Error::fatal("dive::gfx::d3d11: failed to create pixel shader"))?;
            Ok(PixelShader { shader })
        }
    }

    fn create_input_layout(&mut self, elements: &[InputElementInfo], vs_byte_code: &[u8]) -> Result<InputLayout, Error> {
        // semantic names must outlive the call
        let semantics = elements
            .iter()
            .map(|e| CString::new(e.semantic.as_str()))
            .collect::<Result<Vec<CString>, _>>()
            .map_err(|e| Error::asset(format!("dive::gfx::d3d11: invalid semantic name: {}", e)))?;
        let descs: Vec<D3D11_INPUT_ELEMENT_DESC> = elements
            .iter()
            .zip(&semantics)
            .map(|(e, name)| D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(name.as_ptr() as *const u8),
                SemanticIndex: e.index,
                Format: to_dxgi_format(e.format),
                InputSlot: e.input_slot,
                AlignedByteOffset: e.aligned_byte_offset,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
            .collect();
        unsafe {
            let mut layout: Option<ID3D11InputLayout> = None;
            self.device.CreateInputLayout(&descs, vs_byte_code, Some(&mut layout))?;
            let layout = layout.ok_or_else(|| Error::fatal("dive::gfx::d3d11: failed to create input layout"))?;
            Ok(InputLayout { layout })
        }
    }

    fn unbind_render_targets(&mut self) {
        unsafe {
            self.context.OMSetRenderTargets(None, None);
        }
    }

    fn flush(&mut self) {
        unsafe {
            self.context.Flush();
        }
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        let vp = D3D11_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        unsafe {
            self.context.RSSetViewports(Some(&[vp]));
        }
    }

    fn set_render_targets(&mut self, rtv: &RenderTargetView, dsv: Option<&DepthStencilView>) {
        unsafe {
            match dsv {
                Some(dsv) => self.context.OMSetRenderTargets(Some(&[Some(rtv.rtv.clone())]), &dsv.dsv),
                None => self.context.OMSetRenderTargets(Some(&[Some(rtv.rtv.clone())]), None),
            }
        }
    }

    fn clear_render_target(&mut self, rtv: &RenderTargetView, colour: &ClearColour) {
        let colour = colour.as_array();
        unsafe {
            self.context.ClearRenderTargetView(&rtv.rtv, &colour);
        }
    }

    fn clear_depth_stencil(&mut self, dsv: &DepthStencilView, flags: ClearFlags, depth: f32, stencil: u8) {
        let mut d3d_flags = 0;
        if flags.contains(ClearFlags::DEPTH) {
            d3d_flags |= D3D11_CLEAR_DEPTH.0 as u32;
        }
        if flags.contains(ClearFlags::STENCIL) {
            d3d_flags |= D3D11_CLEAR_STENCIL.0 as u32;
        }
        unsafe {
            self.context.ClearDepthStencilView(&dsv.dsv, d3d_flags, depth, stencil);
        }
    }

    fn discard_render_target(&mut self, rtv: &RenderTargetView) {
        unsafe {
            self.context.DiscardView(&rtv.rtv);
        }
    }

    fn discard_depth_stencil(&mut self, dsv: &DepthStencilView) {
        unsafe {
            self.context.DiscardView(&dsv.dsv);
        }
    }

    fn set_input_layout(&mut self, layout: &InputLayout) {
        unsafe {
            self.context.IASetInputLayout(&layout.layout);
        }
    }

    fn set_primitive_topology(&mut self, topology: Topology) {
        let topology = match topology {
            Topology::TriangleList => D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        };
        unsafe {
            self.context.IASetPrimitiveTopology(topology);
        }
    }

    fn set_vertex_buffer(&mut self, buffer: &Buffer, slot: u32) {
        let stride = buffer.info.stride as u32;
        let offset = 0u32;
        unsafe {
            self.context.IASetVertexBuffers(
                slot,
                1,
                Some(&Some(buffer.buffer.clone())),
                Some(&stride),
                Some(&offset),
            );
        }
    }

    fn set_index_buffer(&mut self, buffer: &Buffer) {
        unsafe {
            self.context.IASetIndexBuffer(&buffer.buffer, to_dxgi_format(buffer.info.format), 0);
        }
    }

    fn set_vertex_shader(&mut self, shader: &VertexShader) {
        unsafe {
            self.context.VSSetShader(&shader.shader, None);
        }
    }

    fn set_pixel_shader(&mut self, shader: &PixelShader) {
        unsafe {
            self.context.PSSetShader(&shader.shader, None);
        }
    }

    fn set_vs_constant_buffer(&mut self, buffer: &Buffer, slot: u32) {
        unsafe {
            self.context.VSSetConstantBuffers(slot, Some(&[Some(buffer.buffer.clone())]));
        }
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        unsafe {
            self.context.DrawIndexed(index_count, start_index, base_vertex);
        }
    }

    fn trim(&mut self) {
        match self.dxgi_device() {
            Ok(dxgi_device) => unsafe { dxgi_device.Trim() },
            Err(e) => log::warn!("dive::gfx::d3d11: unable to trim: {}", e),
        }
    }

    fn set_dpi_2d(&mut self, dpi: f32) {
        unsafe {
            self.d2d_context.SetDpi(dpi, dpi);
        }
    }

    fn bind_target_2d(&mut self, swap_chain: &SwapChain, dpi: f32) -> Result<(), Error> {
        let properties = D2D1_BITMAP_PROPERTIES1 {
            pixelFormat: D2D1_PIXEL_FORMAT {
                format: DXGI_FORMAT_B8G8R8A8_UNORM,
                alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
            },
            dpiX: dpi,
            dpiY: dpi,
            bitmapOptions: D2D1_BITMAP_OPTIONS_TARGET | D2D1_BITMAP_OPTIONS_CANNOT_DRAW,
            colorContext: std::mem::ManuallyDrop::new(None),
        };
        unsafe {
            let surface = swap_chain.swap_chain.GetBuffer::<IDXGISurface2>(0)?;
            let bitmap = self.d2d_context.CreateBitmapFromDxgiSurface(&surface, Some(&properties))?;
            self.d2d_context.SetTarget(&bitmap);
            // grayscale text anti-aliasing is recommended for all windows store apps
            self.d2d_context.SetTextAntialiasMode(D2D1_TEXT_ANTIALIAS_MODE_GRAYSCALE);
            self.d2d_target_bitmap = Some(bitmap);
        }
        Ok(())
    }

    fn release_target_2d(&mut self) {
        unsafe {
            self.d2d_context.SetTarget(None);
        }
        self.d2d_target_bitmap = None;
    }
}

impl super::SwapChain<Device> for SwapChain {
    fn resize_buffers(
        &mut self,
        _device: &mut Device,
        num_buffers: u32,
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<(), Error> {
        unsafe {
            self.swap_chain.ResizeBuffers(num_buffers, width, height, to_dxgi_format(format), DXGI_SWAP_CHAIN_FLAG(0))?;
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn set_rotation(&mut self, rotation: ModeRotation) -> Result<(), Error> {
        unsafe { Ok(self.swap_chain.SetRotation(to_dxgi_rotation(rotation))?) }
    }

    fn present(&mut self, _device: &mut Device, sync_interval: u32) -> Result<(), Error> {
        unsafe { Ok(self.swap_chain.Present(sync_interval, DXGI_PRESENT(0)).ok()?) }
    }

    fn get_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl super::Buffer<Device> for Buffer {
    fn get_info(&self) -> &BufferInfo {
        &self.info
    }
}

use crate::gfx;
use crate::gfx::SwapChain as _;
use crate::os;
use crate::os::DisplayOrientation;
use crate::os::Size;
use crate::Error;
use crate::ErrorKind;

use maths_rs::Mat4f;
use maths_rs::Vec4f;

use std::cell::RefCell;
use std::rc::Weak;

/// Dots per inch of a display at 100% scale
pub const DEFAULT_DPI: f32 = 96.0;

/// Number of swap chain buffers, double buffered to minimise latency
pub const SWAP_CHAIN_BUFFER_COUNT: u32 = 2;

/// Pixel format of the swap chain, required by Direct2D interop
pub const SWAP_CHAIN_FORMAT: gfx::Format = gfx::Format::BGRA8n;

/// Fixed 3D screen rotations, row vector convention to be composed after a projection
pub mod screen_rotation {
    use super::*;

    /// 0 degree z-rotation
    pub fn rotation_0() -> Mat4f {
        Mat4f::identity()
    }

    /// 90 degree z-rotation
    pub fn rotation_90() -> Mat4f {
        Mat4f::from((
            Vec4f::new(0.0, 1.0, 0.0, 0.0),
            Vec4f::new(-1.0, 0.0, 0.0, 0.0),
            Vec4f::new(0.0, 0.0, 1.0, 0.0),
            Vec4f::new(0.0, 0.0, 0.0, 1.0),
        ))
    }

    /// 180 degree z-rotation
    pub fn rotation_180() -> Mat4f {
        Mat4f::from((
            Vec4f::new(-1.0, 0.0, 0.0, 0.0),
            Vec4f::new(0.0, -1.0, 0.0, 0.0),
            Vec4f::new(0.0, 0.0, 1.0, 0.0),
            Vec4f::new(0.0, 0.0, 0.0, 1.0),
        ))
    }

    /// 270 degree z-rotation
    pub fn rotation_270() -> Mat4f {
        Mat4f::from((
            Vec4f::new(0.0, -1.0, 0.0, 0.0),
            Vec4f::new(1.0, 0.0, 0.0, 0.0),
            Vec4f::new(0.0, 0.0, 1.0, 0.0),
            Vec4f::new(0.0, 0.0, 0.0, 1.0),
        ))
    }
}

/// Converts a length in device independent pixels to physical pixels
pub fn convert_dips_to_pixels(dips: f32, dpi: f32) -> f32 {
    (dips * dpi / DEFAULT_DPI + 0.5).floor()
}

/// Determines the rotation between the display device's native orientation and the current display orientation
pub fn compute_display_rotation(
    native: DisplayOrientation,
    current: DisplayOrientation,
) -> Result<gfx::ModeRotation, Error> {
    use gfx::ModeRotation::*;
    use DisplayOrientation::*;
    let rotation = match (native, current) {
        (Landscape, Landscape) => Some(Identity),
        (Landscape, Portrait) => Some(Rotate270),
        (Landscape, LandscapeFlipped) => Some(Rotate180),
        (Landscape, PortraitFlipped) => Some(Rotate90),
        (Portrait, Landscape) => Some(Rotate90),
        (Portrait, Portrait) => Some(Identity),
        (Portrait, LandscapeFlipped) => Some(Rotate270),
        (Portrait, PortraitFlipped) => Some(Rotate180),
        _ => Option::None,
    };
    rotation.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOrientation,
            format!("dive::device_resources: no rotation from native {:?} to current {:?}", native, current),
        )
    })
}

/// 2D and 3D transforms which render content in the current orientation when the swap chain is rotated
pub fn compute_orientation_transforms(rotation: gfx::ModeRotation, logical_size: Size<f32>) -> (gfx::Transform2D, Mat4f) {
    match rotation {
        gfx::ModeRotation::Identity => (gfx::Transform2D::identity(), screen_rotation::rotation_0()),
        gfx::ModeRotation::Rotate90 => (
            gfx::Transform2D::rotation(90.0) * gfx::Transform2D::translation(logical_size.height, 0.0),
            screen_rotation::rotation_270(),
        ),
        gfx::ModeRotation::Rotate180 => (
            gfx::Transform2D::rotation(180.0) * gfx::Transform2D::translation(logical_size.width, logical_size.height),
            screen_rotation::rotation_180(),
        ),
        gfx::ModeRotation::Rotate270 => (
            gfx::Transform2D::rotation(270.0) * gfx::Transform2D::translation(0.0, logical_size.width),
            screen_rotation::rotation_90(),
        ),
    }
}

/// Implemented by owners of device dependent resources to rebuild them after the device is lost
pub trait DeviceNotify<D: gfx::Device> {
    /// The old device is about to be released, drop everything created from it
    fn on_device_lost(&mut self);
    /// A new device and window size dependent resources exist, recreate everything
    fn on_device_restored(&mut self, device_resources: &mut DeviceResources<D>) -> Result<(), Error>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    /// Device created, no window bound
    Uninitialized,
    Ready,
    /// Device loss handling in progress
    Lost,
}

/// Render targets and viewport for the current frame alongside the device used to bind them
pub struct FrameTargets<'a, D: gfx::Device> {
    pub device: &'a mut D,
    pub render_target_view: &'a D::RenderTargetView,
    pub depth_stencil_view: &'a D::DepthStencilView,
    pub viewport: &'a gfx::Viewport,
}

/// Controls all the device resources: device, swap chain, size dependent targets and display state
pub struct DeviceResources<D: gfx::Device> {
    info: gfx::DeviceInfo,
    factories: D::Factories,
    device: D,
    swap_chain: Option<D::SwapChain>,
    render_target_view: Option<D::RenderTargetView>,
    depth_stencil_view: Option<D::DepthStencilView>,
    screen_viewport: gfx::Viewport,
    window: Option<os::NativeHandle>,
    d3d_render_target_size: Size<f32>,
    output_size: Size<f32>,
    logical_size: Size<f32>,
    native_orientation: DisplayOrientation,
    current_orientation: DisplayOrientation,
    dpi: f32,
    orientation_transform_2d: gfx::Transform2D,
    orientation_transform_3d: Mat4f,
    device_notify: Option<Weak<RefCell<dyn DeviceNotify<D>>>>,
    state: State,
    size_dependent_rebuilds: u64,
}

impl<D: gfx::Device> DeviceResources<D> {
    /// Creates the device independent factories and a device, falling back to warp when hardware is unavailable
    pub fn create(info: &gfx::DeviceInfo) -> Result<Self, Error> {
        let factories = D::create_factories(info)?;
        let device = Self::create_device(info, &factories)?;
        Ok(DeviceResources {
            info: info.clone(),
            factories,
            device,
            swap_chain: None,
            render_target_view: None,
            depth_stencil_view: None,
            screen_viewport: gfx::Viewport::default(),
            window: None,
            d3d_render_target_size: Size::default(),
            output_size: Size::default(),
            logical_size: Size::default(),
            native_orientation: DisplayOrientation::None,
            current_orientation: DisplayOrientation::None,
            dpi: -1.0,
            orientation_transform_2d: gfx::Transform2D::identity(),
            orientation_transform_3d: screen_rotation::rotation_0(),
            device_notify: None,
            state: State::Uninitialized,
            size_dependent_rebuilds: 0,
        })
    }

    fn create_device(info: &gfx::DeviceInfo, factories: &D::Factories) -> Result<D, Error> {
        if !info.force_warp {
            match D::create(info, gfx::DriverType::Hardware, factories) {
                Ok(device) => {
                    log::info!("dive::device_resources: created hardware device ({:?})", device.get_feature_level());
                    return Ok(device);
                }
                Err(e) => {
                    log::warn!("dive::device_resources: hardware device unavailable, falling back to warp: {}", e);
                }
            }
        }
        match D::create(info, gfx::DriverType::Warp, factories) {
            Ok(device) => {
                log::info!("dive::device_resources: created warp device ({:?})", device.get_feature_level());
                Ok(device)
            }
            Err(e) => Err(Error::fatal(format!(
                "dive::device_resources: failed to create a hardware or warp device: {}",
                e
            ))),
        }
    }

    /// Binds the window and display state, then creates the swap chain and size dependent resources
    pub fn bind_window(&mut self, window: os::NativeHandle, logical_size: Size<f32>, display: &os::DisplayInformation) -> Result<(), Error> {
        self.window = Some(window);
        self.logical_size = logical_size;
        self.native_orientation = display.native_orientation;
        self.current_orientation = display.current_orientation;
        self.dpi = display.logical_dpi;
        self.device.set_dpi_2d(self.dpi);
        self.state = State::Ready;
        self.create_window_size_dependent_resources()
    }

    /// Registers the listener told about device loss and restoration, replaces any previous one
    pub fn register_device_notify(&mut self, device_notify: Weak<RefCell<dyn DeviceNotify<D>>>) {
        self.device_notify = Some(device_notify);
    }

    /// Called when the window size changes, no work is done when the size is unchanged
    pub fn set_logical_size(&mut self, logical_size: Size<f32>) -> Result<(), Error> {
        if self.logical_size != logical_size {
            self.logical_size = logical_size;
            self.create_window_size_dependent_resources()?;
        }
        Ok(())
    }

    /// Called when the display dpi changes, the logical size is re-read from the window bounds
    pub fn set_dpi(&mut self, dpi: f32, window_bounds: Size<f32>) -> Result<(), Error> {
        if dpi != self.dpi {
            self.dpi = dpi;
            self.device.set_dpi_2d(self.dpi);
            self.logical_size = window_bounds;
            self.create_window_size_dependent_resources()?;
        }
        Ok(())
    }

    /// Called when the display orientation changes
    pub fn set_current_orientation(&mut self, current_orientation: DisplayOrientation) -> Result<(), Error> {
        if self.current_orientation != current_orientation {
            self.current_orientation = current_orientation;
            self.create_window_size_dependent_resources()?;
        }
        Ok(())
    }

    /// Recreates the device when the default adapter changed since creation or the device was removed
    pub fn validate_device(&mut self) -> Result<(), Error> {
        let previous = self.device.get_adapter_luid()?;
        let current = self.device.get_default_adapter_luid()?;
        let removed = self.device.get_removed_reason();
        if previous != current || removed.is_err() {
            log::info!(
                "dive::device_resources: device invalidated (adapter {:?} -> {:?}, removed: {})",
                previous,
                current,
                removed.is_err()
            );
            self.handle_device_lost()?;
        }
        Ok(())
    }

    /// Recreates all device resources and sets them back to the current state
    pub fn handle_device_lost(&mut self) -> Result<(), Error> {
        debug_assert!(self.state != State::Lost, "device loss handling is not re-entrant");
        let previous_state = self.state;
        self.state = State::Lost;

        self.swap_chain = None;
        self.render_target_view = None;
        self.depth_stencil_view = None;
        self.device.release_target_2d();

        let listener = self.device_notify.as_ref().and_then(|n| n.upgrade());
        if let Some(listener) = &listener {
            listener.borrow_mut().on_device_lost();
        }

        let result = Self::create_device(&self.info, &self.factories).and_then(|device| {
            self.device = device;
            self.device.set_dpi_2d(self.dpi);
            self.create_window_size_dependent_resources()
        });
        self.state = if previous_state == State::Uninitialized {
            State::Uninitialized
        }
        else {
            State::Ready
        };
        result?;

        if let Some(listener) = &listener {
            listener.borrow_mut().on_device_restored(self)?;
        }
        log::info!("dive::device_resources: device restored");
        Ok(())
    }

    /// Notifies the driver that the app is suspending, releasing temporary buffers
    pub fn trim(&mut self) {
        self.device.trim();
    }

    /// Present the contents of the swap chain to the screen, device loss is handled before returning
    pub fn present(&mut self) -> Result<(), Error> {
        let Some(swap_chain) = self.swap_chain.as_mut() else {
            return Ok(());
        };
        // block until vsync, no frames are rendered that never get displayed
        let result = swap_chain.present(&mut self.device, 1);

        // the contents of the targets will be entirely replaced next frame
        if let Some(rtv) = &self.render_target_view {
            self.device.discard_render_target(rtv);
        }
        if let Some(dsv) = &self.depth_stencil_view {
            self.device.discard_depth_stencil(dsv);
        }

        match result {
            Err(e) if e.is_device_lost() => {
                log::warn!("dive::device_resources: device lost on present: {}", e);
                self.handle_device_lost()
            }
            result => result,
        }
    }

    fn create_window_size_dependent_resources(&mut self) -> Result<(), Error> {
        let Some(window) = self.window else {
            return Ok(());
        };

        // clear the previous window size specific context
        self.device.release_target_2d();
        self.device.unbind_render_targets();
        self.render_target_view = None;
        self.depth_stencil_view = None;
        self.device.flush();

        // calculate the necessary render target size in pixels, never zero
        self.output_size = Size::new(
            convert_dips_to_pixels(self.logical_size.width, self.dpi).max(1.0),
            convert_dips_to_pixels(self.logical_size.height, self.dpi).max(1.0),
        );

        let display_rotation = compute_display_rotation(self.native_orientation, self.current_orientation)?;
        let swap_dimensions = matches!(display_rotation, gfx::ModeRotation::Rotate90 | gfx::ModeRotation::Rotate270);
        self.d3d_render_target_size = if swap_dimensions {
            Size::new(self.output_size.height, self.output_size.width)
        }
        else {
            self.output_size
        };

        let width = self.d3d_render_target_size.width as u32;
        let height = self.d3d_render_target_size.height as u32;

        if let Some(swap_chain) = self.swap_chain.as_mut() {
            let resized = swap_chain.resize_buffers(
                &mut self.device,
                SWAP_CHAIN_BUFFER_COUNT,
                width,
                height,
                SWAP_CHAIN_FORMAT,
            );
            match resized {
                Err(e) if e.is_device_lost() => {
                    // the new device and swap chain are fully set up by the loss handler
                    log::warn!("dive::device_resources: device lost on resize: {}", e);
                    return self.handle_device_lost();
                }
                result => result?,
            }
        }
        else {
            let info = gfx::SwapChainInfo {
                num_buffers: SWAP_CHAIN_BUFFER_COUNT,
                format: SWAP_CHAIN_FORMAT,
                width,
                height,
            };
            self.swap_chain = Some(self.device.create_swap_chain(window, &info)?);
        }

        let (transform_2d, transform_3d) = compute_orientation_transforms(display_rotation, self.logical_size);
        self.orientation_transform_2d = transform_2d;
        self.orientation_transform_3d = transform_3d;

        let swap_chain = self
            .swap_chain
            .as_mut()
            .ok_or_else(|| Error::fatal("dive::device_resources: missing swap chain"))?;
        swap_chain.set_rotation(display_rotation)?;

        self.render_target_view = Some(self.device.create_render_target_view(swap_chain)?);
        self.depth_stencil_view = Some(self.device.create_depth_stencil_view(width, height)?);

        self.screen_viewport = gfx::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.d3d_render_target_size.width,
            height: self.d3d_render_target_size.height,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        self.device.set_viewport(&self.screen_viewport);

        self.device.bind_target_2d(swap_chain, self.dpi)?;

        self.size_dependent_rebuilds += 1;
        log::debug!(
            "dive::device_resources: size dependent resources {}x{} ({:?})",
            width,
            height,
            display_rotation
        );
        Ok(())
    }

    pub fn get_device(&self) -> &D {
        &self.device
    }

    pub fn get_device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn get_factories(&self) -> &D::Factories {
        &self.factories
    }

    pub fn get_swap_chain(&self) -> Option<&D::SwapChain> {
        self.swap_chain.as_ref()
    }

    pub fn get_render_target_view(&self) -> Option<&D::RenderTargetView> {
        self.render_target_view.as_ref()
    }

    pub fn get_depth_stencil_view(&self) -> Option<&D::DepthStencilView> {
        self.depth_stencil_view.as_ref()
    }

    /// The device alongside the current targets, None until a window is bound
    pub fn get_frame_targets(&mut self) -> Option<FrameTargets<'_, D>> {
        match (&self.render_target_view, &self.depth_stencil_view) {
            (Some(render_target_view), Some(depth_stencil_view)) => Some(FrameTargets {
                device: &mut self.device,
                render_target_view,
                depth_stencil_view,
                viewport: &self.screen_viewport,
            }),
            _ => None,
        }
    }

    pub fn get_screen_viewport(&self) -> &gfx::Viewport {
        &self.screen_viewport
    }

    /// The size of the render target in pixels
    pub fn get_output_size(&self) -> Size<f32> {
        self.output_size
    }

    /// The size of the swap chain back buffer in pixels, swapped relative to the output when rotated
    pub fn get_render_target_size(&self) -> Size<f32> {
        self.d3d_render_target_size
    }

    /// The size of the render target in device independent pixels
    pub fn get_logical_size(&self) -> Size<f32> {
        self.logical_size
    }

    pub fn get_dpi(&self) -> f32 {
        self.dpi
    }

    pub fn get_native_orientation(&self) -> DisplayOrientation {
        self.native_orientation
    }

    pub fn get_current_orientation(&self) -> DisplayOrientation {
        self.current_orientation
    }

    pub fn get_orientation_transform_2d(&self) -> gfx::Transform2D {
        self.orientation_transform_2d
    }

    pub fn get_orientation_transform_3d(&self) -> Mat4f {
        self.orientation_transform_3d
    }

    /// Number of times the size dependent resources have been built, including after device loss
    pub fn get_size_dependent_rebuilds(&self) -> u64 {
        self.size_dependent_rebuilds
    }
}

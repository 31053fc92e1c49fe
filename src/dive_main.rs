use crate::device_resources::{DeviceNotify, DeviceResources, FrameTargets};
use crate::gfx;
use crate::renderer::Sample3DRenderer;
use crate::scene_context::SceneContext;
use crate::timer::{Clock, StepTimer, SystemClock};
use crate::DiveInfo;
use crate::Error;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Directory next to the running executable, where compiled shaders are deployed
pub fn default_asset_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        .unwrap_or_default()
}

/// Renders application content to the screen, owns the timer and the renderer
pub struct DiveMain<D: gfx::Device, C: Clock = SystemClock> {
    timer: StepTimer<C>,
    renderer: Sample3DRenderer<D>,
    scene: Option<SceneContext<D>>,
    clear_colour: gfx::ClearColour,
}

impl<D: gfx::Device> DiveMain<D, SystemClock> {
    /// Creates main with the system performance counter
    pub fn create(device_resources: &mut DeviceResources<D>, info: &DiveInfo) -> Result<Rc<RefCell<Self>>, Error> {
        Self::create_with_clock(device_resources, info, SystemClock::new())
    }
}

impl<D: gfx::Device, C: Clock + 'static> DiveMain<D, C> {
    /// Loads the renderer and optional scene, then registers for device loss notifications
    pub fn create_with_clock(device_resources: &mut DeviceResources<D>, info: &DiveInfo, clock: C) -> Result<Rc<RefCell<Self>>, Error> {
        let asset_dir = info.asset_dir.clone().unwrap_or_else(default_asset_dir);
        let renderer = Sample3DRenderer::create(device_resources.get_device_mut(), &asset_dir, info.degrees_per_second)?;

        let scene = match &info.scene_file {
            Some(path) => match SceneContext::load(path, device_resources.get_device_mut()) {
                Ok(scene) => Some(scene),
                Err(e) => {
                    log::warn!("dive::dive_main: failed to load scene {}: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        let mut timer = StepTimer::with_clock(clock);
        timer.set_fixed_time_step(info.fixed_time_step);
        if info.target_fps > 0.0 {
            timer.set_target_elapsed_seconds(1.0 / info.target_fps);
        }

        let mut main = DiveMain {
            timer,
            renderer,
            scene,
            clear_colour: info.clear_colour,
        };
        main.create_window_size_dependent_resources(device_resources);

        let main = Rc::new(RefCell::new(main));
        let notify: Rc<RefCell<dyn DeviceNotify<D>>> = main.clone();
        device_resources.register_device_notify(Rc::downgrade(&notify));
        Ok(main)
    }

    /// Updates application state when the window size changes
    pub fn create_window_size_dependent_resources(&mut self, device_resources: &DeviceResources<D>) {
        self.renderer.create_window_size_dependent_resources(device_resources);
    }

    /// Updates the application state once per frame
    pub fn update(&mut self) {
        let renderer = &mut self.renderer;
        self.timer.tick(|timer| {
            renderer.update(timer);
        });
    }

    /// Renders the current frame, returns true if the frame was rendered and is ready to be displayed
    pub fn render(&mut self, device_resources: &mut DeviceResources<D>) -> Result<bool, Error> {
        // don't try to render anything before the first update
        if self.timer.get_frame_count() == 0 {
            return Ok(false);
        }

        let Some(FrameTargets {
            device,
            render_target_view,
            depth_stencil_view,
            viewport,
        }) = device_resources.get_frame_targets()
        else {
            return Ok(false);
        };

        // reset render targets to the screen
        device.set_viewport(viewport);
        device.set_render_targets(render_target_view, Some(depth_stencil_view));

        // clear the back buffer and depth stencil view
        device.clear_render_target(render_target_view, &self.clear_colour);
        device.clear_depth_stencil(depth_stencil_view, gfx::ClearFlags::DEPTH | gfx::ClearFlags::STENCIL, 1.0, 0);

        self.renderer.render(device, self.scene.as_ref())?;
        Ok(true)
    }

    pub fn get_timer(&self) -> &StepTimer<C> {
        &self.timer
    }

    pub fn get_timer_mut(&mut self) -> &mut StepTimer<C> {
        &mut self.timer
    }

    pub fn get_renderer(&self) -> &Sample3DRenderer<D> {
        &self.renderer
    }

    pub fn get_renderer_mut(&mut self) -> &mut Sample3DRenderer<D> {
        &mut self.renderer
    }

    pub fn get_scene(&self) -> Option<&SceneContext<D>> {
        self.scene.as_ref()
    }

    pub fn get_scene_mut(&mut self) -> Option<&mut SceneContext<D>> {
        self.scene.as_mut()
    }
}

impl<D: gfx::Device, C: Clock + 'static> DeviceNotify<D> for DiveMain<D, C> {
    fn on_device_lost(&mut self) {
        log::info!("dive::dive_main: releasing device resources");
        self.renderer.release_device_dependent_resources();
        if let Some(scene) = &mut self.scene {
            scene.release_device_resources();
        }
    }

    fn on_device_restored(&mut self, device_resources: &mut DeviceResources<D>) -> Result<(), Error> {
        log::info!("dive::dive_main: restoring device resources");
        self.renderer.create_device_dependent_resources(device_resources.get_device_mut())?;
        if let Some(scene) = &mut self.scene {
            scene.restore_device_resources(device_resources.get_device_mut())?;
        }
        self.create_window_size_dependent_resources(device_resources);
        Ok(())
    }
}

use crate::device_resources::DeviceResources;
use crate::dive_main;
use crate::dive_main::DiveMain;
use crate::gfx;
use crate::os;
use crate::timer::{Clock, SystemClock};
use crate::DiveInfo;
use crate::Error;

use os::AppEvent;
use os::Window;

use serde::{Deserialize, Serialize};

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// File name of the user config, looked up next to the executable
pub const USER_CONFIG_FILE: &str = "config.user.json";

/// Serialisable user configuration, every member is optional and overrides the matching `DiveInfo` member
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct UserConfig {
    // pos xy, size xy
    pub main_window_rect: Option<os::Rect<i32>>,
    pub fixed_time_step: Option<bool>,
    pub target_fps: Option<f64>,
    pub degrees_per_second: Option<f32>,
    pub clear_colour: Option<gfx::ClearColour>,
    pub asset_dir: Option<PathBuf>,
    pub scene_file: Option<PathBuf>,
    /// "warp" forces the software rasterizer, anything else prefers the hardware adapter
    pub adapter: Option<String>,
}

impl UserConfig {
    /// Reads a user config from a json file
    pub fn load(path: &Path) -> Result<Self, Error> {
        let user_data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&user_data)?)
    }

    /// Location of the user config next to the executable
    pub fn default_path() -> PathBuf {
        dive_main::default_asset_dir().join(USER_CONFIG_FILE)
    }

    /// Overrides the members of `info` which are set in this config
    pub fn apply(&self, info: &mut DiveInfo) {
        if let Some(rect) = self.main_window_rect {
            info.window_rect = rect;
        }
        if let Some(fixed_time_step) = self.fixed_time_step {
            info.fixed_time_step = fixed_time_step;
        }
        if let Some(target_fps) = self.target_fps {
            info.target_fps = target_fps;
        }
        if let Some(degrees_per_second) = self.degrees_per_second {
            info.degrees_per_second = degrees_per_second;
        }
        if let Some(clear_colour) = self.clear_colour {
            info.clear_colour = clear_colour;
        }
        if let Some(asset_dir) = &self.asset_dir {
            info.asset_dir = Some(asset_dir.clone());
        }
        if let Some(scene_file) = &self.scene_file {
            info.scene_file = Some(scene_file.clone());
        }
        if let Some(adapter) = &self.adapter {
            info.force_warp = adapter.eq_ignore_ascii_case("warp");
        }
    }
}

/// Dive client data members, maps the os application lifecycle onto the device resources and main
pub struct Client<D: gfx::Device, A: os::App, C: Clock = SystemClock> {
    pub app: A,
    pub main_window: A::Window,
    pub device_resources: DeviceResources<D>,
    pub main: Rc<RefCell<DiveMain<D, C>>>,
    visible: bool,
    closed: bool,
}

impl<D, A> Client<D, A, SystemClock>
where
    D: gfx::Device,
    A: os::App,
{
    /// Create a dive client consisting of an app, main window, device resources and main
    pub fn create(info: DiveInfo) -> Result<Self, Error> {
        Self::create_with_clock(info, SystemClock::new())
    }
}

impl<D, A, C> Client<D, A, C>
where
    D: gfx::Device,
    A: os::App,
    C: Clock + 'static,
{
    /// Create a client which times frames with `clock`
    pub fn create_with_clock(mut info: DiveInfo, clock: C) -> Result<Self, Error> {
        // supplied user config wins over the one on disk
        let user_config = match info.user_config.take() {
            Some(user_config) => Some(user_config),
            None => {
                let path = UserConfig::default_path();
                if path.exists() {
                    match UserConfig::load(&path) {
                        Ok(user_config) => Some(user_config),
                        Err(e) => {
                            log::warn!("dive::client: ignoring invalid user config {}: {}", path.display(), e);
                            None
                        }
                    }
                }
                else {
                    None
                }
            }
        };
        if let Some(user_config) = &user_config {
            user_config.apply(&mut info);
        }

        // app
        let mut app = A::create(os::AppInfo {
            name: info.name.to_string(),
            dpi_aware: true,
        })?;

        // main window
        let main_window = app.create_window(os::WindowInfo {
            title: info.name.to_string(),
            rect: info.window_rect,
        })?;

        // device
        let mut device_resources = DeviceResources::<D>::create(&gfx::DeviceInfo {
            debug_layer: cfg!(debug_assertions),
            force_warp: info.force_warp,
        })?;
        let display = app.get_display_information(&main_window);
        device_resources.bind_window(main_window.get_native_handle(), main_window.get_bounds(), &display)?;

        // main
        let main = DiveMain::create_with_clock(&mut device_resources, &info, clock)?;
        let visible = main_window.is_visible();

        log::info!("dive::client: created '{}'", info.name);
        Ok(Client {
            app,
            main_window,
            device_resources,
            main,
            visible,
            closed: false,
        })
    }

    /// Responds to a single application lifecycle event
    pub fn handle_event(&mut self, event: AppEvent) -> Result<(), Error> {
        log::trace!("dive::client: {:?}", event);
        match event {
            AppEvent::Activated => (),
            AppEvent::Suspending(deferral) => {
                // the driver can reclaim temporary buffers, suspension waits for the deferral
                self.device_resources.trim();
                deferral.complete();
            }
            AppEvent::Resuming => {
                log::info!("dive::client: resuming");
            }
            AppEvent::VisibilityChanged(visible) => {
                self.visible = visible;
            }
            AppEvent::Closed => {
                self.closed = true;
            }
            AppEvent::SizeChanged(logical_size) => {
                self.device_resources.set_logical_size(logical_size)?;
                self.main.borrow_mut().create_window_size_dependent_resources(&self.device_resources);
            }
            AppEvent::DpiChanged(dpi) => {
                self.device_resources.set_dpi(dpi, self.main_window.get_bounds())?;
                self.main.borrow_mut().create_window_size_dependent_resources(&self.device_resources);
            }
            AppEvent::OrientationChanged(orientation) => {
                self.device_resources.set_current_orientation(orientation)?;
                self.main.borrow_mut().create_window_size_dependent_resources(&self.device_resources);
            }
            AppEvent::DisplayContentsInvalidated => {
                self.device_resources.validate_device()?;
            }
        }
        Ok(())
    }

    /// Processes pending events and, while visible, updates renders and presents one frame.
    /// Returns false once the window has closed
    pub fn run_frame(&mut self) -> Result<bool, Error> {
        let running = if self.visible {
            self.app.pump_events()
        }
        else {
            self.app.wait_events()
        };

        for event in self.app.take_events() {
            self.handle_event(event)?;
        }
        if self.closed || !running {
            return Ok(false);
        }

        if self.visible {
            let rendered = {
                let mut main = self.main.borrow_mut();
                main.update();
                main.render(&mut self.device_resources)?
            };
            if rendered {
                self.device_resources.present()?;
            }
        }
        Ok(true)
    }

    /// Very simple run loop which takes control of the application until the window is closed
    pub fn run(mut self) -> Result<(), Error> {
        while self.run_frame()? {}
        log::info!("dive::client: main window closed");
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Operating system module.
pub mod os;

/// Graphics device abstraction with d3d11 and null backends.
pub mod gfx;

/// Fixed and variable step frame timer.
pub mod timer;

/// Device, swap chain and size dependent resource lifecycle.
pub mod device_resources;

/// Image reading support (tga only).
pub mod image;

/// Interchange scene graph: nodes, meshes, materials, textures and cameras.
pub mod scene;

/// Conversion of scene meshes into gpu vertex and index buffers grouped by material.
pub mod mesh;

/// Material records built from scene materials.
pub mod material;

/// Explicit caches mapping scene objects to their gpu side records.
pub mod scene_context;

/// Projection and view matrix helpers.
pub mod camera;

/// Geometry primitives.
pub mod primitives;

/// The rotating cube renderer.
pub mod renderer;

/// Owns the timer and renderer, listens for device loss.
pub mod dive_main;

/// Application shell mapping os lifecycle events onto the device and renderer.
pub mod client;

/// Use bitmask for flags
#[macro_use]
extern crate bitflags;

#[cfg(target_os = "windows")]
pub use gfx::d3d11 as gfx_platform;

#[cfg(target_os = "windows")]
pub use os::win32 as os_platform;

#[cfg(not(target_os = "windows"))]
pub use gfx::null as gfx_platform;

#[cfg(not(target_os = "windows"))]
pub use os::null as os_platform;

/// Broad classification of errors so callers can decide between recovery and abort.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecoverable, the operation in progress is aborted
    Fatal,
    /// The gpu was physically removed, driver updated or hung
    DeviceRemoved,
    /// The device was reset by the driver
    DeviceReset,
    /// A format or feature this crate does not handle
    Unsupported,
    /// The native / current display orientation pair has no rotation mapping
    InvalidOrientation,
    /// Malformed or missing asset data
    Asset,
    /// File system errors
    Io,
}

/// Generic errors for modules to define their own
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Error {
            kind,
            msg: msg.into()
        }
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fatal, msg)
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Asset, msg)
    }

    /// True for removal or reset, the two conditions recovered by recreating the device
    pub fn is_device_lost(&self) -> bool {
        matches!(self.kind, ErrorKind::DeviceRemoved | ErrorKind::DeviceReset)
    }
}

/// Generic debug for errors
impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.msg)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for Error {}

// conversion for windows-rs win32 errors, device removal and reset keep their identity
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for Error {
    fn from(err: windows::core::Error) -> Error {
        use windows::Win32::Graphics::Dxgi::{DXGI_ERROR_DEVICE_REMOVED, DXGI_ERROR_DEVICE_RESET};
        let kind = if err.code() == DXGI_ERROR_DEVICE_REMOVED {
            ErrorKind::DeviceRemoved
        }
        else if err.code() == DXGI_ERROR_DEVICE_RESET {
            ErrorKind::DeviceReset
        }
        else {
            ErrorKind::Fatal
        };
        Error {
            kind,
            msg: err.message().to_string(),
        }
    }
}

// std errors
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Io,
            msg: err.to_string()
        }
    }
}

// json errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error {
            kind: ErrorKind::Asset,
            msg: err.to_string()
        }
    }
}

/// Information to create a dive client which will create an app, window, device
pub struct DiveInfo {
    /// name for the app and window title
    pub name: String,
    /// window rect {pos_x pos_y, width, height}
    pub window_rect: os::Rect<i32>,
    /// clear colour of the back buffer each frame
    pub clear_colour: gfx::ClearColour,
    /// skip the hardware path and create the software rasterizer device directly
    pub force_warp: bool,
    /// enables the fixed time step mode of the frame timer
    pub fixed_time_step: bool,
    /// target frames per second when running fixed time step
    pub target_fps: f64,
    /// rotation speed of the sample cube
    pub degrees_per_second: f32,
    /// directory containing compiled shaders, None for the executable directory
    pub asset_dir: Option<std::path::PathBuf>,
    /// optional interchange scene to load and cache on the device
    pub scene_file: Option<std::path::PathBuf>,
    /// optional user config, the default will be located next to the executable when present
    pub user_config: Option<client::UserConfig>,
}

impl Default for DiveInfo {
    fn default() -> Self {
        DiveInfo {
            name: "dive".to_string(),
            window_rect: os::Rect {
                x: 100,
                y: 100,
                width: 1280,
                height: 720
            },
            // cornflower blue
            clear_colour: gfx::ClearColour {
                r: 0.392_156_9,
                g: 0.584_313_75,
                b: 0.929_411_8,
                a: 1.0,
            },
            force_warp: false,
            fixed_time_step: false,
            target_fps: 60.0,
            degrees_per_second: 45.0,
            asset_dir: None,
            scene_file: None,
            user_config: None,
        }
    }
}

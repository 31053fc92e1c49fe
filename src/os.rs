/// Implements this interface for windows win32 platform
#[cfg(target_os = "windows")]
pub mod win32;

/// Headless platform with a scripted event queue
pub mod null;

use crate::Error;

use serde::{Deserialize, Serialize};

use std::any::Any;
use std::sync::mpsc;

/// Describes a rectangle starting at the top left corner specified by x,y
/// with the size of width and height.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

/// 2-Dimensional size, used for logical (device independent) and physical pixel sizes
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }
}

/// Physical orientation of a display output
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayOrientation {
    /// Unknown or not yet reported
    None,
    Landscape,
    Portrait,
    LandscapeFlipped,
    PortraitFlipped,
}

/// Snapshot of the display properties a window is shown on
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DisplayInformation {
    pub native_orientation: DisplayOrientation,
    pub current_orientation: DisplayOrientation,
    /// Logical dots per inch, 96.0 is 100% scale
    pub logical_dpi: f32,
}

/// Platform specific window handle in a form the graphics backends can create swap chains from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NativeHandle {
    /// Win32 HWND value
    #[cfg(target_os = "windows")]
    Hwnd(isize),
    /// Identifier of a window created by the null platform
    Headless(u64),
}

/// Filled out to specify various window parameters
/// when a window is created by `App::create_window`
#[derive(Clone)]
pub struct WindowInfo {
    pub title: String,
    pub rect: Rect<i32>,
}

/// Information to create an `App`
#[derive(Clone)]
pub struct AppInfo {
    pub name: String,
    pub dpi_aware: bool,
}

/// Application lifecycle and window notifications
#[derive(Debug)]
pub enum AppEvent {
    Activated,
    /// The process is about to be suspended, suspension waits until the deferral is completed
    Suspending(SuspendingDeferral),
    Resuming,
    VisibilityChanged(bool),
    Closed,
    /// New logical size of the window
    SizeChanged(Size<f32>),
    /// New logical dpi of the display
    DpiChanged(f32),
    OrientationChanged(DisplayOrientation),
    /// Display contents must be revalidated, the default adapter may have changed
    DisplayContentsInvalidated,
}

/// Handed to the application with `AppEvent::Suspending`, completing it allows suspension to proceed
#[derive(Debug)]
pub struct SuspendingDeferral {
    sender: mpsc::Sender<()>,
}

/// Held by the platform to wait on a `SuspendingDeferral`
pub struct SuspendCompletion {
    receiver: mpsc::Receiver<()>,
}

impl SuspendingDeferral {
    pub fn complete(self) {
        // the platform may have stopped waiting, nothing to report in that case
        let _ = self.sender.send(());
    }
}

impl SuspendCompletion {
    /// Blocks until the deferral is completed or dropped
    pub fn wait(self) {
        let _ = self.receiver.recv();
    }

    /// Non blocking check
    pub fn is_complete(&self) -> bool {
        matches!(self.receiver.try_recv(), Ok(()) | Err(mpsc::TryRecvError::Disconnected))
    }
}

/// Creates a connected deferral and completion pair
pub fn suspending_deferral() -> (SuspendingDeferral, SuspendCompletion) {
    let (sender, receiver) = mpsc::channel();
    (SuspendingDeferral { sender }, SuspendCompletion { receiver })
}

/// An interface which all platforms need to implement for general operating system calls
pub trait App: 'static + Any + Sized {
    type Window: Window<Self>;
    /// Create an application instance
    fn create(info: AppInfo) -> Result<Self, Error>;
    /// Create a new operating system window
    fn create_window(&mut self, info: WindowInfo) -> Result<Self::Window, Error>;
    /// Orientation and dpi of the display the window is currently on
    fn get_display_information(&self, window: &Self::Window) -> DisplayInformation;
    /// Processes all pending os messages without blocking, returns false once the app has quit
    fn pump_events(&mut self) -> bool;
    /// Blocks until at least one message arrives then processes all pending, returns false once the app has quit
    fn wait_events(&mut self) -> bool;
    /// Takes ownership of the lifecycle events gathered by the last pump
    fn take_events(&mut self) -> Vec<AppEvent>;
}

/// An instance of an operating system window
pub trait Window<A: App>: Any + Sized {
    /// Handle passed to the graphics device to create a swap chain
    fn get_native_handle(&self) -> NativeHandle;
    /// Client area size in device independent pixels
    fn get_bounds(&self) -> Size<f32>;
    fn is_visible(&self) -> bool;
    fn close(&mut self);
}

use super::AppEvent;
use super::AppInfo;
use super::DisplayInformation;
use super::DisplayOrientation;
use super::NativeHandle;
use super::Size;
use super::SuspendCompletion;
use super::WindowInfo;

use crate::Error;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

struct WindowState {
    id: u64,
    bounds: Size<f32>,
    visible: bool,
    closed: bool,
}

/// Headless app, events are pushed by the caller and delivered on the next pump
pub struct App {
    name: String,
    display: DisplayInformation,
    pending: VecDeque<AppEvent>,
    delivered: Vec<AppEvent>,
    windows: Vec<Rc<RefCell<WindowState>>>,
    next_window_id: u64,
    quit: bool,
}

/// Headless window, shares its state with the `App` that created it
pub struct Window {
    state: Rc<RefCell<WindowState>>,
}

impl App {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Queue a raw event to be delivered on the next pump
    pub fn push_event(&mut self, event: AppEvent) {
        self.pending.push_back(event);
    }

    /// Resizes the most recently created window and queues `SizeChanged`
    pub fn resize_window(&mut self, width: f32, height: f32) {
        let size = Size::new(width, height);
        if let Some(window) = self.windows.last() {
            window.borrow_mut().bounds = size;
        }
        self.push_event(AppEvent::SizeChanged(size));
    }

    /// Rotates the display and queues `OrientationChanged`
    pub fn set_orientation(&mut self, orientation: DisplayOrientation) {
        self.display.current_orientation = orientation;
        self.push_event(AppEvent::OrientationChanged(orientation));
    }

    /// Sets the native orientation reported for the display, no event is sent
    pub fn set_native_orientation(&mut self, orientation: DisplayOrientation) {
        self.display.native_orientation = orientation;
    }

    /// Changes the display scale and queues `DpiChanged`
    pub fn set_dpi(&mut self, dpi: f32) {
        self.display.logical_dpi = dpi;
        self.push_event(AppEvent::DpiChanged(dpi));
    }

    /// Shows or hides the most recently created window and queues `VisibilityChanged`
    pub fn set_visible(&mut self, visible: bool) {
        if let Some(window) = self.windows.last() {
            window.borrow_mut().visible = visible;
        }
        self.push_event(AppEvent::VisibilityChanged(visible));
    }

    /// Queues `Suspending`, the returned completion is signalled once the app completes its deferral
    pub fn suspend(&mut self) -> SuspendCompletion {
        let (deferral, completion) = super::suspending_deferral();
        self.push_event(AppEvent::Suspending(deferral));
        completion
    }

    /// Closes all windows and queues `Closed`
    pub fn quit(&mut self) {
        for window in &self.windows {
            window.borrow_mut().closed = true;
        }
        self.push_event(AppEvent::Closed);
        self.quit = true;
    }

    fn deliver(&mut self) {
        self.delivered.extend(self.pending.drain(..));
    }
}

impl super::App for App {
    type Window = Window;

    fn create(info: AppInfo) -> Result<Self, Error> {
        Ok(App {
            name: info.name,
            display: DisplayInformation {
                native_orientation: DisplayOrientation::Landscape,
                current_orientation: DisplayOrientation::Landscape,
                logical_dpi: 96.0,
            },
            pending: VecDeque::new(),
            delivered: Vec::new(),
            windows: Vec::new(),
            next_window_id: 1,
            quit: false,
        })
    }

    fn create_window(&mut self, info: WindowInfo) -> Result<Window, Error> {
        let state = Rc::new(RefCell::new(WindowState {
            id: self.next_window_id,
            bounds: Size::new(info.rect.width as f32, info.rect.height as f32),
            visible: true,
            closed: false,
        }));
        self.next_window_id += 1;
        self.windows.push(state.clone());
        Ok(Window { state })
    }

    fn get_display_information(&self, _window: &Window) -> DisplayInformation {
        self.display
    }

    fn pump_events(&mut self) -> bool {
        self.deliver();
        !self.quit || !self.delivered.is_empty()
    }

    fn wait_events(&mut self) -> bool {
        // nothing external can arrive while blocked, behave like a pump
        self.pump_events()
    }

    fn take_events(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.delivered)
    }
}

impl super::Window<App> for Window {
    fn get_native_handle(&self) -> NativeHandle {
        NativeHandle::Headless(self.state.borrow().id)
    }

    fn get_bounds(&self) -> Size<f32> {
        self.state.borrow().bounds
    }

    fn is_visible(&self) -> bool {
        let state = self.state.borrow();
        state.visible && !state.closed
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

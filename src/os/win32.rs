use windows::{
    core::PCSTR,
    core::PCWSTR,
    Win32::Foundation::*,
    Win32::Graphics::Gdi::*,
    Win32::System::LibraryLoader::*,
    Win32::UI::HiDpi::*,
    Win32::UI::WindowsAndMessaging::*,
};

use super::AppEvent;
use super::DisplayInformation;
use super::DisplayOrientation;
use super::NativeHandle;
use super::Size;
use super::SuspendCompletion;

use crate::Error;

use std::cell::RefCell;

const PBT_APMSUSPEND: usize = 0x0004;
const PBT_APMRESUMEAUTOMATIC: usize = 0x0012;
const USER_DEFAULT_SCREEN_DPI: f32 = 96.0;

pub struct App {
    window_class: String,
    hinstance: HINSTANCE,
    events: Vec<AppEvent>,
    suspending: Vec<SuspendCompletion>,
}

pub struct Window {
    info: super::WindowInfo,
    hwnd: HWND,
}

impl Drop for Window {
    fn drop(&mut self) {
        unsafe {
            if !self.hwnd.is_invalid() {
                let _ = DestroyWindow(self.hwnd);
                self.hwnd = HWND::default();
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        unsafe {
            let _ = UnregisterClassA(PCSTR(self.window_class.as_ptr()), self.hinstance);
        }
    }
}

struct ProcData {
    events: Vec<AppEvent>,
    suspending: Vec<SuspendCompletion>,
    minimised: bool,
    orientation: DisplayOrientation,
}

thread_local! {
    static PROC_DATA: RefCell<ProcData> = RefCell::new(ProcData {
        events: Vec::new(),
        suspending: Vec::new(),
        minimised: false,
        orientation: DisplayOrientation::None,
    });
}

fn push_event(event: AppEvent) {
    PROC_DATA.with(|data| data.borrow_mut().events.push(event));
}

fn window_dpi(hwnd: HWND) -> f32 {
    let dpi = unsafe { GetDpiForWindow(hwnd) };
    if dpi == 0 {
        USER_DEFAULT_SCREEN_DPI
    }
    else {
        dpi as f32
    }
}

fn current_display_mode() -> Option<DEVMODEW> {
    unsafe {
        let mut mode = DEVMODEW {
            dmSize: std::mem::size_of::<DEVMODEW>() as u16,
            ..Default::default()
        };
        if EnumDisplaySettingsW(PCWSTR::null(), ENUM_CURRENT_SETTINGS, &mut mode).as_bool() {
            Some(mode)
        }
        else {
            None
        }
    }
}

/// Reads native and current orientation of the primary display, desktops are assumed landscape when unknown
fn display_orientations() -> (DisplayOrientation, DisplayOrientation) {
    let Some(mode) = current_display_mode() else {
        return (DisplayOrientation::Landscape, DisplayOrientation::Landscape);
    };
    let rotation = unsafe { mode.Anonymous1.Anonymous2.dmDisplayOrientation };
    let quarter_turned = rotation == DMDO_90 || rotation == DMDO_270;
    // pel sizes are reported in the current orientation
    let (width, height) = if quarter_turned {
        (mode.dmPelsHeight, mode.dmPelsWidth)
    }
    else {
        (mode.dmPelsWidth, mode.dmPelsHeight)
    };
    let native = if width >= height {
        DisplayOrientation::Landscape
    }
    else {
        DisplayOrientation::Portrait
    };
    let current = match (native, rotation) {
        (DisplayOrientation::Landscape, r) if r == DMDO_90 => DisplayOrientation::Portrait,
        (DisplayOrientation::Landscape, r) if r == DMDO_180 => DisplayOrientation::LandscapeFlipped,
        (DisplayOrientation::Landscape, r) if r == DMDO_270 => DisplayOrientation::PortraitFlipped,
        (DisplayOrientation::Portrait, r) if r == DMDO_90 => DisplayOrientation::LandscapeFlipped,
        (DisplayOrientation::Portrait, r) if r == DMDO_180 => DisplayOrientation::PortraitFlipped,
        (DisplayOrientation::Portrait, r) if r == DMDO_270 => DisplayOrientation::Landscape,
        _ => native,
    };
    (native, current)
}

impl super::App for App {
    type Window = Window;

    fn create(info: super::AppInfo) -> Result<Self, Error> {
        unsafe {
            if info.dpi_aware {
                if let Err(e) = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) {
                    log::warn!("dive::os::win32: unable to set per monitor dpi awareness: {}", e.message());
                }
            }

            let window_class = info.name + "\0";
            let instance: HINSTANCE = GetModuleHandleA(None)?.into();

            let wc = WNDCLASSA {
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hInstance: instance,
                lpszClassName: PCSTR(window_class.as_ptr()),
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wndproc),
                ..Default::default()
            };

            if RegisterClassA(&wc) == 0 {
                return Err(Error::fatal("dive::os::win32: class already registered!"));
            }

            PROC_DATA.with(|data| data.borrow_mut().orientation = display_orientations().1);

            Ok(App {
                window_class,
                hinstance: instance,
                events: Vec::new(),
                suspending: Vec::new(),
            })
        }
    }

    fn create_window(&mut self, info: super::WindowInfo) -> Result<Window, Error> {
        let title = info.title.clone() + "\0";
        unsafe {
            let hwnd = CreateWindowExA(
                Default::default(),
                PCSTR(self.window_class.as_ptr()),
                PCSTR(title.as_ptr()),
                WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                info.rect.x,
                info.rect.y,
                info.rect.width,
                info.rect.height,
                None,
                None,
                self.hinstance,
                None,
            )?;
            Ok(Window {
                hwnd,
                info,
            })
        }
    }

    fn get_display_information(&self, window: &Window) -> DisplayInformation {
        let (native_orientation, current_orientation) = display_orientations();
        DisplayInformation {
            native_orientation,
            current_orientation,
            logical_dpi: window_dpi(window.hwnd),
        }
    }

    fn pump_events(&mut self) -> bool {
        let mut quit = false;
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageA(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageA(&msg);
                if msg.message == WM_QUIT {
                    quit = true;
                    break;
                }
            }
        }
        self.gather();
        !quit
    }

    fn wait_events(&mut self) -> bool {
        unsafe {
            let mut msg = MSG::default();
            if !GetMessageA(&mut msg, None, 0, 0).as_bool() {
                self.gather();
                return false;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageA(&msg);
        }
        self.pump_events()
    }

    fn take_events(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }
}

impl App {
    fn gather(&mut self) {
        PROC_DATA.with(|data| {
            let mut data = data.borrow_mut();
            self.events.append(&mut data.events);
            self.suspending.append(&mut data.suspending);
        });
        self.suspending.retain(|completion| {
            let complete = completion.is_complete();
            if complete {
                log::info!("dive::os::win32: suspend deferral completed");
            }
            !complete
        });
    }
}

impl super::Window<App> for Window {
    fn get_native_handle(&self) -> NativeHandle {
        NativeHandle::Hwnd(self.hwnd.0 as isize)
    }

    fn get_bounds(&self) -> Size<f32> {
        let mut rect = RECT::default();
        unsafe {
            if GetClientRect(self.hwnd, &mut rect).is_err() {
                return Size::new(self.info.rect.width as f32, self.info.rect.height as f32);
            }
        }
        let scale = USER_DEFAULT_SCREEN_DPI / window_dpi(self.hwnd);
        Size::new(
            (rect.right - rect.left) as f32 * scale,
            (rect.bottom - rect.top) as f32 * scale,
        )
    }

    fn is_visible(&self) -> bool {
        unsafe { IsWindowVisible(self.hwnd).as_bool() && !IsIconic(self.hwnd).as_bool() }
    }

    fn close(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
        self.hwnd = HWND::default();
    }
}

fn loword(v: usize) -> u32 {
    (v & 0xffff) as u32
}

fn hiword(v: usize) -> u32 {
    ((v >> 16) & 0xffff) as u32
}

extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        match message {
            WM_ACTIVATE => {
                if loword(wparam.0) != WA_INACTIVE {
                    push_event(AppEvent::Activated);
                }
                LRESULT(0)
            }
            WM_SIZE => {
                let minimised = wparam.0 as u32 == SIZE_MINIMIZED;
                let was_minimised = PROC_DATA.with(|data| {
                    let mut data = data.borrow_mut();
                    std::mem::replace(&mut data.minimised, minimised)
                });
                if minimised != was_minimised {
                    push_event(AppEvent::VisibilityChanged(!minimised));
                }
                if !minimised {
                    let scale = USER_DEFAULT_SCREEN_DPI / window_dpi(window);
                    let pixels = lparam.0 as usize;
                    push_event(AppEvent::SizeChanged(Size::new(
                        loword(pixels) as f32 * scale,
                        hiword(pixels) as f32 * scale,
                    )));
                }
                LRESULT(0)
            }
            WM_DPICHANGED => {
                push_event(AppEvent::DpiChanged(hiword(wparam.0) as f32));
                let suggested = lparam.0 as *const RECT;
                if let Some(rect) = suggested.as_ref() {
                    let _ = SetWindowPos(
                        window,
                        None,
                        rect.left,
                        rect.top,
                        rect.right - rect.left,
                        rect.bottom - rect.top,
                        SWP_NOZORDER | SWP_NOACTIVATE,
                    );
                }
                LRESULT(0)
            }
            WM_DISPLAYCHANGE => {
                let current = display_orientations().1;
                let previous = PROC_DATA.with(|data| {
                    std::mem::replace(&mut data.borrow_mut().orientation, current)
                });
                if previous != current {
                    push_event(AppEvent::OrientationChanged(current));
                }
                push_event(AppEvent::DisplayContentsInvalidated);
                LRESULT(0)
            }
            WM_POWERBROADCAST => {
                match wparam.0 {
                    PBT_APMSUSPEND => {
                        let (deferral, completion) = super::suspending_deferral();
                        PROC_DATA.with(|data| data.borrow_mut().suspending.push(completion));
                        push_event(AppEvent::Suspending(deferral));
                    }
                    PBT_APMRESUMEAUTOMATIC => push_event(AppEvent::Resuming),
                    _ => (),
                }
                LRESULT(1)
            }
            WM_PAINT => {
                let _ = ValidateRect(window, None);
                LRESULT(0)
            }
            WM_DESTROY => {
                push_event(AppEvent::Closed);
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcA(window, message, wparam, lparam),
        }
    }
}

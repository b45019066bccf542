//! Modal rubber-band selection window.
//!
//! A dimmed, topmost, layered popup covers the virtual desktop.  The window
//! procedure feeds mouse and keyboard input into a [`SelectionState`] owned
//! by [`select_region`]; the state is reached through `GWLP_USERDATA`,
//! which is set from the `CREATESTRUCTW` during `WM_NCCREATE`.

use std::ffi::c_void;

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, BitBlt, CreateSolidBrush, EndPaint, FillRect, FrameRect, InvalidateRect, HBRUSH,
    HDC, HGDIOBJ, PAINTSTRUCT, SRCCOPY,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    ReleaseCapture, SetCapture, SetFocus, VK_ESCAPE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, LoadCursorW,
    PostQuitMessage, RegisterClassW, SetForegroundWindow, SetLayeredWindowAttributes, ShowWindow,
    TranslateMessage, UnregisterClassW, CREATESTRUCTW, GWLP_USERDATA, IDC_CROSS, LWA_ALPHA, MSG,
    SW_SHOW, WM_CLOSE, WM_DESTROY, WM_ERASEBKGND, WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MOUSEMOVE, WM_NCCREATE, WM_PAINT, WM_RBUTTONDOWN, WNDCLASSW, WS_EX_LAYERED,
    WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
};

use super::capture::virtual_screen;
use super::gdi::{GdiObject, Surface};
use crate::errors::{win32_context, GrabError, SelectionError};
use crate::geometry::{Point, Rect};
use crate::selection::{SelectionOutcome, SelectionResponse, SelectionState};

const CLASS_NAME: PCWSTR = w!("ShotcapSelectionOverlay");
/// Overlay opacity, 0-255.
const OVERLAY_ALPHA: u8 = 110;
const BACKDROP: COLORREF = COLORREF(0x0000_0000);
const HIGHLIGHT: COLORREF = COLORREF(0x0060_6060);
/// `0x00BBGGRR`
const OUTLINE: COLORREF = COLORREF(0x0000_00FF);

/// State shared with the window procedure.
struct Session {
    state: SelectionState,
    /// Virtual-screen position of the window's client origin.
    bounds: Rect,
}

impl Session {
    fn screen_point(&self, lparam: LPARAM) -> Point {
        // GET_X_LPARAM / GET_Y_LPARAM: signed 16-bit client coordinates
        let x = (lparam.0 & 0xFFFF) as u16 as i16 as i32;
        let y = ((lparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32;
        Point::new(self.bounds.left + x, self.bounds.top + y)
    }
}

// ---------------------------------------------------------------------------
// GWLP_USERDATA access
// ---------------------------------------------------------------------------

#[cfg(target_pointer_width = "64")]
unsafe fn set_session(hwnd: HWND, session: *mut Session) {
    use windows::Win32::UI::WindowsAndMessaging::SetWindowLongPtrW;
    unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, session as isize) };
}

#[cfg(target_pointer_width = "64")]
unsafe fn session_ptr(hwnd: HWND) -> *mut Session {
    use windows::Win32::UI::WindowsAndMessaging::GetWindowLongPtrW;
    unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut Session }
}

#[cfg(target_pointer_width = "32")]
unsafe fn set_session(hwnd: HWND, session: *mut Session) {
    use windows::Win32::UI::WindowsAndMessaging::SetWindowLongW;
    unsafe { SetWindowLongW(hwnd, GWLP_USERDATA, session as i32) };
}

#[cfg(target_pointer_width = "32")]
unsafe fn session_ptr(hwnd: HWND) -> *mut Session {
    use windows::Win32::UI::WindowsAndMessaging::GetWindowLongW;
    unsafe { GetWindowLongW(hwnd, GWLP_USERDATA) as *mut Session }
}

// ---------------------------------------------------------------------------
// Window procedure
// ---------------------------------------------------------------------------

unsafe extern "system" fn selection_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_NCCREATE => {
            let create = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
            unsafe { set_session(hwnd, create.lpCreateParams as *mut Session) };
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }
        WM_ERASEBKGND => return LRESULT(1),
        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            return LRESULT(0);
        }
        _ => {}
    }

    let ptr = unsafe { session_ptr(hwnd) };
    if ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    if msg == WM_PAINT {
        paint(hwnd, unsafe { &*ptr });
        return LRESULT(0);
    }

    // the borrow ends before DestroyWindow re-enters this procedure
    let response = {
        let session = unsafe { &mut *ptr };
        match msg {
            WM_LBUTTONDOWN => {
                unsafe { SetCapture(hwnd) };
                session.state.press(session.screen_point(lparam))
            }
            WM_MOUSEMOVE => session.state.motion(session.screen_point(lparam)),
            WM_LBUTTONUP => session.state.release(session.screen_point(lparam)),
            WM_KEYDOWN if wparam.0 == VK_ESCAPE.0 as usize => session.state.cancel(),
            WM_RBUTTONDOWN | WM_CLOSE => session.state.cancel(),
            _ => return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    };

    match response {
        SelectionResponse::Ignore => {}
        SelectionResponse::Repaint => {
            let _ = unsafe { InvalidateRect(hwnd, None, false) };
        }
        SelectionResponse::Finish => unsafe {
            let _ = ReleaseCapture();
            let _ = DestroyWindow(hwnd);
        },
    }
    LRESULT(0)
}

// ---------------------------------------------------------------------------
// Painting
// ---------------------------------------------------------------------------

fn paint(hwnd: HWND, session: &Session) {
    let mut ps = PAINTSTRUCT::default();
    let hdc = unsafe { BeginPaint(hwnd, &mut ps) };
    if !hdc.is_invalid() {
        if let Err(e) = draw_overlay(hdc, session) {
            log::debug!("Selection overlay paint failed: {e}");
        }
    }
    let _ = unsafe { EndPaint(hwnd, &ps) };
}

fn brush(color: COLORREF) -> Result<GdiObject, GrabError> {
    let brush = unsafe { CreateSolidBrush(color) };
    GdiObject::new(HGDIOBJ(brush.0), "CreateSolidBrush")
}

fn win32_rect(r: Rect) -> RECT {
    RECT {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

/// Paint into an off-screen surface first so dragging does not flicker.
fn draw_overlay(hdc: HDC, session: &Session) -> Result<(), GrabError> {
    let width = session.bounds.width();
    let height = session.bounds.height();
    let surface = Surface::new(hdc, width, height)?;

    let backdrop = brush(BACKDROP)?;
    let whole = RECT {
        left: 0,
        top: 0,
        right: width as i32,
        bottom: height as i32,
    };
    unsafe { FillRect(surface.hdc(), &whole, HBRUSH(backdrop.handle().0)) };

    let selected = session.state.rect();
    if session.state.is_dragging() && !selected.is_empty() {
        let local = win32_rect(selected.relative_to(session.bounds.origin()));
        let highlight = brush(HIGHLIGHT)?;
        let outline = brush(OUTLINE)?;
        unsafe {
            FillRect(surface.hdc(), &local, HBRUSH(highlight.handle().0));
            FrameRect(surface.hdc(), &local, HBRUSH(outline.handle().0));
        }
    }

    unsafe {
        BitBlt(
            hdc,
            0,
            0,
            width as i32,
            height as i32,
            surface.hdc(),
            0,
            0,
            SRCCOPY,
        )
    }
    .map_err(|e| GrabError::BlitFailed(win32_context("BitBlt", &e)))
}

// ---------------------------------------------------------------------------
// Session driver
// ---------------------------------------------------------------------------

/// Unregisters the window class on drop.
struct ClassRegistration(HINSTANCE);

impl ClassRegistration {
    fn register(instance: HINSTANCE) -> Result<Self, SelectionError> {
        let cursor = unsafe { LoadCursorW(None, IDC_CROSS) }
            .map_err(|e| SelectionError::Window(win32_context("LoadCursorW", &e)))?;
        let class = WNDCLASSW {
            lpfnWndProc: Some(selection_proc),
            hInstance: instance,
            hCursor: cursor,
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };
        if unsafe { RegisterClassW(&class) } == 0 {
            return Err(SelectionError::Window(format!(
                "RegisterClassW: {}",
                windows::core::Error::from_win32()
            )));
        }
        Ok(Self(instance))
    }
}

impl Drop for ClassRegistration {
    fn drop(&mut self) {
        let _ = unsafe { UnregisterClassW(CLASS_NAME, self.0) };
    }
}

/// Show the overlay and pump messages until the user commits or cancels.
pub(crate) fn select_region() -> Result<SelectionOutcome, SelectionError> {
    let module = unsafe { GetModuleHandleW(None) }
        .map_err(|e| SelectionError::Window(win32_context("GetModuleHandleW", &e)))?;
    let instance = HINSTANCE(module.0);
    let _class = ClassRegistration::register(instance)?;

    let bounds = virtual_screen();
    let mut session = Box::new(Session {
        state: SelectionState::new(),
        bounds,
    });
    let session_ptr: *mut Session = &mut *session;

    let hwnd = unsafe {
        CreateWindowExW(
            WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
            CLASS_NAME,
            w!("Select a region"),
            WS_POPUP,
            bounds.left,
            bounds.top,
            bounds.width() as i32,
            bounds.height() as i32,
            None,
            None,
            instance,
            Some(session_ptr as *const c_void),
        )
    }
    .map_err(|e| SelectionError::Window(win32_context("CreateWindowExW", &e)))?;

    if let Err(e) = unsafe { SetLayeredWindowAttributes(hwnd, COLORREF(0), OVERLAY_ALPHA, LWA_ALPHA) } {
        let _ = unsafe { DestroyWindow(hwnd) };
        return Err(SelectionError::Window(win32_context(
            "SetLayeredWindowAttributes",
            &e,
        )));
    }
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
        let _ = SetFocus(hwnd);
    }
    log::info!("Selection overlay shown over {bounds}; drag to select, Escape to cancel");

    let mut msg = MSG::default();
    loop {
        let status = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        match status.0 {
            0 => break,
            -1 => {
                let err = windows::core::Error::from_win32();
                let _ = unsafe { DestroyWindow(hwnd) };
                return Err(SelectionError::Window(win32_context("GetMessageW", &err)));
            }
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }

    // WM_QUIT arrives only after the window is destroyed
    Ok(session
        .state
        .outcome()
        .unwrap_or(SelectionOutcome::Cancelled))
}

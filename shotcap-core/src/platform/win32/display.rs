//! Monitor and top-level window enumeration via Win32.
//!
//! All functions return owned snapshots; handles are carried as
//! [`WindowHandle`] values and converted back at the call site.

use std::ffi::{c_void, OsString};
use std::os::windows::ffi::OsStringExt;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, FindWindowW, GetForegroundWindow, GetSystemMetrics, GetWindowRect,
    GetWindowTextLengthW, GetWindowTextW, IsWindowVisible, MONITORINFOF_PRIMARY, SM_CXSCREEN,
    SM_CYSCREEN,
};

use super::gdi::wide;
use crate::errors::{win32_context, ResolutionError};
use crate::geometry::Rect;
use crate::resolver::{MonitorInfo, WindowHandle, WindowInfo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn rect(raw: &RECT) -> Rect {
    Rect::new(raw.left, raw.top, raw.right, raw.bottom)
}

fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    OsString::from_wide(&buf[..len])
        .to_string_lossy()
        .into_owned()
}

fn read_window_title(hwnd: HWND) -> String {
    let len = unsafe { GetWindowTextLengthW(hwnd) };
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u16; (len + 1) as usize];
    let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
    if copied <= 0 {
        return String::new();
    }
    from_wide(&buf[..copied as usize])
}

// ---------------------------------------------------------------------------
// Monitors
// ---------------------------------------------------------------------------

unsafe extern "system" fn monitor_callback(
    monitor: HMONITOR,
    _hdc: HDC,
    bounds: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = unsafe { &mut *(lparam.0 as *mut Vec<MonitorInfo>) };

    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;
    let described = unsafe {
        GetMonitorInfoW(monitor, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO)
    }
    .as_bool();

    let (area, device_name, is_primary) = if described {
        (
            rect(&info.monitorInfo.rcMonitor),
            from_wide(&info.szDevice),
            info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
        )
    } else if let Some(bounds) = unsafe { bounds.as_ref() } {
        (rect(bounds), String::new(), false)
    } else {
        return TRUE;
    };

    monitors.push(MonitorInfo {
        index: monitors.len(),
        rect: area,
        device_name,
        is_primary,
    });
    TRUE
}

pub(crate) fn monitors() -> Result<Vec<MonitorInfo>, ResolutionError> {
    let mut monitors: Vec<MonitorInfo> = Vec::with_capacity(4);
    let ok = unsafe {
        EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(monitor_callback),
            LPARAM(&mut monitors as *mut Vec<MonitorInfo> as isize),
        )
    };
    if !ok.as_bool() {
        return Err(ResolutionError::EnumerationFailed(
            "EnumDisplayMonitors returned FALSE".into(),
        ));
    }
    Ok(monitors)
}

/// Primary monitor in virtual-screen coordinates; it always sits at (0, 0).
pub(crate) fn primary_screen() -> Rect {
    let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    Rect::new(0, 0, w.max(0), h.max(0))
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Exact, case-sensitive title match among top-level windows.
pub(crate) fn find_window(title: &str) -> Result<Option<WindowHandle>, ResolutionError> {
    let title = wide(title);
    match unsafe { FindWindowW(PCWSTR::null(), PCWSTR(title.as_ptr())) } {
        Ok(hwnd) if !hwnd.is_invalid() => Ok(Some(handle(hwnd))),
        Ok(_) => Ok(None),
        // no match reports a NULL window without a last-error code
        Err(e) if e.code().is_ok() => Ok(None),
        Err(e) => Err(ResolutionError::Os(win32_context("FindWindowW", &e))),
    }
}

pub(crate) fn foreground_window() -> Option<WindowHandle> {
    let hwnd = unsafe { GetForegroundWindow() };
    (!hwnd.is_invalid()).then(|| handle(hwnd))
}

pub(crate) fn window_rect(window: WindowHandle) -> Result<Rect, ResolutionError> {
    let mut raw = RECT::default();
    unsafe { GetWindowRect(hwnd(window), &mut raw) }
        .map_err(|e| ResolutionError::Os(win32_context("GetWindowRect", &e)))?;
    Ok(rect(&raw))
}

unsafe extern "system" fn window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = unsafe { &mut *(lparam.0 as *mut Vec<HWND>) };
    if unsafe { IsWindowVisible(hwnd) }.as_bool() && unsafe { GetWindowTextLengthW(hwnd) } > 0 {
        handles.push(hwnd);
    }
    TRUE
}

/// Visible top-level windows with a non-empty title, in Z order.
pub(crate) fn windows() -> Result<Vec<WindowInfo>, ResolutionError> {
    let mut handles: Vec<HWND> = Vec::with_capacity(64);
    unsafe {
        EnumWindows(
            Some(window_callback),
            LPARAM(&mut handles as *mut Vec<HWND> as isize),
        )
    }
    .map_err(|e| ResolutionError::EnumerationFailed(win32_context("EnumWindows", &e)))?;

    Ok(handles
        .into_iter()
        .filter_map(|hwnd| {
            let title = read_window_title(hwnd);
            if title.is_empty() {
                return None;
            }
            let mut raw = RECT::default();
            let _ = unsafe { GetWindowRect(hwnd, &mut raw) };
            Some(WindowInfo {
                hwnd: handle(hwnd),
                title,
                rect: rect(&raw),
            })
        })
        .collect())
}

//! GDI capture primitives: desktop blit and `PrintWindow`.

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{BitBlt, CAPTUREBLT, ROP_CODE, SRCCOPY};
use windows::Win32::Storage::Xps::{PrintWindow, PRINT_WINDOW_FLAGS, PW_CLIENTONLY};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

use super::gdi::{Surface, WindowDc};
use crate::errors::{win32_context, GrabError};
use crate::geometry::Rect;
use crate::grabber::PrintMode;
use crate::pixels::PixelBuffer;

/// Renders DirectComposition content too (Windows 8.1+); not exported by
/// the metadata.
const PW_RENDERFULLCONTENT: PRINT_WINDOW_FLAGS = PRINT_WINDOW_FLAGS(0x0000_0002);

/// Copy `rect` of the virtual desktop, including layered windows.
pub(crate) fn blit_screen(rect: Rect) -> Result<PixelBuffer, GrabError> {
    let screen = WindowDc::screen()?;
    let surface = Surface::new(screen.hdc(), rect.width(), rect.height())?;

    unsafe {
        BitBlt(
            surface.hdc(),
            0,
            0,
            surface.width() as i32,
            surface.height() as i32,
            screen.hdc(),
            rect.left,
            rect.top,
            ROP_CODE(SRCCOPY.0 | CAPTUREBLT.0),
        )
    }
    .map_err(|e| GrabError::BlitFailed(win32_context("BitBlt", &e)))?;

    let mut buffer = surface.to_buffer()?;
    buffer.force_opaque();
    Ok(buffer)
}

/// Ask `hwnd` to paint itself into a `rect`-sized surface.
pub(crate) fn print_window(hwnd: HWND, rect: Rect, mode: PrintMode) -> Result<PixelBuffer, GrabError> {
    let window_dc = WindowDc::acquire(hwnd)?;
    let surface = Surface::new(window_dc.hdc(), rect.width(), rect.height())?;

    let flags = match mode {
        PrintMode::FullContent => PW_RENDERFULLCONTENT,
        PrintMode::ClientOnly => PW_CLIENTONLY,
    };
    let printed = unsafe { PrintWindow(hwnd, surface.hdc(), flags) };
    if !printed.as_bool() {
        return Err(GrabError::BlitFailed(format!(
            "PrintWindow({:#x}, {:#x}) returned FALSE",
            hwnd.0 as isize, flags.0
        )));
    }

    let mut buffer = surface.to_buffer()?;
    buffer.force_opaque();
    Ok(buffer)
}

/// Bounds of the virtual desktop spanning every monitor.
pub(crate) fn virtual_screen() -> Rect {
    let (x, y, w, h) = unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    };
    Rect::new(x, y, x.saturating_add(w.max(0)), y.saturating_add(h.max(0)))
}

//! Win32 backend: GDI capture, `PrintWindow`, the clipboard, the shell,
//! and the selection overlay.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `gdi` | RAII device contexts, GDI objects, and DIB-section surfaces |
//! | `display` | Monitor and top-level window enumeration |
//! | `capture` | Desktop blit and window print |
//! | `cursor` | Pointer snapshot and glyph drawing |
//! | `text` | GDI text rasterisation for labels |
//! | `clipboard` | `CF_DIB` publishing |
//! | `shell` | `ShellExecuteW` "open" |
//! | `selection` | Modal rubber-band selection window |

mod capture;
mod clipboard;
mod cursor;
mod display;
mod gdi;
mod selection;
mod shell;
mod text;

use std::path::Path;

use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::SetProcessDPIAware;

use crate::com::COMGuard;
use crate::errors::{
    AnnotationError, ClipboardError, GrabError, InitError, ResolutionError, SelectionError,
    ShellError,
};
use crate::geometry::{Point, Rect};
use crate::grabber::{CaptureBackend, PrintMode};
use crate::orchestrator::{Clipboard, Platform, Shell};
use crate::overlay::{GlyphMask, PointerSource, PointerState, TextRasterizer};
use crate::pixels::PixelBuffer;
use crate::resolver::{DisplayServer, MonitorInfo, WindowHandle, WindowInfo};
use crate::selection::{SelectionOutcome, SelectionUi};

/// The native Windows platform.
///
/// Construction opts the process into per-monitor DPI awareness so every
/// coordinate below is in physical pixels.
pub struct Win32Platform {
    com: Option<COMGuard>,
}

impl Win32Platform {
    pub fn new() -> Self {
        enable_dpi_awareness();
        Self { com: None }
    }
}

impl Default for Win32Platform {
    fn default() -> Self {
        Self::new()
    }
}

fn enable_dpi_awareness() {
    match unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) } {
        Ok(()) => log::debug!("Per-monitor DPI awareness (v2) enabled"),
        Err(e) => {
            // pre-1703 systems, or awareness already fixed by a manifest
            log::debug!("SetProcessDpiAwarenessContext failed ({e}); trying SetProcessDPIAware");
            if !unsafe { SetProcessDPIAware() }.as_bool() {
                log::warn!("Could not enable DPI awareness; coordinates may be scaled");
            }
        }
    }
}

impl DisplayServer for Win32Platform {
    fn monitors(&self) -> Result<Vec<MonitorInfo>, ResolutionError> {
        display::monitors()
    }

    fn primary_screen(&self) -> Rect {
        display::primary_screen()
    }

    fn find_window(&self, title: &str) -> Result<Option<WindowHandle>, ResolutionError> {
        display::find_window(title)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        display::foreground_window()
    }

    fn window_rect(&self, window: WindowHandle) -> Result<Rect, ResolutionError> {
        display::window_rect(window)
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, ResolutionError> {
        display::windows()
    }
}

impl CaptureBackend for Win32Platform {
    fn blit_screen(&self, rect: Rect) -> Result<PixelBuffer, GrabError> {
        capture::blit_screen(rect)
    }

    fn print_window(
        &self,
        window: WindowHandle,
        rect: Rect,
        mode: PrintMode,
    ) -> Result<PixelBuffer, GrabError> {
        capture::print_window(display::hwnd(window), rect, mode)
    }

    fn virtual_screen(&self) -> Rect {
        capture::virtual_screen()
    }
}

impl PointerSource for Win32Platform {
    fn pointer(&self) -> Result<PointerState, AnnotationError> {
        cursor::pointer()
    }

    fn draw_pointer(
        &self,
        state: &PointerState,
        buffer: &mut PixelBuffer,
        at: Point,
    ) -> Result<(), AnnotationError> {
        cursor::draw_pointer(state, buffer, at)
    }
}

impl TextRasterizer for Win32Platform {
    fn rasterize(&self, text: &str) -> Result<GlyphMask, AnnotationError> {
        text::rasterize(text)
    }
}

impl Clipboard for Win32Platform {
    fn publish_dib(&self, dib: &[u8]) -> Result<(), ClipboardError> {
        clipboard::publish_dib(dib)
    }
}

impl Shell for Win32Platform {
    fn open(&self, path: &Path) -> Result<(), ShellError> {
        shell::open(path)
    }
}

impl SelectionUi for Win32Platform {
    fn select_region(&self) -> Result<SelectionOutcome, SelectionError> {
        selection::select_region()
    }
}

impl Platform for Win32Platform {
    fn initialize(&mut self) -> Result<(), InitError> {
        if self.com.is_none() {
            self.com = Some(COMGuard::init()?);
            log::debug!("COM apartment initialised");
        }
        Ok(())
    }
}

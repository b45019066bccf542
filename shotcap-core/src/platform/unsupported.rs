//! Stand-in for systems without a capture backend.
//!
//! Lets the CLI parse arguments, print help, and report a clear error
//! everywhere but Windows.  Every operation fails with an `Unsupported`
//! variant; nothing panics.

use std::path::Path;

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

const UNSUPPORTED: &str = "not supported on this platform";

#[derive(Debug, Default)]
pub struct UnsupportedPlatform;

impl UnsupportedPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayServer for UnsupportedPlatform {
    fn monitors(&self) -> Result<Vec<MonitorInfo>, ResolutionError> {
        Err(ResolutionError::EnumerationFailed(UNSUPPORTED.into()))
    }

    fn primary_screen(&self) -> Rect {
        Rect::default()
    }

    fn find_window(&self, _title: &str) -> Result<Option<WindowHandle>, ResolutionError> {
        Err(ResolutionError::Os(UNSUPPORTED.into()))
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        None
    }

    fn window_rect(&self, _window: WindowHandle) -> Result<Rect, ResolutionError> {
        Err(ResolutionError::Os(UNSUPPORTED.into()))
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, ResolutionError> {
        Err(ResolutionError::EnumerationFailed(UNSUPPORTED.into()))
    }
}

impl CaptureBackend for UnsupportedPlatform {
    fn blit_screen(&self, _rect: Rect) -> Result<PixelBuffer, GrabError> {
        Err(GrabError::Unsupported)
    }

    fn print_window(
        &self,
        _window: WindowHandle,
        _rect: Rect,
        _mode: PrintMode,
    ) -> Result<PixelBuffer, GrabError> {
        Err(GrabError::Unsupported)
    }

    fn virtual_screen(&self) -> Rect {
        Rect::default()
    }
}

impl PointerSource for UnsupportedPlatform {
    fn pointer(&self) -> Result<PointerState, AnnotationError> {
        Err(AnnotationError::Pointer(UNSUPPORTED.into()))
    }

    fn draw_pointer(
        &self,
        _state: &PointerState,
        _buffer: &mut PixelBuffer,
        _at: Point,
    ) -> Result<(), AnnotationError> {
        Err(AnnotationError::Pointer(UNSUPPORTED.into()))
    }
}

impl TextRasterizer for UnsupportedPlatform {
    fn rasterize(&self, _text: &str) -> Result<GlyphMask, AnnotationError> {
        Err(AnnotationError::Text(UNSUPPORTED.into()))
    }
}

impl Clipboard for UnsupportedPlatform {
    fn publish_dib(&self, _dib: &[u8]) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unsupported)
    }
}

impl Shell for UnsupportedPlatform {
    fn open(&self, path: &Path) -> Result<(), ShellError> {
        Err(ShellError {
            path: path.display().to_string(),
            reason: UNSUPPORTED.into(),
        })
    }
}

impl SelectionUi for UnsupportedPlatform {
    fn select_region(&self) -> Result<SelectionOutcome, SelectionError> {
        Err(SelectionError::Unsupported)
    }
}

impl Platform for UnsupportedPlatform {
    fn initialize(&mut self) -> Result<(), InitError> {
        Err(InitError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{run, CaptureConfig};
    use crate::errors::ShotcapError;

    #[test]
    fn test_run_fails_at_initialisation() {
        let mut platform = UnsupportedPlatform::new();
        let err = run(&CaptureConfig::default(), &mut platform).unwrap_err();
        assert!(matches!(err, ShotcapError::Init(InitError::Unsupported)));
    }

    #[test]
    fn test_listing_reports_enumeration_failure() {
        let platform = UnsupportedPlatform::new();
        assert!(platform.monitors().is_err());
        assert!(platform.windows().is_err());
    }
}

//! Frame grabbing: copy pixels from a resolved source into a [`PixelBuffer`].
//!
//! Two techniques exist, both implemented by a [`CaptureBackend`]:
//!
//! 1. **Blit** -- a straight pixel copy out of the desktop surface.  Used for
//!    full-screen, monitor, and region targets.
//! 2. **Print** -- ask the window to render itself into an off-screen
//!    surface.  Used for window targets because occluded or
//!    hardware-accelerated windows often come out black or stale through
//!    a blit.
//!
//! Window capture degrades in three steps: full-content print, client-only
//! print, then a blit of the whole screen cropped to the window's last known
//! rectangle.  Each transition is logged at `warn` level.  The grab only
//! fails once every step has failed.

use crate::errors::GrabError;
use crate::geometry::Rect;
use crate::pixels::PixelBuffer;
use crate::resolver::{ResolvedSource, SourceHandle, WindowHandle};

/// How much of a window the print technique asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Whole window including non-client area and DirectComposition content.
    FullContent,
    /// Client area only.
    ClientOnly,
}

/// Which technique produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStage {
    Blit,
    PrintFullContent,
    PrintClientOnly,
    ScreenFallback,
}

/// Platform capture primitives.
///
/// Implementations acquire and release every device context and bitmap
/// inside the call, on every exit path.
pub trait CaptureBackend {
    /// Copy `rect` (virtual-screen coordinates) from the desktop, 1:1.
    fn blit_screen(&self, rect: Rect) -> Result<PixelBuffer, GrabError>;

    /// Have `window` render itself into a `rect`-sized buffer.
    fn print_window(
        &self,
        window: WindowHandle,
        rect: Rect,
        mode: PrintMode,
    ) -> Result<PixelBuffer, GrabError>;

    /// Bounds of the whole virtual desktop, used by the window fallback.
    fn virtual_screen(&self) -> Rect;
}

/// A captured frame and the technique that produced it.
#[derive(Debug)]
pub struct Grab {
    pub buffer: PixelBuffer,
    pub stage: GrabStage,
}

/// Capture `resolved` with the technique appropriate to its source.
pub fn grab<B: CaptureBackend + ?Sized>(
    backend: &B,
    resolved: &ResolvedSource,
) -> Result<Grab, GrabError> {
    let rect = resolved.rect;
    log::info!("Capture dimensions: {}x{}", rect.width(), rect.height());

    if rect.is_empty() {
        log::warn!("Capture rectangle {rect} has zero area; producing an empty image");
        return Ok(Grab {
            buffer: PixelBuffer::empty(),
            stage: GrabStage::Blit,
        });
    }

    match resolved.source {
        SourceHandle::Screen => Ok(Grab {
            buffer: backend.blit_screen(rect)?,
            stage: GrabStage::Blit,
        }),
        SourceHandle::Window(window) => grab_window(backend, window, rect),
    }
}

fn grab_window<B: CaptureBackend + ?Sized>(
    backend: &B,
    window: WindowHandle,
    rect: Rect,
) -> Result<Grab, GrabError> {
    match backend.print_window(window, rect, PrintMode::FullContent) {
        Ok(buffer) => {
            return Ok(Grab {
                buffer,
                stage: GrabStage::PrintFullContent,
            })
        }
        Err(e) => log::warn!("Full-content window print failed ({e}); retrying client area only"),
    }

    match backend.print_window(window, rect, PrintMode::ClientOnly) {
        Ok(buffer) => {
            return Ok(Grab {
                buffer,
                stage: GrabStage::PrintClientOnly,
            })
        }
        Err(e) => log::warn!(
            "Client-area window print failed ({e}); falling back to screen blit cropped to {rect}"
        ),
    }

    let screen = backend.virtual_screen();
    let full = backend.blit_screen(screen)?;
    Ok(Grab {
        buffer: full.crop(&rect.relative_to(screen.origin())),
        stage: GrabStage::ScreenFallback,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::geometry::Point;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Call {
        Blit(Rect),
        Print(PrintMode),
    }

    /// Backend that fails on demand and records every call.
    ///
    /// Screen pixels encode their own coordinates: blue = x, green = y
    /// (mod 256), relative to the virtual screen origin.
    pub(crate) struct FaultyBackend {
        pub fail_full: bool,
        pub fail_client: bool,
        pub fail_blit: bool,
        pub screen: Rect,
        pub calls: RefCell<Vec<Call>>,
    }

    impl FaultyBackend {
        pub(crate) fn healthy() -> Self {
            Self {
                fail_full: false,
                fail_client: false,
                fail_blit: false,
                screen: Rect::new(-100, 0, 300, 200),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    fn coordinate_buffer(rect: Rect, origin: Point) -> PixelBuffer {
        let mut buf = PixelBuffer::new(rect.width(), rect.height());
        for y in 0..rect.height() {
            for x in 0..rect.width() {
                let sx = (rect.left + x as i32 - origin.x) as u8;
                let sy = (rect.top + y as i32 - origin.y) as u8;
                buf.set_pixel(x, y, [sx, sy, 0, 255]);
            }
        }
        buf
    }

    impl CaptureBackend for FaultyBackend {
        fn blit_screen(&self, rect: Rect) -> Result<PixelBuffer, GrabError> {
            self.calls.borrow_mut().push(Call::Blit(rect));
            if self.fail_blit {
                return Err(GrabError::BlitFailed("BitBlt: access denied".into()));
            }
            Ok(coordinate_buffer(rect, self.screen.origin()))
        }

        fn print_window(
            &self,
            _window: WindowHandle,
            rect: Rect,
            mode: PrintMode,
        ) -> Result<PixelBuffer, GrabError> {
            self.calls.borrow_mut().push(Call::Print(mode));
            let fail = match mode {
                PrintMode::FullContent => self.fail_full,
                PrintMode::ClientOnly => self.fail_client,
            };
            if fail {
                return Err(GrabError::BlitFailed("PrintWindow returned FALSE".into()));
            }
            Ok(PixelBuffer::new(rect.width(), rect.height()))
        }

        fn virtual_screen(&self) -> Rect {
            self.screen
        }
    }

    fn window_source(rect: Rect) -> ResolvedSource {
        ResolvedSource {
            rect,
            source: SourceHandle::Window(WindowHandle(0x42)),
        }
    }

    #[test]
    fn test_screen_source_blits_exact_rect() {
        let backend = FaultyBackend::healthy();
        let rect = Rect::new(10, 20, 110, 70);
        let g = grab(
            &backend,
            &ResolvedSource {
                rect,
                source: SourceHandle::Screen,
            },
        )
        .unwrap();
        assert_eq!(g.stage, GrabStage::Blit);
        assert_eq!((g.buffer.width(), g.buffer.height()), (100, 50));
        assert_eq!(*backend.calls.borrow(), vec![Call::Blit(rect)]);
    }

    #[test]
    fn test_window_full_content_first() {
        let backend = FaultyBackend::healthy();
        let g = grab(&backend, &window_source(Rect::new(0, 0, 40, 30))).unwrap();
        assert_eq!(g.stage, GrabStage::PrintFullContent);
        assert_eq!(
            *backend.calls.borrow(),
            vec![Call::Print(PrintMode::FullContent)]
        );
    }

    #[test]
    fn test_window_client_only_second() {
        let backend = FaultyBackend {
            fail_full: true,
            ..FaultyBackend::healthy()
        };
        let g = grab(&backend, &window_source(Rect::new(0, 0, 40, 30))).unwrap();
        assert_eq!(g.stage, GrabStage::PrintClientOnly);
        assert_eq!(
            *backend.calls.borrow(),
            vec![
                Call::Print(PrintMode::FullContent),
                Call::Print(PrintMode::ClientOnly)
            ]
        );
    }

    #[test]
    fn test_window_falls_back_to_cropped_screen_blit() {
        let backend = FaultyBackend {
            fail_full: true,
            fail_client: true,
            ..FaultyBackend::healthy()
        };
        let window = Rect::new(-50, 20, 30, 60);
        let g = grab(&backend, &window_source(window)).unwrap();

        assert_eq!(g.stage, GrabStage::ScreenFallback);
        assert_eq!(
            *backend.calls.borrow(),
            vec![
                Call::Print(PrintMode::FullContent),
                Call::Print(PrintMode::ClientOnly),
                Call::Blit(backend.screen),
            ]
        );
        assert_eq!((g.buffer.width(), g.buffer.height()), (80, 40));
        // top-left of the crop is screen-relative (50, 20)
        assert_eq!(g.buffer.pixel(0, 0), Some([50, 20, 0, 255]));
        assert_eq!(g.buffer.pixel(79, 39), Some([129, 59, 0, 255]));
    }

    #[test]
    fn test_window_all_stages_exhausted() {
        let backend = FaultyBackend {
            fail_full: true,
            fail_client: true,
            fail_blit: true,
            ..FaultyBackend::healthy()
        };
        let err = grab(&backend, &window_source(Rect::new(0, 0, 10, 10))).unwrap_err();
        assert!(matches!(err, GrabError::BlitFailed(_)));
        assert_eq!(backend.calls.borrow().len(), 3);
    }

    #[test]
    fn test_zero_area_produces_empty_buffer_without_backend_calls() {
        let backend = FaultyBackend::healthy();
        let g = grab(
            &backend,
            &ResolvedSource {
                rect: Rect::new(200, 200, 200, 200),
                source: SourceHandle::Screen,
            },
        )
        .unwrap();
        assert!(g.buffer.is_empty());
        assert!(backend.calls.borrow().is_empty());
    }
}

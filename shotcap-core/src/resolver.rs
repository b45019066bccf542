//! Source resolution: turn a [`CaptureTarget`] into a capture rectangle and
//! the source to copy from.
//!
//! The platform is reached through [`DisplayServer`], which exposes monitor
//! and top-level window enumeration as owned snapshots -- never raw handles
//! that outlive the call, only opaque [`WindowHandle`] values.

use serde::Serialize;

use crate::errors::ResolutionError;
use crate::geometry::Rect;
use crate::target::CaptureTarget;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Opaque top-level window identifier (an `HWND` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WindowHandle(pub isize);

/// One display, in platform enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorInfo {
    pub index: usize,
    pub rect: Rect,
    pub device_name: String,
    pub is_primary: bool,
}

/// Owned snapshot of a visible, titled top-level window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    pub hwnd: WindowHandle,
    pub title: String,
    pub rect: Rect,
}

/// Where pixels are copied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHandle {
    /// The desktop surface; `rect` is in virtual-screen coordinates.
    Screen,
    /// A top-level window; `rect` is its last known screen rectangle.
    Window(WindowHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSource {
    pub rect: Rect,
    pub source: SourceHandle,
}

// ---------------------------------------------------------------------------
// Platform seam
// ---------------------------------------------------------------------------

/// Display and window enumeration.
pub trait DisplayServer {
    /// Monitors in platform enumeration order.  The order is stable for the
    /// lifetime of the process unless displays are hot-plugged.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, ResolutionError>;

    /// Primary screen rectangle, anchored at the origin.
    fn primary_screen(&self) -> Rect;

    /// First top-level window whose title matches `title` exactly.
    /// `Ok(None)` means "no such window", `Err` an OS failure.
    fn find_window(&self, title: &str) -> Result<Option<WindowHandle>, ResolutionError>;

    fn foreground_window(&self) -> Option<WindowHandle>;

    fn window_rect(&self, window: WindowHandle) -> Result<Rect, ResolutionError>;

    /// Visible top-level windows that have a title.
    fn windows(&self) -> Result<Vec<WindowInfo>, ResolutionError>;
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve `target` to a rectangle and source.
pub fn resolve<D: DisplayServer + ?Sized>(
    display: &D,
    target: &CaptureTarget,
) -> Result<ResolvedSource, ResolutionError> {
    let resolved = match target {
        CaptureTarget::ActiveWindow => {
            let window = display
                .foreground_window()
                .ok_or(ResolutionError::NoForegroundWindow)?;
            ResolvedSource {
                rect: display.window_rect(window)?,
                source: SourceHandle::Window(window),
            }
        }
        CaptureTarget::WindowByTitle(title) => {
            let window = display
                .find_window(title)?
                .ok_or_else(|| ResolutionError::SourceNotFound(title.clone()))?;
            ResolvedSource {
                rect: display.window_rect(window)?,
                source: SourceHandle::Window(window),
            }
        }
        CaptureTarget::Monitor(index) => {
            let monitors = display.monitors()?;
            let monitor = usize::try_from(*index)
                .ok()
                .and_then(|i| monitors.get(i))
                .ok_or(ResolutionError::InvalidIndex {
                    index: *index,
                    count: monitors.len(),
                })?;
            ResolvedSource {
                rect: monitor.rect,
                source: SourceHandle::Screen,
            }
        }
        CaptureTarget::Region(rect) => ResolvedSource {
            rect: *rect,
            source: SourceHandle::Screen,
        },
        CaptureTarget::FullScreen => ResolvedSource {
            rect: display.primary_screen(),
            source: SourceHandle::Screen,
        },
    };

    log::info!(
        "Resolved {} to {} ({}x{})",
        target.describe(),
        resolved.rect,
        resolved.rect.width(),
        resolved.rect.height()
    );
    Ok(resolved)
}

/// Render the monitor list the way `-listmonitors` prints it.
pub fn format_monitor_list(monitors: &[MonitorInfo]) -> String {
    let mut out = String::from("Monitors available:\n");
    for m in monitors {
        let r = m.rect;
        out.push_str(&format!(
            "  [{}] ({},{}) - ({},{})",
            m.index, r.left, r.top, r.right, r.bottom
        ));
        if !m.device_name.is_empty() {
            out.push_str(&format!(" {}", m.device_name));
        }
        if m.is_primary {
            out.push_str(" (primary)");
        }
        out.push('\n');
    }
    out
}

/// Render the window list the way `-listwindows` prints it.
pub fn format_window_list(windows: &[WindowInfo]) -> String {
    let mut out = String::from("Visible windows:\n");
    for w in windows {
        out.push_str(&format!("Handle: {:#x} | Title: {}\n", w.hwnd.0, w.title));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory display: two side-by-side monitors and a couple of windows.
    pub(crate) struct FakeDisplay {
        pub monitors: Result<Vec<MonitorInfo>, ResolutionError>,
        pub windows: Vec<WindowInfo>,
        pub foreground: Option<WindowHandle>,
    }

    impl Default for FakeDisplay {
        fn default() -> Self {
            Self {
                monitors: Ok(vec![
                    MonitorInfo {
                        index: 0,
                        rect: Rect::new(0, 0, 1920, 1080),
                        device_name: r"\\.\DISPLAY1".into(),
                        is_primary: true,
                    },
                    MonitorInfo {
                        index: 1,
                        rect: Rect::new(1920, 0, 3200, 1024),
                        device_name: r"\\.\DISPLAY2".into(),
                        is_primary: false,
                    },
                ]),
                windows: vec![
                    WindowInfo {
                        hwnd: WindowHandle(0x10),
                        title: "Untitled - Notepad".into(),
                        rect: Rect::new(100, 100, 900, 700),
                    },
                    WindowInfo {
                        hwnd: WindowHandle(0x20),
                        title: "Calculator".into(),
                        rect: Rect::new(50, 60, 370, 560),
                    },
                ],
                foreground: Some(WindowHandle(0x20)),
            }
        }
    }

    impl DisplayServer for FakeDisplay {
        fn monitors(&self) -> Result<Vec<MonitorInfo>, ResolutionError> {
            self.monitors.clone()
        }

        fn primary_screen(&self) -> Rect {
            Rect::new(0, 0, 1920, 1080)
        }

        fn find_window(&self, title: &str) -> Result<Option<WindowHandle>, ResolutionError> {
            Ok(self
                .windows
                .iter()
                .find(|w| w.title == title)
                .map(|w| w.hwnd))
        }

        fn foreground_window(&self) -> Option<WindowHandle> {
            self.foreground
        }

        fn window_rect(&self, window: WindowHandle) -> Result<Rect, ResolutionError> {
            self.windows
                .iter()
                .find(|w| w.hwnd == window)
                .map(|w| w.rect)
                .ok_or_else(|| ResolutionError::Os("GetWindowRect: invalid handle".into()))
        }

        fn windows(&self) -> Result<Vec<WindowInfo>, ResolutionError> {
            Ok(self.windows.clone())
        }
    }

    #[test]
    fn test_resolve_full_screen() {
        let r = resolve(&FakeDisplay::default(), &CaptureTarget::FullScreen).unwrap();
        assert_eq!(r.rect, Rect::new(0, 0, 1920, 1080));
        assert_eq!(r.source, SourceHandle::Screen);
    }

    #[test]
    fn test_resolve_monitor_uses_enumeration_order() {
        let display = FakeDisplay::default();
        let listed = display.monitors().unwrap();
        for (i, m) in listed.iter().enumerate() {
            let r = resolve(&display, &CaptureTarget::Monitor(i as i32)).unwrap();
            assert_eq!(r.rect, m.rect);
        }
    }

    #[test]
    fn test_resolve_monitor_out_of_range() {
        let err = resolve(&FakeDisplay::default(), &CaptureTarget::Monitor(2)).unwrap_err();
        assert_eq!(err, ResolutionError::InvalidIndex { index: 2, count: 2 });
    }

    #[test]
    fn test_resolve_negative_monitor_index() {
        let err = resolve(&FakeDisplay::default(), &CaptureTarget::Monitor(-2)).unwrap_err();
        assert_eq!(err, ResolutionError::InvalidIndex { index: -2, count: 2 });
    }

    #[test]
    fn test_resolve_monitor_enumeration_failure() {
        let display = FakeDisplay {
            monitors: Err(ResolutionError::EnumerationFailed("EnumDisplayMonitors".into())),
            ..FakeDisplay::default()
        };
        let err = resolve(&display, &CaptureTarget::Monitor(0)).unwrap_err();
        assert!(matches!(err, ResolutionError::EnumerationFailed(_)));
    }

    #[test]
    fn test_resolve_window_by_title() {
        let target = CaptureTarget::WindowByTitle("Calculator".into());
        let r = resolve(&FakeDisplay::default(), &target).unwrap();
        assert_eq!(r.source, SourceHandle::Window(WindowHandle(0x20)));
        assert_eq!(r.rect, Rect::new(50, 60, 370, 560));
    }

    #[test]
    fn test_resolve_window_title_is_exact() {
        let target = CaptureTarget::WindowByTitle("calculator".into());
        let err = resolve(&FakeDisplay::default(), &target).unwrap_err();
        assert_eq!(err, ResolutionError::SourceNotFound("calculator".into()));
    }

    #[test]
    fn test_resolve_active_window() {
        let r = resolve(&FakeDisplay::default(), &CaptureTarget::ActiveWindow).unwrap();
        assert_eq!(r.source, SourceHandle::Window(WindowHandle(0x20)));

        let display = FakeDisplay {
            foreground: None,
            ..FakeDisplay::default()
        };
        let err = resolve(&display, &CaptureTarget::ActiveWindow).unwrap_err();
        assert_eq!(err, ResolutionError::NoForegroundWindow);
    }

    #[test]
    fn test_format_monitor_list() {
        let text = format_monitor_list(&FakeDisplay::default().monitors().unwrap());
        assert!(text.starts_with("Monitors available:\n"));
        assert!(text.contains("  [0] (0,0) - (1920,1080)"));
        assert!(text.contains("(primary)"));
        assert!(text.contains("  [1] (1920,0) - (3200,1024)"));
    }

    #[test]
    fn test_format_window_list() {
        let text = format_window_list(&FakeDisplay::default().windows);
        assert!(text.contains("Handle: 0x10 | Title: Untitled - Notepad"));
    }

    #[test]
    fn test_monitor_info_serialization() {
        let m = &FakeDisplay::default().monitors().unwrap()[1];
        let json = serde_json::to_string(m).unwrap();
        assert!(json.contains("\"index\":1"));
        assert!(json.contains("\"right\":3200"));
    }

    #[test]
    fn test_window_info_serialization() {
        let json = serde_json::to_string(&FakeDisplay::default().windows[0]).unwrap();
        assert!(json.contains("\"hwnd\":16"));
        assert!(json.contains("Notepad"));
    }
}

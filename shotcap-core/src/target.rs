//! What to capture, decided once per invocation.

use crate::geometry::Rect;

/// Capture source.  Exactly one variant is active per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    FullScreen,
    /// 0-based; negative indices are kept and rejected at resolution.
    Monitor(i32),
    Region(Rect),
    WindowByTitle(String),
    ActiveWindow,
}

impl CaptureTarget {
    /// Collapse the individually-optional selectors into one target.
    ///
    /// Precedence: active window > window by title > monitor > region >
    /// full screen.
    pub fn from_selectors(
        active: bool,
        title: Option<String>,
        monitor: Option<i32>,
        region: Option<Rect>,
    ) -> Self {
        if active {
            return Self::ActiveWindow;
        }
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            return Self::WindowByTitle(title);
        }
        if let Some(index) = monitor {
            return Self::Monitor(index);
        }
        match region {
            Some(rect) => Self::Region(rect),
            None => Self::FullScreen,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::FullScreen => "full desktop".to_owned(),
            Self::Monitor(i) => format!("monitor {i}"),
            Self::Region(r) => format!(
                "region ({},{},{},{})",
                r.left,
                r.top,
                r.width(),
                r.height()
            ),
            Self::WindowByTitle(t) => format!("window '{t}'"),
            Self::ActiveWindow => "active window".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_active_wins() {
        let t = CaptureTarget::from_selectors(
            true,
            Some("Notepad".into()),
            Some(1),
            Some(Rect::new(0, 0, 10, 10)),
        );
        assert_eq!(t, CaptureTarget::ActiveWindow);
    }

    #[test]
    fn test_precedence_title_over_monitor() {
        let t = CaptureTarget::from_selectors(false, Some("Notepad".into()), Some(1), None);
        assert_eq!(t, CaptureTarget::WindowByTitle("Notepad".into()));
    }

    #[test]
    fn test_precedence_monitor_over_region() {
        let t = CaptureTarget::from_selectors(false, None, Some(2), Some(Rect::new(0, 0, 5, 5)));
        assert_eq!(t, CaptureTarget::Monitor(2));
    }

    #[test]
    fn test_empty_title_ignored() {
        let t = CaptureTarget::from_selectors(false, Some(String::new()), None, None);
        assert_eq!(t, CaptureTarget::FullScreen);
    }

    #[test]
    fn test_region_and_default() {
        let r = Rect::new(1, 2, 3, 4);
        assert_eq!(
            CaptureTarget::from_selectors(false, None, None, Some(r)),
            CaptureTarget::Region(r)
        );
        assert_eq!(
            CaptureTarget::from_selectors(false, None, None, None),
            CaptureTarget::FullScreen
        );
    }
}

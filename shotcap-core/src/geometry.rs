//! Screen-space geometry: points, rectangles, and the `x,y,w,h` region syntax.

use serde::Serialize;

use crate::errors::ArgumentError;

/// A point in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in screen coordinates.  `right >= left` and `bottom >= top`
/// hold for every value produced by the constructors below.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Build from edges, swapping them if given out of order.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Build from an origin and an extent.  `None` if the far edge overflows.
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Option<Self> {
        let right = x.checked_add(i32::try_from(width).ok()?)?;
        let bottom = y.checked_add(i32::try_from(height).ok()?)?;
        Some(Self {
            left: x,
            top: y,
            right,
            bottom,
        })
    }

    /// Bounding box of two points.  Identical points give a zero-area rect.
    pub fn spanning(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    pub fn width(&self) -> u32 {
        self.right.abs_diff(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.abs_diff(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Overlap of two rectangles, `None` when they do not intersect.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        (left < right && top < bottom).then_some(Rect {
            left,
            top,
            right,
            bottom,
        })
    }

    /// Shift by `(-dx, -dy)`, i.e. express this rect relative to `origin`.
    pub fn relative_to(&self, origin: Point) -> Rect {
        Rect {
            left: self.left - origin.x,
            top: self.top - origin.y,
            right: self.right - origin.x,
            bottom: self.bottom - origin.y,
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{}) - ({},{})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Parse the `x,y,w,h` region syntax.
///
/// The origin may be negative (monitors left of or above the primary);
/// width and height may not.
pub fn parse_region(input: &str) -> Result<Rect, ArgumentError> {
    let invalid = || ArgumentError::Region(input.to_owned());

    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(invalid());
    };

    let x: i32 = x.parse().map_err(|_| invalid())?;
    let y: i32 = y.parse().map_err(|_| invalid())?;
    let w: i64 = w.parse().map_err(|_| invalid())?;
    let h: i64 = h.parse().map_err(|_| invalid())?;

    if w < 0 || h < 0 {
        return Err(ArgumentError::NegativeExtent(input.to_owned()));
    }

    let w = u32::try_from(w).map_err(|_| invalid())?;
    let h = u32::try_from(h).map_err(|_| invalid())?;
    Rect::from_origin_size(x, y, w, h).ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_region_basic() {
        let r = parse_region("100,100,400,300").unwrap();
        assert_eq!(r, Rect::new(100, 100, 500, 400));
        assert_eq!(r.width(), 400);
        assert_eq!(r.height(), 300);
    }

    #[test]
    fn test_parse_region_negative_origin() {
        let r = parse_region("-1920, 0, 1920, 1080").unwrap();
        assert_eq!(r.left, -1920);
        assert_eq!(r.right, 0);
    }

    #[test]
    fn test_parse_region_rejects_bad_token_count() {
        assert!(matches!(parse_region("1,2,3"), Err(ArgumentError::Region(_))));
        assert!(matches!(parse_region("1,2,3,4,5"), Err(ArgumentError::Region(_))));
        assert!(matches!(parse_region(""), Err(ArgumentError::Region(_))));
    }

    #[test]
    fn test_parse_region_rejects_non_numeric() {
        assert!(matches!(parse_region("a,2,3,4"), Err(ArgumentError::Region(_))));
        assert!(matches!(parse_region("1,2,3.5,4"), Err(ArgumentError::Region(_))));
    }

    #[test]
    fn test_parse_region_rejects_negative_extent() {
        assert!(matches!(
            parse_region("0,0,-5,10"),
            Err(ArgumentError::NegativeExtent(_))
        ));
    }

    #[test]
    fn test_parse_region_rejects_overflow() {
        assert!(parse_region("2147483000,0,1000,10").is_err());
    }

    #[test]
    fn test_spanning_orders_edges() {
        let r = Rect::spanning(Point::new(50, 80), Point::new(10, 20));
        assert_eq!(r, Rect::new(10, 20, 50, 80));
        let z = Rect::spanning(Point::new(5, 5), Point::new(5, 5));
        assert!(z.is_empty());
        assert_eq!((z.width(), z.height()), (0, 0));
    }

    #[test]
    fn test_intersect() {
        let screen = Rect::new(0, 0, 1920, 1080);
        let window = Rect::new(-10, 1000, 300, 1200);
        assert_eq!(screen.intersect(&window), Some(Rect::new(0, 1000, 300, 1080)));
        assert_eq!(screen.intersect(&Rect::new(2000, 0, 2100, 10)), None);
    }

    #[test]
    fn test_rect_display() {
        assert_eq!(Rect::new(0, 0, 1920, 1080).to_string(), "(0,0) - (1920,1080)");
    }

    proptest! {
        #[test]
        fn test_parse_region_extent_roundtrip(
            x in -100_000i32..100_000,
            y in -100_000i32..100_000,
            w in 0u32..20_000,
            h in 0u32..20_000,
        ) {
            let r = parse_region(&format!("{x},{y},{w},{h}")).unwrap();
            prop_assert_eq!(r.right - r.left, w as i32);
            prop_assert_eq!(r.bottom - r.top, h as i32);
            prop_assert_eq!(r.origin(), Point::new(x, y));
        }

        #[test]
        fn test_parse_region_wrong_arity_rejected(
            parts in proptest::collection::vec(-1000i32..1000, 0..8)
                .prop_filter("arity 4 is valid", |v| v.len() != 4)
        ) {
            let joined = parts.iter().map(i32::to_string).collect::<Vec<_>>().join(",");
            prop_assert!(parse_region(&joined).is_err());
        }
    }
}

//! Overlay compositing: mouse pointer glyph and timestamp label.
//!
//! Both overlays are best-effort.  Anything fallible (querying the pointer,
//! rasterising text) happens before the buffer is touched, so a failure
//! leaves the captured frame exactly as it was.

use chrono::{DateTime, Local, TimeZone};

use crate::errors::AnnotationError;
use crate::geometry::Point;
use crate::pixels::PixelBuffer;

/// Distance between the label and the bottom-right buffer corner.
pub const LABEL_MARGIN: i32 = 10;

/// Offset of the shadow pass relative to the foreground pass.
pub const SHADOW_OFFSET: i32 = 2;

/// Shadow colour (BGR) and opacity.
const SHADOW_BGR: [u8; 3] = [0, 0, 0];
const SHADOW_ALPHA: u8 = 128;

/// Foreground colour (BGR), fully opaque.
const TEXT_BGR: [u8; 3] = [255, 255, 255];

/// Timestamp format, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Pointer
// ---------------------------------------------------------------------------

/// Snapshot of the system pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerState {
    /// Screen position of the pointer.
    pub position: Point,
    /// `false` when the pointer is hidden or suppressed.
    pub showing: bool,
    /// Platform cursor handle (`HCURSOR` on Windows).
    pub glyph: isize,
}

pub trait PointerSource {
    fn pointer(&self) -> Result<PointerState, AnnotationError>;

    /// Draw the pointer glyph with its top-left corner at `at`
    /// (buffer-local).  On error `buffer` must be left unmodified.
    fn draw_pointer(
        &self,
        state: &PointerState,
        buffer: &mut PixelBuffer,
        at: Point,
    ) -> Result<(), AnnotationError>;
}

/// Draw the current pointer onto a frame captured at `capture_origin`.
///
/// Returns whether anything was drawn.
pub fn draw_pointer_overlay<P: PointerSource + ?Sized>(
    source: &P,
    buffer: &mut PixelBuffer,
    capture_origin: Point,
) -> Result<bool, AnnotationError> {
    let state = source.pointer()?;
    if !state.showing {
        log::debug!("Pointer hidden; skipping pointer overlay");
        return Ok(false);
    }

    let local = Point::new(
        state.position.x - capture_origin.x,
        state.position.y - capture_origin.y,
    );
    if buffer.is_empty() || local.x >= buffer.width() as i32 || local.y >= buffer.height() as i32 {
        log::debug!("Pointer at {local:?} lies outside the captured frame");
        return Ok(false);
    }

    source.draw_pointer(&state, buffer, local)?;
    log::info!("Mouse pointer drawn at {},{}", local.x, local.y);
    Ok(true)
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Rasterised text as 8-bit coverage, row-major, top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl GlyphMask {
    fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.coverage[y as usize * self.width as usize + x as usize]
    }
}

/// Renders a string in the fixed annotation font.
pub trait TextRasterizer {
    fn rasterize(&self, text: &str) -> Result<GlyphMask, AnnotationError>;
}

/// Where a label lands in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    /// Top-left of the foreground pass; may be negative when the label is
    /// wider than the frame.
    pub origin: Point,
    pub width: u32,
    pub height: u32,
}

impl LabelLayout {
    /// Anchor a `width`x`height` label at the bottom-right corner of a
    /// `buf_width`x`buf_height` frame, inset by [`LABEL_MARGIN`].
    pub fn bottom_right(width: u32, height: u32, buf_width: u32, buf_height: u32) -> Self {
        let x = buf_width as i64 - width as i64 - LABEL_MARGIN as i64;
        let y = buf_height as i64 - height as i64 - LABEL_MARGIN as i64;
        Self {
            origin: Point::new(clamp_i32(x), clamp_i32(y)),
            width,
            height,
        }
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Draw `text` at the bottom-right of `buffer`: a half-transparent black
/// shadow offset by ([`SHADOW_OFFSET`], [`SHADOW_OFFSET`]), then opaque white.
pub fn draw_label<R: TextRasterizer + ?Sized>(
    rasterizer: &R,
    buffer: &mut PixelBuffer,
    text: &str,
) -> Result<LabelLayout, AnnotationError> {
    let mask = rasterizer.rasterize(text)?;
    if mask.coverage.len() != mask.width as usize * mask.height as usize {
        return Err(AnnotationError::Text(format!(
            "glyph mask is {} bytes, expected {}x{}",
            mask.coverage.len(),
            mask.width,
            mask.height
        )));
    }
    let layout = LabelLayout::bottom_right(mask.width, mask.height, buffer.width(), buffer.height());

    let shadow = Point::new(
        layout.origin.x + SHADOW_OFFSET,
        layout.origin.y + SHADOW_OFFSET,
    );
    composite_mask(buffer, &mask, shadow, SHADOW_BGR, SHADOW_ALPHA);
    composite_mask(buffer, &mask, layout.origin, TEXT_BGR, u8::MAX);

    log::info!("Timestamp annotation applied: {text}");
    Ok(layout)
}

fn composite_mask(buffer: &mut PixelBuffer, mask: &GlyphMask, at: Point, bgr: [u8; 3], alpha: u8) {
    for y in 0..mask.height {
        for x in 0..mask.width {
            let cov = mask.coverage_at(x, y) as u32;
            if cov == 0 {
                continue;
            }
            let a = ((cov * alpha as u32 + 127) / 255) as u8;
            buffer.blend(at.x as i64 + x as i64, at.y as i64 + y as i64, bgr, a);
        }
    }
}

/// Format `when` as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp<Tz: TimeZone>(when: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    when.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time as a label.
pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

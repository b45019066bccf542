//! GDI text rasterisation for the timestamp label.
//!
//! Text is drawn white on black into a DIB section; the brightest channel
//! of each pixel becomes the coverage value, so ClearType and greyscale
//! antialiasing both come out as a usable alpha mask.

use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, SIZE};
use windows::Win32::Graphics::Gdi::{
    CreateFontW, GetTextExtentPoint32W, SelectObject, SetBkColor, SetBkMode, SetTextColor, TextOutW,
    ANTIALIASED_QUALITY, CLIP_DEFAULT_PRECIS, DEFAULT_CHARSET, HGDIOBJ, OPAQUE, OUT_TT_PRECIS,
};

use super::gdi::{wide, GdiObject, MemoryDc, Surface, WindowDc};
use crate::errors::{AnnotationError, GrabError};
use crate::overlay::GlyphMask;
use crate::pixels::BYTES_PER_PIXEL;

const FONT_FACE: &str = "Arial";
/// 20 pt at 96 DPI, as a negative cell height (character height in pixels).
const FONT_HEIGHT: i32 = -27;
const FW_NORMAL: i32 = 400;
/// `DEFAULT_PITCH | FF_SWISS`
const PITCH_AND_FAMILY: u32 = 0x20;

fn text_err(e: GrabError) -> AnnotationError {
    AnnotationError::Text(e.to_string())
}

fn create_font() -> Result<GdiObject, AnnotationError> {
    let face = wide(FONT_FACE);
    let font = unsafe {
        CreateFontW(
            FONT_HEIGHT,
            0,
            0,
            0,
            FW_NORMAL,
            0,
            0,
            0,
            DEFAULT_CHARSET,
            OUT_TT_PRECIS,
            CLIP_DEFAULT_PRECIS,
            ANTIALIASED_QUALITY,
            PITCH_AND_FAMILY,
            PCWSTR(face.as_ptr()),
        )
    };
    GdiObject::new(HGDIOBJ(font.0), "CreateFontW").map_err(text_err)
}

pub(crate) fn rasterize(text: &str) -> Result<GlyphMask, AnnotationError> {
    let utf16: Vec<u16> = text.encode_utf16().collect();
    let screen = WindowDc::screen().map_err(text_err)?;
    let font = create_font()?;

    let mut extent = SIZE::default();
    {
        let measure = MemoryDc::compatible_with(screen.hdc()).map_err(text_err)?;
        let _font = measure.select(font.handle());
        if !unsafe { GetTextExtentPoint32W(measure.hdc(), &utf16, &mut extent) }.as_bool() {
            return Err(AnnotationError::Text(
                "GetTextExtentPoint32W returned FALSE".into(),
            ));
        }
    }
    if extent.cx <= 0 || extent.cy <= 0 {
        return Ok(GlyphMask {
            width: 0,
            height: 0,
            coverage: Vec::new(),
        });
    }

    let surface = Surface::new(screen.hdc(), extent.cx as u32, extent.cy as u32).map_err(text_err)?;
    let drawn = {
        let hdc = surface.hdc();
        let previous = unsafe { SelectObject(hdc, font.handle()) };
        let drawn = unsafe {
            SetTextColor(hdc, COLORREF(0x00FF_FFFF));
            SetBkColor(hdc, COLORREF(0));
            SetBkMode(hdc, OPAQUE);
            TextOutW(hdc, 0, 0, &utf16)
        };
        let _ = unsafe { SelectObject(hdc, previous) };
        drawn
    };
    if !drawn.as_bool() {
        return Err(AnnotationError::Text("TextOutW returned FALSE".into()));
    }

    let pixels = surface.to_buffer().map_err(text_err)?;
    let coverage = pixels
        .as_bytes()
        .chunks_exact(BYTES_PER_PIXEL)
        .map(|px| px[0].max(px[1]).max(px[2]))
        .collect();

    Ok(GlyphMask {
        width: pixels.width(),
        height: pixels.height(),
        coverage,
    })
}

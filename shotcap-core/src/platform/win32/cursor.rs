//! System pointer snapshot and glyph drawing.

use std::ffi::c_void;

use windows::Win32::Graphics::Gdi::HBRUSH;
use windows::Win32::UI::WindowsAndMessaging::{
    DrawIconEx, GetCursorInfo, GetSystemMetrics, CURSORINFO, CURSOR_SHOWING, DI_NORMAL, HICON,
    SM_CXCURSOR, SM_CYCURSOR,
};

use super::gdi::{Surface, WindowDc};
use crate::errors::{win32_context, AnnotationError};
use crate::geometry::{Point, Rect};
use crate::overlay::PointerState;
use crate::pixels::PixelBuffer;

pub(crate) fn pointer() -> Result<PointerState, AnnotationError> {
    let mut info = CURSORINFO {
        cbSize: std::mem::size_of::<CURSORINFO>() as u32,
        ..Default::default()
    };
    unsafe { GetCursorInfo(&mut info) }
        .map_err(|e| AnnotationError::Pointer(win32_context("GetCursorInfo", &e)))?;

    Ok(PointerState {
        position: Point::new(info.ptScreenPos.x, info.ptScreenPos.y),
        showing: info.flags.0 & CURSOR_SHOWING.0 != 0 && !info.hCursor.is_invalid(),
        glyph: info.hCursor.0 as isize,
    })
}

/// Draw the glyph onto a copy of the pixels under it, then paste the patch
/// back.  `buffer` is only touched once drawing has succeeded.
pub(crate) fn draw_pointer(
    state: &PointerState,
    buffer: &mut PixelBuffer,
    at: Point,
) -> Result<(), AnnotationError> {
    let pointer_err = |e: crate::errors::GrabError| AnnotationError::Pointer(e.to_string());

    let (cx, cy) = unsafe { (GetSystemMetrics(SM_CXCURSOR), GetSystemMetrics(SM_CYCURSOR)) };
    let patch_area = Rect::from_origin_size(at.x, at.y, cx.max(1) as u32, cy.max(1) as u32)
        .ok_or_else(|| AnnotationError::Pointer(format!("pointer patch at {at:?} overflows")))?;

    let screen = WindowDc::screen().map_err(pointer_err)?;
    let mut surface =
        Surface::new(screen.hdc(), patch_area.width(), patch_area.height()).map_err(pointer_err)?;
    surface.load(&buffer.crop(&patch_area));

    unsafe {
        DrawIconEx(
            surface.hdc(),
            0,
            0,
            HICON(state.glyph as *mut c_void),
            0,
            0,
            0,
            HBRUSH::default(),
            DI_NORMAL,
        )
    }
    .map_err(|e| AnnotationError::Pointer(win32_context("DrawIconEx", &e)))?;

    let mut patch = surface.to_buffer().map_err(pointer_err)?;
    patch.force_opaque();
    buffer.paste(&patch, at);
    Ok(())
}

//! RAII wrappers for the GDI objects the capture path juggles.
//!
//! Every handle is released in `Drop`, so early returns through `?` cannot
//! leak device contexts or bitmaps.  Drop order inside [`Surface`] restores
//! the original selection before the bitmap and DC are destroyed.

use std::ffi::c_void;

use windows::Win32::Foundation::{HANDLE, HWND};
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GdiFlush, GetDC, ReleaseDC,
    SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ,
};

use crate::errors::GrabError;
use crate::pixels::{PixelBuffer, RowOrder, BYTES_PER_PIXEL};

// ---------------------------------------------------------------------------
// Device contexts
// ---------------------------------------------------------------------------

/// A DC obtained with `GetDC`, released with `ReleaseDC`.
pub(crate) struct WindowDc {
    hwnd: HWND,
    hdc: HDC,
}

impl WindowDc {
    pub(crate) fn acquire(hwnd: HWND) -> Result<Self, GrabError> {
        let hdc = unsafe { GetDC(hwnd) };
        if hdc.is_invalid() {
            return Err(GrabError::DeviceContextUnavailable(format!(
                "GetDC({:#x}) returned NULL",
                hwnd.0 as isize
            )));
        }
        Ok(Self { hwnd, hdc })
    }

    /// DC for the entire virtual screen.
    pub(crate) fn screen() -> Result<Self, GrabError> {
        Self::acquire(HWND::default())
    }

    pub(crate) fn hdc(&self) -> HDC {
        self.hdc
    }
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        let _ = unsafe { ReleaseDC(self.hwnd, self.hdc) };
    }
}

/// A memory DC from `CreateCompatibleDC`, destroyed with `DeleteDC`.
pub(crate) struct MemoryDc(HDC);

impl MemoryDc {
    pub(crate) fn compatible_with(reference: HDC) -> Result<Self, GrabError> {
        let hdc = unsafe { CreateCompatibleDC(reference) };
        if hdc.is_invalid() {
            return Err(GrabError::DeviceContextUnavailable(
                "CreateCompatibleDC returned NULL".into(),
            ));
        }
        Ok(Self(hdc))
    }

    pub(crate) fn hdc(&self) -> HDC {
        self.0
    }

    /// Select `object` until the returned guard is dropped.
    pub(crate) fn select(&self, object: HGDIOBJ) -> Selected<'_> {
        let previous = unsafe { SelectObject(self.0, object) };
        Selected {
            dc: self,
            previous,
        }
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        let _ = unsafe { DeleteDC(self.0) };
    }
}

/// Restores the previously selected object on drop.
pub(crate) struct Selected<'a> {
    dc: &'a MemoryDc,
    previous: HGDIOBJ,
}

impl Drop for Selected<'_> {
    fn drop(&mut self) {
        if !self.previous.is_invalid() {
            let _ = unsafe { SelectObject(self.dc.0, self.previous) };
        }
    }
}

/// Any GDI object released with `DeleteObject` (bitmaps, fonts, brushes).
pub(crate) struct GdiObject(HGDIOBJ);

impl GdiObject {
    pub(crate) fn new(object: HGDIOBJ, what: &str) -> Result<Self, GrabError> {
        if object.is_invalid() {
            return Err(GrabError::AllocationFailed(format!("{what} returned NULL")));
        }
        Ok(Self(object))
    }

    pub(crate) fn handle(&self) -> HGDIOBJ {
        self.0
    }
}

impl Drop for GdiObject {
    fn drop(&mut self) {
        let _ = unsafe { DeleteObject(self.0) };
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// A 32-bit bottom-up DIB section selected into its own memory DC.
///
/// GDI draws into it through [`Surface::hdc`]; the pixels are read back
/// directly from the section's memory.
pub(crate) struct Surface {
    previous: HGDIOBJ,
    bits: *mut u8,
    width: u32,
    height: u32,
    // field order is drop order: bitmap before its DC
    bitmap: GdiObject,
    dc: MemoryDc,
}

impl Surface {
    pub(crate) fn new(reference: HDC, width: u32, height: u32) -> Result<Self, GrabError> {
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(GrabError::AllocationFailed(format!(
                "{width}x{height} exceeds the GDI bitmap limits"
            )));
        };

        let dc = MemoryDc::compatible_with(reference)?;
        let info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: w,
                // positive height: bottom-up
                biHeight: h,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut bits: *mut c_void = std::ptr::null_mut();
        let bitmap: HBITMAP = unsafe {
            CreateDIBSection(dc.hdc(), &info, DIB_RGB_COLORS, &mut bits, HANDLE::default(), 0)
        }
        .map_err(|e| {
            GrabError::AllocationFailed(format!("CreateDIBSection({width}x{height}): {e}"))
        })?;
        let bitmap = GdiObject::new(HGDIOBJ(bitmap.0), "CreateDIBSection")?;
        if bits.is_null() {
            return Err(GrabError::AllocationFailed(
                "CreateDIBSection returned no pixel memory".into(),
            ));
        }

        let previous = unsafe { SelectObject(dc.hdc(), bitmap.handle()) };
        Ok(Self {
            previous,
            bits: bits.cast(),
            width,
            height,
            bitmap,
            dc,
        })
    }

    pub(crate) fn hdc(&self) -> HDC {
        self.dc.hdc()
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    fn len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: the section holds exactly width * height 32-bit pixels and
        // lives as long as `self.bitmap`.
        unsafe { std::slice::from_raw_parts(self.bits, self.len()) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `bytes`; `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.bits, self.len()) }
    }

    /// Seed the surface with `buffer` (same dimensions).
    pub(crate) fn load(&mut self, buffer: &PixelBuffer) {
        debug_assert_eq!((buffer.width(), buffer.height()), (self.width, self.height));
        let stride = buffer.stride();
        if stride == 0 {
            return;
        }
        let _ = unsafe { GdiFlush() };
        let src = buffer.as_bytes();
        for (dst_row, src_row) in self
            .bytes_mut()
            .chunks_exact_mut(stride)
            .zip(src.chunks_exact(stride).rev())
        {
            dst_row.copy_from_slice(src_row);
        }
    }

    /// Copy the pixels out as a top-down [`PixelBuffer`].
    pub(crate) fn to_buffer(&self) -> Result<PixelBuffer, GrabError> {
        let _ = unsafe { GdiFlush() };
        PixelBuffer::from_raw(
            self.width,
            self.height,
            self.bytes().to_vec(),
            RowOrder::BottomUp,
        )
        .ok_or_else(|| GrabError::AllocationFailed("DIB section size mismatch".into()))
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if !self.previous.is_invalid() {
            let _ = unsafe { SelectObject(self.dc.hdc(), self.previous) };
        }
    }
}

/// NUL-terminated UTF-16 for `PCWSTR` parameters.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

//! `CF_DIB` clipboard publishing.

use windows::Win32::Foundation::{HANDLE, HGLOBAL, HWND};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData,
};
use windows::Win32::System::Memory::{GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE};

use crate::errors::{win32_context, ClipboardError};

/// Standard clipboard format id for a packed `BITMAPINFO` + bits.
const CF_DIB: u32 = 8;

/// Movable global memory, freed on drop unless handed to the clipboard.
struct GlobalBlock(HGLOBAL);

impl GlobalBlock {
    fn copy_of(bytes: &[u8]) -> Result<Self, ClipboardError> {
        let hmem = unsafe { GlobalAlloc(GMEM_MOVEABLE, bytes.len()) }
            .map_err(|e| ClipboardError::Allocation(win32_context("GlobalAlloc", &e)))?;
        let block = Self(hmem);

        let dst = unsafe { GlobalLock(block.0) };
        if dst.is_null() {
            return Err(ClipboardError::Allocation("GlobalLock returned NULL".into()));
        }
        // SAFETY: the block is at least `bytes.len()` long and locked.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.cast::<u8>(), bytes.len());
            // FALSE with NO_ERROR just means the lock count reached zero
            let _ = GlobalUnlock(block.0);
        }
        Ok(block)
    }

    /// Give up ownership; the system frees the block from now on.
    fn into_handle(self) -> HANDLE {
        let handle = HANDLE(self.0 .0);
        std::mem::forget(self);
        handle
    }
}

impl Drop for GlobalBlock {
    fn drop(&mut self) {
        let _ = unsafe { GlobalFree(self.0) };
    }
}

/// Clipboard ownership for the duration of one publish.
struct OpenClipboardGuard;

impl OpenClipboardGuard {
    fn open() -> Result<Self, ClipboardError> {
        unsafe { OpenClipboard(HWND::default()) }
            .map_err(|e| ClipboardError::Open(win32_context("OpenClipboard", &e)))?;
        Ok(Self)
    }
}

impl Drop for OpenClipboardGuard {
    fn drop(&mut self) {
        let _ = unsafe { CloseClipboard() };
    }
}

pub(crate) fn publish_dib(dib: &[u8]) -> Result<(), ClipboardError> {
    let block = GlobalBlock::copy_of(dib)?;
    let _clipboard = OpenClipboardGuard::open()?;

    unsafe { EmptyClipboard() }
        .map_err(|e| ClipboardError::SetData(win32_context("EmptyClipboard", &e)))?;

    let handle = HANDLE(block.0 .0);
    unsafe { SetClipboardData(CF_DIB, handle) }
        .map_err(|e| ClipboardError::SetData(win32_context("SetClipboardData", &e)))?;
    block.into_handle();

    log::debug!("Published {} byte CF_DIB", dib.len());
    Ok(())
}

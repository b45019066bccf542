//! Operating-system backends for the [`Platform`](crate::orchestrator::Platform) seam.

#[cfg(windows)]
mod win32;
#[cfg(windows)]
pub use win32::Win32Platform as NativePlatform;

#[cfg(not(windows))]
mod unsupported;
#[cfg(not(windows))]
pub use unsupported::UnsupportedPlatform as NativePlatform;

/// The backend for the running operating system.
pub fn native() -> NativePlatform {
    NativePlatform::new()
}

//! COM apartment RAII guard.
//!
//! `ShellExecuteW` may hand the open request to shell extensions that need
//! a single-threaded apartment, so [`COMGuard`] joins an STA on the thread
//! that runs the capture pipeline and leaves it when dropped.
//!
//! The `PhantomData<*const ()>` field makes the guard `!Send` + `!Sync`:
//! an apartment belongs to exactly one thread.

use windows::Win32::System::Com::{
    CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED, COINIT_DISABLE_OLE1DDE,
};

use crate::errors::InitError;

/// Balances a successful `CoInitializeEx` with `CoUninitialize` on drop.
#[must_use = "COMGuard must be kept alive for the duration of COM usage"]
pub struct COMGuard {
    should_uninit: bool,
    _not_send: std::marker::PhantomData<*const ()>,
}

impl COMGuard {
    /// Initialise (or join) the calling thread's STA.
    ///
    /// `RPC_E_CHANGED_MODE` means the thread already lives in the MTA.
    /// COM is still usable, but the call was not counted, so the guard
    /// must not uninitialise.
    pub fn init() -> Result<Self, InitError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED | COINIT_DISABLE_OLE1DDE) };

        let hresult_value = hr.0 as u32;
        match hresult_value {
            // S_OK or S_FALSE
            0x0 | 0x1 => Ok(Self {
                should_uninit: true,
                _not_send: std::marker::PhantomData,
            }),
            // RPC_E_CHANGED_MODE
            0x8001_0106 => {
                log::warn!(
                    "CoInitializeEx: RPC_E_CHANGED_MODE -- thread already has an MTA, \
                     keeping the existing apartment"
                );
                Ok(Self {
                    should_uninit: false,
                    _not_send: std::marker::PhantomData,
                })
            }
            _ => Err(InitError::Com(format!(
                "CoInitializeEx failed: HRESULT 0x{hresult_value:08X}"
            ))),
        }
    }
}

impl Drop for COMGuard {
    fn drop(&mut self) {
        if self.should_uninit {
            unsafe { CoUninitialize() };
        }
    }
}

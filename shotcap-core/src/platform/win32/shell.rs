//! Open a saved file with its registered application.

use std::path::Path;

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

use super::gdi::wide;
use crate::errors::ShellError;

pub(crate) fn open(path: &Path) -> Result<(), ShellError> {
    let display = path.display().to_string();
    let file = wide(&display);

    let instance = unsafe {
        ShellExecuteW(
            HWND::default(),
            w!("open"),
            PCWSTR(file.as_ptr()),
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };

    // values above 32 mean success; anything else is an SE_ERR_* code
    let code = instance.0 as isize;
    if code <= 32 {
        return Err(ShellError {
            path: display,
            reason: format!("ShellExecuteW returned {code}"),
        });
    }
    log::info!("Opened {display}");
    Ok(())
}

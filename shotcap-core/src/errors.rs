//! Error types for `shotcap_core`.
//!
//! Each pipeline stage owns its own `thiserror` enum so callers can decide
//! per stage whether a failure is fatal, per-iteration, or best-effort.
//! [`ShotcapError`] aggregates them for the orchestrator.

use thiserror::Error;

/// Malformed or out-of-range command-line input.  Always raised before any
/// capture is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("invalid region '{0}': expected x,y,w,h")]
    Region(String),

    #[error("invalid region '{0}': width and height must not be negative")]
    NegativeExtent(String),

    #[error("quality must be between 0 and 100 (got {0})")]
    QualityOutOfRange(i64),

    #[error("unsupported image format '{0}': supported formats are png, jpg, bmp")]
    UnsupportedFormat(String),

    #[error("{0} must be a non-negative number of seconds")]
    NegativeDuration(&'static str),

    #[error("invalid {what} '{value}'")]
    InvalidNumber { what: &'static str, value: String },
}

/// Failure to turn a [`crate::target::CaptureTarget`] into a rectangle and a
/// source handle.  Fatal to the capture attempt, never to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("window not found: {0}")]
    SourceNotFound(String),

    #[error("no foreground window")]
    NoForegroundWindow,

    #[error("failed to enumerate monitors: {0}")]
    EnumerationFailed(String),

    #[error("invalid monitor index {index}: {count} monitor(s) available")]
    InvalidIndex { index: i32, count: usize },

    #[error("{0}")]
    Os(String),
}

/// Every capture technique, including the screen-blit fallback, failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrabError {
    #[error("failed to allocate capture bitmap: {0}")]
    AllocationFailed(String),

    #[error("device context unavailable: {0}")]
    DeviceContextUnavailable(String),

    #[error("blit failed: {0}")]
    BlitFailed(String),

    #[error("screen capture is not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("image encoder not available for {0}")]
    EncoderUnavailable(&'static str),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Pointer or timestamp overlay failure.  Never aborts a capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("pointer overlay failed: {0}")]
    Pointer(String),

    #[error("text overlay failed: {0}")]
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("failed to open clipboard: {0}")]
    Open(String),

    #[error("failed to allocate clipboard memory: {0}")]
    Allocation(String),

    #[error("failed to set clipboard data: {0}")]
    SetData(String),

    #[error("clipboard is not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to open '{path}': {reason}")]
pub struct ShellError {
    pub path: String,
    pub reason: String,
}

/// Process-wide setup failure (COM apartment, platform backend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("COM initialisation failed: {0}")]
    Com(String),

    #[error("screen capture is not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("failed to create selection window: {0}")]
    Window(String),

    #[error("interactive selection is not supported on this platform")]
    Unsupported,
}

/// Top-level error type for the `shotcap_core` library.
#[derive(Debug, Error)]
pub enum ShotcapError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Grab(#[from] GrabError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Render a Win32 failure as `"<Function>: <message>"`.
#[cfg(windows)]
pub(crate) fn win32_context(function: &str, err: &windows::core::Error) -> String {
    format!("{function}: {err}")
}

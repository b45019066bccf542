//! `shotcap_core` -- screen capture pipeline behind the `shotcap` CLI.
//!
//! The pipeline is platform-neutral and talks to the operating system
//! through the [`orchestrator::Platform`] trait; [`platform::native`]
//! returns the Win32 implementation on Windows and an always-failing
//! stand-in elsewhere.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | Per-stage error enums via `thiserror` |
//! | [`geometry`] | `Point`, `Rect`, `x,y,w,h` region parsing |
//! | [`target`] | Capture target selection and precedence |
//! | [`pixels`] | Owned BGRA `PixelBuffer`, crop, DIB serialisation |
//! | [`resolver`] | Target -> capture rectangle and source; listings |
//! | [`grabber`] | Screen blit and window print with fallbacks |
//! | [`overlay`] | Pointer glyph and timestamp label compositing |
//! | [`encoder`] | PNG / JPEG / BMP via the `image` crate |
//! | [`selection`] | Interactive rubber-band selection state machine |
//! | [`repeat`] | Output naming and fixed-cadence scheduling |
//! | [`orchestrator`] | Delay, selection, repeat loop, per-capture pipeline |
//! | [`platform`] | Native backends (Win32 GDI on Windows) |

#[cfg(windows)]
pub mod com;
pub mod encoder;
pub mod errors;
pub mod geometry;
pub mod grabber;
pub mod orchestrator;
pub mod overlay;
pub mod pixels;
pub mod platform;
pub mod repeat;
pub mod resolver;
pub mod selection;
pub mod target;

pub use encoder::{EncodeOptions, ImageFormat, Quality};
pub use errors::ShotcapError;
pub use geometry::{parse_region, Point, Rect};
pub use orchestrator::{run, CaptureConfig, Platform, RunReport};
pub use repeat::{OutputNaming, RepeatPlan};
pub use target::CaptureTarget;

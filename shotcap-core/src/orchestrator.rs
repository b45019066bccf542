//! Capture orchestration: delay, optional interactive selection, then one or
//! more resolve -> grab -> overlay -> encode passes.
//!
//! # Failure policy
//!
//! Only setup can fail a run ([`Platform::initialize`], the selection
//! window).  A failed capture is logged at `error` level and counted in the
//! [`RunReport`]; in repeat mode the next iteration still runs.  Overlay,
//! clipboard, and shell failures are logged and never fail a capture.
//!
//! # Buffer lifetime
//!
//! Each iteration owns its [`PixelBuffer`] and drops it on every exit path
//! before the next iteration starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encoder::{self, EncodeOptions};
use crate::errors::{ClipboardError, InitError, ShellError, ShotcapError};
use crate::grabber::{self, CaptureBackend};
use crate::overlay::{self, PointerSource, TextRasterizer};
use crate::pixels::PixelBuffer;
use crate::repeat::{Cadence, OutputNaming, RepeatPlan};
use crate::resolver::{self, DisplayServer};
use crate::selection::{SelectionOutcome, SelectionUi};
use crate::target::CaptureTarget;

// ---------------------------------------------------------------------------
// Platform seam
// ---------------------------------------------------------------------------

pub trait Clipboard {
    /// Replace the clipboard contents with a packed DIB.
    fn publish_dib(&self, dib: &[u8]) -> Result<(), ClipboardError>;
}

pub trait Shell {
    /// Open `path` with the default application.
    fn open(&self, path: &Path) -> Result<(), ShellError>;
}

/// Everything the pipeline needs from the operating system.
pub trait Platform:
    DisplayServer + CaptureBackend + PointerSource + TextRasterizer + Clipboard + Shell + SelectionUi
{
    /// One-time, per-process setup of the imaging subsystem.  Called after
    /// the pre-capture delay and before the first capture.
    fn initialize(&mut self) -> Result<(), InitError>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A fully validated capture request.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pub target: CaptureTarget,
    /// Let the user drag out the region before capturing.
    pub interactive: bool,
    pub delay: Duration,
    pub encode: EncodeOptions,
    pub output: OutputNaming,
    pub pointer: bool,
    pub timestamp: bool,
    pub clipboard: bool,
    pub show: bool,
    pub repeat: Option<RepeatPlan>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target: CaptureTarget::FullScreen,
            interactive: false,
            delay: Duration::ZERO,
            encode: EncodeOptions::default(),
            output: OutputNaming::default(),
            pointer: false,
            timestamp: false,
            clipboard: false,
            show: false,
            repeat: None,
        }
    }
}

/// A capture that did not produce a file.
#[derive(Debug)]
pub struct IterationFailure {
    /// 1-based iteration number.
    pub iteration: u32,
    pub path: PathBuf,
    pub error: ShotcapError,
}

/// Outcome of [`run`].
#[derive(Debug, Default)]
pub struct RunReport {
    pub saved: Vec<PathBuf>,
    pub failures: Vec<IterationFailure>,
    /// The interactive selection was cancelled; nothing was captured.
    pub cancelled: bool,
}

impl RunReport {
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failures.len()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run one complete invocation.
pub fn run<P: Platform>(config: &CaptureConfig, platform: &mut P) -> Result<RunReport, ShotcapError> {
    if !config.delay.is_zero() {
        log::info!(
            "Waiting for {:.3} seconds before capturing...",
            config.delay.as_secs_f64()
        );
        std::thread::sleep(config.delay);
    }

    let mut report = RunReport::default();
    let target = match interactive_target(config, platform)? {
        Some(target) => target,
        None => {
            log::info!("Selection cancelled; nothing captured");
            report.cancelled = true;
            return Ok(report);
        }
    };

    platform.initialize()?;
    let platform = &*platform;

    let path = match config.repeat {
        Some(plan) if plan.count > 0 => {
            let paths = config.output.sequence(config.encode.format, plan.count);
            let cadence = Cadence::starting_now(plan.interval);
            for (k, path) in (0u32..).zip(paths) {
                if k > 0 {
                    cadence.wait_for(k);
                }
                let result = capture_once(platform, config, &target, &path);
                record(&mut report, k + 1, path, result);
            }
            return Ok(report);
        }
        _ => config.output.single(),
    };

    let result = capture_once(platform, config, &target, &path);
    record(&mut report, 1, path, result);
    Ok(report)
}

/// `Some(target)` to capture, `None` if the user cancelled the selection.
fn interactive_target<P: Platform>(
    config: &CaptureConfig,
    platform: &P,
) -> Result<Option<CaptureTarget>, ShotcapError> {
    if !config.interactive {
        return Ok(Some(config.target.clone()));
    }
    if !matches!(
        config.target,
        CaptureTarget::FullScreen | CaptureTarget::Region(_)
    ) {
        log::info!(
            "Interactive selection skipped: {} takes precedence",
            config.target.describe()
        );
        return Ok(Some(config.target.clone()));
    }

    match platform.select_region()? {
        SelectionOutcome::Selected(rect) => {
            log::info!("Selected region {rect}");
            Ok(Some(CaptureTarget::Region(rect)))
        }
        SelectionOutcome::Cancelled => Ok(None),
    }
}

fn record(
    report: &mut RunReport,
    iteration: u32,
    path: PathBuf,
    result: Result<PathBuf, ShotcapError>,
) {
    match result {
        Ok(saved) => {
            log::info!("Iteration {iteration} saved {}", saved.display());
            report.saved.push(saved);
        }
        Err(error) => {
            log::error!("Capture iteration {iteration} failed: {error}");
            report.failures.push(IterationFailure {
                iteration,
                path,
                error,
            });
        }
    }
}

/// Resolve, grab, annotate, and save a single frame to `path`.
pub fn capture_once<P: Platform + ?Sized>(
    platform: &P,
    config: &CaptureConfig,
    target: &CaptureTarget,
    path: &Path,
) -> Result<PathBuf, ShotcapError> {
    let resolved = resolver::resolve(platform, target)?;
    let grab = grabber::grab(platform, &resolved)?;
    log::debug!("Frame captured via {:?}", grab.stage);
    let mut buffer = grab.buffer;

    if config.pointer {
        if let Err(e) = overlay::draw_pointer_overlay(platform, &mut buffer, resolved.rect.origin())
        {
            log::warn!("{e}");
        }
    }

    // The clipboard copy is taken before the timestamp is drawn.
    if config.clipboard {
        publish_to_clipboard(platform, &buffer);
    }

    if config.timestamp {
        let label = overlay::timestamp_now();
        if let Err(e) = overlay::draw_label(platform, &mut buffer, &label) {
            log::warn!("{e}");
        }
    }

    let saved = encoder::save(&buffer, path, &config.encode)?;
    drop(buffer);

    if config.show {
        log::info!("Opening image...");
        if let Err(e) = platform.open(&saved) {
            log::warn!("{e}");
        }
    }
    Ok(saved)
}

fn publish_to_clipboard<C: Clipboard + ?Sized>(clipboard: &C, buffer: &PixelBuffer) {
    log::info!("Copying image to clipboard...");
    match clipboard.publish_dib(&buffer.to_dib()) {
        Ok(()) => log::info!("Image copied to clipboard successfully."),
        Err(e) => log::error!("{e}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

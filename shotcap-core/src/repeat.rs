//! Output naming and repeat scheduling.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::encoder::ImageFormat;
use crate::errors::ArgumentError;

/// Repeat `count` captures, `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatPlan {
    pub interval: Duration,
    pub count: u32,
}

impl RepeatPlan {
    /// Build from fractional seconds.
    pub fn new(interval_secs: f64, count: u32) -> Result<Self, ArgumentError> {
        Ok(Self {
            interval: seconds(interval_secs, "repeat interval")?,
            count,
        })
    }
}

/// Convert user-supplied fractional seconds to a `Duration`.
pub fn seconds(value: f64, what: &'static str) -> Result<Duration, ArgumentError> {
    Duration::try_from_secs_f64(value).map_err(|_| ArgumentError::NegativeDuration(what))
}

/// Where captures are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub file_name: String,
    /// `None` means the current directory.
    pub directory: Option<PathBuf>,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            file_name: "screenshot.png".to_owned(),
            directory: None,
        }
    }
}

impl OutputNaming {
    fn place(&self, name: &str) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Path for a single capture.
    pub fn single(&self) -> PathBuf {
        self.place(&self.file_name)
    }

    /// Paths for a repeat run: `<base>_001<ext>` .. `<base>_NNN<ext>`.
    ///
    /// The extension comes from the file name, or from `format` when the
    /// name has none.
    pub fn sequence(&self, format: ImageFormat, count: u32) -> Vec<PathBuf> {
        let (parent, leaf) = split_leaf(&self.file_name);
        let (base, ext) = match leaf.rfind('.') {
            Some(pos) => (&leaf[..pos], &leaf[pos..]),
            None => (leaf, format.extension()),
        };
        (1..=count)
            .map(|i| {
                let name = format!("{base}_{i:03}{ext}");
                match parent {
                    Some(parent) => self.place(&parent.join(name).to_string_lossy()),
                    None => self.place(&name),
                }
            })
            .collect()
    }
}

/// Split `name` into an optional directory part and the final component.
fn split_leaf(name: &str) -> (Option<&Path>, &str) {
    let path = Path::new(name);
    match (path.parent(), path.file_name().and_then(|f| f.to_str())) {
        (Some(parent), Some(leaf)) if !parent.as_os_str().is_empty() => (Some(parent), leaf),
        _ => (None, name),
    }
}

/// Fixed-cadence scheduler.
///
/// Tick `k` is due at `anchor + k * interval`.  Waiting sleeps until the
/// tick's deadline instead of for a fixed interval, so time spent capturing
/// does not push later ticks back.  Deadlines that have already passed
/// return immediately.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    anchor: Instant,
    interval: Duration,
}

impl Cadence {
    pub fn starting_now(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub fn starting_at(anchor: Instant, interval: Duration) -> Self {
        Self { anchor, interval }
    }

    /// Deadline of tick `k` (tick 0 is the anchor); `None` when it lies
    /// beyond what the monotonic clock can represent.
    pub fn deadline(&self, k: u32) -> Option<Instant> {
        self.interval
            .checked_mul(k)
            .and_then(|offset| self.anchor.checked_add(offset))
    }

    /// Time left until tick `k` as seen from `now`.  Saturates at
    /// `Duration::MAX` rather than wrapping to "due now".
    pub fn remaining(&self, k: u32, now: Instant) -> Duration {
        let offset = self.interval.saturating_mul(k);
        offset.saturating_sub(now.saturating_duration_since(self.anchor))
    }

    /// Block until tick `k` is due.
    pub fn wait_for(&self, k: u32) {
        let remaining = self.remaining(k, Instant::now());
        if !remaining.is_zero() {
            log::info!(
                "Waiting {:.3} seconds before next capture...",
                remaining.as_secs_f64()
            );
            std::thread::sleep(remaining);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

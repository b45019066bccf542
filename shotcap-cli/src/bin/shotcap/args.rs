//! Command-line arguments and their translation into a [`CaptureConfig`].

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use shotcap_core::errors::ArgumentError;
use shotcap_core::repeat::seconds;
use shotcap_core::{
    parse_region, CaptureConfig, CaptureTarget, EncodeOptions, ImageFormat, OutputNaming, Quality,
    Rect, RepeatPlan,
};

#[derive(Parser, Debug)]
#[command(name = "shotcap")]
#[command(
    version,
    about = "Capture the screen, a monitor, a region, or a window to an image file",
    after_help = "Single-dash long options from earlier releases (-format, -quality, -dir, \
                  -active, -clipboard, -show, -timestamp, -repeat, -select, -listmonitors, \
                  -listwindows) are still accepted."
)]
pub struct Args {
    /// Output file name
    #[arg(short = 'f', long = "file", value_name = "FILENAME", default_value = "screenshot.png")]
    pub file: String,

    /// Output directory (default: current directory)
    #[arg(long = "dir", value_name = "DIRECTORY")]
    pub dir: Option<PathBuf>,

    /// Delay in seconds before capturing; fractions allowed
    #[arg(short = 'd', long = "delay", value_name = "SECONDS", default_value = "0",
          allow_negative_numbers = true, value_parser = parse_delay)]
    pub delay: Duration,

    /// Capture region; the origin may be negative on multi-monitor desktops
    #[arg(short = 'r', long = "region", value_name = "X,Y,W,H",
          allow_hyphen_values = true, value_parser = parse_region)]
    pub region: Option<Rect>,

    /// Drag out the capture region with the mouse (Escape cancels)
    #[arg(long, action = ArgAction::SetTrue)]
    pub select: bool,

    /// Image format: png, jpg, bmp
    #[arg(long, value_name = "FORMAT", default_value = "png", value_parser = ImageFormat::parse)]
    pub format: ImageFormat,

    /// JPEG quality, 0-100 (only used with --format jpg)
    #[arg(long, value_name = "0-100", default_value = "90",
          allow_negative_numbers = true, value_parser = parse_quality)]
    pub quality: Quality,

    /// Capture the window with exactly this title
    #[arg(short = 'w', long = "window", value_name = "TITLE", allow_hyphen_values = true)]
    pub window: Option<String>,

    /// Capture the active (foreground) window
    #[arg(long, action = ArgAction::SetTrue)]
    pub active: bool,

    /// Capture a monitor by 0-based index (see --list-monitors); -1 means none
    #[arg(short = 'm', long = "monitor", value_name = "INDEX", allow_negative_numbers = true)]
    pub monitor: Option<i32>,

    /// Copy the captured image to the clipboard
    #[arg(long, action = ArgAction::SetTrue)]
    pub clipboard: bool,

    /// Open the image after saving it
    #[arg(long, action = ArgAction::SetTrue)]
    pub show: bool,

    /// Include the mouse pointer
    #[arg(short = 'p', long = "pointer", action = ArgAction::SetTrue)]
    pub pointer: bool,

    /// Stamp the current date and time in the bottom-right corner
    #[arg(long, action = ArgAction::SetTrue)]
    pub timestamp: bool,

    /// Capture COUNT times, INTERVAL seconds apart
    #[arg(long, num_args = 2, value_names = ["INTERVAL", "COUNT"], allow_negative_numbers = true)]
    pub repeat: Option<Vec<String>>,

    /// List monitors and exit
    #[arg(long = "list-monitors", action = ArgAction::SetTrue)]
    pub list_monitors: bool,

    /// List visible top-level windows and exit
    #[arg(long = "list-windows", action = ArgAction::SetTrue)]
    pub list_windows: bool,

    /// Print listings as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Verbose logging (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_delay(s: &str) -> Result<Duration, ArgumentError> {
    seconds(parse_number(s, "delay")?, "delay")
}

fn parse_quality(s: &str) -> Result<Quality, ArgumentError> {
    let value = s
        .trim()
        .parse::<i64>()
        .map_err(|_| ArgumentError::InvalidNumber {
            what: "quality",
            value: s.to_owned(),
        })?;
    Quality::new(value)
}

fn parse_number(s: &str, what: &'static str) -> Result<f64, ArgumentError> {
    s.trim().parse::<f64>().map_err(|_| ArgumentError::InvalidNumber {
        what,
        value: s.to_owned(),
    })
}

impl Args {
    /// Validate the cross-field parts clap cannot check and build the
    /// capture request.
    pub fn to_config(&self) -> Result<CaptureConfig, ArgumentError> {
        let repeat = match self.repeat.as_deref() {
            Some([interval, count]) => {
                let interval = parse_number(interval, "repeat interval")?;
                let count = count
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ArgumentError::InvalidNumber {
                        what: "repeat count",
                        value: count.clone(),
                    })?;
                Some(RepeatPlan::new(interval, count)?)
            }
            _ => None,
        };

        Ok(CaptureConfig {
            target: CaptureTarget::from_selectors(
                self.active,
                self.window.clone(),
                self.monitor.filter(|&index| index != -1),
                self.region,
            ),
            interactive: self.select,
            delay: self.delay,
            encode: EncodeOptions {
                format: self.format,
                quality: self.quality,
            },
            output: OutputNaming {
                file_name: self.file.clone(),
                directory: self.dir.clone(),
            },
            pointer: self.pointer,
            timestamp: self.timestamp,
            clipboard: self.clipboard,
            show: self.show,
            repeat,
        })
    }
}

// ---------------------------------------------------------------------------
// Legacy single-dash flags
// ---------------------------------------------------------------------------

const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("-dir", "--dir"),
    ("-format", "--format"),
    ("-quality", "--quality"),
    ("-active", "--active"),
    ("-clipboard", "--clipboard"),
    ("-show", "--show"),
    ("-timestamp", "--timestamp"),
    ("-repeat", "--repeat"),
    ("-select", "--select"),
    ("-listmonitors", "--list-monitors"),
    ("-listwindows", "--list-windows"),
    ("--listmonitors", "--list-monitors"),
    ("--listwindows", "--list-windows"),
];

/// Values consumed by a (normalised) flag; those tokens are never rewritten.
fn values_taken(flag: &str) -> usize {
    match flag {
        "--file" | "--dir" | "--delay" | "--region" | "--format" | "--quality" | "--window"
        | "--monitor" => 1,
        "--repeat" => 2,
        _ => short_group_values(flag),
    }
}

/// A short group such as `-vw` takes the next token as its value when the
/// value-taking flag comes last; `-wTitle` carries its value inline.
fn short_group_values(flag: &str) -> usize {
    let Some(group) = flag.strip_prefix('-').filter(|g| !g.starts_with('-')) else {
        return 0;
    };
    let mut chars = group.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            'v' | 'p' => continue,
            'f' | 'd' | 'r' | 'w' | 'm' if chars.peek().is_none() => return 1,
            _ => return 0,
        }
    }
    0
}

/// Rewrite legacy single-dash long options into their `--` form.
///
/// Option values are passed through untouched, so a window titled
/// `-show` can still be captured with `-w -show`.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut out: Vec<OsString> = args.next().into_iter().collect();
    let mut pending = 0usize;
    let mut verbatim = false;

    for arg in args {
        if verbatim || pending > 0 {
            pending = pending.saturating_sub(1);
            out.push(arg);
            continue;
        }
        let arg = match arg.to_str() {
            Some("--") => {
                verbatim = true;
                arg
            }
            Some(s) => LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| *legacy == s)
                .map(|(_, modern)| OsString::from(*modern))
                .unwrap_or(arg),
            None => arg,
        };
        pending = arg.to_str().map(values_taken).unwrap_or(0);
        out.push(arg);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<OsString> {
        std::iter::once("shotcap")
            .chain(items.iter().copied())
            .map(OsString::from)
            .collect()
    }

    fn parse(items: &[&str]) -> Args {
        Args::try_parse_from(normalize_legacy_flags(argv(items))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).to_config().unwrap();
        assert_eq!(config, CaptureConfig::default());
    }

    #[test]
    fn test_legacy_flags_normalised() {
        let out = normalize_legacy_flags(argv(&["-format", "jpg", "-quality", "70", "-active"]));
        assert_eq!(out, argv(&["--format", "jpg", "--quality", "70", "--active"]));
    }

    #[test]
    fn test_values_are_not_rewritten() {
        let out = normalize_legacy_flags(argv(&["-w", "-show", "-f", "-dir"]));
        assert_eq!(out, argv(&["-w", "-show", "-f", "-dir"]));

        let out = normalize_legacy_flags(argv(&["-repeat", "1", "-show", "-show"]));
        assert_eq!(out, argv(&["--repeat", "1", "-show", "--show"]));
    }

    #[test]
    fn test_short_group_value_is_not_rewritten() {
        let out = normalize_legacy_flags(argv(&["-vw", "-show", "-pm", "-select"]));
        assert_eq!(out, argv(&["-vw", "-show", "-pm", "-select"]));

        // inline value: the next token is a flag again
        let out = normalize_legacy_flags(argv(&["-wNotepad", "-show"]));
        assert_eq!(out, argv(&["-wNotepad", "--show"]));

        let args = parse(&["-vw", "-show"]);
        assert_eq!(args.window.as_deref(), Some("-show"));
        assert!(!args.show);
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_negative_monitor_index() {
        let config = parse(&["-m", "-1"]).to_config().unwrap();
        assert_eq!(config.target, CaptureTarget::FullScreen);

        let config = parse(&["-m", "-2"]).to_config().unwrap();
        assert_eq!(config.target, CaptureTarget::Monitor(-2));
    }

    #[test]
    fn test_region_with_negative_origin() {
        let args = parse(&["-r", "-1920,0,800,600", "-format", "bmp"]);
        assert_eq!(args.region, Some(Rect::new(-1920, 0, -1120, 600)));
        assert_eq!(args.format, ImageFormat::Bmp);
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        assert!(Args::try_parse_from(argv(&["--quality", "101"])).is_err());
        assert!(Args::try_parse_from(argv(&["--quality", "-1"])).is_err());
        assert_eq!(parse(&["-quality", "0"]).quality.get(), 0);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        assert!(Args::try_parse_from(argv(&["--format", "gif"])).is_err());
        assert_eq!(parse(&["--format", "JPG"]).format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_fractional_delay() {
        let args = parse(&["-d", "1.5"]);
        assert_eq!(args.delay, Duration::from_millis(1500));
        assert!(Args::try_parse_from(argv(&["-d", "-2"])).is_err());
    }

    #[test]
    fn test_repeat_plan() {
        let config = parse(&["-repeat", "2", "3", "-f", "shot.png"])
            .to_config()
            .unwrap();
        assert_eq!(
            config.repeat,
            Some(RepeatPlan {
                interval: Duration::from_secs(2),
                count: 3
            })
        );
    }

    #[test]
    fn test_repeat_bad_count() {
        let err = parse(&["--repeat", "1", "many"]).to_config().unwrap_err();
        assert_eq!(
            err,
            ArgumentError::InvalidNumber {
                what: "repeat count",
                value: "many".into()
            }
        );
        assert!(parse(&["--repeat", "-1", "2"]).to_config().is_err());
    }

    #[test]
    fn test_target_precedence() {
        let config = parse(&["-m", "1", "-w", "Notepad", "-r", "0,0,10,10"])
            .to_config()
            .unwrap();
        assert_eq!(config.target, CaptureTarget::WindowByTitle("Notepad".into()));

        let config = parse(&["-m", "1", "-active"]).to_config().unwrap();
        assert_eq!(config.target, CaptureTarget::ActiveWindow);
    }

    #[test]
    fn test_select_and_output_options() {
        let config = parse(&[
            "-select", "-dir", "shots", "-f", "a.bmp", "-clipboard", "-show", "-p", "-timestamp",
        ])
        .to_config()
        .unwrap();
        assert!(config.interactive);
        assert_eq!(config.output.directory, Some(PathBuf::from("shots")));
        assert_eq!(config.output.file_name, "a.bmp");
        assert!(config.clipboard && config.show && config.pointer && config.timestamp);
    }

    #[test]
    fn test_verbose_count() {
        assert_eq!(parse(&["-v"]).verbose, 1);
        assert_eq!(parse(&["-vv"]).verbose, 2);
    }
}

//! `shotcap` -- capture the screen, a monitor, a region, or a window.
//!
//! Exit status: 0 on success, after listings, when the selection is
//! cancelled, and when individual captures fail (they are reported on
//! stderr); 2 for invalid arguments; 1 when the platform cannot be
//! initialised or the selection window cannot be shown.

mod args;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::LevelFilter;
use shotcap_core::platform;
use shotcap_core::resolver::{format_monitor_list, format_window_list, DisplayServer};

use crate::args::{normalize_legacy_flags, Args};

/// `warn` by default, raised for this tool's own targets by `-v`;
/// `RUST_LOG` takes precedence when set.
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        // prefix match: covers shotcap_core as well
        .filter_module("shotcap", level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn print_listing<D: DisplayServer>(display: &D, args: &Args) {
    if args.list_monitors {
        match display.monitors() {
            Ok(monitors) if args.json => match serde_json::to_string_pretty(&monitors) {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Failed to serialise monitor list: {e}"),
            },
            Ok(monitors) => print!("{}", format_monitor_list(&monitors)),
            Err(e) => log::error!("{e}"),
        }
    }
    if args.list_windows {
        match display.windows() {
            Ok(windows) if args.json => match serde_json::to_string_pretty(&windows) {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Failed to serialise window list: {e}"),
            },
            Ok(windows) => print!("{}", format_window_list(&windows)),
            Err(e) => log::error!("{e}"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse_from(normalize_legacy_flags(std::env::args_os()));
    init_logger(args.verbose);

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => Args::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    let mut platform = platform::native();

    if args.list_monitors || args.list_windows {
        print_listing(&platform, &args);
        return ExitCode::SUCCESS;
    }

    match shotcap_core::run(&config, &mut platform) {
        Ok(report) => {
            for saved in &report.saved {
                println!("Screenshot saved as {}", saved.display());
            }
            if !report.failures.is_empty() {
                log::warn!(
                    "{} of {} capture(s) failed",
                    report.failures.len(),
                    report.attempted()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

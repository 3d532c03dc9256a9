//! Logging setup for the `photosift` binary.
//!
//! The library only talks to the `log` facade. The binary installs
//! `env_logger` once at startup with [`init_logging`]. Level resolution:
//!
//! 1. `RUST_LOG`, when set, is used verbatim
//! 2. `--quiet` keeps errors only
//! 3. `-v` enables debug, `-vv` trace (photosift modules only; dependencies
//!    stay at warn)
//! 4. Otherwise info
//!
//! Debug builds prefix records with a timestamp and, when verbose, the
//! module path. Release builds print level and message.
//!
//! ```rust,no_run
//! use photosift::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Crate whose records follow the verbosity flags.
const OWN_TARGET: &str = "photosift";

/// Install the global logger. A second call is a no-op.
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var_os("RUST_LOG").is_some();
    let mut builder = build_logger(verbose, quiet, from_env);

    if builder.try_init().is_ok() {
        if from_env {
            log::debug!("Log filter taken from RUST_LOG");
        } else {
            log::debug!("Log level {}", determine_level(verbose, quiet));
        }
    }
}

/// Resolve the level for our own records from CLI flags.
#[must_use]
pub fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Level applied to dependency crates for the given flags.
fn dependency_level(own: LevelFilter) -> LevelFilter {
    own.min(LevelFilter::Warn)
}

fn build_logger(verbose: u8, quiet: bool, from_env: bool) -> Builder {
    let mut builder = Builder::new();

    if from_env {
        builder.parse_default_env();
    } else {
        let own = determine_level(verbose, quiet);
        builder
            .filter_level(dependency_level(own))
            .filter_module(OWN_TARGET, own);
    }

    let with_module = verbose >= 1;
    if cfg!(debug_assertions) {
        builder.format(move |buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = buf.timestamp_seconds();
            if with_module {
                writeln!(
                    buf,
                    "{ts} {style}{:<5}{style:#} [{}] {}",
                    record.level(),
                    record.module_path().unwrap_or("?"),
                    record.args()
                )
            } else {
                writeln!(buf, "{ts} {style}{:<5}{style:#} {}", record.level(), record.args())
            }
        });
    } else {
        builder.format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
        });
    }

    builder
}

/// Name of the active maximum level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

//! stderr logger for the CLI.
//!
//! Lines look like `[ INFO] cpustat::registry: message`. Stdout is kept for
//! command output only.

use std::io::Write;
use std::str::FromStr;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable holding a level name (`error` .. `trace`).
pub const LOG_ENV: &str = "CPUSTAT_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        // Nothing sensible to do if stderr is gone.
        let _ = writeln!(out, "[{:>5}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

/// Pick the level: each `-v` raises it from `warn`; `CPUSTAT_LOG` wins when
/// set to a valid name.
pub fn level(verbose: u8) -> LevelFilter {
    if let Ok(name) = std::env::var(LOG_ENV) {
        if let Ok(level) = LevelFilter::from_str(&name) {
            return level;
        }
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the logger. Safe to call more than once; later calls only change
/// the level.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

//! Logger setup for foreground and daemonized runs.
//!
//! Foreground runs log to stdout, one `<timestamp> <message>` line per
//! event. Daemonized runs log to syslog instead.

use std::io::Write;

use anyhow::{Result, anyhow};
use log::{Level, LevelFilter, Metadata, Record};
use syslog::{BasicLogger, Facility, Formatter3164};

struct StdoutLogger;

impl log::Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut out = std::io::stdout().lock();
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(out, "{timestamp} {}", record.args());
        let _ = out.flush();
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// Installs the stdout logger for foreground runs.
pub fn init_stdout() -> Result<()> {
    log::set_boxed_logger(Box::new(StdoutLogger))
        .map(|()| log::set_max_level(LevelFilter::Info))
        .map_err(|e| anyhow!("{e}"))
}

/// Installs the syslog logger for daemonized runs.
pub fn init_syslog() -> Result<()> {
    let formatter = Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: "hwfand".into(),
        pid: 0,
    };

    let logger = syslog::unix(formatter).map_err(|e| anyhow!("Failed to connect to syslog: {e}"))?;

    log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
        .map(|()| log::set_max_level(LevelFilter::Info))
        .map_err(|e| anyhow!("{e}"))
}

use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};

use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use crate::config::LogConfig;
use crate::error::{Result, TreeError};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Installs a terminal logger, plus a file logger if configured.
///
/// Returns `Ok(true)` if this call installed the logger and `Ok(false)` if a
/// logger was already in place (from an earlier call or from the host).
pub fn init_logging(config: &LogConfig) -> Result<bool> {
    if INSTALLED.load(Ordering::Acquire) {
        return Ok(false)
    }

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);
    loggers.push(TermLogger::new(config.terminal_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto));

    if let Some((path, level)) = &config.file {
        let file = File::create(path)
            .map_err(|e| TreeError::Logging(format!("cannot create {}: {e}", path.display())))?;
        loggers.push(WriteLogger::new(*level, Config::default(), file));
    }

    match CombinedLogger::init(loggers) {
        Ok(()) => {
            INSTALLED.store(true, Ordering::Release);
            debug!("Logging initialized");
            Ok(true)
        }
        // someone else got there first, which is fine
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let first = init_logging(&LogConfig::default()).unwrap();
        let second = init_logging(&LogConfig::default()).unwrap();
        // another test may have installed it already, but never both calls
        assert!(!(first && second));
        assert!(!second);
    }

    #[test]
    fn unwritable_log_file_is_an_error_not_a_panic() {
        if INSTALLED.load(Ordering::Acquire) {
            return
        }
        let config = LogConfig::default()
            .with_file("/nonexistent-directory/for/rbindex/test.log", log::LevelFilter::Debug);
        match init_logging(&config) {
            Err(TreeError::Logging(msg)) => assert!(msg.contains("cannot create")),
            // lost the race with another test that installed a logger first
            Ok(false) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

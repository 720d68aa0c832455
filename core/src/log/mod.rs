//! Logger and logging macros
//!
//! The macros forward to the `log` facade. Components which need their output observed
//! (the block processing pipeline in particular) receive a [`Logger`] handle instead, which
//! writes through the same facade and can additionally record into a [`LogCapture`].

use log::LevelFilter;
use log4rs::{config::Root, Config};

mod appender;
mod capture;
mod consts;
mod handle;
mod logger;

pub use capture::{LogCapture, LogEntry};
pub use handle::Logger;
pub use log::Level;
pub use logger::LogError;

#[doc(hidden)]
pub use log as __log;

use appender::AppenderSpec;
use consts::{DEFAULT_LOGGER_ENV, ERR_LOG_FILE_NAME, LOG_FILE_NAME};
use logger::Builder;

const CONSOLE_APPENDER: &str = "stdout";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// Initializes the global logger. Output always goes to stdout; when `log_dir` is given, a
/// size-rolled log file and a warnings-and-above file are written there as well.
///
/// `filters` follows the `RUST_LOG` syntax, e.g. `info,dpos_consensus=debug`. The environment
/// variable is applied first and the explicit expression takes precedence over it.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    let mut stdout_appender = AppenderSpec::console(CONSOLE_APPENDER, None);
    let mut file_appender = log_dir.map(|dir| AppenderSpec::roller(LOG_FILE_APPENDER, None, dir, LOG_FILE_NAME)).transpose()?;
    let mut err_file_appender =
        log_dir.map(|dir| AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), dir, ERR_LOG_FILE_NAME)).transpose()?;
    let appenders = [Some(&stdout_appender), file_appender.as_ref(), err_file_appender.as_ref()].map(|x| x.map(|x| x.name));

    let loggers = Builder::new().root_level(LevelFilter::Info).parse_env(DEFAULT_LOGGER_ENV).parse_expression(filters).build();

    let config_appenders = [
        Some(stdout_appender.appender()?),
        file_appender.as_mut().map(AppenderSpec::appender).transpose()?,
        err_file_appender.as_mut().map(AppenderSpec::appender).transpose()?,
    ];
    let config = Config::builder()
        .appenders(config_appenders.into_iter().flatten())
        .loggers(loggers.items())
        .build(Root::builder().appenders(appenders.into_iter().flatten()).build(loggers.root_level()))
        .map_err(|err| LogError::Init(err.to_string()))?;

    log4rs::init_config(config).map_err(|err| LogError::Init(err.to_string()))?;
    Ok(())
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => (
        $crate::log::__log::trace!($($t)*)
    )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => (
        $crate::log::__log::debug!($($t)*)
    )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => (
        $crate::log::__log::info!($($t)*)
    )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => (
        $crate::log::__log::warn!($($t)*)
    )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => (
        $crate::log::__log::error!($($t)*)
    )
}

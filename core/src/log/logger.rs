use log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::HashMap, env, mem};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum LogError {
    #[error("Logger spec parsing error: {0}")]
    ParseLoggerSpecError(String),

    #[error("Log directory {0} is not a valid UTF-8 path")]
    InvalidPath(String),

    #[error("Appender {0} was already built")]
    AppenderConsumed(&'static str),

    #[error("Logger initialization failed: {0}")]
    Init(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct LoggerSpec {
    pub name: String,
    pub level: LevelFilter,
}

impl LoggerSpec {
    pub fn logger(&self) -> Logger {
        Logger::builder().build(self.name.clone(), self.level)
    }
}

pub(super) struct Loggers {
    loggers: Vec<LoggerSpec>,
    root_level: LevelFilter,
}

impl Loggers {
    pub fn root_level(&self) -> LevelFilter {
        self.root_level
    }

    pub fn items(&self) -> impl Iterator<Item = Logger> + '_ {
        self.loggers.iter().map(|x| x.logger())
    }
}

/// Collects per-target levels from `RUST_LOG`-like expressions, e.g. `info,dpos_consensus=trace`
pub(super) struct Builder {
    loggers: HashMap<String, LevelFilter>,
    root_level: Option<LevelFilter>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { loggers: HashMap::new(), root_level: None }
    }

    pub fn parse_env(&mut self, env: &str) -> &mut Self {
        self.parse_expression(&env::var(env).unwrap_or_default())
    }

    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(|x| x.trim()) {
            if spec.is_empty() {
                continue;
            }
            match Self::parse_spec(spec) {
                Ok((level, Some(name))) => {
                    self.loggers.insert(name.to_string(), level);
                }
                Ok((level, None)) => {
                    self.root_level.replace(level);
                }
                Err(err) => eprintln!("Ignoring invalid logging spec '{}'", err),
            }
        }
        self
    }

    fn parse_spec(spec: &str) -> Result<(LevelFilter, Option<&str>), LogError> {
        let mut parts = spec.split('=');
        match (parts.next(), parts.next().map(|x| x.trim()), parts.next()) {
            // a single level string defines the root level, a single name enables everything for that target
            (Some(part0), None, None) => match part0.parse() {
                Ok(level) => Ok((level, None)),
                Err(_) => Ok((LevelFilter::max(), Some(part0))),
            },
            (Some(part0), Some(""), None) => Ok((LevelFilter::max(), Some(part0))),
            (Some(part0), Some(part1), None) => match part1.parse() {
                Ok(level) => Ok((level, Some(part0))),
                Err(_) => Err(LogError::ParseLoggerSpecError(part1.to_string())),
            },
            _ => Err(LogError::ParseLoggerSpecError(spec.to_string())),
        }
    }

    pub fn root_level(&mut self, root_level: LevelFilter) -> &mut Self {
        self.root_level.replace(root_level);
        self
    }

    pub fn build(&mut self) -> Loggers {
        let mut loggers =
            mem::take(&mut self.loggers).into_iter().map(|(name, level)| LoggerSpec { name, level }).collect::<Vec<_>>();
        loggers.sort_by(|a, b| a.name.cmp(&b.name));
        Loggers { loggers, root_level: self.root_level.take().unwrap_or(LevelFilter::Error) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() {
        let loggers = Builder::new().root_level(LevelFilter::Info).parse_expression("warn, dpos_consensus=trace, simchain,bad=nope").build();
        assert_eq!(loggers.root_level(), LevelFilter::Warn);
        assert_eq!(
            loggers.loggers,
            vec![
                LoggerSpec { name: "dpos_consensus".to_string(), level: LevelFilter::Trace },
                LoggerSpec { name: "simchain".to_string(), level: LevelFilter::max() },
            ]
        );
    }

    #[test]
    fn test_default_root_level() {
        let loggers = Builder::new().parse_expression("").build();
        assert_eq!(loggers.root_level(), LevelFilter::Error);
        assert_eq!(loggers.items().count(), 0);
    }
}

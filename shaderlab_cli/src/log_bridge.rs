//! Forwards compiler log events into the `log` facade

use shaderlab_compiler::logging::{LogEvent, LogLevel, Logger};

pub struct LogBridge;

impl Logger for LogBridge {
    fn log(&self, event: &LogEvent) {
        let level = match event.level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        };
        log::log!(target: "shaderlab", level, "{}", event.format());
    }
}

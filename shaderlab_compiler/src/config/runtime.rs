// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// File extensions picked up when an include directory is scanned
    pub include_extensions: Vec<String>,

    /// Whether include directories are walked recursively
    pub recurse_include_dirs: bool,

    /// Whether to log size/line metrics for every loaded file
    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            include_extensions: env::var(env_vars::INCLUDE_EXTENSIONS)
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|ext| ext.trim().trim_start_matches('.').to_string())
                        .filter(|ext| !ext.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| {
                    vec!["glsl".to_string(), "shader".to_string(), "gs".to_string()]
                }),
            recurse_include_dirs: env_flag(env_vars::RECURSE_INCLUDE_DIRS, true),
            enable_performance_logging: env_flag(env_vars::ENABLE_PERFORMANCE_LOGGING, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorPreferences {
    /// Whether a chunk included more than once produces a warning
    pub warn_on_repeated_include: bool,

    /// Whether redefinitions of ordinary macros are logged
    pub log_macro_redefinitions: bool,

    /// Whether the built-in GL_ES macro is seeded before each compile
    pub predefine_gl_es: bool,
}

impl Default for PreprocessorPreferences {
    fn default() -> Self {
        Self {
            warn_on_repeated_include: env_flag(env_vars::PREPROCESSOR_WARN_REPEATED_INCLUDE, true),
            log_macro_redefinitions: env_flag(env_vars::PREPROCESSOR_LOG_REDEFINITIONS, false),
            predefine_gl_es: env_flag(env_vars::PREPROCESSOR_PREDEFINE_GL_ES, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPreferences {
    /// Collect recoverable errors and keep parsing; when false the first one aborts
    pub collect_recoverable_errors: bool,

    /// Whether scope push/pop and symbol declarations are logged at debug level
    pub log_symbol_events: bool,
}

impl Default for ContentPreferences {
    fn default() -> Self {
        Self {
            collect_recoverable_errors: env_flag(env_vars::CONTENT_COLLECT_ERRORS, true),
            log_symbol_events: env_flag(env_vars::CONTENT_LOG_SYMBOLS, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticPreferences {
    /// Lines of context printed above and below the offending line
    pub wrapping_line_count: usize,

    /// Whether errors in expanded text are traced back to their originating file
    pub remap_to_origin: bool,

    /// Whether rendered diagnostics include the source snippet
    pub show_source_snippet: bool,
}

impl Default for DiagnosticPreferences {
    fn default() -> Self {
        Self {
            wrapping_line_count: env::var(env_vars::DIAGNOSTIC_WRAP_LINES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::config::compile_time::diagnostics::WRAPPING_LINE_COUNT),
            remap_to_origin: env_flag(env_vars::DIAGNOSTIC_REMAP, true),
            show_source_snippet: env_flag(env_vars::DIAGNOSTIC_SNIPPETS, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Preferred minimum log level (clamped by the compile-time floor)
    pub min_log_level: LogLevel,

    /// Whether to tag events with the file being compiled
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_flag(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: env_flag(env_vars::LOGGING_ENABLE_CONSOLE, false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_file_context: env_flag(env_vars::LOGGING_INCLUDE_FILE_CONTEXT, true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    pub fn to_events_log_level(&self) -> crate::logging::LogLevel {
        match self {
            LogLevel::Error => crate::logging::LogLevel::Error,
            LogLevel::Warning => crate::logging::LogLevel::Warning,
            LogLevel::Info => crate::logging::LogLevel::Info,
            LogLevel::Debug => crate::logging::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Failure to load a runtime configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid configuration file {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub preprocessor: PreprocessorPreferences,
    pub content: ContentPreferences,
    pub diagnostics: DiagnosticPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a TOML document; missing tables and keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: display.clone(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| ConfigError::Parse {
            path: display,
            message: e.to_string(),
        })
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const INCLUDE_EXTENSIONS: &str = "SHADERLAB_INCLUDE_EXTENSIONS";
    pub const RECURSE_INCLUDE_DIRS: &str = "SHADERLAB_RECURSE_INCLUDE_DIRS";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "SHADERLAB_ENABLE_PERFORMANCE_LOGGING";

    // Preprocessor
    pub const PREPROCESSOR_WARN_REPEATED_INCLUDE: &str = "SHADERLAB_WARN_REPEATED_INCLUDE";
    pub const PREPROCESSOR_LOG_REDEFINITIONS: &str = "SHADERLAB_LOG_MACRO_REDEFINITIONS";
    pub const PREPROCESSOR_PREDEFINE_GL_ES: &str = "SHADERLAB_PREDEFINE_GL_ES";

    // Content parser
    pub const CONTENT_COLLECT_ERRORS: &str = "SHADERLAB_COLLECT_RECOVERABLE_ERRORS";
    pub const CONTENT_LOG_SYMBOLS: &str = "SHADERLAB_LOG_SYMBOL_EVENTS";

    // Diagnostics
    pub const DIAGNOSTIC_WRAP_LINES: &str = "SHADERLAB_DIAGNOSTIC_WRAP_LINES";
    pub const DIAGNOSTIC_REMAP: &str = "SHADERLAB_DIAGNOSTIC_REMAP";
    pub const DIAGNOSTIC_SNIPPETS: &str = "SHADERLAB_DIAGNOSTIC_SNIPPETS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "SHADERLAB_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "SHADERLAB_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "SHADERLAB_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "SHADERLAB_LOGGING_INCLUDE_FILE_CONTEXT";
}

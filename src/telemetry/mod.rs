//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events. Binaries (or tests) that want to see them call
//! [`init_subscriber`] once at startup.
//!
//! ```rust,ignore
//! use siumai_media::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use crate::error::MediaError;

/// Environment variable read by [`init_from_env`] for the level.
pub const LOG_LEVEL_ENV: &str = "SIUMAI_MEDIA_LOG_LEVEL";
/// Environment variable read by [`init_from_env`] for the format.
pub const LOG_FORMAT_ENV: &str = "SIUMAI_MEDIA_LOG_FORMAT";
/// Environment variable read by [`init_from_env`] for the log file.
pub const LOG_FILE_ENV: &str = "SIUMAI_MEDIA_LOG_FILE";

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON, one object per line
    Json,
    /// JSON without span lists
    JsonCompact,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, MediaError> {
        match value.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(MediaError::ConfigurationError(format!(
                "Invalid log format: {value}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stderr.
    pub enable_console: bool,
    /// Also write to this file (never rotated).
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Debug-level text logs on stderr.
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Warn-level JSON logs written to `log_file` only.
    pub fn production(log_file: PathBuf) -> Self {
        Self {
            log_level: tracing::Level::WARN,
            output_format: OutputFormat::Json,
            enable_console: false,
            log_file: Some(log_file),
        }
    }

    fn filter(&self) -> String {
        let level = match self.log_level {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        };
        format!("siumai_media={level}")
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, MediaError> {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                return Err(MediaError::ConfigurationError(format!(
                    "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

/// Install a global subscriber.
///
/// Returns the appender guard when file logging is enabled; keep it alive for as long as logs
/// should be flushed. Calling this when a subscriber is already installed is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, MediaError> {
    let filter = config.filter();
    let (writer, guard) = make_writer(&config)?;

    let init_result = match config.output_format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .json()
            .with_span_list(false)
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_target(true)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("already") => Ok(guard),
        Err(e) => Err(MediaError::ConfigurationError(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}

fn make_writer(
    config: &SubscriberConfig,
) -> Result<(BoxMakeWriter, Option<WorkerGuard>), MediaError> {
    let Some(path) = &config.log_file else {
        let writer = if config.enable_console {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::sink)
        };
        return Ok((writer, None));
    };

    let file_name = path.file_name().ok_or_else(|| {
        MediaError::ConfigurationError(format!(
            "Log file path has no file name: {}",
            path.display()
        ))
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let (file, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let writer = if config.enable_console {
        BoxMakeWriter::new(file.and(std::io::stderr))
    } else {
        BoxMakeWriter::new(file)
    };
    Ok((writer, Some(guard)))
}

/// Initialize with `SubscriberConfig::default()`.
pub fn init_default() -> Result<Option<WorkerGuard>, MediaError> {
    init_subscriber(SubscriberConfig::default())
}

/// Configuration from `SIUMAI_MEDIA_LOG_LEVEL`, `SIUMAI_MEDIA_LOG_FORMAT` and
/// `SIUMAI_MEDIA_LOG_FILE`.
pub fn config_from_env() -> Result<SubscriberConfig, MediaError> {
    let mut builder = SubscriberConfig::builder();
    if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
        builder = builder.log_level_str(&level)?;
    }
    if let Ok(format) = std::env::var(LOG_FORMAT_ENV) {
        builder = builder.output_format(OutputFormat::parse(&format)?);
    }
    if let Ok(file_path) = std::env::var(LOG_FILE_ENV) {
        builder = builder.log_file(PathBuf::from(file_path));
    }
    Ok(builder.build())
}

/// Initialize from environment variables, see [`config_from_env`].
pub fn init_from_env() -> Result<Option<WorkerGuard>, MediaError> {
    init_subscriber(config_from_env()?)
}

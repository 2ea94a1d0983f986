//! Structured logging for injury-sim
//!
//! The engine only emits `tracing` events; this module wires up the
//! subscriber for the CLI with a choice of output formats and an optional
//! rotating JSON log file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: LogLevel,

    /// Output format (pretty, json, compact)
    pub format: LogFormat,

    /// Log file path (None for stderr only)
    pub file_path: Option<PathBuf>,

    /// Rotate the log file daily
    pub rotation: bool,

    /// Include span enter/close events
    pub include_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Pretty,
            file_path: None,
            rotation: true,
            include_spans: false,
        }
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }

    pub fn to_filter(&self) -> String {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
        .to_string()
    }

    /// Map a `-v` count onto a level, starting from `base`
    pub fn from_verbosity(base: LogLevel, verbose: u8) -> Self {
        let levels = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let start = levels.iter().position(|l| *l == base).unwrap_or(1);
        levels[(start + verbose as usize).min(levels.len() - 1)]
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors
    Pretty,
    /// JSON format for log shippers
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Initialize the logging system
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("injury_sim={}", config.level.to_filter()))
    });

    // stdout carries the CLI report, so log lines go to stderr
    let stderr_layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .with_span_events(if config.include_spans {
                FmtSpan::ENTER | FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            })
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(config.include_spans)
            .with_span_list(config.include_spans)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer);

    if let Some(file_path) = &config.file_path {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if config.rotation {
            let file_appender = tracing_appender::rolling::daily(
                file_path.parent().unwrap_or_else(|| Path::new(".")),
                file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("injury-sim.log"),
            );

            let file_layer = fmt::layer()
                .json()
                .with_writer(file_appender)
                .with_target(true)
                .with_current_span(config.include_spans)
                .with_span_list(config.include_spans);

            subscriber.with(file_layer).try_init()?;
        } else {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;

            let file_layer = fmt::layer()
                .json()
                .with_writer(file)
                .with_target(true)
                .with_current_span(config.include_spans)
                .with_span_list(config.include_spans);

            subscriber.with(file_layer).try_init()?;
        }
    } else {
        subscriber.try_init()?;
    }

    tracing::info!(
        level = %config.level.to_tracing_level(),
        format = ?config.format,
        file = ?config.file_path,
        "Logging initialized"
    );

    Ok(())
}

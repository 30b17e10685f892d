// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{ffi::OsStr, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationFreq {
    Minutely,
    Hourly,
    Daily,
    #[default]
    Never,
}

impl From<RotationFreq> for Rotation {
    fn from(freq: RotationFreq) -> Self {
        match freq {
            RotationFreq::Minutely => Rotation::MINUTELY,
            RotationFreq::Hourly => Rotation::HOURLY,
            RotationFreq::Daily => Rotation::DAILY,
            RotationFreq::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogFileConfig {
    pub path: String,
    #[serde(default)]
    pub rotation_frequency: RotationFreq,
}

impl LogFileConfig {
    /// Appender for the configured path, rotating in place next to it.
    fn appender(&self) -> RollingFileAppender {
        let path = Path::new(&self.path);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .unwrap_or_else(|| OsStr::new("ndn-ft-client.log"));
        RollingFileAppender::new(self.rotation_frequency.clone().into(), dir, file_name)
    }
}

/// Logging section of the runtime config.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggerConfig {
    /// Default filter directive; `RUST_LOG` overrides it when set.
    #[serde(default = "LoggerConfig::default_level")]
    pub level: String,
    #[serde(default = "LoggerConfig::default_output")]
    pub output: Output,
    #[serde(default = "LoggerConfig::default_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file: Option<LogFileConfig>,
}

impl LoggerConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_output() -> Output {
        Output::Stderr
    }

    fn default_format() -> LogFormat {
        LogFormat::Plain
    }

    /// Non-blocking sink for the configured output. The guard must outlive
    /// every log call that should reach the sink.
    fn sink(&self) -> Result<(NonBlocking, WorkerGuard)> {
        Ok(match (&self.output, &self.file) {
            (Output::Stdout, _) => tracing_appender::non_blocking(std::io::stdout()),
            (Output::Stderr, _) => tracing_appender::non_blocking(std::io::stderr()),
            (Output::File, Some(file)) => tracing_appender::non_blocking(file.appender()),
            (Output::File, None) => {
                bail!("logger output is 'file' but no logger.file section is set")
            },
        })
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            output: Self::default_output(),
            format: Self::default_format(),
            file: None,
        }
    }
}

/// Installs the global tracing subscriber. The returned guard must be held
/// for the lifetime of the process so buffered log lines flush on exit.
pub fn init_logger(cfg: &LoggerConfig) -> Result<WorkerGuard> {
    let (sink, guard) = cfg.sink()?;
    let writer = BoxMakeWriter::new(sink);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .context("failed to parse log level from env or config")?;

    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer().with_writer(writer).with_ansi(false).json();
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()
                .context("failed to set global default subscriber")?;
        },
        LogFormat::Plain => {
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()
                .context("failed to set global default subscriber")?;
        },
    }

    Ok(guard)
}

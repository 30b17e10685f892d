// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::cfg::logger::LoggerConfig;

/// Largest payload a single UDP datagram can carry.
const UDP_MAX_PAYLOAD: usize = 65507;

/// Runtime configuration that lives outside the CLI: where the forwarder is,
/// how wide the pipeline runs, and how to log. Every field has a default so
/// the file is optional.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub forwarder: ForwarderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
}

/// Transport parameters for the UDP face.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ForwarderConfig {
    #[serde(rename = "Address")]
    /// Forwarder address, `host:port`.
    pub address: String,

    #[serde(rename = "Mtu")]
    /// Largest link packet this face will put on the wire.
    pub mtu: usize,

    #[serde(rename = "PollTimeoutMillis")]
    /// Upper bound on one face poll; this paces the dispatcher loop.
    pub poll_timeout_ms: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6363".to_string(),
            mtu: 8800,
            poll_timeout_ms: 2,
        }
    }
}

/// Pipeline sizing.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    #[serde(rename = "WindowSize")]
    /// Maximum number of simultaneously in-flight Interests.
    pub window_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { window_size: 4096 }
    }
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(&path).with_context(|| {
            format!("failed to read config file {:?}", path.as_ref())
        })?;
        Self::from_yaml_str(&s)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let mut cfg: Config =
            serde_yaml::from_str(s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Validates invariants and normalizes derived fields.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(
            !self.forwarder.address.is_empty(),
            "forwarder Address must not be empty"
        );
        ensure!(
            (576..=UDP_MAX_PAYLOAD).contains(&self.forwarder.mtu),
            "Mtu must be within 576..={UDP_MAX_PAYLOAD}"
        );
        ensure!(self.pipeline.window_size >= 1, "WindowSize must be >= 1");

        // A zero poll timeout busy-spins the dispatcher; pin it to 1 ms.
        if self.forwarder.poll_timeout_ms == 0 {
            self.forwarder.poll_timeout_ms = 1;
        }

        Ok(())
    }
}

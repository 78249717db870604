// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Server-wide configuration.
//!
//! Everything the core needs that is neither tree state nor part of a
//! single request: the path length ceiling, the initial level pair,
//! which text-codec version to save with, and how chatty diagnostics
//! should be. Loadable from a TOML file; sane defaults when absent,
//! mirroring the Reed.toml parse-then-validate pattern.

use crate::registry::error::{io_error, RegError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum path length in UTF-16 code units, matching `path_t` in the
/// original RPC surface.
pub const MAX_PATH: usize = 256;

/// Default ceiling on a single value's byte length, standing in for
/// "the request tail" (§6) since this core has no literal request
/// buffer to bound against.
pub const DEFAULT_MAX_VALUE_LEN: usize = 1024 * 1024;

/// Text codec version used by `save_registry` when not overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingVersion {
    V1,
    V2,
}

impl Default for SavingVersion {
    fn default() -> Self {
        SavingVersion::V2
    }
}

/// Server-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,

    #[serde(default = "default_max_value_len")]
    pub max_value_len: usize,

    #[serde(default)]
    pub current_level: u32,

    #[serde(default)]
    pub saving_level: u32,

    #[serde(default)]
    pub saving_version: SavingVersion,

    #[serde(default)]
    pub debug_level: u8,
}

fn default_max_path_len() -> usize {
    MAX_PATH
}

fn default_max_value_len() -> usize {
    DEFAULT_MAX_VALUE_LEN
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_path_len: default_max_path_len(),
            max_value_len: default_max_value_len(),
            current_level: 0,
            saving_level: 0,
            saving_version: SavingVersion::V2,
            debug_level: 0,
        }
    }
}

impl ServerConfig {
    /// Parses and validates a config file. Falls back to `ServerConfig::default()`
    /// semantics field-by-field via serde's `#[serde(default)]`, so a
    /// near-empty TOML file is perfectly valid input.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, RegError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ServerConfig = toml::from_str(&content).map_err(|e| {
            io_error("parse_toml", path.as_ref().display().to_string(), e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RegError> {
        if self.max_path_len == 0 {
            return Err(RegError::OutOfMemory(
                "max_path_len must be greater than zero".to_string(),
            ));
        }
        if self.max_value_len == 0 {
            return Err(RegError::OutOfMemory(
                "max_value_len must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

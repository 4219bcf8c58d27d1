// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Processor configuration via `effects_sdk.yaml`.

use std::path::{Path, PathBuf};

use effects_sdk_abi::DEFAULT_LIBRARY_NAME;
use serde::Deserialize;

use crate::error::{EffectsError, Result};

/// Environment variable overriding [`EffectsConfig::library_path`].
pub const LIBRARY_PATH_ENV: &str = "EFFECTS_SDK_LIBRARY";

/// Configuration for [`crate::FrameEffectsProcessor`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectsConfig {
    /// Path of the vendor effects library. Its directory is also searched for
    /// the libraries the vendor library depends on.
    pub library_path: PathBuf,

    /// Skip the vendor round-trip when no effect is active. Off by default:
    /// every frame goes through the vendor pipeline.
    pub skip_idle_frames: bool,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from(DEFAULT_LIBRARY_NAME),
            skip_idle_frames: false,
        }
    }
}

impl EffectsConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "effects_sdk.yaml";

    /// Use `library_path` instead of the default library name.
    pub fn with_library_path(mut self, library_path: impl Into<PathBuf>) -> Self {
        self.library_path = library_path.into();
        self
    }

    /// Parse a configuration file. Returns error if the file is missing or
    /// cannot be parsed.
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            EffectsError::Configuration(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let config = Self::parse(&content, config_path)?;
        tracing::info!("Loaded effects config from {}", config_path.display());
        Ok(config.with_env_overrides())
    }

    fn parse(content: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            EffectsError::Configuration(format!("Failed to parse {}: {}", origin.display(), e))
        })
    }

    /// Load configuration from a directory. Returns error if the file is
    /// missing or cannot be parsed.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::from_file(&dir.join(Self::FILE_NAME))
    }

    /// Load configuration from a directory, returning defaults if the file is
    /// missing or unparseable.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(
                "No {} found in {}, using defaults",
                Self::FILE_NAME,
                dir.display()
            );
            return Self::default().with_env_overrides();
        }

        match Self::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default().with_env_overrides()
            }
        }
    }

    pub(crate) fn with_env_overrides(self) -> Self {
        self.with_library_override(std::env::var_os(LIBRARY_PATH_ENV).map(PathBuf::from))
    }

    fn with_library_override(self, library_path: Option<PathBuf>) -> Self {
        match library_path {
            Some(path) if !path.as_os_str().is_empty() => {
                tracing::debug!("{} overrides library path: {}", LIBRARY_PATH_ENV, path.display());
                self.with_library_path(path)
            }
            _ => self,
        }
    }
}

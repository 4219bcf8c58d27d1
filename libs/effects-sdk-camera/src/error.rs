// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::path::PathBuf;

use effects_sdk_abi::PipelineErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EffectsError {
    #[error("Can't enable replace background: {0}")]
    EngineActivationFailed(PipelineErrorCode),

    #[error("Can't process frame: {0}")]
    FrameProcessingFailed(PipelineErrorCode),

    #[error("Failed to load background image: {}", .0.display())]
    BackgroundImageLoad(PathBuf),

    #[error("Frame creation failed: {0}")]
    FrameCreation(String),

    #[error("Frame lock failed: {0}")]
    FrameLock(String),

    #[error("Frame size mismatch: expected at least {expected} bytes, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("Failed to load effects library {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Effects library is missing entry point: {0}")]
    MissingEntryPoint(String),

    #[error("Effects SDK factory failed: {0}")]
    FactoryCreation(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EffectsError {
    /// Negative status reported across the C ABI. `-1` is reserved for
    /// invalid arguments detected by the FFI layer itself.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::EngineActivationFailed(_) => -2,
            Self::FrameProcessingFailed(_) => -3,
            Self::BackgroundImageLoad(_) => -4,
            Self::FrameCreation(_) => -5,
            Self::FrameLock(_) => -6,
            Self::FrameSizeMismatch { .. } => -7,
            Self::LibraryLoad { .. } | Self::MissingEntryPoint(_) | Self::FactoryCreation(_) => -8,
            Self::Configuration(_) | Self::Io(_) => -9,
        }
    }
}

pub type Result<T> = std::result::Result<T, EffectsError>;

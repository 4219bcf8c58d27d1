// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Camera frame processor for the Effects SDK.
//!
//! Wraps each captured BGRA frame in a vendor frame, runs it through the
//! vendor pipeline (background blur, beautification, background replacement)
//! and hands back a red/blue swapped copy for the camera preview.
//!
//! Rust hosts use [`FrameEffectsProcessor`] directly; native hosts load the
//! cdylib and call the `esdk_*` functions in [`ffi`].

pub mod config;
pub mod effects;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod pixels;
pub mod processor;
pub mod sdk;

pub use config::EffectsConfig;
pub use effects::{BackgroundSource, EffectState};
pub use error::{EffectsError, Result};
pub use pixels::Resolution;
pub use processor::FrameEffectsProcessor;

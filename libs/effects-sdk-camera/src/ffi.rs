// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// FFI surface: all public functions are unsafe extern "C" called by the native camera host.
#![allow(clippy::missing_safety_doc)]

//! C ABI for native camera hosts.
//!
//! Functions are prefixed with `esdk_`. The host creates one processor per
//! camera, drives it from its capture thread and destroys it when the camera
//! closes. Fallible functions return `0` on success, `-1` for null or
//! invalid arguments, and [`EffectsError::status_code`] otherwise.

use std::ffi::{c_char, CStr};
use std::path::{Path, PathBuf};

use crate::config::EffectsConfig;
use crate::error::EffectsError;
use crate::logging;
use crate::processor::FrameEffectsProcessor;

/// Opaque processor handle.
pub type EsdkProcessor = FrameEffectsProcessor;

pub const ESDK_OK: i32 = 0;
pub const ESDK_INVALID_ARGUMENT: i32 = -1;

// ============================================================================
// Helpers
// ============================================================================

unsafe fn processor_mut<'a>(processor: *mut EsdkProcessor) -> Option<&'a mut EsdkProcessor> {
    processor.as_mut()
}

unsafe fn path_arg(path: *const c_char) -> Option<PathBuf> {
    if path.is_null() {
        return None;
    }
    match CStr::from_ptr(path).to_str() {
        Ok(path) if !path.is_empty() => Some(PathBuf::from(path)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("[esdk] Path is not valid UTF-8: {}", e);
            None
        }
    }
}

fn status(result: crate::Result<()>) -> i32 {
    match result {
        Ok(()) => ESDK_OK,
        Err(e) => {
            tracing::warn!("[esdk] {}", e);
            e.status_code()
        }
    }
}

/// Config file or directory given by the host; defaults on any failure.
fn resolve_config(config_path: Option<&Path>) -> EffectsConfig {
    match config_path {
        None => EffectsConfig::default().with_env_overrides(),
        Some(dir) if dir.is_dir() => EffectsConfig::load_or_default(dir),
        Some(file) => EffectsConfig::from_file(file).unwrap_or_else(|e: EffectsError| {
            tracing::warn!("[esdk] {}, using defaults", e);
            EffectsConfig::default().with_env_overrides()
        }),
    }
}

// ============================================================================
// C ABI: Processor lifecycle
// ============================================================================

/// Create a processor.
///
/// `config_path` is an `effects_sdk.yaml` file, a directory containing one,
/// or null for defaults. Never returns null: a processor whose SDK failed to
/// load still converts frames. Caller must call `esdk_processor_destroy`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_processor_create(config_path: *const c_char) -> *mut EsdkProcessor {
    logging::init();

    let config = resolve_config(path_arg(config_path).as_deref());
    let processor = FrameEffectsProcessor::new(config);
    tracing::info!(available = processor.is_available(), "[esdk] Processor created");
    Box::into_raw(Box::new(processor))
}

/// Destroy a processor, releasing every vendor object it holds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_processor_destroy(processor: *mut EsdkProcessor) {
    if processor.is_null() {
        return;
    }
    drop(Box::from_raw(processor));
    tracing::debug!("[esdk] Processor destroyed");
}

/// 1 if the effects SDK loaded, 0 otherwise.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_processor_is_available(processor: *const EsdkProcessor) -> i32 {
    match processor.as_ref() {
        Some(processor) => processor.is_available() as i32,
        None => 0,
    }
}

// ============================================================================
// C ABI: Effects
// ============================================================================

#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_set_blur(processor: *mut EsdkProcessor, power: f32) {
    if let Some(processor) = processor_mut(processor) {
        processor.set_blur(power);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_clear_blur(processor: *mut EsdkProcessor) {
    if let Some(processor) = processor_mut(processor) {
        processor.clear_blur();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_set_beautification_level(processor: *mut EsdkProcessor, level: f32) {
    if let Some(processor) = processor_mut(processor) {
        processor.set_beautification_level(level);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_clear_beautification(processor: *mut EsdkProcessor) {
    if let Some(processor) = processor_mut(processor) {
        processor.clear_beautification();
    }
}

/// Replace the background with the image at the UTF-8 `path`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_set_background_image(
    processor: *mut EsdkProcessor,
    path: *const c_char,
) -> i32 {
    let (Some(processor), Some(path)) = (processor_mut(processor), path_arg(path)) else {
        return ESDK_INVALID_ARGUMENT;
    };
    status(processor.set_background_image(path))
}

/// Replace the background with a solid color; bits 24/16/8/0 are B/G/R/A.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_set_background_color(processor: *mut EsdkProcessor, color: i32) -> i32 {
    let Some(processor) = processor_mut(processor) else {
        return ESDK_INVALID_ARGUMENT;
    };
    status(processor.set_background_color(color as u32))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_clear_background(processor: *mut EsdkProcessor) {
    if let Some(processor) = processor_mut(processor) {
        processor.clear_background();
    }
}

/// 1 if blur, beautification or background replacement is on.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_any_effect_active(processor: *const EsdkProcessor) -> i32 {
    match processor.as_ref() {
        Some(processor) => processor.any_effect_active() as i32,
        None => 0,
    }
}

// ============================================================================
// C ABI: Frames
// ============================================================================

#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_update_resolution(
    processor: *mut EsdkProcessor,
    width: u32,
    height: u32,
) {
    if let Some(processor) = processor_mut(processor) {
        processor.update_resolution(width, height);
    }
}

/// Process one tightly packed BGRA frame of `len` bytes.
///
/// On success `*out_ptr`/`*out_len` describe the converted frame. The memory
/// belongs to the processor and stays valid until the next `esdk_process`,
/// `esdk_update_resolution` or `esdk_processor_destroy` call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn esdk_process(
    processor: *mut EsdkProcessor,
    frame: *mut u8,
    len: usize,
    out_ptr: *mut *const u8,
    out_len: *mut usize,
) -> i32 {
    let Some(processor) = processor_mut(processor) else {
        return ESDK_INVALID_ARGUMENT;
    };
    if frame.is_null() || out_ptr.is_null() || out_len.is_null() {
        return ESDK_INVALID_ARGUMENT;
    }

    let camera_frame = std::slice::from_raw_parts_mut(frame, len);
    match processor.process(camera_frame) {
        Ok(output) => {
            *out_ptr = output.as_ptr();
            *out_len = output.len();
            ESDK_OK
        }
        Err(e) => {
            tracing::warn!("[esdk] {}", e);
            e.status_code()
        }
    }
}

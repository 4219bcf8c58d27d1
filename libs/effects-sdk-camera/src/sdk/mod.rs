// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Typed seam between the processor and an effects SDK.
//!
//! Every object handed out through these traits is owned: dropping it hands
//! it back to the SDK. The processor never releases anything by hand.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::path::Path;

pub use effects_sdk_abi::{FrameLock, PipelineErrorCode};

use crate::pixels::Resolution;

pub mod tsvb;

/// Family of types making up one effects SDK.
pub trait EffectsSdk: Sized {
    type Frame: Frame;
    type FrameFactory: FrameFactory<Self>;
    type Pipeline: Pipeline<Self>;
    type Controller: ReplacementController<Self>;
}

/// Entry object of an SDK; only needed until the processor holds its frame
/// factory and pipeline.
pub trait SdkFactory<S: EffectsSdk> {
    fn create_frame_factory(&self) -> Option<S::FrameFactory>;
    fn create_pipeline(&self) -> Option<S::Pipeline>;
}

/// Wraps pixel memory and image files into SDK frames.
pub trait FrameFactory<S: EffectsSdk> {
    /// Wrap a caller-owned BGRA buffer without copying it.
    fn wrap_bgra<'a>(
        &self,
        data: &'a mut [u8],
        stride: usize,
        resolution: Resolution,
    ) -> Option<BorrowedFrame<'a, S::Frame>>;

    /// Build a BGRA frame owning a copy of `data`.
    fn create_bgra(&self, data: &[u8], stride: usize, resolution: Resolution) -> Option<S::Frame>;

    /// Decode an image file into a frame.
    fn load_image(&self, path: &Path) -> Option<S::Frame>;
}

/// A frame owned by the SDK.
pub trait Frame {
    type Locked<'a>: LockedFrameData
    where
        Self: 'a;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Map the frame's pixel memory. `None` if the SDK refuses the lock.
    fn lock(&mut self, access: FrameLock) -> Option<Self::Locked<'_>>;
}

/// Mapped pixel memory of a locked frame.
pub trait LockedFrameData {
    fn bytes_per_line(&self, plane: usize) -> usize;
    fn plane(&self, plane: usize) -> &[u8];
    fn plane_mut(&mut self, plane: usize) -> &mut [u8];
}

/// The SDK's effect chain.
pub trait Pipeline<S: EffectsSdk> {
    fn enable_blur_background(&mut self, power: f32) -> PipelineErrorCode;
    fn disable_background_blur(&mut self);

    fn set_beautification_level(&mut self, level: f32);
    fn enable_beautification(&mut self) -> PipelineErrorCode;
    fn disable_beautification(&mut self);

    /// Turn background replacement on and obtain its controller.
    fn enable_replace_background(&mut self) -> Result<S::Controller, PipelineErrorCode>;
    fn disable_replace_background(&mut self);

    /// Run one frame through every enabled effect.
    fn process(&mut self, input: &S::Frame) -> Result<S::Frame, PipelineErrorCode>;
}

/// Controls the image shown behind the segmented foreground.
pub trait ReplacementController<S: EffectsSdk> {
    fn set_background_image(&mut self, image: &S::Frame);
    fn clear_background_image(&mut self);
}

/// A frame aliasing caller memory; cannot outlive the borrowed buffer.
pub struct BorrowedFrame<'a, F> {
    frame: F,
    _data: PhantomData<&'a mut [u8]>,
}

impl<'a, F> BorrowedFrame<'a, F> {
    /// `frame` must only reference memory that lives for `'a`.
    pub fn new(frame: F) -> Self {
        Self {
            frame,
            _data: PhantomData,
        }
    }
}

impl<F> Deref for BorrowedFrame<'_, F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.frame
    }
}

impl<F> DerefMut for BorrowedFrame<'_, F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.frame
    }
}

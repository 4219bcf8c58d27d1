// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use effects_sdk_abi::{IPipeline, IReplacementController, PipelineError, PipelineErrorCode};

use super::{Tsvb, TsvbFrame, TsvbLibrary, VendorObject};
use crate::sdk::{Pipeline, ReplacementController};

/// Vendor effect pipeline.
#[derive(Debug)]
pub struct TsvbPipeline {
    object: VendorObject<IPipeline>,
}

impl TsvbPipeline {
    /// # Safety
    ///
    /// See [`VendorObject::from_raw`].
    pub(crate) unsafe fn from_raw(ptr: *mut IPipeline, library: &Arc<TsvbLibrary>) -> Option<Self> {
        VendorObject::from_raw(ptr, library).map(|object| Self { object })
    }
}

impl Pipeline<Tsvb> for TsvbPipeline {
    fn enable_blur_background(&mut self, power: f32) -> PipelineErrorCode {
        unsafe { (self.object.vtbl().enable_blur_background)(self.object.as_ptr(), power) }.code()
    }

    fn disable_background_blur(&mut self) {
        unsafe { (self.object.vtbl().disable_background_blur)(self.object.as_ptr()) }
    }

    fn set_beautification_level(&mut self, level: f32) {
        unsafe { (self.object.vtbl().set_beautification_level)(self.object.as_ptr(), level) }
    }

    fn enable_beautification(&mut self) -> PipelineErrorCode {
        unsafe { (self.object.vtbl().enable_beautification)(self.object.as_ptr()) }.code()
    }

    fn disable_beautification(&mut self) {
        unsafe { (self.object.vtbl().disable_beautification)(self.object.as_ptr()) }
    }

    fn enable_replace_background(&mut self) -> Result<TsvbReplacementController, PipelineErrorCode> {
        let mut raw: *mut IReplacementController = std::ptr::null_mut();
        let status = unsafe {
            (self.object.vtbl().enable_replace_background)(self.object.as_ptr(), &mut raw)
        };
        // Owned as soon as it exists so an error path still releases it.
        let controller = unsafe { TsvbReplacementController::from_raw(raw, self.object.library()) };

        if !status.is_ok() {
            return Err(status.code());
        }
        // An ok status without a controller leaves nothing to drive.
        controller.ok_or(PipelineErrorCode::ResourceAllocationError)
    }

    fn disable_replace_background(&mut self) {
        unsafe { (self.object.vtbl().disable_replace_background)(self.object.as_ptr()) }
    }

    fn process(&mut self, input: &TsvbFrame) -> Result<TsvbFrame, PipelineErrorCode> {
        let mut error = PipelineError::OK;
        let raw = unsafe {
            (self.object.vtbl().process)(self.object.as_ptr(), input.as_ptr(), &mut error)
        };
        let output = unsafe { TsvbFrame::from_raw(raw, self.object.library()) };

        if !error.is_ok() {
            return Err(error.code());
        }
        output.ok_or(PipelineErrorCode::ResourceAllocationError)
    }
}

/// Vendor background replacement controller.
#[derive(Debug)]
pub struct TsvbReplacementController {
    object: VendorObject<IReplacementController>,
}

impl TsvbReplacementController {
    /// # Safety
    ///
    /// See [`VendorObject::from_raw`].
    pub(crate) unsafe fn from_raw(
        ptr: *mut IReplacementController,
        library: &Arc<TsvbLibrary>,
    ) -> Option<Self> {
        VendorObject::from_raw(ptr, library).map(|object| Self { object })
    }
}

impl ReplacementController<Tsvb> for TsvbReplacementController {
    fn set_background_image(&mut self, image: &TsvbFrame) {
        unsafe { (self.object.vtbl().set_background_image)(self.object.as_ptr(), image.as_ptr()) }
    }

    fn clear_background_image(&mut self) {
        unsafe { (self.object.vtbl().clear_background_image)(self.object.as_ptr()) }
    }
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use effects_sdk_abi::{FrameLock, IFrame, IFrameFactory, ILockedFrameData};

use super::{Tsvb, TsvbLibrary, VendorObject};
use crate::pixels::Resolution;
use crate::sdk::{BorrowedFrame, Frame, FrameFactory, LockedFrameData};

/// Vendor frame factory.
#[derive(Debug)]
pub struct TsvbFrameFactory {
    object: VendorObject<IFrameFactory>,
}

impl TsvbFrameFactory {
    /// # Safety
    ///
    /// See [`VendorObject::from_raw`].
    pub(crate) unsafe fn from_raw(ptr: *mut IFrameFactory, library: &Arc<TsvbLibrary>) -> Option<Self> {
        VendorObject::from_raw(ptr, library).map(|object| Self { object })
    }

    fn create_bgra_raw(
        &self,
        data: *mut u8,
        stride: usize,
        resolution: Resolution,
        make_copy: bool,
    ) -> Option<TsvbFrame> {
        let stride = u32::try_from(stride).ok()?;
        let raw = unsafe {
            (self.object.vtbl().create_bgra)(
                self.object.as_ptr(),
                data.cast::<c_void>(),
                stride,
                resolution.width,
                resolution.height,
                make_copy,
            )
        };
        unsafe { TsvbFrame::from_raw(raw, self.object.library()) }
    }
}

impl FrameFactory<Tsvb> for TsvbFrameFactory {
    fn wrap_bgra<'a>(
        &self,
        data: &'a mut [u8],
        stride: usize,
        resolution: Resolution,
    ) -> Option<BorrowedFrame<'a, TsvbFrame>> {
        if data.len() < stride * resolution.height as usize {
            return None;
        }
        // No copy: the frame aliases `data`, hence the borrow.
        self.create_bgra_raw(data.as_mut_ptr(), stride, resolution, false)
            .map(BorrowedFrame::new)
    }

    fn create_bgra(&self, data: &[u8], stride: usize, resolution: Resolution) -> Option<TsvbFrame> {
        if data.len() < stride * resolution.height as usize {
            return None;
        }
        // With make_copy the vendor only reads `data` during the call.
        self.create_bgra_raw(data.as_ptr().cast_mut(), stride, resolution, true)
    }

    fn load_image(&self, path: &Path) -> Option<TsvbFrame> {
        let Some(utf8) = path.to_str() else {
            tracing::warn!("Background image path is not valid UTF-8: {}", path.display());
            return None;
        };
        let c_path = match CString::new(utf8) {
            Ok(c_path) => c_path,
            Err(e) => {
                tracing::warn!("Background image path contains a NUL byte: {}", e);
                return None;
            }
        };

        let raw = unsafe { (self.object.vtbl().load_image)(self.object.as_ptr(), c_path.as_ptr()) };
        unsafe { TsvbFrame::from_raw(raw, self.object.library()) }
    }
}

/// Vendor frame.
#[derive(Debug)]
pub struct TsvbFrame {
    object: VendorObject<IFrame>,
}

impl TsvbFrame {
    /// # Safety
    ///
    /// See [`VendorObject::from_raw`].
    pub(crate) unsafe fn from_raw(ptr: *mut IFrame, library: &Arc<TsvbLibrary>) -> Option<Self> {
        VendorObject::from_raw(ptr, library).map(|object| Self { object })
    }

    pub(crate) fn as_ptr(&self) -> *mut IFrame {
        self.object.as_ptr()
    }
}

impl Frame for TsvbFrame {
    type Locked<'a> = TsvbLockedFrame<'a>;

    fn width(&self) -> u32 {
        unsafe { (self.object.vtbl().width)(self.object.as_ptr()) }
    }

    fn height(&self) -> u32 {
        unsafe { (self.object.vtbl().height)(self.object.as_ptr()) }
    }

    fn lock(&mut self, access: FrameLock) -> Option<TsvbLockedFrame<'_>> {
        let rows = self.height() as usize;
        let raw = unsafe { (self.object.vtbl().lock)(self.object.as_ptr(), access) };
        let object = unsafe { VendorObject::from_raw(raw, self.object.library()) }?;

        Some(TsvbLockedFrame {
            object,
            rows,
            _frame: PhantomData,
        })
    }
}

/// Mapped pixel memory of a [`TsvbFrame`]; the frame stays borrowed until
/// the lock is released.
///
/// Planes are assumed to span `bytes_per_line * height` bytes, which holds
/// for the packed BGRA/RGBA frames this crate creates.
#[derive(Debug)]
pub struct TsvbLockedFrame<'a> {
    object: VendorObject<ILockedFrameData>,
    rows: usize,
    _frame: PhantomData<&'a mut TsvbFrame>,
}

impl TsvbLockedFrame<'_> {
    fn plane_ptr(&self, plane: usize) -> Option<(*mut u8, usize)> {
        let index = i32::try_from(plane).ok()?;
        let ptr = unsafe { (self.object.vtbl().data_pointer)(self.object.as_ptr(), index) };
        if ptr.is_null() {
            return None;
        }
        Some((ptr.cast::<u8>(), self.bytes_per_line(plane) * self.rows))
    }
}

impl LockedFrameData for TsvbLockedFrame<'_> {
    fn bytes_per_line(&self, plane: usize) -> usize {
        let Ok(index) = i32::try_from(plane) else {
            return 0;
        };
        let bytes = unsafe { (self.object.vtbl().bytes_per_line)(self.object.as_ptr(), index) };
        usize::try_from(bytes).unwrap_or(0)
    }

    fn plane(&self, plane: usize) -> &[u8] {
        match self.plane_ptr(plane) {
            // Safety: the vendor keeps the plane mapped while the lock lives.
            Some((ptr, len)) => unsafe { std::slice::from_raw_parts(ptr, len) },
            None => &[],
        }
    }

    fn plane_mut(&mut self, plane: usize) -> &mut [u8] {
        match self.plane_ptr(plane) {
            // Safety: as above; `&mut self` makes the view exclusive.
            Some((ptr, len)) => unsafe { std::slice::from_raw_parts_mut(ptr, len) },
            None => &mut [],
        }
    }
}

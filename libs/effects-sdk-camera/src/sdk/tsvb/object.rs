// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Owned vendor object handle.

use std::ptr::NonNull;
use std::sync::Arc;

use effects_sdk_abi::Interface;

use super::TsvbLibrary;

/// A vendor object with exactly one owner.
///
/// Non-null by construction; `release()` is called exactly once, from
/// `Drop`. Holds the library so vendor code stays mapped until the last
/// object is gone.
///
/// Raw vendor pointers carry no thread-safety guarantee, so this type is
/// neither `Send` nor `Sync`.
pub(crate) struct VendorObject<T: Interface> {
    ptr: NonNull<T>,
    library: Arc<TsvbLibrary>,
}

impl<T: Interface> VendorObject<T> {
    /// Take ownership of a pointer returned by the vendor. `None` for null.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a live `T` owned by the caller (not released
    /// and not owned by any other `VendorObject`), created by `library`.
    pub(crate) unsafe fn from_raw(ptr: *mut T, library: &Arc<TsvbLibrary>) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            ptr,
            library: Arc::clone(library),
        })
    }

    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub(crate) fn vtbl(&self) -> &T::Vtbl {
        // Safety: `ptr` is live until drop and vendor vtables are static.
        unsafe { &*T::vtbl(self.ptr.as_ptr()) }
    }

    pub(crate) fn library(&self) -> &Arc<TsvbLibrary> {
        &self.library
    }
}

impl<T: Interface> Drop for VendorObject<T> {
    fn drop(&mut self) {
        // Safety: sole owner, never used after this point.
        unsafe { T::release(self.ptr.as_ptr()) }
    }
}

impl<T: Interface> std::fmt::Debug for VendorObject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorObject")
            .field("type", &std::any::type_name::<T>())
            .field("ptr", &self.ptr)
            .finish()
    }
}

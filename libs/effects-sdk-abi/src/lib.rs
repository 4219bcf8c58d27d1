// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! ABI mirrors of the Effects SDK (`tsvb`) C++ interfaces.
//!
//! The vendor library exports a single C entry point, `createSDKFactory`,
//! returning an object whose methods are C++ virtual functions. Every
//! interface here is laid out the way the compiler lays out a class with
//! only pure virtual methods and no data members: a single pointer to a
//! table of function pointers, with base-class slots first.
//!
//! ```text
//! ISdkFactory ──createFrameFactory()──► IFrameFactory ──createBGRA()/loadImage()──► IFrame
//!             └─createPipeline()──────► IPipeline ──process()──────────────────────► IFrame
//!                                                 └─enableReplaceBackground()──────► IReplacementController
//! IFrame ──lock()──► ILockedFrameData
//! ```
//!
//! Every object returned by the vendor is owned by the caller and must be
//! handed back through its `release` slot exactly once. This crate only
//! describes the layout; ownership is enforced by `effects-sdk-camera`.
//!
//! Virtual calls use the platform C calling convention. That matches the
//! MSVC x64 and Itanium (Linux, macOS) ABIs; 32-bit Windows would need
//! `thiscall` and is not supported.

use std::ffi::{c_char, c_void};

#[cfg(all(windows, target_arch = "x86"))]
compile_error!("the Effects SDK vtable mirrors assume the x64 calling convention");

/// Name of the factory entry point exported by the vendor library.
pub const CREATE_SDK_FACTORY_SYMBOL: &[u8] = b"createSDKFactory\0";

/// File name of the vendor library when no explicit path is configured.
#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY_NAME: &str = "tsvb.dll";
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAME: &str = "libtsvb.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_LIBRARY_NAME: &str = "libtsvb.so";

/// Signature of [`CREATE_SDK_FACTORY_SYMBOL`].
pub type CreateSdkFactoryFn = unsafe extern "C" fn() -> *mut ISdkFactory;

// ============================================================================
// Status codes and enums
// ============================================================================

/// Raw status reported by pipeline calls.
///
/// Kept as a transparent `i32` so an unexpected value coming back from the
/// vendor is still a valid Rust value. Convert with [`PipelineError::code`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineError(pub i32);

impl PipelineError {
    pub const OK: Self = Self(0);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    pub fn code(self) -> PipelineErrorCode {
        PipelineErrorCode::from(self)
    }
}

/// Typed view of [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorCode {
    Ok,
    InvalidArgument,
    NoFeaturesEnabled,
    EngineInitializationError,
    ResourceAllocationError,
    Unknown(i32),
}

impl From<PipelineError> for PipelineErrorCode {
    fn from(raw: PipelineError) -> Self {
        match raw.0 {
            0 => Self::Ok,
            1 => Self::InvalidArgument,
            2 => Self::NoFeaturesEnabled,
            3 => Self::EngineInitializationError,
            4 => Self::ResourceAllocationError,
            other => Self::Unknown(other),
        }
    }
}

impl From<PipelineErrorCode> for PipelineError {
    fn from(code: PipelineErrorCode) -> Self {
        match code {
            PipelineErrorCode::Ok => Self(0),
            PipelineErrorCode::InvalidArgument => Self(1),
            PipelineErrorCode::NoFeaturesEnabled => Self(2),
            PipelineErrorCode::EngineInitializationError => Self(3),
            PipelineErrorCode::ResourceAllocationError => Self(4),
            PipelineErrorCode::Unknown(other) => Self(other),
        }
    }
}

impl std::fmt::Display for PipelineErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::NoFeaturesEnabled => write!(f, "no features enabled"),
            Self::EngineInitializationError => write!(f, "engine initialization error"),
            Self::ResourceAllocationError => write!(f, "resource allocation error"),
            Self::Unknown(code) => write!(f, "unknown status {}", code),
        }
    }
}

/// Access mode requested when locking a frame's pixel memory.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLock {
    Read = 1,
    Write = 2,
    ReadWrite = 3,
}

/// Raw pixel layout reported by `IFrame::frameFormat`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat(pub i32);

impl FrameFormat {
    pub const RGBA32: Self = Self(1);
    pub const BGRA32: Self = Self(2);
    pub const NV12: Self = Self(3);
}

// ============================================================================
// Interfaces
// ============================================================================

/// Implemented by every vendor interface mirror.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` structs whose only field is a pointer to
/// a vtable that starts with [`IReleaseVtbl`].
pub unsafe trait Interface {
    type Vtbl;

    /// Read the object's vtable pointer.
    ///
    /// # Safety
    ///
    /// `this` must point to a live object obtained from the vendor.
    unsafe fn vtbl(this: *const Self) -> *const Self::Vtbl;

    /// Hand the object back to the vendor.
    ///
    /// # Safety
    ///
    /// `this` must be a live object obtained from the vendor and must not be
    /// used afterwards.
    unsafe fn release(this: *mut Self) {
        let base = this.cast::<IRelease>();
        ((*(*base).vtbl).release)(base)
    }
}

/// Root of the vendor hierarchy.
#[repr(C)]
pub struct IRelease {
    pub vtbl: *const IReleaseVtbl,
}

#[repr(C)]
pub struct IReleaseVtbl {
    pub release: unsafe extern "C" fn(this: *mut IRelease),
}

/// Factory returned by `createSDKFactory`.
#[repr(C)]
pub struct ISdkFactory {
    pub vtbl: *const ISdkFactoryVtbl,
}

#[repr(C)]
pub struct ISdkFactoryVtbl {
    pub base: IReleaseVtbl,
    pub create_frame_factory: unsafe extern "C" fn(this: *mut ISdkFactory) -> *mut IFrameFactory,
    pub create_pipeline: unsafe extern "C" fn(this: *mut ISdkFactory) -> *mut IPipeline,
}

/// Wraps raw pixel memory (or an image file) into [`IFrame`] objects.
#[repr(C)]
pub struct IFrameFactory {
    pub vtbl: *const IFrameFactoryVtbl,
}

#[repr(C)]
pub struct IFrameFactoryVtbl {
    pub base: IReleaseVtbl,
    pub create_rgba: unsafe extern "C" fn(
        this: *mut IFrameFactory,
        data: *mut c_void,
        bytes_per_line: u32,
        width: u32,
        height: u32,
        make_copy: bool,
    ) -> *mut IFrame,
    pub create_bgra: unsafe extern "C" fn(
        this: *mut IFrameFactory,
        data: *mut c_void,
        bytes_per_line: u32,
        width: u32,
        height: u32,
        make_copy: bool,
    ) -> *mut IFrame,
    pub load_image:
        unsafe extern "C" fn(this: *mut IFrameFactory, utf8_path: *const c_char) -> *mut IFrame,
}

/// A single video frame owned by the vendor.
#[repr(C)]
pub struct IFrame {
    pub vtbl: *const IFrameVtbl,
}

#[repr(C)]
pub struct IFrameVtbl {
    pub base: IReleaseVtbl,
    pub width: unsafe extern "C" fn(this: *const IFrame) -> u32,
    pub height: unsafe extern "C" fn(this: *const IFrame) -> u32,
    pub frame_format: unsafe extern "C" fn(this: *const IFrame) -> FrameFormat,
    pub lock: unsafe extern "C" fn(this: *mut IFrame, access: FrameLock) -> *mut ILockedFrameData,
}

/// Direct view on a frame's pixel planes, valid until released.
#[repr(C)]
pub struct ILockedFrameData {
    pub vtbl: *const ILockedFrameDataVtbl,
}

#[repr(C)]
pub struct ILockedFrameDataVtbl {
    pub base: IReleaseVtbl,
    pub data_pointer: unsafe extern "C" fn(this: *mut ILockedFrameData, plane: i32) -> *mut c_void,
    pub bytes_per_line: unsafe extern "C" fn(this: *const ILockedFrameData, plane: i32) -> i32,
}

/// Controls the image used by background replacement.
#[repr(C)]
pub struct IReplacementController {
    pub vtbl: *const IReplacementControllerVtbl,
}

#[repr(C)]
pub struct IReplacementControllerVtbl {
    pub base: IReleaseVtbl,
    pub set_background_image:
        unsafe extern "C" fn(this: *mut IReplacementController, image: *const IFrame),
    pub clear_background_image: unsafe extern "C" fn(this: *mut IReplacementController),
}

/// The active effect chain.
#[repr(C)]
pub struct IPipeline {
    pub vtbl: *const IPipelineVtbl,
}

#[repr(C)]
pub struct IPipelineVtbl {
    pub base: IReleaseVtbl,
    pub enable_blur_background: unsafe extern "C" fn(this: *mut IPipeline, power: f32) -> PipelineError,
    pub disable_background_blur: unsafe extern "C" fn(this: *mut IPipeline),
    pub enable_replace_background: unsafe extern "C" fn(
        this: *mut IPipeline,
        controller: *mut *mut IReplacementController,
    ) -> PipelineError,
    pub disable_replace_background: unsafe extern "C" fn(this: *mut IPipeline),
    pub enable_beautification: unsafe extern "C" fn(this: *mut IPipeline) -> PipelineError,
    pub disable_beautification: unsafe extern "C" fn(this: *mut IPipeline),
    pub set_beautification_level: unsafe extern "C" fn(this: *mut IPipeline, level: f32),
    pub process: unsafe extern "C" fn(
        this: *mut IPipeline,
        input: *const IFrame,
        error: *mut PipelineError,
    ) -> *mut IFrame,
}

macro_rules! interface {
    ($($iface:ty => $vtbl:ty),* $(,)?) => {
        $(
            unsafe impl Interface for $iface {
                type Vtbl = $vtbl;

                unsafe fn vtbl(this: *const Self) -> *const $vtbl {
                    (*this).vtbl
                }
            }
        )*
    };
}

interface! {
    IRelease => IReleaseVtbl,
    ISdkFactory => ISdkFactoryVtbl,
    IFrameFactory => IFrameFactoryVtbl,
    IFrame => IFrameVtbl,
    ILockedFrameData => ILockedFrameDataVtbl,
    IReplacementController => IReplacementControllerVtbl,
    IPipeline => IPipelineVtbl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_known_codes() {
        assert!(PipelineError(0).is_ok());
        assert_eq!(PipelineError(1).code(), PipelineErrorCode::InvalidArgument);
        assert_eq!(PipelineError(2).code(), PipelineErrorCode::NoFeaturesEnabled);
        assert_eq!(PipelineError(4).code(), PipelineErrorCode::ResourceAllocationError);
    }

    #[test]
    fn test_pipeline_error_unknown_code_is_preserved() {
        let code = PipelineError(42).code();
        assert_eq!(code, PipelineErrorCode::Unknown(42));
        assert_eq!(PipelineError::from(code), PipelineError(42));
        assert_eq!(code.to_string(), "unknown status 42");
    }

    #[test]
    fn test_interfaces_are_a_single_pointer() {
        let ptr = std::mem::size_of::<*const c_void>();
        assert_eq!(std::mem::size_of::<IFrame>(), ptr);
        assert_eq!(std::mem::size_of::<IPipeline>(), ptr);
        assert_eq!(std::mem::size_of::<ILockedFrameData>(), ptr);
    }

    #[test]
    fn test_derived_vtables_start_with_release() {
        assert_eq!(std::mem::offset_of!(IPipelineVtbl, base), 0);
        assert_eq!(std::mem::offset_of!(IFrameVtbl, base), 0);
        assert_eq!(std::mem::offset_of!(IFrameFactoryVtbl, base), 0);
    }
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Binding to the vendor effects library (`tsvb`).
//!
//! Loads the library at runtime, resolves `createSDKFactory` and wraps every
//! vendor pointer in an owned [`VendorObject`]. Nothing here keeps state
//! beyond the objects themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use effects_sdk_abi::{CreateSdkFactoryFn, ISdkFactory, CREATE_SDK_FACTORY_SYMBOL};
use libloading::Library;

use crate::error::{EffectsError, Result};

use super::{EffectsSdk, SdkFactory};

mod frame;
mod object;
mod pipeline;

#[cfg(test)]
pub(crate) mod fake;

pub use frame::{TsvbFrame, TsvbFrameFactory, TsvbLockedFrame};
pub use pipeline::{TsvbPipeline, TsvbReplacementController};

pub(crate) use object::VendorObject;

/// The vendor SDK type family.
#[derive(Debug)]
pub struct Tsvb;

impl EffectsSdk for Tsvb {
    type Frame = TsvbFrame;
    type FrameFactory = TsvbFrameFactory;
    type Pipeline = TsvbPipeline;
    type Controller = TsvbReplacementController;
}

/// The loaded vendor library.
///
/// Shared by every vendor object; unloaded when the last one is released.
pub struct TsvbLibrary {
    library: Library,
    path: PathBuf,
}

impl TsvbLibrary {
    /// Load the library at `path`.
    ///
    /// When `path` has a directory component that directory is searched for
    /// the vendor library's own dependencies, so the SDK can ship next to
    /// its runtime libraries outside the host's search path.
    pub fn load(path: &Path) -> Result<Arc<Self>> {
        let library = unsafe { open_library(path) }.map_err(|source| EffectsError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Loaded effects library {}", path.display());
        Ok(Arc::new(Self {
            library,
            path: path.to_path_buf(),
        }))
    }

    /// Handle of the running executable. Lets vendor objects that were not
    /// produced by a separately loaded library be owned the same way.
    #[cfg(test)]
    pub(crate) fn current_process() -> Arc<Self> {
        #[cfg(unix)]
        let library: Library = libloading::os::unix::Library::this().into();
        #[cfg(windows)]
        let library: Library = libloading::os::windows::Library::this()
            .expect("current process handle")
            .into();

        Arc::new(Self {
            library,
            path: PathBuf::from("<current process>"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `createSDKFactory` and call it.
    pub fn create_sdk_factory(self: &Arc<Self>) -> Result<TsvbSdkFactory> {
        let create: CreateSdkFactoryFn = unsafe {
            let symbol = self
                .library
                .get::<CreateSdkFactoryFn>(CREATE_SDK_FACTORY_SYMBOL)
                .map_err(|e| {
                    EffectsError::MissingEntryPoint(format!(
                        "createSDKFactory in {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
            *symbol
        };

        let raw = unsafe { create() };
        // Safety: the factory is returned owned by the caller.
        let factory = unsafe { TsvbSdkFactory::from_raw(raw, self) }.ok_or_else(|| {
            EffectsError::FactoryCreation(format!(
                "createSDKFactory in {} returned null",
                self.path.display()
            ))
        })?;

        tracing::debug!("Created SDK factory from {}", self.path.display());
        Ok(factory)
    }
}

impl std::fmt::Debug for TsvbLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsvbLibrary")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(windows)]
unsafe fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    use libloading::os::windows::{
        Library as WindowsLibrary, LOAD_LIBRARY_SEARCH_DEFAULT_DIRS,
        LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR,
    };

    match library_directory(path) {
        // LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR needs an absolute path.
        Some(_) => {
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            };
            WindowsLibrary::load_with_flags(
                &absolute,
                LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR | LOAD_LIBRARY_SEARCH_DEFAULT_DIRS,
            )
            .map(Into::into)
        }
        None => Library::new(path),
    }
}

// The dynamic loader resolves the vendor library's dependencies through its
// own RPATH/RUNPATH; nothing to add for the directory.
#[cfg(not(windows))]
unsafe fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    Library::new(path)
}

/// Directory component of `path`, if it has a non-empty one.
#[cfg_attr(not(windows), allow(dead_code))]
fn library_directory(path: &Path) -> Option<&Path> {
    path.parent().filter(|dir| !dir.as_os_str().is_empty())
}

/// Entry object returned by `createSDKFactory`.
#[derive(Debug)]
pub struct TsvbSdkFactory {
    object: VendorObject<ISdkFactory>,
}

impl TsvbSdkFactory {
    /// # Safety
    ///
    /// See [`VendorObject::from_raw`].
    pub(crate) unsafe fn from_raw(ptr: *mut ISdkFactory, library: &Arc<TsvbLibrary>) -> Option<Self> {
        VendorObject::from_raw(ptr, library).map(|object| Self { object })
    }
}

impl SdkFactory<Tsvb> for TsvbSdkFactory {
    fn create_frame_factory(&self) -> Option<TsvbFrameFactory> {
        let raw = unsafe { (self.object.vtbl().create_frame_factory)(self.object.as_ptr()) };
        unsafe { TsvbFrameFactory::from_raw(raw, self.object.library()) }
    }

    fn create_pipeline(&self) -> Option<TsvbPipeline> {
        let raw = unsafe { (self.object.vtbl().create_pipeline)(self.object.as_ptr()) };
        unsafe { TsvbPipeline::from_raw(raw, self.object.library()) }
    }
}

/// Load the vendor library and return its SDK factory.
pub fn load(path: &Path) -> Result<TsvbSdkFactory> {
    TsvbLibrary::load(path)?.create_sdk_factory()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_directory() {
        assert_eq!(library_directory(Path::new("tsvb.dll")), None);
        assert_eq!(
            library_directory(Path::new("plugins/effects/tsvb.dll")),
            Some(Path::new("plugins/effects"))
        );
    }

    #[test]
    fn test_load_missing_library_fails() {
        let err = load(Path::new("/nonexistent/effects/libtsvb-missing.so")).unwrap_err();
        assert!(matches!(err, EffectsError::LibraryLoad { .. }));
        assert!(err.to_string().contains("libtsvb-missing"));
    }

    #[test]
    fn test_current_process_has_no_entry_point() {
        let library = TsvbLibrary::current_process();
        let err = library.create_sdk_factory().unwrap_err();
        assert!(matches!(err, EffectsError::MissingEntryPoint(_)));
    }

    #[test]
    fn test_factory_creates_frame_factory_and_pipeline() {
        let vendor = fake::FakeVendor::new();
        let library = TsvbLibrary::current_process();
        let factory = unsafe { TsvbSdkFactory::from_raw(vendor.sdk_factory(), &library) }.unwrap();

        let frame_factory = factory.create_frame_factory();
        let pipeline = factory.create_pipeline();
        assert!(frame_factory.is_some());
        assert!(pipeline.is_some());

        drop(factory);
        assert_eq!(vendor.live_objects(), 2);

        drop(frame_factory);
        drop(pipeline);
        assert_eq!(vendor.live_objects(), 0);
    }
}

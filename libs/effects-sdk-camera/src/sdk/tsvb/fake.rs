// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! In-process stand-in for the vendor library, built from the same vtable
//! layouts, so the binding can be exercised without the real SDK.
//!
//! Objects are never freed: `release` only marks them, so a second release
//! is counted instead of being undefined behaviour.

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_void, CStr};
use std::rc::Rc;

use effects_sdk_abi::{
    FrameFormat, FrameLock, IFrame, IFrameFactory, IFrameFactoryVtbl, IFrameVtbl,
    ILockedFrameData, ILockedFrameDataVtbl, IPipeline, IPipelineVtbl, IRelease, IReleaseVtbl,
    IReplacementController, IReplacementControllerVtbl, ISdkFactory, ISdkFactoryVtbl,
    PipelineError,
};

#[derive(Default)]
struct FakeState {
    live: Cell<isize>,
    double_releases: Cell<usize>,
    process_status: Cell<i32>,
    replace_status: Cell<i32>,
    blur: Cell<Option<f32>>,
    beautification_level: Cell<f32>,
    beautification_on: Cell<bool>,
    replace_enabled: Cell<bool>,
    background: RefCell<Option<(u32, u32, Vec<u8>)>>,
}

/// Handle used by tests to create vendor objects and observe vendor calls.
pub(crate) struct FakeVendor {
    state: Rc<FakeState>,
}

impl FakeVendor {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(FakeState::default()),
        }
    }

    /// A fresh `ISdkFactory`, owned by the caller.
    pub(crate) fn sdk_factory(&self) -> *mut ISdkFactory {
        alloc(&self.state, |header| FakeSdkFactory {
            vtbl: &SDK_FACTORY_VTBL,
            header,
        })
        .cast()
    }

    pub(crate) fn live_objects(&self) -> isize {
        self.state.live.get()
    }

    pub(crate) fn double_releases(&self) -> usize {
        self.state.double_releases.get()
    }

    pub(crate) fn set_process_status(&self, status: PipelineError) {
        self.state.process_status.set(status.0);
    }

    pub(crate) fn set_replace_status(&self, status: PipelineError) {
        self.state.replace_status.set(status.0);
    }

    pub(crate) fn blur_power(&self) -> Option<f32> {
        self.state.blur.get()
    }

    pub(crate) fn beautification_level(&self) -> Option<f32> {
        self.state
            .beautification_on
            .get()
            .then(|| self.state.beautification_level.get())
    }

    pub(crate) fn replace_enabled(&self) -> bool {
        self.state.replace_enabled.get()
    }

    pub(crate) fn has_background_image(&self) -> bool {
        self.state.background.borrow().is_some()
    }

    /// Size and packed pixels of the frame last assigned as background.
    pub(crate) fn background_pixels(&self) -> Option<(u32, u32, Vec<u8>)> {
        self.state.background.borrow().clone()
    }
}

// ============================================================================
// Objects
// ============================================================================

struct Header {
    state: Rc<FakeState>,
    released: Cell<bool>,
}

trait FakeObject {
    fn header(&self) -> &Header;
}

fn alloc<T>(state: &Rc<FakeState>, build: impl FnOnce(Header) -> T) -> *mut T {
    state.live.set(state.live.get() + 1);
    Box::into_raw(Box::new(build(Header {
        state: Rc::clone(state),
        released: Cell::new(false),
    })))
}

unsafe fn object<'a, T, P>(this: *const P) -> &'a T {
    &*this.cast::<T>()
}

unsafe extern "C" fn release<T: FakeObject>(this: *mut IRelease) {
    let header = object::<T, _>(this).header();
    if header.released.replace(true) {
        header.state.double_releases.set(header.state.double_releases.get() + 1);
    } else {
        header.state.live.set(header.state.live.get() - 1);
    }
}

macro_rules! fake_object {
    ($($name:ident),*) => {
        $(
            impl FakeObject for $name {
                fn header(&self) -> &Header {
                    &self.header
                }
            }
        )*
    };
}

#[repr(C)]
struct FakeSdkFactory {
    vtbl: *const ISdkFactoryVtbl,
    header: Header,
}

#[repr(C)]
struct FakeFrameFactory {
    vtbl: *const IFrameFactoryVtbl,
    header: Header,
}

#[repr(C)]
struct FakeFrame {
    vtbl: *const IFrameVtbl,
    header: Header,
    width: u32,
    height: u32,
    stride: u32,
    data: *mut u8,
    _owned: Vec<u8>,
}

#[repr(C)]
struct FakeLocked {
    vtbl: *const ILockedFrameDataVtbl,
    header: Header,
    data: *mut u8,
    stride: u32,
}

#[repr(C)]
struct FakePipeline {
    vtbl: *const IPipelineVtbl,
    header: Header,
}

#[repr(C)]
struct FakeController {
    vtbl: *const IReplacementControllerVtbl,
    header: Header,
}

fake_object!(FakeSdkFactory, FakeFrameFactory, FakeFrame, FakeLocked, FakePipeline, FakeController);

fn new_frame(
    state: &Rc<FakeState>,
    data: *mut u8,
    stride: u32,
    width: u32,
    height: u32,
    make_copy: bool,
) -> *mut IFrame {
    let len = stride as usize * height as usize;
    let mut owned = if make_copy {
        unsafe { std::slice::from_raw_parts(data, len) }.to_vec()
    } else {
        Vec::new()
    };
    let data = if make_copy { owned.as_mut_ptr() } else { data };

    alloc(state, |header| FakeFrame {
        vtbl: &FRAME_VTBL,
        header,
        width,
        height,
        stride,
        data,
        _owned: owned,
    })
    .cast()
}

// ============================================================================
// ISdkFactory
// ============================================================================

unsafe extern "C" fn create_frame_factory(this: *mut ISdkFactory) -> *mut IFrameFactory {
    let state = &object::<FakeSdkFactory, _>(this).header.state;
    alloc(state, |header| FakeFrameFactory {
        vtbl: &FRAME_FACTORY_VTBL,
        header,
    })
    .cast()
}

unsafe extern "C" fn create_pipeline(this: *mut ISdkFactory) -> *mut IPipeline {
    let state = &object::<FakeSdkFactory, _>(this).header.state;
    alloc(state, |header| FakePipeline {
        vtbl: &PIPELINE_VTBL,
        header,
    })
    .cast()
}

static SDK_FACTORY_VTBL: ISdkFactoryVtbl = ISdkFactoryVtbl {
    base: IReleaseVtbl {
        release: release::<FakeSdkFactory>,
    },
    create_frame_factory,
    create_pipeline,
};

// ============================================================================
// IFrameFactory
// ============================================================================

unsafe extern "C" fn create_packed(
    this: *mut IFrameFactory,
    data: *mut c_void,
    bytes_per_line: u32,
    width: u32,
    height: u32,
    make_copy: bool,
) -> *mut IFrame {
    let state = &object::<FakeFrameFactory, _>(this).header.state;
    new_frame(state, data.cast(), bytes_per_line, width, height, make_copy)
}

/// Paths starting with `missing` fail to load; anything else decodes to an
/// opaque 2x1 image.
unsafe extern "C" fn load_image(this: *mut IFrameFactory, utf8_path: *const c_char) -> *mut IFrame {
    let state = &object::<FakeFrameFactory, _>(this).header.state;
    let path = CStr::from_ptr(utf8_path).to_string_lossy();
    if path.starts_with("missing") {
        return std::ptr::null_mut();
    }
    let mut pixels = [0u8, 0, 0, 255, 0, 0, 0, 255];
    new_frame(state, pixels.as_mut_ptr(), 8, 2, 1, true)
}

static FRAME_FACTORY_VTBL: IFrameFactoryVtbl = IFrameFactoryVtbl {
    base: IReleaseVtbl {
        release: release::<FakeFrameFactory>,
    },
    create_rgba: create_packed,
    create_bgra: create_packed,
    load_image,
};

// ============================================================================
// IFrame / ILockedFrameData
// ============================================================================

unsafe extern "C" fn frame_width(this: *const IFrame) -> u32 {
    object::<FakeFrame, _>(this).width
}

unsafe extern "C" fn frame_height(this: *const IFrame) -> u32 {
    object::<FakeFrame, _>(this).height
}

unsafe extern "C" fn frame_format(_this: *const IFrame) -> FrameFormat {
    FrameFormat::BGRA32
}

unsafe extern "C" fn frame_lock(this: *mut IFrame, _access: FrameLock) -> *mut ILockedFrameData {
    let frame = object::<FakeFrame, _>(this);
    alloc(&frame.header.state, |header| FakeLocked {
        vtbl: &LOCKED_VTBL,
        header,
        data: frame.data,
        stride: frame.stride,
    })
    .cast()
}

static FRAME_VTBL: IFrameVtbl = IFrameVtbl {
    base: IReleaseVtbl {
        release: release::<FakeFrame>,
    },
    width: frame_width,
    height: frame_height,
    frame_format,
    lock: frame_lock,
};

unsafe extern "C" fn data_pointer(this: *mut ILockedFrameData, plane: i32) -> *mut c_void {
    match plane {
        0 => object::<FakeLocked, _>(this).data.cast(),
        _ => std::ptr::null_mut(),
    }
}

unsafe extern "C" fn bytes_per_line(this: *const ILockedFrameData, _plane: i32) -> i32 {
    object::<FakeLocked, _>(this).stride as i32
}

static LOCKED_VTBL: ILockedFrameDataVtbl = ILockedFrameDataVtbl {
    base: IReleaseVtbl {
        release: release::<FakeLocked>,
    },
    data_pointer,
    bytes_per_line,
};

// ============================================================================
// IPipeline
// ============================================================================

fn pipeline_state<'a>(this: *const IPipeline) -> &'a FakeState {
    unsafe { &object::<FakePipeline, _>(this).header.state }
}

unsafe extern "C" fn enable_blur_background(this: *mut IPipeline, power: f32) -> PipelineError {
    pipeline_state(this).blur.set(Some(power));
    PipelineError::OK
}

unsafe extern "C" fn disable_background_blur(this: *mut IPipeline) {
    pipeline_state(this).blur.set(None);
}

unsafe extern "C" fn enable_replace_background(
    this: *mut IPipeline,
    controller: *mut *mut IReplacementController,
) -> PipelineError {
    let pipeline = object::<FakePipeline, _>(this);
    let status = PipelineError(pipeline.header.state.replace_status.get());
    if !status.is_ok() {
        return status;
    }

    pipeline.header.state.replace_enabled.set(true);
    *controller = alloc(&pipeline.header.state, |header| FakeController {
        vtbl: &CONTROLLER_VTBL,
        header,
    })
    .cast();
    PipelineError::OK
}

unsafe extern "C" fn disable_replace_background(this: *mut IPipeline) {
    pipeline_state(this).replace_enabled.set(false);
}

unsafe extern "C" fn enable_beautification(this: *mut IPipeline) -> PipelineError {
    pipeline_state(this).beautification_on.set(true);
    PipelineError::OK
}

unsafe extern "C" fn disable_beautification(this: *mut IPipeline) {
    pipeline_state(this).beautification_on.set(false);
}

unsafe extern "C" fn set_beautification_level(this: *mut IPipeline, level: f32) {
    pipeline_state(this).beautification_level.set(level);
}

/// Copies the input unchanged. An output frame is produced even when the
/// configured status is an error, as the vendor is allowed to do.
unsafe extern "C" fn process(
    this: *mut IPipeline,
    input: *const IFrame,
    error: *mut PipelineError,
) -> *mut IFrame {
    let pipeline = object::<FakePipeline, _>(this);
    let input = object::<FakeFrame, _>(input);
    *error = PipelineError(pipeline.header.state.process_status.get());
    new_frame(
        &pipeline.header.state,
        input.data,
        input.stride,
        input.width,
        input.height,
        true,
    )
}

static PIPELINE_VTBL: IPipelineVtbl = IPipelineVtbl {
    base: IReleaseVtbl {
        release: release::<FakePipeline>,
    },
    enable_blur_background,
    disable_background_blur,
    enable_replace_background,
    disable_replace_background,
    enable_beautification,
    disable_beautification,
    set_beautification_level,
    process,
};

// ============================================================================
// IReplacementController
// ============================================================================

unsafe extern "C" fn set_background_image(
    this: *mut IReplacementController,
    image: *const IFrame,
) {
    let image = object::<FakeFrame, _>(image);
    let row_bytes = image.width as usize * 4;
    let mut pixels = Vec::with_capacity(row_bytes * image.height as usize);
    for row in 0..image.height as usize {
        let start = image.data.add(row * image.stride as usize);
        pixels.extend_from_slice(std::slice::from_raw_parts(start, row_bytes));
    }
    *object::<FakeController, _>(this).header.state.background.borrow_mut() =
        Some((image.width, image.height, pixels));
}

unsafe extern "C" fn clear_background_image(this: *mut IReplacementController) {
    *object::<FakeController, _>(this).header.state.background.borrow_mut() = None;
}

static CONTROLLER_VTBL: IReplacementControllerVtbl = IReplacementControllerVtbl {
    base: IReleaseVtbl {
        release: release::<FakeController>,
    },
    set_background_image,
    clear_background_image,
};

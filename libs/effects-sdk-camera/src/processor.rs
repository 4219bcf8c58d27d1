// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-camera frame processor driving the effects SDK.
//!
//! ```text
//! capture thread ──process(frame)──► wrap ──► pipeline.process ──► R/B swap ──► frame_data
//! UI / session   ──set_*/clear_*───► pipeline / replacement controller
//! ```
//!
//! Single-threaded: the capture pipeline serializes every call. Vendor
//! objects are owned by [`Engine`] and released when dropped, so every exit
//! path (including errors) hands them back exactly once.

use std::path::Path;

use crate::config::EffectsConfig;
use crate::effects::{BackgroundSource, EffectState};
use crate::error::{EffectsError, Result};
use crate::pixels::{self, BgraColor, Resolution};
use crate::sdk::tsvb::{self, Tsvb};
use crate::sdk::{
    EffectsSdk, Frame, FrameFactory, FrameLock, LockedFrameData, Pipeline, PipelineErrorCode,
    ReplacementController, SdkFactory,
};

/// Frame processor bridging capture frames to the effects SDK.
///
/// Starts either `Ready` (SDK loaded) or `Unavailable`. While unavailable,
/// effect setters are no-ops and frames are converted without effects.
pub struct FrameEffectsProcessor<S: EffectsSdk = Tsvb> {
    engine: EngineState<S>,
    effects: EffectState,
    resolution: Resolution,
    frame_data: Vec<u8>,
    config: EffectsConfig,
}

enum EngineState<S: EffectsSdk> {
    Ready(Engine<S>),
    Unavailable,
}

/// Vendor objects owned for the processor's lifetime. Field order is drop
/// order: background first, frame factory last.
struct Engine<S: EffectsSdk> {
    background: Option<ActiveBackground<S>>,
    pipeline: S::Pipeline,
    frame_factory: S::FrameFactory,
}

struct ActiveBackground<S: EffectsSdk> {
    /// Kept alive while assigned; `None` once handed off (solid colors).
    image: Option<S::Frame>,
    controller: S::Controller,
}

impl FrameEffectsProcessor<Tsvb> {
    /// Load the vendor library named by `config`.
    ///
    /// Load failures are not errors: they are logged and the processor comes
    /// up [`Unavailable`](Self::is_available).
    pub fn new(config: EffectsConfig) -> Self {
        match tsvb::load(&config.library_path) {
            Ok(factory) => Self::with_factory(&factory, config),
            Err(e) => {
                tracing::warn!("Effects SDK unavailable, frames will not be processed: {}", e);
                Self::unavailable(config)
            }
        }
    }
}

impl<S: EffectsSdk> FrameEffectsProcessor<S> {
    /// Build from an SDK factory. The factory is only used here; the
    /// processor keeps the frame factory and pipeline it creates.
    pub fn with_factory<F: SdkFactory<S>>(factory: &F, config: EffectsConfig) -> Self {
        let frame_factory = factory.create_frame_factory();
        let pipeline = factory.create_pipeline();

        let (Some(frame_factory), Some(pipeline)) = (frame_factory, pipeline) else {
            tracing::warn!("Effects SDK factory did not create a frame factory and pipeline");
            return Self::unavailable(config);
        };

        tracing::info!("Effects SDK pipeline ready");
        Self {
            engine: EngineState::Ready(Engine {
                background: None,
                pipeline,
                frame_factory,
            }),
            effects: EffectState::default(),
            resolution: Resolution::default(),
            frame_data: Vec::new(),
            config,
        }
    }

    /// A processor without an SDK.
    pub fn unavailable(config: EffectsConfig) -> Self {
        Self {
            engine: EngineState::Unavailable,
            effects: EffectState::default(),
            resolution: Resolution::default(),
            frame_data: Vec::new(),
            config,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.engine, EngineState::Ready(_))
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    pub fn effects(&self) -> &EffectState {
        &self.effects
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Most recent processed frame, tightly packed.
    pub fn frame_data(&self) -> &[u8] {
        &self.frame_data
    }

    pub fn any_effect_active(&self) -> bool {
        self.effects.any_active()
    }

    // ------------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------------

    pub fn set_blur(&mut self, power: f32) {
        let EngineState::Ready(engine) = &mut self.engine else {
            return;
        };
        if self.effects.blur_active() {
            return;
        }

        let status = engine.pipeline.enable_blur_background(power);
        warn_unless_ok("enable background blur", status);
        self.effects.blur = Some(power);
        tracing::debug!(power, "Background blur enabled");
    }

    pub fn clear_blur(&mut self) {
        let EngineState::Ready(engine) = &mut self.engine else {
            return;
        };
        if !self.effects.blur_active() {
            return;
        }

        engine.pipeline.disable_background_blur();
        self.effects.blur = None;
        tracing::debug!("Background blur disabled");
    }

    pub fn set_beautification_level(&mut self, level: f32) {
        let EngineState::Ready(engine) = &mut self.engine else {
            return;
        };
        if self.effects.beautification_active() {
            return;
        }

        engine.pipeline.set_beautification_level(level);
        let status = engine.pipeline.enable_beautification();
        warn_unless_ok("enable beautification", status);
        self.effects.beautification = Some(level);
        tracing::debug!(level, "Beautification enabled");
    }

    pub fn clear_beautification(&mut self) {
        let EngineState::Ready(engine) = &mut self.engine else {
            return;
        };
        if !self.effects.beautification_active() {
            return;
        }

        engine.pipeline.disable_beautification();
        self.effects.beautification = None;
        tracing::debug!("Beautification disabled");
    }

    /// Replace the background with the image at `path`.
    ///
    /// Fails if the SDK refuses to enable replacement or cannot load the
    /// image; the effect then stays off.
    pub fn set_background_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let EngineState::Ready(engine) = &mut self.engine else {
            return Ok(());
        };
        if self.effects.background_active() {
            return Ok(());
        }

        let path = path.as_ref();
        engine.enable_background(
            |frame_factory| {
                frame_factory
                    .load_image(path)
                    .ok_or_else(|| EffectsError::BackgroundImageLoad(path.to_path_buf()))
            },
            true,
        )?;

        self.effects.background = Some(BackgroundSource::Image(path.to_path_buf()));
        tracing::debug!("Background replaced with image {}", path.display());
        Ok(())
    }

    /// Replace the background with a solid color the size of the current
    /// resolution. `color` packs B, G, R, A into bits 24, 16, 8, 0.
    pub fn set_background_color(&mut self, color: u32) -> Result<()> {
        let EngineState::Ready(engine) = &mut self.engine else {
            return Ok(());
        };
        if self.effects.background_active() {
            return Ok(());
        }
        let resolution = self.resolution;
        if resolution.is_empty() {
            tracing::warn!("Background color {:#010x} ignored: resolution not set", color);
            return Ok(());
        }

        let data = pixels::solid_bgra(BgraColor::from_packed(color), resolution);
        engine.enable_background(
            |frame_factory| {
                frame_factory
                    .create_bgra(&data, resolution.stride(), resolution)
                    .ok_or_else(|| {
                        EffectsError::FrameCreation(format!("{} background color frame", resolution))
                    })
            },
            false,
        )?;

        self.effects.background = Some(BackgroundSource::Color(color));
        tracing::debug!("Background replaced with color {:#010x}", color);
        Ok(())
    }

    /// Turn background replacement off and release its controller. A later
    /// set starts from a fresh controller.
    pub fn clear_background(&mut self) {
        let EngineState::Ready(engine) = &mut self.engine else {
            return;
        };
        if !self.effects.background_active() {
            return;
        }

        engine.disable_background();
        self.effects.background = None;
        tracing::debug!("Background replacement disabled");
    }

    // ------------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------------

    /// Set the frame size. Must be called before the first frame and on every
    /// size change; resizes the output buffer to `width * height * 4`.
    pub fn update_resolution(&mut self, width: u32, height: u32) {
        let resolution = Resolution::new(width, height);
        if resolution == self.resolution && self.frame_data.len() == resolution.frame_len() {
            tracing::trace!("Resolution unchanged at {}", resolution);
            return;
        }

        self.resolution = resolution;
        self.frame_data.resize(resolution.frame_len(), 0);
        tracing::debug!("Resolution set to {}", resolution);
    }

    /// Run one tightly packed BGRA camera frame through the enabled effects.
    ///
    /// Returns the converted frame with red and blue swapped; empty while the
    /// resolution has a zero dimension. The slice
    /// borrows the processor's reusable buffer and is overwritten by the next
    /// call. On error the buffer keeps its previous contents.
    pub fn process(&mut self, camera_frame: &mut [u8]) -> Result<&[u8]> {
        let resolution = self.resolution;
        let expected = resolution.frame_len();
        if camera_frame.len() < expected {
            return Err(EffectsError::FrameSizeMismatch {
                expected,
                actual: camera_frame.len(),
            });
        }
        if resolution.is_empty() {
            tracing::trace!("Resolution not set, frame dropped");
            return Ok(&self.frame_data);
        }

        let skip_idle = self.config.skip_idle_frames && !self.effects.any_active();
        match &mut self.engine {
            EngineState::Ready(engine) if !skip_idle => {
                engine.process(camera_frame, resolution, &mut self.frame_data)?;
            }
            _ => {
                tracing::trace!("Frame bypasses effects pipeline");
                pixels::convert_into(
                    &mut self.frame_data,
                    camera_frame,
                    resolution.stride(),
                    resolution.width as usize,
                    resolution.height as usize,
                );
            }
        }

        Ok(&self.frame_data)
    }
}

impl<S: EffectsSdk> Engine<S> {
    /// Enable replacement, assign the frame built by `image`, and keep the
    /// frame when `keep_image` is set. Anything acquired is released again
    /// if a later step fails.
    fn enable_background(
        &mut self,
        image: impl FnOnce(&S::FrameFactory) -> Result<S::Frame>,
        keep_image: bool,
    ) -> Result<()> {
        let mut controller = self
            .pipeline
            .enable_replace_background()
            .map_err(EffectsError::EngineActivationFailed)?;

        let image = match image(&self.frame_factory) {
            Ok(image) => image,
            Err(e) => {
                drop(controller);
                self.pipeline.disable_replace_background();
                return Err(e);
            }
        };

        controller.set_background_image(&image);
        self.background = Some(ActiveBackground {
            image: keep_image.then_some(image),
            controller,
        });
        Ok(())
    }

    fn disable_background(&mut self) {
        if let Some(mut background) = self.background.take() {
            background.controller.clear_background_image();
            drop(background);
            self.pipeline.disable_replace_background();
        }
    }

    fn process(
        &mut self,
        camera_frame: &mut [u8],
        resolution: Resolution,
        frame_data: &mut [u8],
    ) -> Result<()> {
        let stride = resolution.stride();
        let width = resolution.width as usize;
        let rows = resolution.height as usize;

        let mut input = self
            .frame_factory
            .wrap_bgra(camera_frame, stride, resolution)
            .ok_or_else(|| EffectsError::FrameCreation(format!("{} camera frame", resolution)))?;

        let mut output = self
            .pipeline
            .process(&input)
            .map_err(EffectsError::FrameProcessingFailed)?;

        let _input_lock = input.lock(FrameLock::ReadWrite);
        let mut locked = output
            .lock(FrameLock::ReadWrite)
            .ok_or_else(|| EffectsError::FrameLock("processed frame".into()))?;

        let output_stride = locked.bytes_per_line(0);
        let plane = locked.plane_mut(0);
        let required = output_stride * (rows - 1) + stride;
        if output_stride < stride || plane.len() < required {
            return Err(EffectsError::FrameLock(format!(
                "processed frame holds {} bytes at {} bytes per line, {} needs {}",
                plane.len(),
                output_stride,
                resolution,
                required
            )));
        }

        pixels::swap_red_blue(plane, output_stride, width, rows);
        pixels::copy_rows(frame_data, plane, output_stride, stride, rows);
        tracing::trace!("Processed {} frame", resolution);
        Ok(())
    }
}

fn warn_unless_ok(operation: &str, status: PipelineErrorCode) {
    if status != PipelineErrorCode::Ok {
        tracing::warn!("Effects SDK could not {}: {}", operation, status);
    }
}

impl<S: EffectsSdk> std::fmt::Debug for FrameEffectsProcessor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameEffectsProcessor")
            .field("available", &self.is_available())
            .field("effects", &self.effects)
            .field("resolution", &self.resolution)
            .field("config", &self.config)
            .finish()
    }
}

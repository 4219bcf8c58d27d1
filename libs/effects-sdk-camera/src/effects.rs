// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::path::PathBuf;

/// What is shown behind the foreground while background replacement is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSource {
    Image(PathBuf),
    /// Packed color, bits 24/16/8/0 = B/G/R/A.
    Color(u32),
}

/// Effects currently enabled on the pipeline.
///
/// `None` means the effect is off. An effect is only set while off and only
/// cleared while on; anything else is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectState {
    /// Blur power while background blur is on.
    pub blur: Option<f32>,
    /// Level while beautification is on.
    pub beautification: Option<f32>,
    pub background: Option<BackgroundSource>,
}

impl EffectState {
    pub fn blur_active(&self) -> bool {
        self.blur.is_some()
    }

    pub fn beautification_active(&self) -> bool {
        self.beautification.is_some()
    }

    pub fn background_active(&self) -> bool {
        self.background.is_some()
    }

    pub fn any_active(&self) -> bool {
        self.blur_active() || self.beautification_active() || self.background_active()
    }
}

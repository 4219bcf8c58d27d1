// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Subscriber installation for hosts that bring no `tracing` subscriber.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_FILTER_ENV: &str = "EFFECTS_SDK_LOG";

static INIT: Once = Once::new();

/// Install a stderr fmt subscriber filtered by [`LOG_FILTER_ENV`] (default
/// `info`). Safe to call repeatedly; only the first call has an effect, and a
/// subscriber already installed by the host wins.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}

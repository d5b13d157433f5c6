//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (monotonic milliseconds)
//! - Device capabilities used to pick difficulty tuning

use serde::{Deserialize, Serialize};

/// Viewports at or below this width count as phone-sized (px)
pub const MOBILE_VIEWPORT_WIDTH: f64 = 900.0;

/// Capabilities of the device the game runs on, probed once per session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Primary pointer is coarse (touch screen)
    pub coarse_pointer: bool,
    /// Viewport width in CSS pixels
    pub viewport_width: f64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            coarse_pointer: false,
            viewport_width: 1280.0,
        }
    }
}

impl DeviceProfile {
    /// Touch devices and small screens are harder to play on
    pub fn is_mobile_like(&self) -> bool {
        self.coarse_pointer || self.viewport_width <= MOBILE_VIEWPORT_WIDTH
    }

    /// Probe the browser window
    #[cfg(target_arch = "wasm32")]
    pub fn detect() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let coarse_pointer = window
            .match_media("(pointer: coarse)")
            .ok()
            .flatten()
            .map(|mq| mq.matches())
            .unwrap_or(false);
        let viewport_width = window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0);
        Self {
            coarse_pointer,
            viewport_width,
        }
    }

    /// Native builds behave like a desktop browser
    #[cfg(not(target_arch = "wasm32"))]
    pub fn detect() -> Self {
        Self::default()
    }
}

/// Monotonic milliseconds (`performance.now()` in the browser)
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Monotonic milliseconds since the first call
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

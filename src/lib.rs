//! Pixel Ripple - pixelated radial reveal effect for DOM elements
//!
//! Core modules:
//! - `schedule`: Per-block reveal frames (distance, easing, edge jitter)
//! - `render`: Full-surface repaint for a given frame counter
//! - `animation`: Frame loop with a cancellable, awaitable handle
//! - `fade`: Opacity fade-out and removal
//! - `ripple`: Element binding, pointer press/release, lifecycle events
//! - `host`: Environment traits plus a headless implementation
//! - `web`: Browser bindings (wasm32 only)

pub mod animation;
pub mod color;
pub mod config;
pub mod easing;
pub mod error;
pub mod events;
pub mod fade;
pub mod host;
pub mod render;
pub mod ripple;
pub mod schedule;
pub mod task;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use animation::{AnimationHandle, CancelToken};
pub use color::Color;
pub use config::{ExitBefore, RippleOptions};
pub use error::{Result, RippleError};
pub use events::{Emitter, RippleEvent};
pub use ripple::{Pointer, Ripple};
pub use schedule::{RenderSchedule, ScheduleOptions};

/// Effect constants
pub mod consts {
    /// Opacity removed per frame while fading out
    pub const DEFAULT_OPACITY_STEP: f64 = 0.02;
    /// Edge jitter strength for standalone plays
    pub const DEFAULT_BIT_CRASH: f64 = 7.0;
    /// Default block size is the canvas height divided by this
    pub const PIXEL_SIZE_DIVISOR: u32 = 10;
    /// Blocks at or below this raw frame are never jittered
    pub const JITTER_MIN_FRAME: u32 = 5;
    /// Duration argument passed to timing functions
    pub const TIMING_DURATION: f64 = 1.0;
    pub const DEFAULT_TIMING_FUNCTION: &str = "easeInBack";
    /// DOM event that starts the fade after a press
    pub const DEFAULT_EXIT_EVENT: &str = "mouseup";
    /// Stand-in for `DEFAULT_EXIT_EVENT` on touch presses
    pub const TOUCH_EXIT_EVENT: &str = "touchend";
    /// Mouse presses this soon after a touch are emulated ones
    pub const COMPAT_MOUSE_WINDOW_MS: f64 = 800.0;
    /// Element attribute holding per-element options
    pub const OPTIONS_ATTRIBUTE: &str = "imd-options";
}

/// Building blocks for driving the effect by hand
pub mod util {
    pub use crate::color::pixel_color;
    pub use crate::easing::resolve_timing_function;
    pub use crate::fade::transparentize;
    pub use crate::schedule::create_render_schedule;
}

//! Browser bindings
//!
//! - `host`: `requestAnimationFrame` scheduler and canvas surfaces
//! - `element`: DOM element the ripple overlays
//! - `bindings`: the JS-facing `ImdRipple` class and `util` functions

pub mod bindings;
pub mod element;
pub mod host;

pub use bindings::{ImdRipple, RippleAnimation};
pub use element::DomElement;
pub use host::{BrowserHost, CanvasSurface};

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (module instantiated twice) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Pixel Ripple loaded");
}

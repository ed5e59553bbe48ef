//! `requestAnimationFrame` scheduling and `<canvas>` surfaces

use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, ImageData, Window};

use crate::color::Color;
use crate::error::{Result, RippleError};
use crate::host::{Fadeable, FrameScheduler, Host, Surface};
use crate::render::PixelBuffer;

/// Host backed by the page's `window`
#[derive(Clone)]
pub struct BrowserHost {
    window: Window,
}

impl BrowserHost {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| RippleError::Host("no window".into()))?;
        Ok(Self { window })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn create_canvas(&self, width: u32, height: u32) -> Result<HtmlCanvasElement> {
        let document = self
            .window
            .document()
            .ok_or_else(|| RippleError::Host("no document".into()))?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| RippleError::Host("created element is not a canvas".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);
        Ok(canvas)
    }
}

impl FrameScheduler for BrowserHost {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) {
        let closure = Closure::once(move |_time: f64| callback());
        if let Err(e) = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            log::error!("requestAnimationFrame failed: {:?}", e);
        }
        closure.forget();
    }
}

impl Host for BrowserHost {
    type Surface = CanvasSurface;

    fn create_surface(&self, width: u32, height: u32, pixelated: bool) -> Result<CanvasSurface> {
        let canvas = self.create_canvas(width, height)?;

        // Overlay the parent exactly
        let style = canvas.style();
        style.set_property("position", "absolute")?;
        for side in ["top", "right", "bottom", "left"] {
            style.set_property(side, "0")?;
        }

        let context = context_2d(&canvas)?;
        if pixelated {
            context.set_image_smoothing_enabled(false);
        }
        Ok(CanvasSurface { canvas, context })
    }

    /// Let the browser parse the color by painting one pixel with it
    fn resolve_color(&self, css: &str) -> Color {
        let probe = || -> Result<Color> {
            let canvas = self.create_canvas(1, 1)?;
            let context = context_2d(&canvas)?;
            context.set_fill_style_str(css);
            context.fill_rect(0.0, 0.0, 1.0, 1.0);
            let data = context.get_image_data(0.0, 0.0, 1.0, 1.0)?.data();
            match data.0.as_slice() {
                [r, g, b, a, ..] => Ok(Color::rgba(*r, *g, *b, *a)),
                _ => Err(RippleError::Host("empty image data".into())),
            }
        };
        probe().unwrap_or_else(|e| {
            log::warn!("Color probe failed ({}), parsing {:?} directly", e, css);
            Color::from_css(css)
        })
    }

    fn seed(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| RippleError::Host("2d context unavailable".into()))?
        .dyn_into()
        .map_err(|_| RippleError::Host("not a 2d context".into()))
}

/// A `<canvas>` and its 2d context
#[derive(Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.context
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn present(&self, pixels: &PixelBuffer) {
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(pixels.as_bytes()),
            pixels.width(),
            pixels.height(),
        );
        let result = image.and_then(|image| self.context.put_image_data(&image, 0.0, 0.0));
        if let Err(e) = result {
            log::error!("Failed to present frame: {:?}", e);
        }
    }
}

impl Fadeable for CanvasSurface {
    fn set_opacity(&self, opacity: f64) {
        let element: &HtmlElement = &self.canvas;
        element.set_opacity(opacity);
    }

    fn detach(&self) -> bool {
        let element: &HtmlElement = &self.canvas;
        element.detach()
    }
}

impl Fadeable for HtmlElement {
    fn set_opacity(&self, opacity: f64) {
        if let Err(e) = self.style().set_property("opacity", &opacity.to_string()) {
            log::warn!("Could not set opacity: {:?}", e);
        }
    }

    fn detach(&self) -> bool {
        match self.parent_node() {
            Some(parent) => parent.remove_child(self).is_ok(),
            None => false,
        }
    }
}

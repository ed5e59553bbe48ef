//! JS-facing API
//!
//! `ImdRipple` binds a ripple to an element and listens for pointer presses.
//! The free functions mirror the `util` module for scripts that drive the
//! effect by hand.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{AddEventListenerOptions, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent};

use crate::animation::AnimationHandle;
use crate::config::RippleOptions;
use crate::easing::{CustomTiming, find_easing};
use crate::error::{Result, RippleError};
use crate::host::Host;
use crate::ripple::{self, Pointer, Ripple};
use crate::schedule::{ScheduleOptions, create_render_schedule};

use super::element::DomElement;
use super::host::{BrowserHost, CanvasSurface};

type BrowserRipple = Ripple<BrowserHost, DomElement>;

/// Ripple bound to one element
#[wasm_bindgen]
pub struct ImdRipple {
    ripple: BrowserRipple,
}

#[wasm_bindgen]
impl ImdRipple {
    /// Bind to `element`: left-button presses and touches start a ripple there
    #[wasm_bindgen(constructor)]
    pub fn new(element: HtmlElement, options: JsValue) -> std::result::Result<ImdRipple, JsValue> {
        let host = BrowserHost::new()?;
        let dom = DomElement::new(&host, element)?;
        let ripple = Ripple::new(host, dom, options_from_js(&options)?);
        bind_pointer(&ripple)?;
        Ok(ImdRipple { ripple })
    }

    #[wasm_bindgen(getter)]
    pub fn element(&self) -> HtmlElement {
        self.ripple.element().element().clone()
    }

    /// Play inside the element; omitted coordinates mean the centre
    pub fn play(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        options: JsValue,
    ) -> std::result::Result<RippleAnimation, JsValue> {
        let handle = self.ripple.play(x, y, &options_from_js(&options)?)?;
        Ok(RippleAnimation { handle })
    }

    /// Fade out every ripple still waiting for its exit event
    pub fn release(&self) {
        self.ripple.release();
    }

    /// Subscribe to "begin", "rendered" or "end". Begin and end listeners
    /// receive the canvas. Returns an id for `off`.
    pub fn on(&self, event: String, callback: js_sys::Function) -> f64 {
        self.ripple.on(move |e| {
            if e.name() != event {
                return;
            }
            let arg = e
                .surface()
                .map(|s| JsValue::from(s.canvas().clone()))
                .unwrap_or(JsValue::UNDEFINED);
            if let Err(err) = callback.call1(&JsValue::NULL, &arg) {
                log::error!("'{}' listener threw: {:?}", e.name(), err);
            }
        }) as f64
    }

    pub fn off(&self, id: f64) -> bool {
        self.ripple.events().off(id as u64)
    }

    /// Play on a new detached canvas of the given size
    #[wasm_bindgen(js_name = playAt)]
    pub fn play_at(
        x: f64,
        y: f64,
        width: u32,
        height: u32,
        options: JsValue,
    ) -> std::result::Result<RippleAnimation, JsValue> {
        let host = BrowserHost::new()?;
        let handle = ripple::play(&host, x, y, width, height, &options_from_js(&options)?)?;
        Ok(RippleAnimation { handle })
    }

    /// Once the page has loaded, bind every element matching `selector`.
    /// Resolves to the array of instances.
    #[wasm_bindgen(js_name = bindOnLoad)]
    pub fn bind_on_load(selector: String, options: JsValue) -> js_sys::Promise {
        js_sys::Promise::new(&mut |resolve, reject| {
            let selector = selector.clone();
            let options = options.clone();
            let settle = move || match bind_all(&selector, &options) {
                Ok(instances) => resolve.call1(&JsValue::NULL, &instances),
                Err(e) => reject.call1(&JsValue::NULL, &e),
            };

            let Some(window) = web_sys::window() else {
                let _ = settle();
                return;
            };
            let loaded = window
                .document()
                .and_then(|d| js_sys::Reflect::get(&d, &JsValue::from_str("readyState")).ok())
                .and_then(|state| state.as_string())
                .is_some_and(|state| state == "complete");
            if loaded {
                let _ = settle();
                return;
            }

            let closure = Closure::once(move |_event: web_sys::Event| {
                let _ = settle();
            });
            let listen = AddEventListenerOptions::new();
            listen.set_once(true);
            let _ = window.add_event_listener_with_callback_and_add_event_listener_options(
                "load",
                closure.as_ref().unchecked_ref(),
                &listen,
            );
            closure.forget();
        })
    }
}

/// A running reveal
#[wasm_bindgen]
pub struct RippleAnimation {
    handle: AnimationHandle<CanvasSurface>,
}

#[wasm_bindgen]
impl RippleAnimation {
    /// Stop after the current frame
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    #[wasm_bindgen(getter)]
    pub fn canvas(&self) -> HtmlCanvasElement {
        self.handle.surface().canvas().clone()
    }

    #[wasm_bindgen(getter)]
    pub fn frame(&self) -> u32 {
        self.handle.frame()
    }

    /// Resolves to the canvas on full reveal or cancellation
    pub fn finished(&self) -> js_sys::Promise {
        let wait = self.handle.finished();
        future_to_promise(async move {
            let surface = wait.await;
            Ok(surface.canvas().clone().into())
        })
    }
}

/// Reveal schedule as `{ data, width, height, pixelSize, easedBy }`
#[wasm_bindgen(js_name = createRenderSchedule)]
pub fn create_render_schedule_js(
    x: f64,
    y: f64,
    width: u32,
    height: u32,
    options: JsValue,
) -> std::result::Result<JsValue, JsValue> {
    let opts = options_from_js(&options)?;
    let schedule_options = ScheduleOptions {
        block_size: opts.pixel_size.unwrap_or(1),
        timing: crate::easing::resolve_timing_function(opts.timing_spec()),
        bit_crash: opts.bit_crash,
    };
    let schedule = create_render_schedule(
        glam::DVec2::new(x, y),
        width,
        height,
        &schedule_options,
        &mut rand::rng(),
    );

    let json = serde_json::to_string(&schedule.data()).map_err(RippleError::from)?;
    js_sys::JSON::parse(&json)
}

/// RGBA bytes of a CSS color as the canvas resolves it
#[wasm_bindgen(js_name = getPixelColor)]
pub fn get_pixel_color(color: &str) -> std::result::Result<Vec<u8>, JsValue> {
    let host = BrowserHost::new()?;
    Ok(host.resolve_color(color).to_array().to_vec())
}

/// Fade `element` out and remove it from its parent
#[wasm_bindgen(js_name = transparentize)]
pub fn transparentize_js(
    element: HtmlElement,
    opacity_step: Option<f64>,
) -> std::result::Result<js_sys::Promise, JsValue> {
    let host = BrowserHost::new()?;
    let step = opacity_step.unwrap_or(crate::consts::DEFAULT_OPACITY_STEP);
    let done = crate::fade::transparentize(&host, element, step);
    Ok(future_to_promise(async move {
        done.wait().await;
        Ok(JsValue::UNDEFINED)
    }))
}

/// Look up a named curve as a JS `(t, b, c, d) => frame` function
#[wasm_bindgen(js_name = getTimingFunction)]
pub fn get_timing_function(name: Option<String>) -> Option<js_sys::Function> {
    let name = name.unwrap_or_else(|| crate::consts::DEFAULT_TIMING_FUNCTION.to_string());
    let easing = find_easing(&name)?;
    let curve = Closure::<dyn Fn(f64, f64, f64, f64) -> f64>::new(move |t, b, c, d| {
        easing.apply(t, b, c, d)
    });
    Some(curve.into_js_value().unchecked_into())
}

/// Options object from JS. `timingFunction` may be a curve name or a function.
fn options_from_js(value: &JsValue) -> Result<RippleOptions> {
    if value.is_undefined() || value.is_null() {
        return Ok(RippleOptions::default());
    }
    let json: String = js_sys::JSON::stringify(value)?.into();
    let mut options: RippleOptions = serde_json::from_str(&json)?;

    let timing = js_sys::Reflect::get(value, &JsValue::from_str("timingFunction"))?;
    if let Some(function) = timing.dyn_ref::<js_sys::Function>() {
        options = options.with_custom_timing(js_timing(function.clone()));
    }
    Ok(options)
}

/// Wrap a JS timing function. A throw or non-number result keeps the raw frame.
fn js_timing(function: js_sys::Function) -> CustomTiming {
    Rc::new(move |t, b, c, d| {
        let args = js_sys::Array::of4(
            &JsValue::from(t),
            &JsValue::from(b),
            &JsValue::from(c),
            &JsValue::from(d),
        );
        function
            .apply(&JsValue::NULL, &args)
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(b)
    })
}

fn bind_all(selector: &str, options: &JsValue) -> std::result::Result<js_sys::Array, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| RippleError::Host("no document".into()))?;
    let nodes = document.query_selector_all(selector)?;
    let instances = js_sys::Array::new();
    for i in 0..nodes.length() {
        let Some(element) = nodes.get(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
            continue;
        };
        instances.push(&ImdRipple::new(element, options.clone())?.into());
    }
    log::info!("Bound {} ripple elements for '{}'", instances.length(), selector);
    Ok(instances)
}

fn bind_pointer(ripple: &BrowserRipple) -> Result<()> {
    let target = ripple.element().element().clone();

    // Mouse down, left button only
    {
        let ripple = ripple.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            if event.button() != 0 {
                return;
            }
            let (x, y) = (event.client_x(), event.client_y());
            press(&ripple, Pointer::Mouse, x, y, event.time_stamp());
        });
        target.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Touch start, first changed touch
    {
        let ripple = ripple.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            if let Some(touch) = event.changed_touches().get(0) {
                let (x, y) = (touch.client_x(), touch.client_y());
                press(&ripple, Pointer::Touch, x, y, event.time_stamp());
            }
        });
        target.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Touch end, so the emulated mouse press that follows is recognised
    {
        let ripple = ripple.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            ripple.touch_end(event.time_stamp());
        });
        target.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

fn press(ripple: &BrowserRipple, pointer: Pointer, client_x: i32, client_y: i32, time_ms: f64) {
    let (left, top) = ripple.element().origin();
    let x = (client_x as f64 - left).floor();
    let y = (client_y as f64 - top).floor();
    match ripple.pointer_down(pointer, x, y, time_ms) {
        Some(Ok(_)) => {}
        Some(Err(e)) => {
            log::error!("Ripple failed to start: {}", e);
            return;
        }
        None => return,
    }

    if let Some(name) = ripple.exit_event(pointer)
        && let Err(e) = arm_release(ripple, &name)
    {
        log::error!("Could not listen for '{}': {}", name, e);
    }
}

/// Release the ripple the next time `event` fires on the element
fn arm_release(ripple: &BrowserRipple, event: &str) -> Result<()> {
    let target = ripple.element().element().clone();
    let ripple = ripple.clone();
    let closure = Closure::once(move |_event: web_sys::Event| ripple.release());
    let listen = AddEventListenerOptions::new();
    listen.set_once(true);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        closure.as_ref().unchecked_ref(),
        &listen,
    )?;
    closure.forget();
    Ok(())
}


//! Ripple controller
//!
//! Ties schedule, renderer, fade and events together:
//! - `play`: standalone ripple on a fresh surface
//! - `Ripple::play`: ripple inside a bound element, removed automatically by default
//! - `Ripple::press` / `Ripple::release`: pointer-driven ripple that fades on release

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::animation::{self, AnimationHandle};
use crate::config::{ExitBefore, RippleOptions};
use crate::consts::{COMPAT_MOUSE_WINDOW_MS, DEFAULT_EXIT_EVENT, TOUCH_EXIT_EVENT};
use crate::easing::resolve_timing_function;
use crate::error::Result;
use crate::events::{Emitter, ListenerId, RippleEvent};
use crate::fade::transparentize;
use crate::host::{Host, HostElement};
use crate::schedule::{ScheduleOptions, create_render_schedule};

/// Play a ripple from (x, y) on a new `width` x `height` surface.
/// The surface is not attached anywhere; place `handle.surface()` yourself.
pub fn play<H: Host>(
    host: &H,
    x: f64,
    y: f64,
    width: u32,
    height: u32,
    options: &RippleOptions,
) -> Result<AnimationHandle<H::Surface>> {
    let opts = RippleOptions::play_defaults(height).merge(options);

    let surface = host.create_surface(width, height, opts.pixelated.unwrap_or(true))?;
    let schedule_options = ScheduleOptions {
        block_size: opts.pixel_size.unwrap_or(1),
        timing: resolve_timing_function(opts.timing_spec()),
        bit_crash: opts.bit_crash,
    };
    let mut rng = Pcg32::seed_from_u64(host.seed());
    let schedule = create_render_schedule(
        DVec2::new(x, y),
        width,
        height,
        &schedule_options,
        &mut rng,
    );
    let color = host.resolve_color(opts.color_or_default());

    log::info!(
        "Ripple at ({:.0}, {:.0}) on {}x{}, {} frames",
        x,
        y,
        width,
        height,
        schedule.max_frame() + 1
    );
    Ok(animation::play(host, surface, schedule, color))
}

type Event<H> = RippleEvent<<H as Host>::Surface>;

/// Input device behind a press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Mouse,
    Touch,
}

struct RippleInner<H: Host, E> {
    host: H,
    element: E,
    options: RippleOptions,
    events: Emitter<Event<H>>,
    /// Presses waiting for their exit event
    pressed: RefCell<Vec<AnimationHandle<H::Surface>>>,
    /// Timestamp (ms) of the last touch start or end
    last_touch: Cell<Option<f64>>,
}

/// A ripple bound to one host element
pub struct Ripple<H: Host, E> {
    inner: Rc<RippleInner<H, E>>,
}

impl<H: Host, E> Clone for Ripple<H, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H, E> Ripple<H, E>
where
    H: Host,
    E: HostElement<Surface = H::Surface>,
{
    pub fn new(host: H, element: E, options: RippleOptions) -> Self {
        Self {
            inner: Rc::new(RippleInner {
                host,
                element,
                options,
                events: Emitter::new(),
                pressed: RefCell::new(Vec::new()),
                last_touch: Cell::new(None),
            }),
        }
    }

    pub fn element(&self) -> &E {
        &self.inner.element
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn events(&self) -> &Emitter<Event<H>> {
        &self.inner.events
    }

    pub fn on(&self, callback: impl Fn(&Event<H>) + 'static) -> ListenerId {
        self.inner.events.on(callback)
    }

    pub fn once(&self, callback: impl Fn(&Event<H>) + 'static) -> ListenerId {
        self.inner.events.once(callback)
    }

    /// Defaults < element attribute < bound options < `call`
    pub fn resolve_options(&self, defaults: &RippleOptions, call: &RippleOptions) -> RippleOptions {
        let attribute = self.inner.element.options_attribute();
        defaults
            .merge(&RippleOptions::from_attribute(attribute.as_deref()))
            .merge(&self.inner.options)
            .merge(call)
    }

    /// Exit behaviour for presses on this element
    pub fn exit_before(&self) -> ExitBefore {
        self.resolve_options(&RippleOptions::default(), &RippleOptions::default())
            .exit_before_or_default()
    }

    /// Play inside the element. Missing (or zero) coordinates mean the centre.
    pub fn play(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        call: &RippleOptions,
    ) -> Result<AnimationHandle<H::Surface>> {
        let defaults = RippleOptions {
            auto_destroy: Some(true),
            ..Default::default()
        };
        let opts = self.resolve_options(&defaults, call);
        self.start(x, y, opts)
    }

    /// Pointer went down at (x, y), element-local. Emits `begin`.
    pub fn press(&self, x: f64, y: f64) -> Result<AnimationHandle<H::Surface>> {
        let defaults = RippleOptions {
            auto_destroy: Some(false),
            ..Default::default()
        };
        let call = RippleOptions {
            auto_destroy: Some(false),
            ..Default::default()
        };
        let opts = self.resolve_options(&defaults, &call);
        let exit = opts.exit_before_or_default();
        let step = opts.opacity_step_or_default();

        let handle = self.start(Some(x), Some(y), opts)?;
        self.inner
            .events
            .emit(&RippleEvent::Begin(handle.surface().clone()));

        match exit {
            ExitBefore::Immediate(true) => self.dismiss(handle.clone(), step),
            ExitBefore::Immediate(false) => {
                let ripple = self.clone();
                let pending = handle.clone();
                handle.then(move |_| {
                    if !pending.is_cancelled() {
                        ripple.dismiss(pending, step);
                    }
                });
            }
            ExitBefore::Event(_) => self.inner.pressed.borrow_mut().push(handle.clone()),
        }
        Ok(handle)
    }

    /// Press from an input event stamped `time_ms`. A mouse press shortly after
    /// a touch is the browser's emulated mouse event for that touch and is
    /// ignored (`None`).
    pub fn pointer_down(
        &self,
        pointer: Pointer,
        x: f64,
        y: f64,
        time_ms: f64,
    ) -> Option<Result<AnimationHandle<H::Surface>>> {
        match pointer {
            Pointer::Touch => self.inner.last_touch.set(Some(time_ms)),
            Pointer::Mouse if self.is_touch_echo(time_ms) => {
                log::debug!("Ignoring emulated mouse press after touch");
                return None;
            }
            Pointer::Mouse => {}
        }
        Some(self.press(x, y))
    }

    /// Touch lifted at `time_ms`; emulated mouse events follow it
    pub fn touch_end(&self, time_ms: f64) {
        self.inner.last_touch.set(Some(time_ms));
    }

    /// DOM event that releases a press from `pointer`, if the exit is event driven.
    /// Touches never produce the default mouse exit event.
    pub fn exit_event(&self, pointer: Pointer) -> Option<String> {
        match self.exit_before() {
            ExitBefore::Event(name) if pointer == Pointer::Touch && name == DEFAULT_EXIT_EVENT => {
                Some(TOUCH_EXIT_EVENT.to_string())
            }
            ExitBefore::Event(name) => Some(name),
            ExitBefore::Immediate(_) => None,
        }
    }

    fn is_touch_echo(&self, time_ms: f64) -> bool {
        self.inner
            .last_touch
            .get()
            .is_some_and(|touched| (0.0..COMPAT_MOUSE_WINDOW_MS).contains(&(time_ms - touched)))
    }

    /// Exit event fired: fade out every pressed ripple. A second call is a no-op.
    pub fn release(&self) {
        let pressed: Vec<_> = self.inner.pressed.borrow_mut().drain(..).collect();
        let step = self
            .resolve_options(&RippleOptions::default(), &RippleOptions::default())
            .opacity_step_or_default();
        for handle in pressed {
            self.dismiss(handle, step);
        }
    }

    /// Number of presses still waiting for release
    pub fn pressed_count(&self) -> usize {
        self.inner.pressed.borrow().len()
    }

    fn start(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        opts: RippleOptions,
    ) -> Result<AnimationHandle<H::Surface>> {
        let (width, height) = self.inner.element.size();
        let x = x.filter(|&v| v != 0.0).unwrap_or(width / 2.0);
        let y = y.filter(|&v| v != 0.0).unwrap_or(height / 2.0);

        // Canvas dimensions are whole pixels
        let handle = play(
            &self.inner.host,
            x,
            y,
            width.max(0.0) as u32,
            height.max(0.0) as u32,
            &opts,
        )?;
        self.inner.element.append_surface(handle.surface())?;

        let ripple = self.clone();
        let auto_destroy = opts.auto_destroy.unwrap_or(false);
        let step = opts.opacity_step_or_default();
        let pending = handle.clone();
        handle.then(move |_| {
            // A cancelled reveal is already being dismissed
            if pending.is_cancelled() {
                return;
            }
            ripple.inner.events.emit(&RippleEvent::Rendered);
            if auto_destroy {
                ripple.dismiss(pending, step);
            }
        });
        Ok(handle)
    }

    /// Fade, stop the reveal, then emit `end`
    fn dismiss(&self, handle: AnimationHandle<H::Surface>, step: f64) {
        let surface = handle.surface().clone();
        let ripple = self.clone();
        transparentize(&self.inner.host, surface.clone(), step).then(move |_| {
            handle.cancel();
            log::info!("Ripple removed");
            ripple.inner.events.emit(&RippleEvent::End(surface.clone()));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::host::{HeadlessElement, HeadlessHost, MemorySurface, Surface};
    use std::cell::Cell;

    fn ripple(element: HeadlessElement) -> (HeadlessHost, Ripple<HeadlessHost, HeadlessElement>) {
        let host = HeadlessHost::new(42);
        let ripple = Ripple::new(host.clone(), element, RippleOptions::default());
        (host, ripple)
    }

    fn record(ripple: &Ripple<HeadlessHost, HeadlessElement>) -> Rc<RefCell<Vec<&'static str>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        ripple.on(move |event| l.borrow_mut().push(event.name()));
        log
    }

    #[test]
    fn test_static_play_uses_play_defaults() {
        let host = HeadlessHost::new(1);
        let handle = play(&host, 25.0, 25.0, 50, 50, &RippleOptions::default()).unwrap();
        assert!(handle.surface().is_pixelated());
        assert_eq!(handle.surface().width(), 50);

        host.run_until_idle(10_000);
        assert!(handle.is_finished());
        // Default color is translucent black
        assert_eq!(handle.surface().pixel(25, 25), Some(Color::rgba(0, 0, 0, 77)));
    }

    #[test]
    fn test_static_play_custom_color_and_size() {
        let host = HeadlessHost::new(1);
        let options = RippleOptions {
            pixel_size: Some(3),
            bit_crash: Some(1.0),
            color: Some("aliceblue".into()),
            pixelated: Some(false),
            ..Default::default()
        };
        let handle = play(&host, 25.0, 25.0, 50, 50, &options).unwrap();
        assert!(!handle.surface().is_pixelated());
        host.run_until_idle(10_000);
        let surface: &MemorySurface = handle.surface();
        assert_eq!(surface.pixel(0, 0), Some(Color::rgb(240, 248, 255)));
        assert_eq!(surface.snapshot().visible_count(), 50 * 50);
    }

    #[test]
    fn test_instance_play_auto_destroys() {
        let element = HeadlessElement::new(40.0, 20.0);
        let (host, ripple) = ripple(element);
        let log = record(&ripple);

        let handle = ripple.play(None, None, &RippleOptions::default()).unwrap();
        assert_eq!(ripple.element().attached_children(), 1);

        host.run_until_idle(10_000);
        assert!(handle.is_finished());
        assert_eq!(*log.borrow(), vec!["rendered", "end"]);
        assert_eq!(ripple.element().attached_children(), 0);
        assert_eq!(handle.surface().opacity(), 0.0);
    }

    #[test]
    fn test_instance_play_keeps_surface_without_auto_destroy() {
        let element = HeadlessElement::new(40.0, 20.0).with_attribute("{autoDestroy: false}");
        let (host, ripple) = ripple(element);
        let log = record(&ripple);

        ripple.play(Some(5.0), Some(5.0), &RippleOptions::default()).unwrap();
        host.run_until_idle(10_000);
        assert_eq!(*log.borrow(), vec!["rendered"]);
        assert_eq!(ripple.element().attached_children(), 1);
    }

    #[test]
    fn test_call_options_beat_attribute() {
        let element =
            HeadlessElement::new(30.0, 30.0).with_attribute("{color: 'red', pixelSize: 2}");
        let (host, ripple) = ripple(element);
        let call = RippleOptions {
            color: Some("blue".into()),
            auto_destroy: Some(false),
            ..Default::default()
        };
        let handle = ripple.play(None, None, &call).unwrap();
        host.run_until_idle(10_000);
        assert_eq!(handle.surface().pixel(15, 15), Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_press_release_emits_begin_then_end() {
        let element = HeadlessElement::new(60.0, 30.0);
        let (host, ripple) = ripple(element);
        let log = record(&ripple);

        let handle = ripple.press(10.0, 10.0).unwrap();
        assert_eq!(*log.borrow(), vec!["begin"]);
        assert_eq!(ripple.pressed_count(), 1);

        host.run_frame();
        ripple.release();
        assert_eq!(ripple.pressed_count(), 0);
        // Second release has nothing to do
        ripple.release();

        host.run_until_idle(10_000);
        assert!(handle.is_cancelled());
        assert!(handle.is_finished());
        let events = log.borrow();
        assert_eq!(events.first(), Some(&"begin"));
        assert_eq!(events.last(), Some(&"end"));
        assert_eq!(events.iter().filter(|e| **e == "end").count(), 1);
        assert_eq!(ripple.element().attached_children(), 0);
    }

    #[test]
    fn test_press_without_release_stays() {
        let element = HeadlessElement::new(20.0, 20.0);
        let (host, ripple) = ripple(element);
        let log = record(&ripple);

        ripple.press(3.0, 3.0).unwrap();
        host.run_until_idle(10_000);
        assert_eq!(*log.borrow(), vec!["begin", "rendered"]);
        assert_eq!(ripple.element().attached_children(), 1);
    }

    #[test]
    fn test_press_exit_after_reveal() {
        let element = HeadlessElement::new(20.0, 20.0).with_attribute("{exitBefore: false}");
        let (host, ripple) = ripple(element);
        let log = record(&ripple);

        ripple.press(3.0, 3.0).unwrap();
        assert_eq!(ripple.pressed_count(), 0);
        host.run_until_idle(10_000);
        assert_eq!(*log.borrow(), vec!["begin", "rendered", "end"]);
        assert_eq!(ripple.element().attached_children(), 0);
    }

    #[test]
    fn test_press_exit_immediately() {
        let element = HeadlessElement::new(200.0, 200.0).with_attribute("{exitBefore: true}");
        let (host, ripple) = ripple(element);
        let ended = Rc::new(Cell::new(false));
        let e = ended.clone();
        ripple.on(move |event| {
            if event.is_end() {
                e.set(true);
            }
        });

        let handle = ripple.press(1.0, 1.0).unwrap();
        assert_eq!(ripple.pressed_count(), 0);
        host.run_until_idle(10_000);
        assert!(ended.get());
        assert!(handle.is_cancelled());
        assert_eq!(ripple.element().attached_children(), 0);
    }

    #[test]
    fn test_mouse_press_after_touch_is_ignored() {
        let element = HeadlessElement::new(40.0, 40.0);
        let (_, ripple) = ripple(element);
        let log = record(&ripple);

        assert!(ripple.pointer_down(Pointer::Touch, 5.0, 5.0, 1000.0).is_some());
        ripple.touch_end(1100.0);
        // Emulated mousedown for the same tap
        assert!(ripple.pointer_down(Pointer::Mouse, 5.0, 5.0, 1150.0).is_none());
        assert_eq!(*log.borrow(), vec!["begin"]);
        assert_eq!(ripple.pressed_count(), 1);
        assert_eq!(ripple.element().attached_children(), 1);

        // A real click well after the tap goes through
        let later = ripple.pointer_down(Pointer::Mouse, 5.0, 5.0, 1100.0 + COMPAT_MOUSE_WINDOW_MS);
        assert!(later.is_some_and(|handle| handle.is_ok()));
        assert_eq!(ripple.pressed_count(), 2);
    }

    #[test]
    fn test_mouse_presses_without_touch() {
        let element = HeadlessElement::new(40.0, 40.0);
        let (_, ripple) = ripple(element);
        for time in [0.0, 10.0, 20.0] {
            assert!(ripple.pointer_down(Pointer::Mouse, 1.0, 1.0, time).is_some());
        }
        assert_eq!(ripple.pressed_count(), 3);
    }

    #[test]
    fn test_exit_event_per_pointer() {
        let (_, plain) = ripple(HeadlessElement::new(10.0, 10.0));
        assert_eq!(plain.exit_event(Pointer::Mouse).as_deref(), Some("mouseup"));
        assert_eq!(plain.exit_event(Pointer::Touch).as_deref(), Some("touchend"));

        let custom = HeadlessElement::new(10.0, 10.0).with_attribute("{exitBefore: 'mouseleave'}");
        let (_, custom) = ripple(custom);
        assert_eq!(custom.exit_event(Pointer::Touch).as_deref(), Some("mouseleave"));

        let immediate = HeadlessElement::new(10.0, 10.0).with_attribute("{exitBefore: true}");
        let (_, immediate) = ripple(immediate);
        assert_eq!(immediate.exit_event(Pointer::Mouse), None);
    }

    #[test]
    fn test_exit_before_from_attribute() {
        let element = HeadlessElement::new(10.0, 10.0).with_attribute("{exitBefore: 'touchend'}");
        let (_, ripple) = ripple(element);
        assert_eq!(ripple.exit_before(), ExitBefore::Event("touchend".into()));
    }

    #[test]
    fn test_zero_coordinates_fall_back_to_center() {
        let element = HeadlessElement::new(40.0, 40.0)
            .with_attribute("{pixelSize: 1, autoDestroy: false}");
        let (host, ripple) = ripple(element);
        let handle = ripple.play(Some(0.0), Some(0.0), &RippleOptions::default()).unwrap();
        host.run_frame();
        // Only the centre is lit on the first frame
        let surface = handle.surface();
        assert!(surface.pixel(20, 20).is_some_and(|p| p.a > 0));
        assert!(surface.pixel(0, 0).is_some_and(|p| p.a == 0));
    }
}

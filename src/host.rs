//! Host environment abstraction
//!
//! The reveal and fade loops only need three things from their environment:
//! a per-frame callback, a surface to present pixels on, and a way to fade and
//! detach that surface. The browser implementation lives in `web`; the
//! headless one here backs the native demo and the tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::color::Color;
use crate::error::Result;
use crate::render::PixelBuffer;

/// Per-frame callback source (`requestAnimationFrame` in the browser)
pub trait FrameScheduler {
    fn request_frame(&self, callback: Box<dyn FnOnce()>);
}

/// Something pixels can be presented on. Clones refer to the same surface.
pub trait Surface: Clone + 'static {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Replace the surface contents with `pixels`
    fn present(&self, pixels: &PixelBuffer);
}

/// A visual element that can be faded and removed from its parent
pub trait Fadeable {
    fn set_opacity(&self, opacity: f64);
    /// Remove from the parent. Returns false if it was already detached.
    fn detach(&self) -> bool;
}

/// Everything a ripple needs from its environment
pub trait Host: FrameScheduler + Clone + 'static {
    type Surface: Surface + Fadeable;

    fn create_surface(&self, width: u32, height: u32, pixelated: bool) -> Result<Self::Surface>;

    fn resolve_color(&self, css: &str) -> Color {
        Color::from_css(css)
    }

    /// Seed for edge jitter
    fn seed(&self) -> u64;
}

/// The element a ripple is bound to
pub trait HostElement: 'static {
    type Surface;

    /// Layout size (width, height) in CSS pixels
    fn size(&self) -> (f64, f64);
    /// Raw per-element options blob, if any
    fn options_attribute(&self) -> Option<String>;
    fn append_surface(&self, surface: &Self::Surface) -> Result<()>;
}

/// In-memory host with a manually pumped frame queue
#[derive(Clone, Default)]
pub struct HeadlessHost {
    queue: Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>,
    frames: Rc<Cell<u64>>,
    seed: u64,
}

impl HeadlessHost {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Run every callback that was pending when the frame started.
    /// Returns the number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let pending: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let count = pending.len();
        for callback in pending {
            callback();
        }
        if count > 0 {
            self.frames.set(self.frames.get() + 1);
        }
        count
    }

    /// Pump frames until nothing is pending or `max_frames` is hit.
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.run_frame() > 0 {
            frames += 1;
        }
        frames
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }
}

impl FrameScheduler for HeadlessHost {
    fn request_frame(&self, callback: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(callback);
    }
}

impl Host for HeadlessHost {
    type Surface = MemorySurface;

    fn create_surface(&self, width: u32, height: u32, pixelated: bool) -> Result<MemorySurface> {
        Ok(MemorySurface::new(width, height, pixelated))
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

#[derive(Debug)]
struct MemorySurfaceState {
    pixels: PixelBuffer,
    pixelated: bool,
    presents: usize,
    opacity: f64,
    opacity_log: Vec<f64>,
    attached: bool,
}

/// Pixel surface kept in memory, shared between clones
#[derive(Debug, Clone)]
pub struct MemorySurface {
    state: Rc<RefCell<MemorySurfaceState>>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32, pixelated: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(MemorySurfaceState {
                pixels: PixelBuffer::new(width, height),
                pixelated,
                presents: 0,
                opacity: 1.0,
                opacity_log: Vec::new(),
                attached: false,
            })),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.state.borrow().pixels.pixel(x, y)
    }

    /// Copy of the last presented frame
    pub fn snapshot(&self) -> PixelBuffer {
        self.state.borrow().pixels.clone()
    }

    pub fn presents(&self) -> usize {
        self.state.borrow().presents
    }

    pub fn is_pixelated(&self) -> bool {
        self.state.borrow().pixelated
    }

    pub fn opacity(&self) -> f64 {
        self.state.borrow().opacity
    }

    /// Every opacity ever applied, in order
    pub fn opacity_log(&self) -> Vec<f64> {
        self.state.borrow().opacity_log.clone()
    }

    pub fn attach(&self) {
        self.state.borrow_mut().attached = true;
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    pub fn same_surface(&self, other: &MemorySurface) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Surface for MemorySurface {
    fn width(&self) -> u32 {
        self.state.borrow().pixels.width()
    }

    fn height(&self) -> u32 {
        self.state.borrow().pixels.height()
    }

    fn present(&self, pixels: &PixelBuffer) {
        let mut state = self.state.borrow_mut();
        state.pixels.copy_from(pixels);
        state.presents += 1;
    }
}

impl Fadeable for MemorySurface {
    fn set_opacity(&self, opacity: f64) {
        let mut state = self.state.borrow_mut();
        state.opacity = opacity;
        state.opacity_log.push(opacity);
    }

    fn detach(&self) -> bool {
        std::mem::replace(&mut self.state.borrow_mut().attached, false)
    }
}

/// Element stand-in for headless use
pub struct HeadlessElement {
    width: f64,
    height: f64,
    attribute: Option<String>,
    children: RefCell<Vec<MemorySurface>>,
}

impl HeadlessElement {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            attribute: None,
            children: RefCell::new(Vec::new()),
        }
    }

    pub fn with_attribute(mut self, options: &str) -> Self {
        self.attribute = Some(options.to_string());
        self
    }

    /// Surfaces that are still attached
    pub fn attached_children(&self) -> usize {
        self.children
            .borrow()
            .iter()
            .filter(|s| s.is_attached())
            .count()
    }
}

impl HostElement for HeadlessElement {
    type Surface = MemorySurface;

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn options_attribute(&self) -> Option<String> {
        self.attribute.clone()
    }

    fn append_surface(&self, surface: &MemorySurface) -> Result<()> {
        surface.attach();
        self.children.borrow_mut().push(surface.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_queue_runs_one_generation() {
        let host = HeadlessHost::new(1);
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        let inner_host = host.clone();
        host.request_frame(Box::new(move || {
            h.set(h.get() + 1);
            let h = h.clone();
            // Requested during a frame: runs on the next one
            inner_host.request_frame(Box::new(move || h.set(h.get() + 10)));
        }));

        assert_eq!(host.run_frame(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(host.pending(), 1);
        assert_eq!(host.run_frame(), 1);
        assert_eq!(hits.get(), 11);
        assert_eq!(host.run_frame(), 0);
        assert_eq!(host.frame_count(), 2);
    }

    #[test]
    fn test_memory_surface_detach() {
        let surface = MemorySurface::new(2, 2, true);
        assert!(!surface.detach());
        surface.attach();
        assert!(surface.detach());
        assert!(!surface.is_attached());
    }

    #[test]
    fn test_element_append() {
        let element = HeadlessElement::new(10.0, 10.0);
        let surface = MemorySurface::new(10, 10, false);
        element.append_surface(&surface).unwrap();
        assert_eq!(element.attached_children(), 1);
        surface.detach();
        assert_eq!(element.attached_children(), 0);
    }
}

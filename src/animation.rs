//! Reveal animation loop
//!
//! One frame callback per tick: check for cancellation, repaint, present,
//! then either settle or request the next frame. The loop owns its renderer
//! and pixel buffer outright and moves itself into each frame callback.

use std::cell::Cell;
use std::rc::Rc;

use crate::color::Color;
use crate::host::{FrameScheduler, Surface};
use crate::render::{FrameRenderer, PixelBuffer};
use crate::schedule::RenderSchedule;
use crate::task::{Deferred, Wait};

/// Cooperative cancellation flag, checked at the top of each tick
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Live handle on a running reveal
pub struct AnimationHandle<S: Surface> {
    surface: S,
    cancel: CancelToken,
    frame: Rc<Cell<u32>>,
    done: Deferred<S>,
}

impl<S: Surface> Clone for AnimationHandle<S> {
    fn clone(&self) -> Self {
        Self {
            surface: self.surface.clone(),
            cancel: self.cancel.clone(),
            frame: self.frame.clone(),
            done: self.done.clone(),
        }
    }
}

impl<S: Surface> AnimationHandle<S> {
    /// Stop after the tick in flight; the handle settles with the surface as painted so far
    pub fn cancel(&self) -> &Self {
        if !self.done.is_resolved() {
            log::debug!("Ripple cancelled at frame {}", self.frame.get());
        }
        self.cancel.cancel();
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The surface being painted, available before the loop settles
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Frame counter of the most recent paint
    pub fn frame(&self) -> u32 {
        self.frame.get()
    }

    pub fn is_finished(&self) -> bool {
        self.done.is_resolved()
    }

    /// Run `callback` with the surface once the loop settles
    pub fn then(&self, callback: impl FnOnce(S) + 'static) {
        self.done.then(callback);
    }

    /// Resolves to the surface on full reveal or cancellation
    pub fn finished(&self) -> Wait<S> {
        self.done.wait()
    }
}

struct RevealLoop<F, S> {
    scheduler: F,
    surface: S,
    renderer: FrameRenderer,
    pixels: PixelBuffer,
    cancel: CancelToken,
    frame: Rc<Cell<u32>>,
    done: Deferred<S>,
}

impl<F, S> RevealLoop<F, S>
where
    F: FrameScheduler + Clone + 'static,
    S: Surface,
{
    fn tick(mut self) {
        if self.cancel.is_cancelled() {
            self.done.resolve(self.surface);
            return;
        }

        let revealed = self.renderer.paint(&mut self.pixels);
        self.surface.present(&self.pixels);
        self.frame.set(self.renderer.frame());

        if revealed {
            log::debug!("Ripple revealed after {} frames", self.renderer.frame() + 1);
            self.done.resolve(self.surface);
            return;
        }

        self.renderer.advance();
        let scheduler = self.scheduler.clone();
        scheduler.request_frame(Box::new(move || self.tick()));
    }
}

/// Start revealing `schedule` on `surface`; the first paint happens on the next frame.
pub fn play<F, S>(
    scheduler: &F,
    surface: S,
    schedule: RenderSchedule,
    color: Color,
) -> AnimationHandle<S>
where
    F: FrameScheduler + Clone + 'static,
    S: Surface,
{
    let handle = AnimationHandle {
        surface: surface.clone(),
        cancel: CancelToken::default(),
        frame: Rc::new(Cell::new(0)),
        done: Deferred::new(),
    };

    let pixels = PixelBuffer::new(surface.width(), surface.height());
    let reveal = RevealLoop {
        scheduler: scheduler.clone(),
        surface,
        renderer: FrameRenderer::new(schedule, color),
        pixels,
        cancel: handle.cancel.clone(),
        frame: handle.frame.clone(),
        done: handle.done.clone(),
    };
    scheduler.request_frame(Box::new(move || reveal.tick()));

    handle
}

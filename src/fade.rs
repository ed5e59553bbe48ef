//! Fade-out and removal of a ripple surface

use crate::consts::DEFAULT_OPACITY_STEP;
use crate::host::{Fadeable, FrameScheduler};
use crate::task::Deferred;

struct FadeLoop<F, T> {
    scheduler: F,
    target: T,
    opacity: f64,
    step: f64,
    done: Deferred<()>,
}

impl<F, T> FadeLoop<F, T>
where
    F: FrameScheduler + Clone + 'static,
    T: Fadeable + 'static,
{
    fn tick(mut self) {
        self.opacity -= self.step;
        if self.opacity <= 0.0 {
            self.target.set_opacity(0.0);
            if !self.target.detach() {
                log::debug!("Fade target was already detached");
            }
            self.done.resolve(());
            return;
        }

        self.target.set_opacity(self.opacity);
        let scheduler = self.scheduler.clone();
        scheduler.request_frame(Box::new(move || self.tick()));
    }
}

/// Fade `target` out by `opacity_step` per frame, then detach it from its parent.
/// Settles once the target is detached.
pub fn transparentize<F, T>(scheduler: &F, target: T, opacity_step: f64) -> Deferred<()>
where
    F: FrameScheduler + Clone + 'static,
    T: Fadeable + 'static,
{
    let step = if opacity_step > 0.0 {
        opacity_step
    } else {
        log::warn!(
            "Opacity step {} would never finish, using {}",
            opacity_step,
            DEFAULT_OPACITY_STEP
        );
        DEFAULT_OPACITY_STEP
    };

    let done = Deferred::new();
    let fade = FadeLoop {
        scheduler: scheduler.clone(),
        target,
        opacity: 1.0,
        step,
        done: done.clone(),
    };
    scheduler.request_frame(Box::new(move || fade.tick()));
    done
}

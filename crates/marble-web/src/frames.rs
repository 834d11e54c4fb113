//! `requestAnimationFrame` frame scheduler.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use marble_core::FrameScheduler;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

type FrameClosure = Closure<dyn FnMut(f64)>;

/// Schedules the bound callback on the browser's next repaint.
///
/// Clones share the callback slot and the pending request id, so the host
/// binds the callback on one clone after handing another to the engine.
/// Rebinding or unbinding from inside the callback is allowed: the running
/// closure is parked until it returns.
#[derive(Clone, Default)]
pub struct AnimationFrames {
    callback: Rc<RefCell<Option<FrameClosure>>>,
    pending: Rc<Cell<Option<i32>>>,
    running: Rc<Cell<bool>>,
    retired: Rc<RefCell<Vec<FrameClosure>>>,
}

impl AnimationFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the function run on each scheduled frame.
    pub fn bind(&self, mut callback: impl FnMut(f64) + 'static) {
        let running = self.running.clone();
        let closure = Closure::new(move |timestamp: f64| {
            running.set(true);
            callback(timestamp);
            running.set(false);
        });
        let previous = self.callback.borrow_mut().replace(closure);
        self.release(previous);
    }

    /// Drops the callback and any pending request.
    pub fn unbind(&self) {
        self.cancel_pending();
        let previous = self.callback.borrow_mut().take();
        self.release(previous);
    }

    pub fn is_bound(&self) -> bool {
        self.callback.borrow().is_some()
    }

    /// Drops `previous` now, or parks it while a frame is running.
    fn release(&self, previous: Option<FrameClosure>) {
        let mut retired = self.retired.borrow_mut();
        if self.running.get() {
            retired.extend(previous);
        } else {
            retired.clear();
            drop(previous);
        }
    }

    fn cancel_pending(&self) {
        if let Some(id) = self.pending.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }

    /// Runs the bound callback immediately, as the browser would.
    #[cfg(test)]
    pub(crate) fn fire(&self) -> bool {
        let function = self
            .callback
            .borrow()
            .as_ref()
            .map(|closure| closure.as_ref().unchecked_ref::<js_sys::Function>().clone());
        match function {
            Some(function) => function.call1(&JsValue::NULL, &JsValue::from(0.0)).is_ok(),
            None => false,
        }
    }
}

impl FrameScheduler for AnimationFrames {
    fn schedule(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(ref closure) = *self.callback.borrow() {
            let id = window
                .request_animation_frame(closure.as_ref().unchecked_ref())
                .ok();
            self.pending.set(id);
        }
    }

    fn cancel(&mut self) {
        self.cancel_pending();
    }
}

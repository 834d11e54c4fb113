//! Frame scheduling.
//!
//! The engine asks for its next frame through [`FrameScheduler`]; the host
//! answers by calling [`SceneEngine::frame`](super::SceneEngine::frame)
//! on the next display refresh. Cancelling only stops the next request, a
//! frame already running completes.

use std::cell::Cell;
use std::rc::Rc;

/// Requests per-frame callbacks from the host.
pub trait FrameScheduler {
    /// Requests one callback on the next display refresh.
    fn schedule(&mut self);

    /// Drops the pending request, if any.
    fn cancel(&mut self);
}

/// Scheduler for hosts that pump frames themselves.
///
/// Clones share state, so the host keeps one clone and hands the other
/// to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    pending: Rc<Cell<bool>>,
    requests: Rc<Cell<u64>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame has been requested and not yet taken.
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Consumes the pending request. Returns `true` when the host should
    /// run a frame.
    pub fn take(&self) -> bool {
        self.pending.replace(false)
    }

    /// Total requests made since creation.
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl FrameScheduler for ManualFrames {
    fn schedule(&mut self) {
        self.pending.set(true);
        self.requests.set(self.requests.get() + 1);
    }

    fn cancel(&mut self) {
        self.pending.set(false);
    }
}

//! Process-wide shutdown flag shared between the signal watcher and the
//! readiness handler.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Whether the process has begun its graceful shutdown.
///
/// Starts `false`. The signal watcher flips it to `true` once; the readiness
/// probe reads it on every request. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownState {
    shutting_down: Arc<AtomicBool>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the process as shutting down.
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    pub fn begin_shutdown(&self) -> bool {
        !self.shutting_down.swap(true, Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

//! Graceful shutdown on termination signals.
//!
//! On SIGTERM (or SIGINT / Ctrl+C) the watcher:
//! - flips [`ShutdownState`] so `/ready` starts failing
//! - waits the drain interval while the orchestrator stops routing traffic here
//! - returns [`WatchOutcome::Drained`], after which `main` exits with code 0
//!
//! `/alive` keeps passing throughout, so the pod is not restarted mid-drain.

use std::{future::Future, io, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::ShutdownState;

/// How [`watch`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A signal arrived and the full drain interval elapsed.
    Drained,
    /// The cancellation token fired first.
    Cancelled,
}

/// Termination signal listeners, registered up front so a registration
/// failure surfaces at startup instead of inside the watcher task.
#[cfg(unix)]
pub struct TerminationSignals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    /// Wait for the next termination signal and return its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

#[cfg(windows)]
pub struct TerminationSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl TerminationSignals {
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    pub async fn recv(&mut self) -> &'static str {
        self.ctrl_c.recv().await;
        "CTRL_C"
    }
}

/// Run the signal watcher until it drains or is cancelled.
///
/// `trigger` resolves with the name of the signal that started shutdown; in
/// production it is [`TerminationSignals::recv`], tests pass their own future.
/// Cancelling during the drain returns early but leaves the flag set.
pub async fn watch<F>(
    state: ShutdownState,
    drain: Duration,
    trigger: F,
    cancel: CancellationToken,
) -> WatchOutcome
where
    F: Future<Output = &'static str>,
{
    info!("watching for termination signals");

    let signal = tokio::select! {
        signal = trigger => signal,
        _ = cancel.cancelled() => {
            debug!("signal watcher cancelled before any signal");
            return WatchOutcome::Cancelled;
        }
    };

    info!(signal, "got termination signal");
    state.begin_shutdown();
    info!(
        drain_secs = drain.as_secs(),
        "graceful shutdown has begun, readiness now failing"
    );

    tokio::select! {
        _ = tokio::time::sleep(drain) => {
            info!("drain interval elapsed");
            WatchOutcome::Drained
        }
        _ = cancel.cancelled() => {
            debug!("signal watcher cancelled during drain");
            WatchOutcome::Cancelled
        }
    }
}

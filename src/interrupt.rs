//! Interrupt handling: SIGINT/SIGTERM abort the run between steps.
//!
//! Uses the `signal-hook` crate for safe flag-based registration. The run
//! orchestrator polls the flag between sequential commands rather than
//! blocking on signals, so an interrupted run still unwinds through the
//! target-process guard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe interrupt state shared between the signal handler and the
/// run orchestrator.
///
/// The flag uses `Ordering::Relaxed`: it is polled between run steps and no
/// ordering with other atomics is required.
#[derive(Clone)]
pub struct InterruptGuard {
    flag: Arc<AtomicBool>,
}

impl InterruptGuard {
    /// Create a guard and register SIGINT/SIGTERM hooks.
    ///
    /// Registration is best-effort; failures are logged to stderr but not
    /// fatal — the harness degrades to uninterruptible, not broken.
    pub fn new() -> Self {
        let guard = Self {
            flag: Arc::new(AtomicBool::new(false)),
        };
        for signal in [SIGINT, SIGTERM] {
            if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&guard.flag)) {
                eprintln!("[SAH-SIGNAL] failed to register signal {signal}: {e}");
            }
        }
        guard
    }

    /// Guard that never fires, for library callers that manage their own
    /// signal disposition.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether an interrupt has been observed.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Request an abort without a signal, for embedding callers that drive
    /// cancellation themselves (e.g. a timeout or a parent supervisor).
    pub fn request(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

impl Default for InterruptGuard {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::warn;

/// Continue flag shared between a Ctrl+C handler and export workers.
///
/// The flag reads `true` while work may continue. Triggering clears it;
/// workers finish the asset in hand and start nothing new.
pub struct ShutdownSignal {
    running: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a new signal in the running state.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a signal cleared by Ctrl+C.
    ///
    /// A second Ctrl+C is not intercepted again by the workers; it only
    /// repeats the warning.
    pub fn install_ctrlc() -> Result<Self> {
        let signal = Self::new();
        let running = signal.flag();
        ctrlc::set_handler(move || {
            if running.swap(false, Ordering::SeqCst) {
                warn!("Interrupted, finishing assets in progress...");
            }
        })?;
        Ok(signal)
    }

    /// Clear the continue flag.
    pub fn trigger(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if shutdown has been triggered.
    pub fn is_shutdown(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    /// The continue flag itself, for sessions that poll it.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

//! Manual hold
//!
//! While the operator swaps a tool by hand the change sequence waits on
//! this signal. The host releases it when the operator resumes; the reset
//! path cancels it.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// How a manual hold ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resume {
    /// Operator resumed (cycle start)
    Continue,
    /// Reset or stop while held
    Cancelled,
}

/// Resume signal for manual intervention
pub struct ManualHold<M: RawMutex> {
    signal: Signal<M, Resume>,
}

impl<M: RawMutex> Default for ManualHold<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> ManualHold<M> {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Discard any stale resume before entering a new hold
    pub fn arm(&self) {
        self.signal.reset();
    }

    /// Let the waiting change continue
    pub fn release(&self) {
        self.signal.signal(Resume::Continue);
    }

    /// Abort the waiting change
    pub fn cancel(&self) {
        self.signal.signal(Resume::Cancelled);
    }

    /// Wait for the operator or the reset path
    pub async fn wait(&self) -> Resume {
        self.signal.wait().await
    }
}

//! Cancellable idle-timeout timer.
//!
//! A [`Watchdog`] sleeps on a cancellation channel for a fixed period and,
//! if nobody cancels it in time, invokes [`TimeoutTarget::on_idle_timeout`]
//! on every registered target. Cancellation is a channel send (or simply
//! dropping the handle), not thread interruption, so a cancelled watchdog
//! can never half-fire.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

/// Something that wants to be told its idle period has elapsed.
pub trait TimeoutTarget: Send + Sync {
    fn on_idle_timeout(&self);
}

/// Handle to a single armed timeout.
///
/// At most one watchdog is live per owner at a time: arming a replacement
/// starts with cancelling (or dropping) the old handle.
pub struct Watchdog {
    cancel: Sender<()>,
}

impl Watchdog {
    /// Arm a watchdog that fires on `targets` after `idle_timeout`.
    pub fn arm(idle_timeout: Duration, targets: Vec<Arc<dyn TimeoutTarget>>) -> Self {
        let (cancel, parked) = bounded::<()>(1);

        thread::spawn(move || match parked.recv_timeout(idle_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                for target in &targets {
                    target.on_idle_timeout();
                }
            }
            // A send or a dropped handle both mean "stand down".
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
        });

        Self { cancel }
    }

    /// Cancel the pending timeout. No-op if it already fired.
    pub fn cancel(&self) {
        let _ = self.cancel.try_send(());
    }
}

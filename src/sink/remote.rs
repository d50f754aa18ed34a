//! Remote sink: uploads report messages through a time-limited session.
//!
//! Session lifecycle: `Disconnected → Connecting → Connected → (idle
//! timeout) → Disconnected`. Every write re-arms the idle watchdog; when it
//! fires the session is torn down, and the next write connects afresh.
//! Failed writes are dropped, never queued.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::clock;
use crate::remote::{RemoteError, RemoteTransport};
use crate::sink::{LogCategory, LogSink};
use crate::watchdog::{TimeoutTarget, Watchdog};

/// Default idle period after which the session is closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(5000);

struct Session {
    transport: Box<dyn RemoteTransport>,
    connected: bool,
    current_date: String,
}

impl Session {
    /// Idempotent: already-connected sessions are left alone, which keeps a
    /// write racing a watchdog disconnect harmless.
    fn ensure_connected(&mut self) -> Result<(), RemoteError> {
        if self.connected {
            return Ok(());
        }
        self.transport.connect()?;
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.transport.disconnect();
            self.connected = false;
        }
    }
}

/// Closes the session once the sink has been idle for the timeout period.
struct IdleDisconnect {
    session: Weak<Mutex<Session>>,
}

impl TimeoutTarget for IdleDisconnect {
    fn on_idle_timeout(&self) {
        if let Some(session) = self.session.upgrade() {
            tracing::debug!("remote session idle, disconnecting");
            session.lock().unwrap().disconnect();
        }
    }
}

/// Sink that forwards report messages to the remote log store.
pub struct RemoteSink {
    session: Arc<Mutex<Session>>,
    watchdog: Mutex<Option<Watchdog>>,
    idle_timeout: Duration,
}

impl RemoteSink {
    /// Sink over `transport` with the default idle timeout.
    pub fn new(transport: Box<dyn RemoteTransport>) -> Self {
        Self::with_idle_timeout(transport, DEFAULT_IDLE_TIMEOUT)
    }

    /// Sink over `transport` with an explicit idle timeout.
    pub fn with_idle_timeout(transport: Box<dyn RemoteTransport>, idle_timeout: Duration) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session {
                transport,
                connected: false,
                current_date: clock::current_date(),
            })),
            watchdog: Mutex::new(None),
            idle_timeout,
        }
    }

    fn arm_watchdog(&self) {
        let target: Arc<dyn TimeoutTarget> = Arc::new(IdleDisconnect {
            session: Arc::downgrade(&self.session),
        });
        let replaced = self
            .watchdog
            .lock()
            .unwrap()
            .replace(Watchdog::arm(self.idle_timeout, vec![target]));
        // The slot should already be empty here; dropping a stale handle
        // cancels it regardless.
        drop(replaced);
    }
}

impl LogSink for RemoteSink {
    fn write(&self, category: LogCategory, message: &str) {
        if let Some(watchdog) = self.watchdog.lock().unwrap().take() {
            watchdog.cancel();
        }

        {
            let mut session = self.session.lock().unwrap();
            if let Err(e) = session.ensure_connected() {
                tracing::warn!(%category, "dropping log write, remote connect failed: {e}");
                return;
            }

            let name = category.file_name(&session.current_date);
            if let Err(e) = session.transport.upload(category.folder(), &name, message.as_bytes())
            {
                tracing::warn!(%category, "remote upload failed: {e}");
            }
        }

        self.arm_watchdog();
    }

    /// Move destination file names to the new date without reconnecting.
    fn refresh_date(&self) {
        self.session.lock().unwrap().current_date = clock::current_date();
    }
}

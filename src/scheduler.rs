//! Background scheduler: a fixed-period tick loop dispatching day-rollover
//! and periodic-interval callbacks.
//!
//! Callbacks run synchronously on the scheduler's own thread; within one
//! tick, day callbacks always run before interval callbacks. Interval
//! matching is a modulo-tolerance test evaluated once per tick, which makes
//! it best-effort: an interval that is not a multiple of the tick period,
//! or whose tolerance window straddles a tick boundary, can be missed or
//! fired twice. That imprecision is documented behavior, not a bug to fix
//! here.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::clock;

/// Default period between ticks.
pub const DEFAULT_TICK: Duration = Duration::from_millis(1000);

/// Default interval-match tolerance. Must stay strictly below the tick
/// period or intervals double-fire on consecutive ticks.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_millis(900);

/// Identifies a registered callback so it can be removed later (boxed
/// closures are not comparable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackId(u64);

type IntervalCallback = Box<dyn Fn(Duration) + Send>;
type DayCallback = Box<dyn Fn() + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    intervals: Vec<(CallbackId, Vec<Duration>, IntervalCallback)>,
    days: Vec<(CallbackId, DayCallback)>,
}

impl Registry {
    fn next_id(&mut self) -> CallbackId {
        self.next_id += 1;
        CallbackId(self.next_id)
    }
}

/// Errors from scheduler state transitions.
#[derive(Debug)]
pub enum SchedulerError {
    AlreadyRunning,
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::AlreadyRunning => write!(f, "scheduler is already running"),
        }
    }
}

impl std::error::Error for SchedulerError {}

/// Decide whether `interval` is due at `elapsed` time since scheduler
/// start. True whenever the elapsed time is within `tolerance` past a
/// multiple of the interval.
fn interval_due(elapsed: Duration, interval: Duration, tolerance: Duration) -> bool {
    if interval.is_zero() {
        return false;
    }
    elapsed.as_millis() % interval.as_millis() <= tolerance.as_millis()
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// The tick-loop scheduler. `Stopped → Running → Stopped`; stopping is
/// cooperative and observed at the top of the next tick.
pub struct Scheduler {
    tick: Duration,
    tolerance: Duration,
    registry: Arc<Mutex<Registry>>,
    date_source: Arc<dyn Fn() -> String + Send + Sync>,
    worker: Option<Worker>,
}

impl Scheduler {
    /// Scheduler with the default 1000 ms tick and 900 ms tolerance.
    pub fn new() -> Self {
        Self::with_periods(DEFAULT_TICK, DEFAULT_TOLERANCE)
    }

    /// Scheduler with explicit tick period and match tolerance.
    pub fn with_periods(tick: Duration, tolerance: Duration) -> Self {
        Self {
            tick,
            tolerance,
            registry: Arc::new(Mutex::new(Registry::default())),
            date_source: Arc::new(clock::current_date),
            worker: None,
        }
    }

    /// Replace the calendar-date source, for simulating rollover.
    #[cfg(test)]
    fn with_date_source(mut self, source: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.date_source = source;
        self
    }

    /// Register `callback` to fire at each of `intervals`, measured from
    /// scheduler start.
    pub fn add_interval_callback(
        &self,
        intervals: Vec<Duration>,
        callback: impl Fn(Duration) + Send + 'static,
    ) -> CallbackId {
        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id();
        registry.intervals.push((id, intervals, Box::new(callback)));
        id
    }

    /// Unregister an interval callback. Unknown ids are ignored.
    pub fn remove_interval_callback(&self, id: CallbackId) {
        let mut registry = self.registry.lock().unwrap();
        registry.intervals.retain(|(cb_id, _, _)| *cb_id != id);
    }

    /// Register `callback` to fire once whenever the calendar date changes.
    pub fn add_day_callback(&self, callback: impl Fn() + Send + 'static) -> CallbackId {
        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id();
        registry.days.push((id, Box::new(callback)));
        id
    }

    /// Unregister a day callback. Unknown ids are ignored.
    pub fn remove_day_callback(&self, id: CallbackId) {
        let mut registry = self.registry.lock().unwrap();
        registry.days.retain(|(cb_id, _)| *cb_id != id);
    }

    /// Start the tick loop on its own thread.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (stop, stop_rx) = bounded::<()>(1);
        let registry = self.registry.clone();
        let date_source = self.date_source.clone();
        let tick = self.tick;
        let tolerance = self.tolerance;

        let handle = thread::spawn(move || {
            let started = Instant::now();
            let mut last_date = date_source();

            loop {
                match stop_rx.recv_timeout(tick) {
                    // Stop request, or the scheduler handle went away.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let registry = registry.lock().unwrap();

                let today = date_source();
                if today != last_date {
                    tracing::debug!(from = %last_date, to = %today, "day rollover");
                    for (_, callback) in &registry.days {
                        callback();
                    }
                    last_date = today;
                }

                let elapsed = started.elapsed();
                for (_, intervals, callback) in &registry.intervals {
                    for &interval in intervals {
                        if interval_due(elapsed, interval, tolerance) {
                            callback(interval);
                        }
                    }
                }
            }
        });

        self.worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Request the loop to exit and wait for the current tick to finish.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.send(());
            if worker.handle.join().is_err() {
                tracing::warn!("scheduler thread panicked before stopping");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

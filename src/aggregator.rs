//! The presence aggregator: turns raw status/activity change events into
//! buffered, human-readable duration lines.
//!
//! One `Timestamped` entry per subject tracks the *current* status, another
//! the current activity. Every incoming change closes the previous interval
//! into a formatted line and opens a new one; `flush` additionally closes
//! the in-progress intervals so a day's report never loses the trailing
//! partial interval.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::{self, Timestamped};
use crate::sink::{LogCategory, LogSink};

/// Presence state of a tracked subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Online,
    Idle,
    DoNotDisturb,
    Offline,
    /// Sentinel meaning "no baseline observed yet". Never reported as an
    /// interval of its own.
    Unknown,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Online => "Online",
            Status::Idle => "Idle",
            Status::DoNotDisturb => "DoNotDisturb",
            Status::Offline => "Offline",
            Status::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A subject's state at initialization time.
#[derive(Debug, Clone)]
pub struct SubjectSnapshot {
    pub id: String,
    pub status: Status,
    pub activity: Option<String>,
}

impl SubjectSnapshot {
    /// Snapshot for a subject nothing has been observed about yet.
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: Status::Unknown,
            activity: None,
        }
    }
}

/// Errors from the aggregator's initialization path.
#[derive(Debug)]
pub enum RosterError {
    /// The roster was empty where at least one tracked subject was
    /// expected. The aggregator keeps working in a degraded state: unknown
    /// subjects are adopted on their first observed change.
    Empty,
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Empty => write!(f, "subject roster is empty"),
        }
    }
}

impl std::error::Error for RosterError {}

/// Buffers presence transitions per subject and flushes them through a
/// [`LogSink`].
///
/// Not internally synchronized: events are expected to arrive from a single
/// writer at a time. Callers that deliver events and rollover from
/// different threads wrap this in a mutex.
pub struct PresenceAggregator {
    sink: Arc<dyn LogSink>,
    status: HashMap<String, Timestamped<Status>>,
    activity: HashMap<String, Timestamped<Option<String>>>,
    status_lines: Vec<String>,
    activity_lines: Vec<String>,
    debug_lines: Vec<String>,
    direct_message_lines: Vec<String>,
}

impl PresenceAggregator {
    /// Create an aggregator flushing into `sink`, with no tracked subjects.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            status: HashMap::new(),
            activity: HashMap::new(),
            status_lines: Vec::new(),
            activity_lines: Vec::new(),
            debug_lines: Vec::new(),
            direct_message_lines: Vec::new(),
        }
    }

    /// Populate both maps from a roster snapshot.
    ///
    /// Only the subject's actual current status and activity get a live
    /// entry; other statuses stay untracked until first observed. After
    /// this every tracked subject has exactly one entry in each map.
    pub fn init(&mut self, roster: &[SubjectSnapshot]) -> Result<(), RosterError> {
        if roster.is_empty() {
            return Err(RosterError::Empty);
        }

        for subject in roster {
            self.status
                .insert(subject.id.clone(), Timestamped::new(subject.status));
            self.activity
                .insert(subject.id.clone(), Timestamped::new(subject.activity.clone()));
        }
        Ok(())
    }

    /// Number of subjects with live entries.
    pub fn tracked_subjects(&self) -> usize {
        self.status.len()
    }

    /// Record a status change for `id`.
    ///
    /// The first observation of a subject (no entry yet, or a live
    /// `Unknown` baseline) only establishes the new status; a repeated
    /// status is a no-op; everything else closes the previous interval into
    /// a Status line.
    pub fn on_status_change(&mut self, id: &str, new_status: Status) {
        match self.status.entry(id.to_string()) {
            Entry::Vacant(slot) => {
                // Subject unknown to the roster: adopt it silently so a
                // stale roster degrades instead of dropping data.
                slot.insert(Timestamped::new(new_status));
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                let old_status = *entry.value();
                if old_status == new_status {
                    return;
                }

                if old_status != Status::Unknown {
                    self.status_lines.push(format!(
                        "{} was {} for {}",
                        id,
                        old_status,
                        clock::duration_to_readable(entry.elapsed())
                    ));
                }

                *entry = Timestamped::new(new_status);
            }
        }
    }

    /// Record an activity change for `id`. `None` means the subject is not
    /// currently doing anything.
    pub fn on_activity_change(&mut self, id: &str, new_activity: Option<String>) {
        match self.activity.entry(id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(Timestamped::new(new_activity));
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if *entry.value() == new_activity {
                    return;
                }

                if let Some(old_name) = entry.value() {
                    self.activity_lines.push(format!(
                        "{} played {} for {}",
                        id,
                        old_name,
                        clock::duration_to_readable(entry.elapsed())
                    ));
                }

                *entry = Timestamped::new(new_activity);
            }
        }
    }

    /// Buffer a timestamped diagnostic line under `category`.
    pub fn add_debug_line(&mut self, category: LogCategory, message: &str) {
        self.debug_lines.push(format!(
            "[{} | {}]: {}",
            clock::current_time(),
            category,
            message
        ));
    }

    /// Buffer a received direct message.
    pub fn add_direct_message(&mut self, sender: &str, message: &str) {
        self.direct_message_lines
            .push(format!("[{}] {}: {}", clock::current_time(), sender, message));
    }

    /// Close all in-progress intervals, hand each non-empty buffer to the
    /// sink once, and clear the buffers.
    ///
    /// Live entries persist, re-stamped at the flush instant so the
    /// interval just reported is not counted again by the next flush.
    pub fn flush(&mut self) {
        for (id, entry) in &mut self.status {
            let status = *entry.value();
            if status == Status::Unknown {
                continue;
            }
            self.status_lines.push(format!(
                "{} was {} for {}",
                id,
                status,
                clock::duration_to_readable(entry.elapsed())
            ));
            *entry = Timestamped::new(status);
        }

        for (id, entry) in &mut self.activity {
            let Some(name) = entry.value().clone() else {
                continue;
            };
            self.activity_lines.push(format!(
                "{} played {} for {}",
                id,
                name,
                clock::duration_to_readable(entry.elapsed())
            ));
            *entry = Timestamped::new(Some(name));
        }

        let buffers = [
            (LogCategory::Status, &mut self.status_lines),
            (LogCategory::Activity, &mut self.activity_lines),
            (LogCategory::Debug, &mut self.debug_lines),
            (LogCategory::DirectMessage, &mut self.direct_message_lines),
        ];

        for (category, buffer) in buffers {
            if buffer.is_empty() {
                continue;
            }
            self.sink.write(category, &buffer.join("\n"));
            buffer.clear();
        }
    }

    /// Day-rollover entry point: flush the ending day and move the sink's
    /// date context to the new one. Flushing already re-baselines every
    /// live entry, so the new day starts from a fresh snapshot.
    pub fn rollover(&mut self) {
        self.flush();
        self.sink.refresh_date();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testing::MemorySink;

    fn aggregator() -> (PresenceAggregator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let mut agg = PresenceAggregator::new(sink.clone());
        agg.init(&[
            SubjectSnapshot {
                id: "alice".into(),
                status: Status::Online,
                activity: None,
            },
            SubjectSnapshot::unknown("bob"),
        ])
        .unwrap();
        (agg, sink)
    }

    #[test]
    fn test_init_rejects_empty_roster() {
        let sink = Arc::new(MemorySink::default());
        let mut agg = PresenceAggregator::new(sink);
        assert!(matches!(agg.init(&[]), Err(RosterError::Empty)));

        // Degraded operation: unknown subjects are still adopted.
        agg.on_status_change("carol", Status::Online);
        assert_eq!(agg.tracked_subjects(), 1);
    }

    #[test]
    fn test_status_transition_emits_one_line() {
        let (mut agg, sink) = aggregator();

        agg.on_status_change("alice", Status::Idle);
        agg.flush();

        let messages = sink.messages_for(LogCategory::Status);
        assert_eq!(messages.len(), 1);
        let lines: Vec<&str> = messages[0].lines().collect();
        // One transition line plus closing lines for alice (Idle) — bob is
        // still Unknown and contributes nothing.
        assert!(lines[0].starts_with("alice was Online for "));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("alice was ")).count(),
            2
        );
        assert!(!messages[0].contains("bob"));
        assert!(!messages[0].contains("Unknown"));
    }

    #[test]
    fn test_repeated_status_is_noop() {
        let (mut agg, sink) = aggregator();

        agg.on_status_change("alice", Status::Online);
        agg.on_status_change("alice", Status::Online);
        agg.flush();

        let messages = sink.messages_for(LogCategory::Status);
        // Only the closing line for the live status.
        assert_eq!(messages[0].lines().count(), 1);
    }

    #[test]
    fn test_first_observation_from_unknown_emits_nothing() {
        let (mut agg, sink) = aggregator();

        agg.on_status_change("bob", Status::DoNotDisturb);
        agg.flush();

        let messages = sink.messages_for(LogCategory::Status);
        let bob_lines: Vec<&str> = messages[0]
            .lines()
            .filter(|l| l.starts_with("bob"))
            .collect();
        // Just the closing line for the newly established status.
        assert_eq!(bob_lines.len(), 1);
        assert!(bob_lines[0].starts_with("bob was DoNotDisturb for "));
    }

    #[test]
    fn test_line_count_matches_transitions() {
        let (mut agg, sink) = aggregator();

        let sequence = [
            Status::Idle,
            Status::Idle, // no-op
            Status::Offline,
            Status::Online,
        ];
        for status in sequence {
            agg.on_status_change("alice", status);
        }
        agg.flush();

        let messages = sink.messages_for(LogCategory::Status);
        let alice_lines = messages[0]
            .lines()
            .filter(|l| l.starts_with("alice was "))
            .count();
        // Three real transitions plus one closing line.
        assert_eq!(alice_lines, 4);
    }

    #[test]
    fn test_activity_start_stop() {
        let (mut agg, sink) = aggregator();

        agg.on_activity_change("alice", Some("chess".into()));
        agg.on_activity_change("alice", Some("chess".into())); // no-op
        agg.on_activity_change("alice", None);
        agg.flush();

        let messages = sink.messages_for(LogCategory::Activity);
        assert_eq!(messages.len(), 1);
        let lines: Vec<&str> = messages[0].lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("alice played chess for "));
    }

    #[test]
    fn test_activity_switch_closes_old_interval() {
        let (mut agg, sink) = aggregator();

        agg.on_activity_change("alice", Some("chess".into()));
        agg.on_activity_change("alice", Some("go".into()));
        agg.flush();

        let messages = sink.messages_for(LogCategory::Activity);
        let lines: Vec<&str> = messages[0].lines().collect();
        assert!(lines[0].starts_with("alice played chess for "));
        // Closing line for the still-running activity.
        assert!(lines[1].starts_with("alice played go for "));
    }

    #[test]
    fn test_flush_is_idempotent_up_to_closing_lines() {
        let (mut agg, sink) = aggregator();

        agg.on_status_change("alice", Status::Idle);
        agg.flush();
        let after_first = sink.messages_for(LogCategory::Status).len();

        agg.flush();
        let second: Vec<String> = sink.messages_for(LogCategory::Status)
            [after_first..]
            .to_vec();
        // The second flush may only contain closing-line synthesis for the
        // live status, freshly re-stamped at the first flush.
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].lines().count(), 1);
        assert!(second[0].starts_with("alice was Idle for 00:00:00"));
    }

    #[test]
    fn test_debug_and_direct_message_buffers() {
        let (mut agg, sink) = aggregator();

        agg.add_debug_line(LogCategory::Warning, "remote unreachable");
        agg.add_direct_message("mallory", "hello there");
        agg.flush();

        let debug = sink.messages_for(LogCategory::Debug);
        assert_eq!(debug.len(), 1);
        assert!(debug[0].contains("| Warning]: remote unreachable"));

        let dms = sink.messages_for(LogCategory::DirectMessage);
        assert_eq!(dms.len(), 1);
        assert!(dms[0].contains("mallory: hello there"));
    }

    #[test]
    fn test_flush_skips_empty_buffers() {
        let sink = Arc::new(MemorySink::default());
        let mut agg = PresenceAggregator::new(sink.clone());
        agg.init(&[SubjectSnapshot::unknown("bob")]).unwrap();

        agg.flush();
        assert!(sink.writes.lock().unwrap().is_empty());
    }
}

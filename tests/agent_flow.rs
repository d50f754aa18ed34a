//! End-to-end flow: parsed events through the aggregator into local report
//! files.

use std::sync::Arc;

use presence_agent::aggregator::{PresenceAggregator, SubjectSnapshot};
use presence_agent::event::PresenceEvent;
use presence_agent::sink::{LocalFileSink, SplitSink};

fn dispatch(aggregator: &mut PresenceAggregator, line: &str) {
    match PresenceEvent::parse_line(line).unwrap() {
        PresenceEvent::Status { subject, status } => {
            aggregator.on_status_change(&subject, status);
        }
        PresenceEvent::Activity { subject, activity } => {
            aggregator.on_activity_change(&subject, activity);
        }
        PresenceEvent::DirectMessage { sender, body } => {
            aggregator.add_direct_message(&sender, &body);
        }
    }
}

#[test]
fn test_events_end_up_in_report_files() {
    let dir = tempfile::tempdir().unwrap();
    let local = Arc::new(LocalFileSink::new(dir.path()));
    let sink = Arc::new(SplitSink::new(local.clone(), local.clone()));

    let mut aggregator = PresenceAggregator::new(sink);
    aggregator
        .init(&[
            SubjectSnapshot::unknown("alice"),
            SubjectSnapshot::unknown("bob"),
        ])
        .unwrap();

    dispatch(&mut aggregator, "status alice online");
    dispatch(&mut aggregator, "status alice idle");
    dispatch(&mut aggregator, "activity bob Deep Rock Galactic");
    dispatch(&mut aggregator, "activity bob");
    dispatch(&mut aggregator, "dm carol are you around?");
    aggregator.flush();

    let logs_dir = dir.path().join("Logs");
    let debug_dir = dir.path().join("Debug");

    let status_file = find_file(&logs_dir, "Status");
    let status = std::fs::read_to_string(status_file).unwrap();
    assert!(status.starts_with("Session start on the "));
    assert!(status.contains("alice was Online for 00:00:0"));
    assert!(status.contains("alice was Idle for 00:00:0"));
    // bob never had a status observation, only activity.
    assert!(!status.contains("bob"));

    let activity_file = find_file(&logs_dir, "Activity");
    let activity = std::fs::read_to_string(activity_file).unwrap();
    assert!(activity.contains("bob played Deep Rock Galactic for 00:00:0"));

    let dm_file = find_file(&debug_dir, "DirectMessage");
    let dms = std::fs::read_to_string(dm_file).unwrap();
    assert!(dms.contains("carol: are you around?"));
}

#[test]
fn test_second_flush_appends_to_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(LocalFileSink::new(dir.path()));

    let mut aggregator = PresenceAggregator::new(sink);
    aggregator
        .init(&[SubjectSnapshot::unknown("alice")])
        .unwrap();

    dispatch(&mut aggregator, "status alice online");
    aggregator.flush();
    dispatch(&mut aggregator, "status alice offline");
    aggregator.flush();

    let status_file = find_file(&dir.path().join("Logs"), "Status");
    let status = std::fs::read_to_string(status_file).unwrap();
    assert_eq!(status.matches("Session start").count(), 1);
    assert!(status.contains("alice was Online for "));
    assert!(status.contains("\n\n"));
    assert!(status.contains("alice was Offline for "));
}

fn find_file(dir: &std::path::Path, stem: &str) -> std::path::PathBuf {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.contains(stem))
                .unwrap_or(false)
        })
        .unwrap_or_else(|| panic!("no {stem} file in {dir:?}"))
}

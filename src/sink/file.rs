//! Local file sink: per-category, per-start-date log files.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::clock;
use crate::sink::{LogCategory, LogSink};

/// Appends messages to `{root}/{folder}/{start-date} - {Category}.log`.
///
/// The date in the file name is the process start date; a restart opens a
/// new file. The first write to a given file in the process lifetime
/// prefixes a session-start banner, later writes a blank-line separator.
pub struct LocalFileSink {
    root: PathBuf,
    start_date: String,
    start_time: String,
    has_written: Mutex<HashSet<String>>,
}

impl LocalFileSink {
    /// Sink rooted at `root`. Directories are created lazily per write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            start_date: clock::current_date(),
            start_time: clock::current_time(),
            has_written: Mutex::new(HashSet::new()),
        }
    }

    fn append(&self, category: LogCategory, message: &str) -> std::io::Result<()> {
        let file_name = category.file_name(&self.start_date);
        let dir = self.root.join(category.folder());
        std::fs::create_dir_all(&dir)?;

        let first_write = self.has_written.lock().unwrap().insert(file_name.clone());
        let payload = if first_write {
            format!(
                "Session start on the {} at {}\n{}",
                self.start_date, self.start_time, message
            )
        } else {
            format!("\n\n{message}")
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(&file_name))?;
        file.write_all(payload.as_bytes())
    }
}

impl LogSink for LocalFileSink {
    fn write(&self, category: LogCategory, message: &str) {
        if let Err(e) = self.append(category, message) {
            tracing::warn!(%category, "dropping log write, file append failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_gets_banner() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalFileSink::new(dir.path());

        sink.write(LogCategory::Status, "alice was Online for 00:00:05");

        let path = dir
            .path()
            .join("Logs")
            .join(LogCategory::Status.file_name(&sink.start_date));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("Session start on the "));
        assert!(contents.ends_with("alice was Online for 00:00:05"));
    }

    #[test]
    fn test_later_writes_append_with_separator() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalFileSink::new(dir.path());

        sink.write(LogCategory::Debug, "first");
        sink.write(LogCategory::Debug, "second");

        let path = dir
            .path()
            .join("Debug")
            .join(LogCategory::Debug.file_name(&sink.start_date));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("first\n\nsecond"));
        // Only one banner.
        assert_eq!(contents.matches("Session start").count(), 1);
    }

    #[test]
    fn test_categories_split_across_folders() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalFileSink::new(dir.path());

        sink.write(LogCategory::Activity, "a");
        sink.write(LogCategory::Warning, "w");

        assert!(dir.path().join("Logs").is_dir());
        assert!(dir.path().join("Debug").is_dir());
    }
}

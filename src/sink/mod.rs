//! Log sinks: capabilities that durably record or forward categorized
//! report messages.
//!
//! Sinks never surface failures to their callers. A flush path must not be
//! able to fail the component that produced the report, so every variant
//! catches its own I/O problems and logs them through `tracing`.

pub mod console;
pub mod direct;
pub mod file;
pub mod remote;
pub mod split;

use std::fmt;

// Re-export commonly used types
pub use console::ConsoleSink;
pub use direct::{DeliveryError, DirectMessageSink, DirectMessenger};
pub use file::LocalFileSink;
pub use remote::RemoteSink;
pub use split::SplitSink;

/// Category of a log message, deciding which report file it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Info,
    Debug,
    Warning,
    Activity,
    Status,
    DirectMessage,
}

impl LogCategory {
    /// Folder a category's files live under, relative to a sink's root.
    ///
    /// Status and activity reports are the product of this agent; everything
    /// else is diagnostics and kept out of the way.
    pub fn folder(self) -> &'static str {
        match self {
            LogCategory::Status | LogCategory::Activity => "Logs",
            LogCategory::Info
            | LogCategory::Debug
            | LogCategory::Warning
            | LogCategory::DirectMessage => "Debug",
        }
    }

    /// File stem used in `"{date} - {stem}.log"` names.
    pub fn file_stem(self) -> &'static str {
        match self {
            LogCategory::Info => "Info",
            LogCategory::Debug => "Debug",
            LogCategory::Warning => "Warning",
            LogCategory::Activity => "Activity",
            LogCategory::Status => "Status",
            LogCategory::DirectMessage => "DirectMessage",
        }
    }

    /// File name for this category on the given report date.
    pub fn file_name(self, date: &str) -> String {
        format!("{} - {}.log", date, self.file_stem())
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// A destination for categorized log messages.
///
/// `write` must be infallible from the caller's point of view; report
/// producers call it from flush paths that have nowhere sensible to send an
/// error.
pub trait LogSink: Send + Sync {
    /// Persist or forward `message` under `category`.
    fn write(&self, category: LogCategory, message: &str);

    /// A new day has started: sinks that bake the current date into
    /// destination names pick up the change here. Default no-op.
    fn refresh_date(&self) {}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_folder_table() {
        assert_eq!(LogCategory::Status.folder(), "Logs");
        assert_eq!(LogCategory::Activity.folder(), "Logs");
        assert_eq!(LogCategory::Info.folder(), "Debug");
        assert_eq!(LogCategory::Debug.folder(), "Debug");
        assert_eq!(LogCategory::Warning.folder(), "Debug");
        assert_eq!(LogCategory::DirectMessage.folder(), "Debug");
    }

    #[test]
    fn test_category_file_name() {
        assert_eq!(
            LogCategory::Status.file_name("01.02.2026"),
            "01.02.2026 - Status.log"
        );
        assert_eq!(
            LogCategory::DirectMessage.file_name("01.02.2026"),
            "01.02.2026 - DirectMessage.log"
        );
    }
}

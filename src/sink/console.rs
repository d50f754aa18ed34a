//! Console sink: everything straight to stdout.

use crate::sink::{LogCategory, LogSink};

/// Writes `"[category]: message"` to standard output. Mostly useful while
/// developing or when no file root is configured yet.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, category: LogCategory, message: &str) {
        println!("[{category}]: {message}");
    }
}

//! Routing sink: reports one way, diagnostics the other.

use std::sync::Arc;

use crate::sink::{LogCategory, LogSink};

/// Wraps two sinks and routes by category: Status and Activity go to the
/// report sink, everything else to the diagnostics sink. Useful because the
/// report categories are the product of this agent while the rest is
/// debug-only.
pub struct SplitSink {
    reports: Arc<dyn LogSink>,
    diagnostics: Arc<dyn LogSink>,
}

impl SplitSink {
    pub fn new(reports: Arc<dyn LogSink>, diagnostics: Arc<dyn LogSink>) -> Self {
        Self {
            reports,
            diagnostics,
        }
    }
}

impl LogSink for SplitSink {
    fn write(&self, category: LogCategory, message: &str) {
        match category {
            LogCategory::Status | LogCategory::Activity => self.reports.write(category, message),
            LogCategory::Info
            | LogCategory::Debug
            | LogCategory::Warning
            | LogCategory::DirectMessage => self.diagnostics.write(category, message),
        }
    }

    fn refresh_date(&self) {
        self.reports.refresh_date();
        self.diagnostics.refresh_date();
    }
}

//! Nullable report sink — record reports instead of printing them.

use std::sync::Mutex;

use govctl_node::{Report, ReportSink};

/// A sink that keeps every report for assertions.
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Report>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports, in emission order.
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.reports().iter().map(Report::kind).collect()
    }

    /// The reports rendered as the console would print them.
    pub fn lines(&self) -> Vec<String> {
        self.reports().iter().map(ToString::to_string).collect()
    }

    pub fn contains_kind(&self, kind: &str) -> bool {
        self.reports().iter().any(|r| r.kind() == kind)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl ReportSink for RecordingSink {
    fn report(&self, report: &Report) {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(report.clone());
    }
}

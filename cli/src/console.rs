//! Report lines on stdout. Logs go to stderr, so the two never interleave
//! in a pipe.

use std::io::{self, Write};
use std::sync::Mutex;

use govctl_node::{Report, ReportSink};

pub struct ConsoleSink<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    fn report(&self, report: &Report) {
        tracing::debug!(kind = report.kind(), "report");
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{report}").and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }
}

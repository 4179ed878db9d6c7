//! # LogWriter: stdout event printer
//!
//! Prints one line per [`Event`]. Meant for demos and debugging.
//!
//! ## Example output
//! ```text
//! [dispatcher-started]
//! [queued] task=1 mode=detached
//! [starting] task=1 mode=detached
//! [failed] task=1 mode=detached reason="connection refused"
//! [failure-unobserved] task=1 mode=detached reason="task 1 failed: connection refused"
//! [wait-timeout] task=2 mode=wait timeout_ms=10
//! ```

use std::fmt::Write as _;

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn format(e: &Event) -> String {
        let mut line = format!("[{}]", e.kind.as_str());
        if let Some(id) = e.task {
            let _ = write!(line, " task={id}");
        }
        if let Some(mode) = e.mode {
            let _ = write!(line, " mode={}", mode.as_str());
        }
        if let Some(ms) = e.timeout_ms {
            let _ = write!(line, " timeout_ms={ms}");
        }
        if let Some(reason) = e.reason.as_deref() {
            let _ = write!(line, " reason={reason:?}");
        }
        line
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", Self::format(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

//! Step progress tracker — per-category open/close state with per-key dedup.

use std::collections::HashSet;

use scout_core::messages::StreamMessage;

/// Tracks one progress category (e.g. the search step) across a turn.
///
/// Guarantees at most one `step.start` while open, at most one `step.status`
/// per trimmed key, and at most one `step.end` per trimmed key. Completion
/// without a key is tracked by a single flag so it also fires at most once.
/// The step may reopen for a new key after closing.
pub struct StepTracker {
    title: String,
    open: bool,
    started_keys: HashSet<String>,
    status_announced: HashSet<String>,
    completed_keys: HashSet<String>,
    completed_without_key: bool,
}

impl StepTracker {
    /// Create a closed tracker for the given step title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            open: false,
            started_keys: HashSet::new(),
            status_announced: HashSet::new(),
            completed_keys: HashSet::new(),
            completed_without_key: false,
        }
    }

    /// Whether the step is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the step. No-op while already open.
    pub fn start(&mut self, description: impl Into<String>) -> Option<StreamMessage> {
        if self.open {
            return None;
        }
        self.open = true;
        Some(StreamMessage::StepStart {
            title: self.title.clone(),
            description: description.into(),
        })
    }

    /// Record a key as seen. Returns `true` the first time a non-empty
    /// trimmed key is recorded, `false` otherwise.
    pub fn record_key(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() || self.started_keys.contains(key) {
            return false;
        }
        let _ = self.started_keys.insert(key.to_owned());
        true
    }

    /// Emit a status line, at most once per trimmed key.
    pub fn status(&mut self, key: &str, description: impl Into<String>) -> Option<StreamMessage> {
        let key = key.trim();
        if key.is_empty() || self.status_announced.contains(key) {
            return None;
        }
        let _ = self.status_announced.insert(key.to_owned());
        Some(StreamMessage::StepStatus {
            title: self.title.clone(),
            description: description.into(),
        })
    }

    /// Close the step for a key (or without one), at most once per key.
    pub fn complete(
        &mut self,
        key: Option<&str>,
        description: impl Into<String>,
    ) -> Option<StreamMessage> {
        let key = key.map(str::trim).unwrap_or_default();
        if key.is_empty() {
            if self.completed_without_key {
                return None;
            }
            self.completed_without_key = true;
        } else {
            if self.completed_keys.contains(key) {
                return None;
            }
            let _ = self.completed_keys.insert(key.to_owned());
        }
        self.open = false;
        Some(StreamMessage::StepEnd {
            title: self.title.clone(),
            description: Some(description.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn start_is_idempotent_while_open() {
        let mut tracker = StepTracker::new("Search");

        let first = tracker.start("starting");
        assert_matches!(first, Some(StreamMessage::StepStart { .. }));
        assert!(tracker.is_open());

        assert!(tracker.start("starting again").is_none());
    }

    #[test]
    fn record_key_dedups_trimmed() {
        let mut tracker = StepTracker::new("Search");
        assert!(tracker.record_key("widgets"));
        assert!(!tracker.record_key("widgets"));
        assert!(!tracker.record_key("  widgets  "));
        assert!(!tracker.record_key(""));
        assert!(!tracker.record_key("   "));
    }

    #[test]
    fn status_fires_once_per_key() {
        let mut tracker = StepTracker::new("Search");
        let first = tracker.status("widgets", "searching widgets");
        assert_matches!(first, Some(StreamMessage::StepStatus { .. }));
        assert!(tracker.status("widgets", "searching widgets").is_none());
        assert!(tracker.status(" widgets ", "searching widgets").is_none());

        // Independent of start/complete.
        assert_matches!(
            tracker.status("gadgets", "searching gadgets"),
            Some(StreamMessage::StepStatus { .. })
        );
    }

    #[test]
    fn complete_fires_once_per_key() {
        let mut tracker = StepTracker::new("Search");
        let _ = tracker.start("starting");

        let end = tracker.complete(Some("widgets"), "found 3");
        assert_matches!(end, Some(StreamMessage::StepEnd { .. }));
        assert!(!tracker.is_open());

        assert!(tracker.complete(Some("widgets"), "found 3").is_none());
        assert!(tracker.complete(Some(" widgets "), "found 3").is_none());
    }

    #[test]
    fn complete_without_key_fires_once_globally() {
        let mut tracker = StepTracker::new("Search");
        assert_matches!(
            tracker.complete(None, "done"),
            Some(StreamMessage::StepEnd { .. })
        );
        assert!(tracker.complete(None, "done").is_none());
        assert!(tracker.complete(Some(""), "done").is_none());
        assert!(tracker.complete(Some("  "), "done").is_none());
    }

    #[test]
    fn reopens_for_a_new_key() {
        let mut tracker = StepTracker::new("Search");
        let _ = tracker.start("first query");
        let _ = tracker.complete(Some("first"), "done");
        assert!(!tracker.is_open());

        let reopened = tracker.start("second query");
        assert_matches!(reopened, Some(StreamMessage::StepStart { .. }));
        assert_matches!(
            tracker.complete(Some("second"), "done"),
            Some(StreamMessage::StepEnd { .. })
        );
    }

    #[test]
    fn end_carries_title_and_description() {
        let mut tracker = StepTracker::new("Running web search");
        let _ = tracker.start("go");
        let end = tracker.complete(Some("q"), "Found 2 candidates").unwrap();
        assert_eq!(
            end,
            StreamMessage::StepEnd {
                title: "Running web search".into(),
                description: Some("Found 2 candidates".into()),
            }
        );
    }
}

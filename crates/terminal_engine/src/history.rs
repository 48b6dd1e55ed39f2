//! Submitted-command history with a non-wrapping replay cursor.

/// Replay direction for [`CommandHistory::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    /// Towards the first submission.
    Older,
    /// Towards the latest submission, then back to a blank input.
    Newer,
}

/// Append-only list of raw submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl CommandHistory {
    /// Appends a raw submission and stops browsing.
    pub fn push(&mut self, raw: impl Into<String>) {
        self.entries.push(raw.into());
        self.cursor = None;
    }

    /// Stops browsing.
    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// Current replay index, `None` when not browsing.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Commands oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Moves the cursor and returns the text the input should show.
    ///
    /// Returns `None` when history is empty. Moving newer past the latest entry yields an empty
    /// string and stops browsing; moving older from the first entry stays there.
    pub fn navigate(&mut self, direction: HistoryDirection) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let next = match (self.cursor, direction) {
            (None, HistoryDirection::Older) => Some(self.entries.len() - 1),
            (Some(index), HistoryDirection::Older) => Some(index.saturating_sub(1)),
            (Some(index), HistoryDirection::Newer) if index + 1 < self.entries.len() => {
                Some(index + 1)
            }
            (Some(_), HistoryDirection::Newer) | (None, HistoryDirection::Newer) => None,
        };

        self.cursor = next;
        Some(match next {
            Some(index) => self.entries[index].clone(),
            None => String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> CommandHistory {
        let mut history = CommandHistory::default();
        for entry in entries {
            history.push(*entry);
        }
        history
    }

    #[test]
    fn older_clamps_at_the_first_entry() {
        let mut history = history(&["a", "b", "c"]);
        let recalled: Vec<_> = (0..5)
            .filter_map(|_| history.navigate(HistoryDirection::Older))
            .collect();
        assert_eq!(recalled, vec!["c", "b", "a", "a", "a"]);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn newer_past_latest_clears_and_stops_browsing() {
        let mut history = history(&["a", "b"]);
        history.navigate(HistoryDirection::Older);
        history.navigate(HistoryDirection::Older);
        assert_eq!(history.navigate(HistoryDirection::Newer).as_deref(), Some("b"));
        assert_eq!(history.navigate(HistoryDirection::Newer).as_deref(), Some(""));
        assert_eq!(history.cursor(), None);
        assert_eq!(history.navigate(HistoryDirection::Newer).as_deref(), Some(""));
    }

    #[test]
    fn empty_history_is_a_no_op() {
        let mut history = CommandHistory::default();
        assert_eq!(history.navigate(HistoryDirection::Older), None);
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn push_resets_the_cursor() {
        let mut history = history(&["a"]);
        history.navigate(HistoryDirection::Older);
        history.push("b");
        assert_eq!(history.cursor(), None);
        assert_eq!(history.navigate(HistoryDirection::Older).as_deref(), Some("b"));
    }
}

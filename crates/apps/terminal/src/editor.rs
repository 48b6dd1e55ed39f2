//! Single-line input editing over crossterm key events.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the front end to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// The buffer or cursor changed.
    Edited,
    /// Enter was pressed; carries the submitted line.
    Submit(String),
    /// Recall an older history entry.
    HistoryOlder,
    /// Recall a newer history entry.
    HistoryNewer,
    /// Complete the command name under the cursor.
    Complete,
    /// Abandon the current line or prompt.
    Cancel,
    /// Redraw from an empty screen.
    ClearScreen,
    /// Leave the terminal.
    Quit,
    /// Nothing to do.
    Ignored,
}

/// Result of [`LineEditor::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// No candidate matches.
    NoMatch,
    /// The buffer now holds the single match.
    Unique,
    /// Several candidates share the prefix.
    Ambiguous(Vec<String>),
}

/// Editable line with a character cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEditor {
    buffer: String,
    cursor: usize,
}

impl LineEditor {
    /// Creates an empty editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replaces the text and moves the cursor to the end; identical text keeps the cursor.
    pub fn set(&mut self, text: &str) {
        if self.buffer != text {
            self.buffer = text.to_string();
            self.cursor = self.buffer.chars().count();
        }
    }

    /// Empties the editor, returning the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(chars)
            .map_or(self.buffer.len(), |(index, _)| index)
    }

    fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, ch);
        self.cursor += 1;
    }

    fn remove_at(&mut self, chars: usize) -> bool {
        if chars >= self.buffer.chars().count() {
            return false;
        }
        let at = self.byte_index(chars);
        self.buffer.remove(at);
        true
    }

    /// Applies one key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if key.kind == KeyEventKind::Release {
            return EditorAction::Ignored;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => EditorAction::Cancel,
                KeyCode::Char('d') if self.buffer.is_empty() => EditorAction::Quit,
                KeyCode::Char('l') => EditorAction::ClearScreen,
                KeyCode::Char('a') => self.move_to(0),
                KeyCode::Char('e') => self.move_to(self.buffer.chars().count()),
                KeyCode::Char('u') => {
                    let at = self.byte_index(self.cursor);
                    self.buffer.replace_range(..at, "");
                    self.cursor = 0;
                    EditorAction::Edited
                }
                _ => EditorAction::Ignored,
            };
        }

        match key.code {
            KeyCode::Enter => EditorAction::Submit(self.take()),
            KeyCode::Char(ch) => {
                self.insert(ch);
                EditorAction::Edited
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.remove_at(self.cursor);
                EditorAction::Edited
            }
            KeyCode::Delete if self.remove_at(self.cursor) => EditorAction::Edited,
            KeyCode::Left if self.cursor > 0 => self.move_to(self.cursor - 1),
            KeyCode::Right => self.move_to(self.cursor + 1),
            KeyCode::Home => self.move_to(0),
            KeyCode::End => self.move_to(self.buffer.chars().count()),
            KeyCode::Up => EditorAction::HistoryOlder,
            KeyCode::Down => EditorAction::HistoryNewer,
            KeyCode::Tab => EditorAction::Complete,
            KeyCode::Esc => EditorAction::Cancel,
            _ => EditorAction::Ignored,
        }
    }

    fn move_to(&mut self, cursor: usize) -> EditorAction {
        let cursor = cursor.min(self.buffer.chars().count());
        if cursor == self.cursor {
            return EditorAction::Ignored;
        }
        self.cursor = cursor;
        EditorAction::Edited
    }

    /// Completes a command name typed as the only token.
    pub fn complete(&mut self, candidates: &[String]) -> Completion {
        if self.buffer.contains(char::is_whitespace) {
            return Completion::NoMatch;
        }
        let typed = self.buffer.to_lowercase();
        let matches: Vec<&String> = candidates
            .iter()
            .filter(|name| name.starts_with(&typed))
            .collect();
        match matches.as_slice() {
            [] => Completion::NoMatch,
            [only] => {
                self.set(&format!("{only} "));
                Completion::Unique
            }
            [first, rest @ ..] => {
                let shared = rest.iter().fold(first.len(), |len, name| {
                    first
                        .bytes()
                        .zip(name.bytes())
                        .take(len)
                        .take_while(|(a, b)| a == b)
                        .count()
                });
                if shared > typed.len() {
                    self.set(&first[..shared]);
                }
                Completion::Ambiguous(matches.iter().map(|name| name.to_string()).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(editor: &mut LineEditor, text: &str) {
        for ch in text.chars() {
            editor.handle_key(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn typing_and_enter_submit_the_line() {
        let mut editor = LineEditor::new();
        type_text(&mut editor, "help");
        assert_eq!(
            editor.handle_key(key(KeyCode::Enter)),
            EditorAction::Submit("help".to_string())
        );
        assert_eq!(editor.buffer(), "");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn cursor_edits_in_the_middle_of_multibyte_text() {
        let mut editor = LineEditor::new();
        type_text(&mut editor, "héllo");
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.buffer(), "hélo");
        type_text(&mut editor, "L");
        assert_eq!(editor.buffer(), "héLlo");
        editor.handle_key(key(KeyCode::Home));
        editor.handle_key(key(KeyCode::Delete));
        assert_eq!(editor.buffer(), "éLlo");
        assert_eq!(editor.handle_key(key(KeyCode::Left)), EditorAction::Ignored);
    }

    #[test]
    fn control_keys_map_to_actions() {
        let mut editor = LineEditor::new();
        assert_eq!(editor.handle_key(ctrl('d')), EditorAction::Quit);
        type_text(&mut editor, "abc def");
        assert_eq!(editor.handle_key(ctrl('d')), EditorAction::Ignored);
        assert_eq!(editor.handle_key(ctrl('l')), EditorAction::ClearScreen);
        assert_eq!(editor.handle_key(ctrl('c')), EditorAction::Cancel);
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(ctrl('u'));
        assert_eq!(editor.buffer(), "ef");
        assert_eq!(editor.handle_key(key(KeyCode::Up)), EditorAction::HistoryOlder);
    }

    #[test]
    fn set_keeps_the_cursor_for_identical_text() {
        let mut editor = LineEditor::new();
        type_text(&mut editor, "abc");
        editor.handle_key(key(KeyCode::Left));
        editor.set("abc");
        assert_eq!(editor.cursor(), 2);
        editor.set("about");
        assert_eq!(editor.cursor(), 5);
    }

    #[test]
    fn completion_extends_unique_and_shared_prefixes() {
        let names: Vec<String> = ["about", "admin", "dashboard", "delete", "download"]
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut editor = LineEditor::new();
        type_text(&mut editor, "ab");
        assert_eq!(editor.complete(&names), Completion::Unique);
        assert_eq!(editor.buffer(), "about ");

        let mut editor = LineEditor::new();
        type_text(&mut editor, "d");
        assert_eq!(
            editor.complete(&names),
            Completion::Ambiguous(vec![
                "dashboard".to_string(),
                "delete".to_string(),
                "download".to_string()
            ])
        );
        assert_eq!(editor.buffer(), "d");

        let mut editor = LineEditor::new();
        type_text(&mut editor, "x");
        assert_eq!(editor.complete(&names), Completion::NoMatch);
    }
}

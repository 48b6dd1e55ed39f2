//! Raw-mode rendering of scrollback lines and the input prompt.

use std::io::{self, Write};

use crossterm::{
    cursor::{MoveTo, MoveToColumn},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use site_contract::{LineKind, OutputLine};
use terminal_engine::format::printable;

/// Foreground color for a line kind; `None` keeps the terminal default.
pub fn line_color(kind: LineKind) -> Option<Color> {
    match kind {
        LineKind::Boot => Some(Color::DarkGrey),
        LineKind::Command => Some(Color::Cyan),
        LineKind::Output => None,
        LineKind::Error => Some(Color::Red),
        LineKind::Success => Some(Color::Green),
    }
}

/// Writes styled lines above a redrawable prompt row.
pub struct Screen<W: Write> {
    out: W,
}

impl<W: Write> Screen<W> {
    /// Wraps an output sink.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying sink.
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn print_colored(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        let text = printable(text);
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        match color {
            Some(color) => queue!(self.out, SetForegroundColor(color), Print(&text), ResetColor)?,
            None => queue!(self.out, Print(&text))?,
        }
        queue!(self.out, Print("\r\n"))
    }

    /// Prints one scrollback line over the prompt row.
    pub fn line(&mut self, line: &OutputLine) -> io::Result<()> {
        self.print_colored(&line.text, line_color(line.kind))
    }

    /// Prints a front-end message that is not part of the scrollback.
    pub fn note(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        self.print_colored(text, color)
    }

    /// Clears the whole screen.
    pub fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    /// Redraws the prompt row and places the cursor; masked input shows one `*` per character.
    pub fn prompt(&mut self, prompt: &str, input: &str, cursor: usize, masked: bool) -> io::Result<()> {
        let shown = if masked {
            "*".repeat(input.chars().count())
        } else {
            printable(input)
        };
        let column = u16::try_from(prompt.chars().count() + cursor).unwrap_or(u16::MAX);
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(printable(prompt)),
            Print(shown),
            MoveToColumn(column)
        )?;
        self.out.flush()
    }

    /// Leaves the prompt row so the shell resumes on a fresh line.
    pub fn finish(&mut self) -> io::Result<()> {
        queue!(self.out, Print("\r\n"))?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(screen: &Screen<Vec<u8>>) -> String {
        String::from_utf8_lossy(screen.writer()).into_owned()
    }

    #[test]
    fn lines_end_with_carriage_return_newline() {
        let mut screen = Screen::new(Vec::new());
        screen.line(&OutputLine::output("plain")).expect("write");
        screen.line(&OutputLine::error("boom")).expect("write");
        let text = rendered(&screen);
        assert!(text.contains("plain\r\n"));
        assert!(text.contains("boom"));
        assert!(text.find("plain").expect("plain") < text.find("boom").expect("boom"));
    }

    #[test]
    fn masked_prompts_hide_the_input() {
        let mut screen = Screen::new(Vec::new());
        screen.prompt("Password: ", "hunter2", 7, true).expect("write");
        let text = rendered(&screen);
        assert!(text.contains("Password: *******"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn escape_sequences_in_lines_are_neutralised() {
        let mut screen = Screen::new(Vec::new());
        screen
            .line(&OutputLine::output("evil\u{1b}]52;c;aGk=\u{7}\u{1b}[2J"))
            .expect("write");
        let text = rendered(&screen);
        assert!(text.contains("evil\u{fffd}]52;c;aGk=\u{fffd}\u{fffd}[2J\r\n"));
        assert!(!text.contains("\u{1b}]52"));
        assert!(!text.contains("\u{1b}[2J"));
    }

    #[test]
    fn only_plain_output_keeps_the_default_color() {
        assert_eq!(line_color(LineKind::Output), None);
        assert_eq!(line_color(LineKind::Error), Some(Color::Red));
        assert_eq!(line_color(LineKind::Success), Some(Color::Green));
    }
}

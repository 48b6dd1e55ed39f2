//! Text formatting helpers for command output.

use site_contract::OutputLine;
use tabled::{builder::Builder, settings::Style};

/// Renders a byte count as `B`, `KB`, or `MB`.
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let value = bytes as f64;
    if value < KB {
        format!("{bytes} B")
    } else if value < MB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{:.1} MB", value / MB)
    }
}

/// Shortens an RFC 3339 timestamp to `YYYY-MM-DD HH:MM`.
pub fn short_timestamp(raw: &str) -> String {
    raw.get(..16)
        .map(|prefix| prefix.replacen('T', " ", 1))
        .unwrap_or_else(|| raw.to_string())
}

/// Replaces control characters so server-supplied text cannot drive the terminal.
///
/// Tabs become spaces; every other control character becomes `U+FFFD`. The character count
/// is preserved.
pub fn printable(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\t' => ' ',
            ch if ch.is_control() => char::REPLACEMENT_CHARACTER,
            ch => ch,
        })
        .collect()
}

/// Renders rows as aligned borderless columns, one `output` line per row.
pub fn table<R>(headers: &[&str], rows: R) -> Vec<OutputLine>
where
    R: IntoIterator<Item = Vec<String>>,
{
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|header| header.to_string()));
    for row in rows {
        builder.push_record(row.iter().map(|cell| printable(cell)));
    }
    let mut table = builder.build();
    table.with(Style::blank());
    table
        .to_string()
        .lines()
        .map(|line| OutputLine::output(line.strip_prefix(' ').unwrap_or(line).trim_end()))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sizes_pick_the_largest_fitting_unit() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn timestamps_drop_seconds_and_zone() {
        assert_eq!(short_timestamp("2024-05-01T12:34:56+00:00"), "2024-05-01 12:34");
        assert_eq!(short_timestamp("t1"), "t1");
    }

    #[test]
    fn control_characters_are_replaced() {
        assert_eq!(printable("a\tb"), "a b");
        assert_eq!(printable("ok\u{1b}]52;c;aGk=\u{7}"), "ok\u{fffd}]52;c;aGk=\u{fffd}");
        assert_eq!(printable("café"), "café");
    }

    #[test]
    fn table_cells_cannot_carry_escape_sequences() {
        let lines = table(
            &["COMMAND"],
            vec![vec!["\u{1b}[2J\u{1b}]0;owned\u{7}".to_string()]],
        );
        assert!(lines.iter().all(|line| !line.text.contains('\u{1b}')));
        assert!(lines[1].text.contains("[2J"));
    }

    #[test]
    fn table_columns_line_up() {
        let lines = table(
            &["ID", "FILENAME"],
            vec![
                vec!["1".to_string(), "a.txt".to_string()],
                vec!["22".to_string(), "bb.pdf".to_string()],
            ],
        );
        assert_eq!(lines.len(), 3);
        let column = |line: &OutputLine, needle: &str| line.text.find(needle).expect("cell");
        assert_eq!(column(&lines[0], "FILENAME"), column(&lines[1], "a.txt"));
        assert_eq!(column(&lines[1], "a.txt"), column(&lines[2], "bb.pdf"));
    }
}

//! Host-agnostic terminal engine for the studio site.
//!
//! The engine owns scrollback, input, command history, and UI flags for one visitor session.
//! Submissions are processed strictly in order through a [`CommandRegistry`]; handlers reach
//! the backend only through [`site_host::SiteApi`], and timers come from
//! [`site_host::TerminalClock`], so the same engine runs under tokio, in tests, or in any other
//! single-threaded executor.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod commands;
pub mod engine;
pub mod format;
pub mod history;
pub mod registry;

pub use commands::builtin_registry;
pub use engine::{
    parse_call, EngineConfig, LeadCapture, SubmitError, TerminalEngine, TerminalEvent, UiState,
    DEFAULT_BOOT_LINES,
};
pub use history::{CommandHistory, HistoryDirection};
pub use registry::{
    CommandContext, CommandError, CommandHandler, CommandOutcome, CommandRegistry, UiEffect,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_syntax_parses_name_and_argument() {
        assert_eq!(
            parse_call("Quote( web )"),
            Some(("quote".to_string(), "web".to_string()))
        );
        assert_eq!(parse_call("quote(ai) now"), None);
        assert_eq!(parse_call("9lives(x)"), None);
    }
}

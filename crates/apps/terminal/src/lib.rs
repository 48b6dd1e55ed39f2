//! Raw-mode terminal client for the studio site.
//!
//! [`App`] sits between crossterm key events and a [`terminal_engine::TerminalEngine`]: keys
//! edit a [`LineEditor`] and are submitted to the engine, engine events are rendered by
//! [`Screen`], and the lead-capture and upload dialogs become inline prompts.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod editor;
pub mod forms;
pub mod screen;

pub use app::{App, Mode};
pub use editor::{Completion, EditorAction, LineEditor};
pub use forms::{FormError, FormStep, LeadField, LeadForm};
pub use screen::Screen;

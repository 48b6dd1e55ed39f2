//! Built-in terminal commands.

mod admin;
mod files;
mod pages;
mod quote;

use std::{cell::RefCell, rc::Rc};

use crate::registry::{ready, CommandOutcome, CommandRegistry};

pub use pages::{help_lines, HELP_FOOTER};

/// Builds the registry with every built-in command.
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    let help = Rc::new(RefCell::new(Vec::new()));
    registry.register("help", "Show this help", {
        let help = help.clone();
        move |_| ready(Ok(CommandOutcome::from_lines(help.borrow().clone())))
    });

    pages::register(&mut registry);
    quote::register(&mut registry);
    files::register(&mut registry);
    admin::register(&mut registry);

    *help.borrow_mut() = help_lines(&registry);
    registry
}

//! Flat command registry and handler contracts.

use std::{collections::BTreeMap, rc::Rc};

use futures::future::{self, FutureExt, LocalBoxFuture};
use site_contract::{OutputLine, SessionId};
use site_host::{AdminCredential, ApiError, SiteApi};
use thiserror::Error;

/// Async command handler.
pub type CommandHandler =
    Rc<dyn Fn(CommandContext) -> LocalBoxFuture<'static, Result<CommandOutcome, CommandError>>>;

/// Per-invocation data handed to a command handler.
#[derive(Clone)]
pub struct CommandContext {
    /// Tokens after the command name, or the single call-syntax argument.
    pub args: Vec<String>,
    /// Active session, when boot managed to create one.
    pub session_id: Option<SessionId>,
    /// Verified admin credential, when logged in.
    pub admin: Option<AdminCredential>,
    /// Backend service.
    pub api: Rc<dyn SiteApi>,
    /// Command history including the current submission.
    pub history: Vec<String>,
    /// Files uploaded from this terminal.
    pub uploaded_files: usize,
}

impl CommandContext {
    /// Returns the admin credential or the standard login-required error.
    pub fn require_admin(&self) -> Result<AdminCredential, CommandError> {
        self.admin
            .clone()
            .ok_or_else(|| CommandError::new("Admin login required"))
    }
}

/// UI change requested by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Show the lead-capture form, optionally preselecting a service.
    OpenLeadCapture {
        /// Requested service name.
        service: Option<String>,
    },
    /// Show the upload dialog.
    OpenUploadDialog,
    /// Empty the scrollback.
    ClearScrollback,
    /// Treat the next submission as the admin password.
    AwaitAdminPassword,
    /// Drop the stored admin credential.
    AdminLogout,
    /// Ask the host to close the terminal.
    RequestExit,
}

/// Successful handler result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Lines appended in order.
    pub lines: Vec<OutputLine>,
    /// UI effects applied after the lines.
    pub effects: Vec<UiEffect>,
}

impl CommandOutcome {
    /// Builds an outcome from plain `output` lines.
    pub fn text<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_lines(lines.into_iter().map(OutputLine::output).collect())
    }

    /// Builds an outcome from prepared lines.
    pub fn from_lines(lines: Vec<OutputLine>) -> Self {
        Self {
            lines,
            effects: Vec::new(),
        }
    }

    /// Adds a UI effect.
    pub fn with_effect(mut self, effect: UiEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Handler failure rendered as one `error` line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    /// Message shown to the user.
    pub message: String,
}

impl CommandError {
    /// Creates an error with a user-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        Self::new(err.user_message())
    }
}

/// Wraps an immediate result as a handler future.
pub fn ready(
    result: Result<CommandOutcome, CommandError>,
) -> LocalBoxFuture<'static, Result<CommandOutcome, CommandError>> {
    future::ready(result).boxed_local()
}

#[derive(Clone)]
struct RegisteredCommand {
    summary: String,
    handler: CommandHandler,
}

/// Name-keyed command table plus the call-syntax table (`name(argument)`).
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, RegisteredCommand>,
    calls: BTreeMap<String, CommandHandler>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a command. Names are stored lowercase.
    pub fn register<F>(&mut self, name: &str, summary: &str, handler: F)
    where
        F: Fn(CommandContext) -> LocalBoxFuture<'static, Result<CommandOutcome, CommandError>>
            + 'static,
    {
        self.commands.insert(
            name.to_lowercase(),
            RegisteredCommand {
                summary: summary.to_string(),
                handler: Rc::new(handler),
            },
        );
    }

    /// Registers a call-syntax handler; it receives the argument as its only arg.
    pub fn register_call<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(CommandContext) -> LocalBoxFuture<'static, Result<CommandOutcome, CommandError>>
            + 'static,
    {
        self.calls.insert(name.to_lowercase(), Rc::new(handler));
    }

    /// Looks up a command by lowercase name.
    pub fn command(&self, name: &str) -> Option<CommandHandler> {
        self.commands
            .get(name)
            .map(|registered| registered.handler.clone())
    }

    /// Looks up a call-syntax handler by lowercase name.
    pub fn call(&self, name: &str) -> Option<CommandHandler> {
        self.calls.get(name).cloned()
    }

    /// Returns `(name, summary)` pairs in name order.
    pub fn summaries(&self) -> Vec<(String, String)> {
        self.commands
            .iter()
            .map(|(name, registered)| (name.clone(), registered.summary.clone()))
            .collect()
    }

    /// Returns registered command names in order.
    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use site_host::NoopSiteApi;

    use super::*;

    fn context() -> CommandContext {
        CommandContext {
            args: Vec::new(),
            session_id: None,
            admin: None,
            api: Rc::new(NoopSiteApi),
            history: Vec::new(),
            uploaded_files: 0,
        }
    }

    #[test]
    fn names_are_case_insensitive_at_registration() {
        let mut registry = CommandRegistry::new();
        registry.register("Ping", "reply", |_| ready(Ok(CommandOutcome::text(["pong"]))));

        let handler = registry.command("ping").expect("registered");
        let outcome = block_on(handler(context())).expect("ok");
        assert_eq!(outcome.lines, vec![OutputLine::output("pong")]);
        assert!(registry.command("Ping").is_none());
        assert_eq!(
            registry.summaries(),
            vec![("ping".to_string(), "reply".to_string())]
        );
    }

    #[test]
    fn call_handlers_live_in_their_own_table() {
        let mut registry = CommandRegistry::new();
        registry.register_call("quote", |ctx| {
            ready(Ok(CommandOutcome::text([ctx.args.join(",")])))
        });
        assert!(registry.command("quote").is_none());
        assert!(registry.call("quote").is_some());
    }

    #[test]
    fn missing_admin_credential_is_a_login_error() {
        let err = context().require_admin().expect_err("no admin");
        assert_eq!(err.message, "Admin login required");
    }
}

//! Fixed-text pages and local terminal commands.

use site_contract::OutputLine;

use crate::registry::{ready, CommandOutcome, CommandRegistry, UiEffect};

/// Closing lines of the help block.
pub const HELP_FOOTER: [&str; 2] = [
    "Tip: quote(<service>) opens an inquiry for one service, e.g. quote(web).",
    "",
];

const ABOUT: &[&str] = &[
    "We are a small software studio building web platforms, data tooling, and",
    "automation for teams that want to ship without growing a large in-house staff.",
    "",
    "Run 'services' to see what we do or 'quote' to start a project.",
    "",
];

const SERVICES: &[&str] = &[
    "Services:",
    "  web        Web applications and APIs",
    "  data       Data pipelines and reporting",
    "  ai         Applied machine learning integrations",
    "  cloud      Infrastructure, CI/CD, and migrations",
    "  audit      Code and architecture reviews",
    "",
    "Run quote(<service>) to request an estimate.",
    "",
];

const PORTFOLIO: &[&str] = &[
    "Selected work:",
    "  - Booking platform for a regional clinic network",
    "  - Inventory forecasting dashboard for a retail group",
    "  - Document search service for a legal team",
    "",
];

const TECH: &[&str] = &[
    "Technology:",
    "  Languages   Rust, TypeScript, Python, SQL",
    "  Platforms   Linux, containers, managed cloud services",
    "  Storage     PostgreSQL, SQLite, object storage",
    "",
];

const CONTACT: &[&str] = &[
    "Contact:",
    "  email     hello@studio.example",
    "  inquiry   run 'quote' to send project details",
    "  files     run 'upload' to share a brief or mockups",
    "",
];

const SCHEDULE: &[&str] = &[
    "Scheduling:",
    "  Calls run Monday to Thursday, 30 minutes, by video.",
    "  Send an inquiry with 'quote' and we will reply with available slots.",
    "",
];

/// Renders the help block from registered command summaries.
pub fn help_lines(registry: &CommandRegistry) -> Vec<OutputLine> {
    let mut lines = vec![OutputLine::output("Available commands:")];
    lines.extend(
        registry
            .summaries()
            .into_iter()
            .map(|(name, summary)| OutputLine::output(format!("  {name:<11} {summary}"))),
    );
    lines.push(OutputLine::output(""));
    lines.extend(HELP_FOOTER.iter().map(|line| OutputLine::output(*line)));
    lines
}

fn register_text(
    registry: &mut CommandRegistry,
    name: &str,
    summary: &str,
    text: &'static [&'static str],
) {
    registry.register(name, summary, move |_| {
        ready(Ok(CommandOutcome::text(text.iter().copied())))
    });
}

pub(super) fn register(registry: &mut CommandRegistry) {
    register_text(registry, "about", "About the studio", ABOUT);
    register_text(registry, "services", "Services we offer", SERVICES);
    register_text(registry, "portfolio", "Selected work", PORTFOLIO);
    register_text(registry, "tech", "Technology we use", TECH);
    register_text(registry, "contact", "How to reach us", CONTACT);
    register_text(registry, "schedule", "Book a call", SCHEDULE);

    registry.register("status", "Availability and session status", |ctx| {
        let session = ctx
            .session_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "offline".to_string());
        ready(Ok(CommandOutcome::text([
            "Availability: accepting new projects".to_string(),
            format!("Session: {session}"),
            format!("Files uploaded this session: {}", ctx.uploaded_files),
            String::new(),
        ])))
    });

    registry.register("upload", "Share project files", |_| {
        ready(Ok(CommandOutcome::text(["Select files to upload."])
            .with_effect(UiEffect::OpenUploadDialog)))
    });

    registry.register("history", "Show command history", |ctx| {
        ready(Ok(CommandOutcome::text(
            ctx.history
                .iter()
                .enumerate()
                .map(|(index, entry)| format!("{:>4}  {entry}", index + 1)),
        )))
    });

    registry.register("clear", "Clear the screen", |_| {
        ready(Ok(
            CommandOutcome::default().with_effect(UiEffect::ClearScrollback)
        ))
    });

    registry.register("exit", "End the session", |_| {
        ready(Ok(CommandOutcome::text(["Thanks for visiting.", "Session closed."])
            .with_effect(UiEffect::RequestExit)))
    });
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use site_contract::SessionId;
    use site_host::NoopSiteApi;

    use super::*;
    use crate::registry::CommandContext;

    fn run(registry: &CommandRegistry, name: &str, ctx: CommandContext) -> CommandOutcome {
        let handler = registry.command(name).expect("registered");
        block_on(handler(ctx)).expect("handler")
    }

    fn context() -> CommandContext {
        CommandContext {
            args: Vec::new(),
            session_id: Some(SessionId::new("s-9")),
            admin: None,
            api: Rc::new(NoopSiteApi),
            history: vec!["help".to_string(), "history".to_string()],
            uploaded_files: 2,
        }
    }

    #[test]
    fn history_is_numbered_from_one() {
        let mut registry = CommandRegistry::new();
        register(&mut registry);
        let outcome = run(&registry, "history", context());
        assert_eq!(
            outcome.lines,
            vec![
                OutputLine::output("   1  help"),
                OutputLine::output("   2  history"),
            ]
        );
    }

    #[test]
    fn status_reports_session_and_upload_count() {
        let mut registry = CommandRegistry::new();
        register(&mut registry);
        let texts: Vec<_> = run(&registry, "status", context())
            .lines
            .into_iter()
            .map(|line| line.text)
            .collect();
        assert!(texts.contains(&"Session: s-9".to_string()));
        assert!(texts.contains(&"Files uploaded this session: 2".to_string()));
    }

    #[test]
    fn exit_requests_host_shutdown() {
        let mut registry = CommandRegistry::new();
        register(&mut registry);
        let outcome = run(&registry, "exit", context());
        assert_eq!(outcome.effects, vec![UiEffect::RequestExit]);
    }

    #[test]
    fn help_lists_every_command_once() {
        let mut registry = CommandRegistry::new();
        register(&mut registry);
        let lines = help_lines(&registry);
        for name in registry.names() {
            let rows = lines
                .iter()
                .filter(|line| line.text.starts_with(&format!("  {name} ")))
                .count();
            assert_eq!(rows, 1, "help row for {name}");
        }
    }
}

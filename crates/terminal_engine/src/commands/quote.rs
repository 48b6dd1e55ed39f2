//! `quote` and its call form `quote(<service>)`.

use crate::registry::{ready, CommandContext, CommandOutcome, CommandRegistry, UiEffect};

fn open_lead_capture(ctx: CommandContext) -> CommandOutcome {
    let service = ctx
        .args
        .join(" ")
        .trim()
        .trim_matches(|ch| ch == '"' || ch == '\'')
        .trim()
        .to_string();
    let service = (!service.is_empty()).then_some(service);
    let line = match &service {
        Some(service) => format!("Opening project inquiry for '{service}'..."),
        None => "Opening project inquiry...".to_string(),
    };
    CommandOutcome::text([line]).with_effect(UiEffect::OpenLeadCapture { service })
}

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("quote", "Request a project quote", |ctx| {
        ready(Ok(open_lead_capture(ctx)))
    });
    registry.register_call("quote", |ctx| ready(Ok(open_lead_capture(ctx))));
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use site_host::NoopSiteApi;

    use super::*;

    fn context(args: &[&str]) -> CommandContext {
        CommandContext {
            args: args.iter().map(|arg| arg.to_string()).collect(),
            session_id: None,
            admin: None,
            api: Rc::new(NoopSiteApi),
            history: Vec::new(),
            uploaded_files: 0,
        }
    }

    #[test]
    fn call_argument_becomes_the_service() {
        let mut registry = CommandRegistry::new();
        register(&mut registry);
        let handler = registry.call("quote").expect("call form");
        let outcome = block_on(handler(context(&["\"ai\""]))).expect("ok");
        assert_eq!(
            outcome.effects,
            vec![UiEffect::OpenLeadCapture {
                service: Some("ai".to_string())
            }]
        );
    }

    #[test]
    fn bare_quote_has_no_service() {
        let mut registry = CommandRegistry::new();
        register(&mut registry);
        let handler = registry.command("quote").expect("command");
        let outcome = block_on(handler(context(&[]))).expect("ok");
        assert_eq!(
            outcome.effects,
            vec![UiEffect::OpenLeadCapture { service: None }]
        );
    }
}

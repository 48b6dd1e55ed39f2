//! `admin` submenu: password gate and read-only listings.

use futures::FutureExt;
use site_contract::{AdminTopic, OutputLine};

use crate::{
    format::{short_timestamp, table},
    registry::{CommandContext, CommandError, CommandOutcome, CommandRegistry, UiEffect},
};

const MENU: &[&str] = &[
    "Admin commands:",
    "  admin login      Authenticate for admin commands",
    "  admin logout     Drop admin access",
    "  admin leads      Captured project inquiries",
    "  admin logs       Tracked terminal commands",
    "  admin sessions   Visitor sessions",
    "",
];

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

async fn listing(ctx: CommandContext, topic: AdminTopic) -> Result<CommandOutcome, CommandError> {
    let admin = ctx.require_admin()?;
    let failed = |err: site_host::ApiError| {
        CommandError::new(format!(
            "Failed to load {}: {}",
            topic.as_str(),
            err.user_message()
        ))
    };

    let mut lines = match topic {
        AdminTopic::Leads => {
            let leads = ctx.api.admin_leads(&admin).await.map_err(failed)?;
            if leads.is_empty() {
                vec![OutputLine::output("No leads captured")]
            } else {
                table(
                    &["ID", "NAME", "EMAIL", "COMPANY", "PROJECT", "BUDGET", "CREATED"],
                    leads.into_iter().map(|lead| {
                        vec![
                            lead.id.to_string(),
                            lead.name,
                            lead.email,
                            lead.company,
                            optional(lead.project_type),
                            optional(lead.budget),
                            short_timestamp(&lead.created_at),
                        ]
                    }),
                )
            }
        }
        AdminTopic::Logs => {
            let logs = ctx.api.admin_logs(&admin).await.map_err(failed)?;
            if logs.is_empty() {
                vec![OutputLine::output("No commands logged")]
            } else {
                table(
                    &["ID", "SESSION", "COMMAND", "TIME"],
                    logs.into_iter().map(|log| {
                        vec![
                            log.id.to_string(),
                            log.session_id,
                            log.command,
                            short_timestamp(&log.timestamp),
                        ]
                    }),
                )
            }
        }
        AdminTopic::Sessions => {
            let sessions = ctx.api.admin_sessions(&admin).await.map_err(failed)?;
            if sessions.is_empty() {
                vec![OutputLine::output("No sessions recorded")]
            } else {
                table(
                    &["SESSION", "CREATED"],
                    sessions
                        .into_iter()
                        .map(|session| vec![session.id, short_timestamp(&session.created_at)]),
                )
            }
        }
    };
    lines.push(OutputLine::output(""));
    Ok(CommandOutcome::from_lines(lines))
}

async fn admin(ctx: CommandContext) -> Result<CommandOutcome, CommandError> {
    let Some(subcommand) = ctx.args.first().map(|arg| arg.to_lowercase()) else {
        return Ok(CommandOutcome::text(MENU.iter().copied()));
    };
    match subcommand.as_str() {
        "login" => Ok(CommandOutcome::text(["Enter admin password:"])
            .with_effect(UiEffect::AwaitAdminPassword)),
        "logout" => Ok(CommandOutcome::from_lines(vec![OutputLine::success(
            "Admin access revoked",
        )])
        .with_effect(UiEffect::AdminLogout)),
        other => match AdminTopic::parse(other) {
            Some(topic) => listing(ctx, topic).await,
            None => Err(CommandError::new(format!(
                "Unknown admin command: {other}. Run 'admin' for options."
            ))),
        },
    }
}

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(
        "admin",
        "Admin tools: login, logout, leads, logs, sessions",
        |ctx| admin(ctx).boxed_local(),
    );
}

//! Admin-scoped file commands backed by the upload API.

use futures::FutureExt;
use site_contract::OutputLine;

use crate::{
    format::{human_size, short_timestamp, table},
    registry::{CommandContext, CommandError, CommandOutcome, CommandRegistry},
};

fn file_id(ctx: &CommandContext, command: &str) -> Result<String, CommandError> {
    ctx.args
        .first()
        .cloned()
        .ok_or_else(|| CommandError::new(format!("Usage: {command} <id>")))
}

async fn list_files(ctx: CommandContext) -> Result<CommandOutcome, CommandError> {
    let admin = ctx.require_admin()?;
    let files = ctx.api.list_files(&admin).await?;
    if files.is_empty() {
        return Ok(CommandOutcome::text(["No files uploaded", ""]));
    }
    let mut lines = table(
        &["ID", "FILENAME", "SIZE", "UPLOADED"],
        files.into_iter().map(|file| {
            vec![
                file.id,
                file.filename,
                human_size(file.size),
                short_timestamp(&file.upload_date),
            ]
        }),
    );
    lines.push(OutputLine::output(""));
    Ok(CommandOutcome::from_lines(lines))
}

async fn download(ctx: CommandContext) -> Result<CommandOutcome, CommandError> {
    let id = file_id(&ctx, "download")?;
    let admin = ctx.require_admin()?;
    let url = ctx.api.file_download_url(&admin, &id).await?;
    Ok(CommandOutcome::from_lines(vec![
        OutputLine::success(format!("Download link for {id} (valid for 15 minutes):")),
        OutputLine::output(url),
        OutputLine::output(""),
    ]))
}

async fn delete(ctx: CommandContext) -> Result<CommandOutcome, CommandError> {
    let id = file_id(&ctx, "delete")?;
    let admin = ctx.require_admin()?;
    let response = ctx.api.delete_file(&admin, &id).await?;
    Ok(CommandOutcome::from_lines(vec![OutputLine::success(
        format!("File {id}: {}", response.status),
    )]))
}

async fn dashboard(ctx: CommandContext) -> Result<CommandOutcome, CommandError> {
    let admin = ctx.require_admin()?;
    let summary = ctx.api.dashboard(&admin).await?;
    let mut lines = vec![
        OutputLine::output("Upload dashboard"),
        OutputLine::output(format!("  Total files: {}", summary.total_files)),
        OutputLine::output(format!("  Total size:  {}", human_size(summary.total_size))),
        OutputLine::output(""),
    ];
    if summary.files.is_empty() {
        lines.push(OutputLine::output("No recent uploads"));
    } else {
        lines.push(OutputLine::output("Recent uploads:"));
        lines.extend(table(
            &["FILENAME", "SIZE"],
            summary
                .files
                .into_iter()
                .map(|file| vec![file.filename, human_size(file.size)]),
        ));
    }
    lines.push(OutputLine::output(""));
    Ok(CommandOutcome::from_lines(lines))
}

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register("files", "List uploaded files (admin)", |ctx| {
        list_files(ctx).boxed_local()
    });
    registry.register("download", "Get a download link: download <id> (admin)", |ctx| {
        download(ctx).boxed_local()
    });
    registry.register("delete", "Delete a file: delete <id> (admin)", |ctx| {
        delete(ctx).boxed_local()
    });
    registry.register("dashboard", "Upload totals and recent files (admin)", |ctx| {
        dashboard(ctx).boxed_local()
    });
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use site_contract::FileSummary;
    use site_host::{AdminCredential, ApiCall, ApiError, ApiMethod, MemorySiteApi};

    use super::*;

    fn context(api: &MemorySiteApi, args: &[&str], admin: Option<&str>) -> CommandContext {
        CommandContext {
            args: args.iter().map(|arg| arg.to_string()).collect(),
            session_id: None,
            admin: admin.map(AdminCredential::new),
            api: Rc::new(api.clone()),
            history: Vec::new(),
            uploaded_files: 0,
        }
    }

    fn file(id: &str, name: &str, size: u64) -> FileSummary {
        FileSummary {
            id: id.to_string(),
            filename: name.to_string(),
            size,
            upload_date: "2024-05-01T12:34:56+00:00".to_string(),
        }
    }

    #[test]
    fn missing_id_is_a_usage_error_without_requests() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        let err = block_on(download(context(&api, &[], Some("pw")))).expect_err("usage");
        assert_eq!(err.message, "Usage: download <id>");
        let err = block_on(delete(context(&api, &[], Some("pw")))).expect_err("usage");
        assert_eq!(err.message, "Usage: delete <id>");
        assert!(api.calls().is_empty());
    }

    #[test]
    fn listing_without_admin_makes_no_request() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        let err = block_on(list_files(context(&api, &[], None))).expect_err("gated");
        assert_eq!(err.message, "Admin login required");
        assert!(api.calls().is_empty());
    }

    #[test]
    fn listing_renders_a_table_with_readable_sizes() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        api.push_file(file("f-1", "brief.pdf", 2048));
        let outcome = block_on(list_files(context(&api, &[], Some("pw")))).expect("listed");
        assert!(outcome.lines[0].text.starts_with("ID"));
        assert!(outcome.lines[1].text.contains("brief.pdf"));
        assert!(outcome.lines[1].text.contains("2.0 KB"));
        assert!(outcome.lines[1].text.contains("2024-05-01 12:34"));
    }

    #[test]
    fn empty_listing_says_so() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        let outcome = block_on(list_files(context(&api, &[], Some("pw")))).expect("listed");
        assert_eq!(outcome.lines[0], OutputLine::output("No files uploaded"));
    }

    #[test]
    fn unknown_download_reports_not_found() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        let err = block_on(download(context(&api, &["nope"], Some("pw")))).expect_err("404");
        assert_eq!(err.message, "File not found");
        assert_eq!(api.calls(), vec![ApiCall::FileDownloadUrl("nope".to_string())]);
    }

    #[test]
    fn delete_failure_carries_server_detail() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        api.fail(
            ApiMethod::DeleteFile,
            ApiError::Status {
                status: 500,
                message: "failed to delete file".to_string(),
                detail: Some("disk full".to_string()),
            },
        );
        let err = block_on(delete(context(&api, &["f-1"], Some("pw")))).expect_err("500");
        assert_eq!(err.message, "failed to delete file (disk full)");
    }

    #[test]
    fn dashboard_summarises_totals() {
        let api = MemorySiteApi::new().with_admin_password("pw");
        api.push_file(file("f-1", "a.txt", 100));
        api.push_file(file("f-2", "b.txt", 924));
        let outcome = block_on(dashboard(context(&api, &[], Some("pw")))).expect("dashboard");
        let texts: Vec<_> = outcome.lines.iter().map(|line| line.text.as_str()).collect();
        assert!(texts.contains(&"  Total files: 2"));
        assert!(texts.contains(&"  Total size:  1.0 KB"));
    }
}

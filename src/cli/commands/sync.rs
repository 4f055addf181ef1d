use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CliMode, CommandResult, ShellContext};
use crate::cli::output;
use crate::sync::SyncOutcome;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("sync", "Sync quotes with the server now", "sync", cmd_sync),
        CommandDefinition::new(
            "status",
            "Show sync status and store summary",
            "status",
            cmd_status,
        ),
    ]
}

fn cmd_sync(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let scheduler = context.book.scheduler().clone();
    match context.runtime().block_on(scheduler.trigger()) {
        SyncOutcome::Completed(report) => {
            output::info(format!(
                "  fetched {}, malformed {}, replaced {}, added {}; {} quote(s) total",
                report.fetched, report.malformed, report.overwritten, report.added, report.total
            ));
        }
        SyncOutcome::Skipped => output::info("A sync is already running."),
        // The scheduler has already published an error notice.
        SyncOutcome::Failed(_) => {}
    }
    Ok(())
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let scheduler = context.book.scheduler();
    let settings = scheduler.settings();

    output::section("Status");
    output::info(format!("  Sync         : {}", scheduler.status()));
    match scheduler.last_report() {
        Some(report) => output::info(format!(
            "  Last sync    : {} ({} fetched, {} added)",
            report.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.fetched,
            report.added
        )),
        None => output::info("  Last sync    : never"),
    }
    output::info(format!(
        "  Periodic     : {}",
        if context.config.periodic_sync && context.mode == CliMode::Interactive {
            format!("every {}s", settings.interval.as_secs())
        } else {
            "off".to_string()
        }
    ));
    output::info(format!("  Quotes       : {}", context.book.quotes()?.len()));
    output::info(format!("  Category     : {}", context.book.current_selection()));
    Ok(())
}

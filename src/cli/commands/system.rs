use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::{help, output};
use crate::config::Config;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "config",
            "Show or change a setting",
            "config [key value]",
            cmd_config,
        ),
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let config = &context.config;
            output::section("Configuration");
            output::info(format!("  remote_url           : {}", config.remote_url));
            output::info(format!("  sync_interval_secs   : {}", config.sync_interval_secs));
            output::info(format!("  batch_limit          : {}", config.batch_limit));
            output::info(format!("  request_timeout_secs : {}", config.request_timeout_secs));
            output::info(format!(
                "  periodic_sync        : {}",
                if config.periodic_sync { "on" } else { "off" }
            ));
            output::hint(format!("File: {}", context.config_manager.path().display()));
            Ok(())
        }
        [key, value] => {
            let mut updated = context.config.clone();
            updated.set_value(key, value)?;
            context.config = updated;
            context.persist_config()?;
            output::success(format!("Set {} = {}.", key, value));
            output::hint("Sync settings take effect the next time the shell starts.");
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(format!(
            "usage: config [key value] (keys: {})",
            Config::KEYS.join(", ")
        ))),
    }
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Quotebook {}", meta.version));
    output::info(format!(
        "  Build hash : {} ({})",
        meta.git_hash, meta.git_status
    ));
    output::info(format!("  Built at   : {}", meta.timestamp));
    output::info(format!("  Target     : {}", meta.target));
    output::info(format!("  Rustc      : {}", meta.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(command) = args.first().map(|name| name.to_lowercase()) {
        if let Some(command) = context.command(&command) {
            help::print_command(command);
        } else {
            context.suggest_command(args[0]);
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

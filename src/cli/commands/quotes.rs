use std::path::Path;

use crate::cli::commands::CommandDefinition;
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::{UpsertOutcome, Visible, ALL_CATEGORIES};
use crate::domain::Quote;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "show",
            "Show a random quote from the current category",
            "show",
            cmd_show,
        ),
        CommandDefinition::new("list", "List quotes in the current category", "list", cmd_list),
        CommandDefinition::new(
            "categories",
            "List known categories",
            "categories",
            cmd_categories,
        ),
        CommandDefinition::new(
            "filter",
            "Select the category used by show and list",
            "filter <category|all>",
            cmd_filter,
        ),
        CommandDefinition::new(
            "add",
            "Add a quote and post it to the server",
            "add <text> <category>",
            cmd_add,
        ),
        CommandDefinition::new(
            "import",
            "Import quotes from a JSON file",
            "import <path>",
            cmd_import,
        ),
        CommandDefinition::new(
            "export",
            "Export all quotes to a JSON file",
            "export <path>",
            cmd_export,
        ),
    ]
}

fn print_quote(quote: &Quote) {
    output::info(format!("\"{}\"", quote.text));
    output::info(format!("  {} ({})", quote.author, quote.category));
}

fn cmd_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.book.random_quote()? {
        Some(quote) => print_quote(&quote),
        None => output::warning("No quotes available in this category."),
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.book.visible_quotes()? {
        Visible::Quotes(quotes) => {
            output::section(format!("Quotes: {}", context.book.current_selection()));
            for (index, quote) in quotes.iter().enumerate() {
                output::info(format!(
                    "{:>3}. \"{}\" - {} [{}]",
                    index + 1,
                    quote.text,
                    quote.author,
                    quote.category
                ));
            }
        }
        Visible::NoMatches { category } => {
            output::warning(format!("No quotes available in `{}`.", category));
        }
    }
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let current = context.book.current_selection().to_string();
    let mut names = vec![ALL_CATEGORIES.to_string()];
    names.extend(context.book.distinct_categories()?);

    output::section("Categories");
    for name in names {
        let marker = if name == current { "*" } else { " " };
        output::info(format!(" {} {}", marker, name));
    }
    Ok(())
}

fn cmd_filter(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let requested = args.first().copied().unwrap_or(ALL_CATEGORIES);
    let applied = context.book.set_category(requested)?;
    if applied != requested {
        output::warning(format!(
            "Unknown category `{}`; showing all quotes.",
            requested
        ));
    } else {
        output::success(format!("Category set to `{}`.", applied));
    }
    cmd_show(context, &[])
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [text, category] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: add <text> <category>".into(),
        ));
    };

    // The background post is spawned onto the shell runtime.
    let _guard = context.runtime().enter();
    match context.book.add_quote(text, category)? {
        UpsertOutcome::Inserted => output::success("New quote added!"),
        UpsertOutcome::Replaced => output::success("Quote updated."),
    }
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = single_path(args, "import <path>")?;
    let report = context.book.import_file(path)?;
    output::success(format!("Imported {} quote(s).", report.imported));
    if report.skipped_existing > 0 {
        output::info(format!(
            "  {} already present, kept the existing copy.",
            report.skipped_existing
        ));
    }
    if report.rejected > 0 {
        output::warning(format!("  {} record(s) were invalid.", report.rejected));
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let path = single_path(args, "export <path>")?;
    let count = context.book.export_file(path)?;
    output::success(format!("Exported {} quote(s) to {}.", count, path.display()));
    Ok(())
}

fn single_path<'a>(args: &[&'a str], usage: &str) -> Result<&'a Path, CommandError> {
    match args {
        [path] => Ok(Path::new(*path)),
        _ => Err(CommandError::InvalidArguments(format!("usage: {}", usage))),
    }
}

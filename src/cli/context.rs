//! Shell context, dispatch, and error reporting for the quote shell.

use std::{io, path::PathBuf};

use rustyline::error::ReadlineError;
use strsim::levenshtein;
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

use crate::{
    cli::{
        commands::{self, CommandDefinition, CommandRegistry},
        output,
    },
    config::{Config, ConfigManager},
    core::QuoteBook,
    errors::QuoteError,
    sync::{NoticeLevel, PeriodicHandle},
    utils::paths,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub book: QuoteBook,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub last_command: Option<String>,
    pub running: bool,
    runtime: Runtime,
    periodic: Option<PeriodicHandle>,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, paths::app_data_dir())
    }

    pub fn with_base_dir(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        let registry = CommandRegistry::new(commands::all_definitions());
        let config_manager = ConfigManager::with_base_dir(base)?;
        let config = config_manager.load()?;
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("quotebook-sync")
            .enable_all()
            .build()?;
        let book = QuoteBook::open(&config_manager.data_dir(), &config)?;

        book.scheduler().on_notice(|notice| match notice.level {
            NoticeLevel::Success => output::success(&notice.message),
            NoticeLevel::Error => output::warning(&notice.message),
        });

        let periodic = if mode == CliMode::Interactive && config.periodic_sync {
            let _guard = runtime.enter();
            Some(book.scheduler().spawn_periodic())
        } else {
            None
        };

        output::set_plain(mode == CliMode::Script);

        Ok(Self {
            mode,
            registry,
            book,
            config_manager,
            config,
            last_command: None,
            running: true,
            runtime,
            periodic,
        })
    }

    pub fn prompt(&self) -> String {
        format!("quotes [{}]> ", self.book.current_selection())
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|entry| entry.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };

        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };

        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());

        match self.dispatch(&command, raw, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = best {
            if distance <= 3 {
                output::hint(format!("Did you mean `{}`?", best));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(QuoteError::Validation(message)) => {
                output::error(message);
            }
            other => output::error(other),
        }
    }

    /// Stops the background sync loop, letting an in-flight sync finish.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.periodic.take() {
            self.runtime.block_on(handle.stop());
        }
    }
}

impl Drop for ShellContext {
    fn drop(&mut self) {
        if self.periodic.is_some() {
            warn!("shell dropped without shutdown; stopping periodic sync");
            self.shutdown();
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] QuoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("exit requested")]
    ExitRequested,
}

/// Errors that end the shell.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] QuoteError),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(base: PathBuf, lines: &[&str]) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_base_dir(CliMode::Script, base)?;
    for line in lines {
        match app.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => app.report_error(err),
        }
    }
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileStore, KeyValueStore, QUOTES_KEY};
    use tempfile::{tempdir, TempDir};

    /// Base directory whose config points at an address nothing listens on.
    fn offline_base() -> TempDir {
        let temp = tempdir().unwrap();
        let config = Config {
            remote_url: "http://127.0.0.1:9/posts".into(),
            request_timeout_secs: 1,
            ..Config::default()
        };
        ConfigManager::with_base_dir(temp.path().to_path_buf())
            .unwrap()
            .save(&config)
            .unwrap();
        temp
    }

    #[test]
    fn add_and_filter_persist_between_sessions() {
        let temp = offline_base();
        let app = process_script(
            temp.path().to_path_buf(),
            &["add \"Stay hungry\" Grit", "filter Grit", "exit"],
        )
        .expect("script runs");
        assert!(!app.running);
        assert_eq!(app.book.current_selection(), "Grit");
        drop(app);

        let reopened = ShellContext::with_base_dir(CliMode::Script, temp.path().to_path_buf())
            .expect("reopen");
        assert_eq!(reopened.book.current_selection(), "Grit");
        let quotes = reopened.book.quotes().unwrap();
        assert_eq!(quotes.len(), 4);
        assert_eq!(quotes[3].text, "Stay hungry");
    }

    #[test]
    fn invalid_add_leaves_store_untouched() {
        let temp = offline_base();
        let app = process_script(temp.path().to_path_buf(), &["add \"\" Grit", "add only-text"])
            .expect("script runs");
        assert_eq!(app.book.quotes().unwrap().len(), 3);
        let backend = JsonFileStore::new(app.config_manager.data_dir()).unwrap();
        assert_eq!(backend.read(QUOTES_KEY).unwrap(), None);
    }

    #[test]
    fn failed_sync_is_reported_without_ending_the_shell() {
        let temp = offline_base();
        let app = process_script(temp.path().to_path_buf(), &["sync", "status"])
            .expect("script runs");
        assert!(app.running);
        assert_eq!(app.book.quotes().unwrap().len(), 3);
        assert!(app.book.scheduler().last_report().is_none());
    }

    #[test]
    fn unknown_command_is_not_fatal() {
        let temp = offline_base();
        let mut app = ShellContext::with_base_dir(CliMode::Script, temp.path().to_path_buf())
            .expect("context");
        assert_eq!(app.process_line("lsit").unwrap(), LoopControl::Continue);
        assert_eq!(app.last_command.as_deref(), Some("lsit"));
    }
}

//! The read-eval loop and its entry points.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sqlcli_core::{CancelToken, RunMode, VERBOSE};
use sqlcli_gateway::Executor;
use sqlcli_parser::{format_sql_file, OperationParser, SqlParser};
use tracing::{debug, info, warn};

use crate::dispatcher::OperationDispatcher;
use crate::error::{CliError, CliResult};
use crate::format;
use crate::messages::{message_input_closed, MESSAGE_EXECUTE_FILE, MESSAGE_WELCOME, PROMPT};
use crate::reader::StatementReader;
use crate::reporter::ErrorReporter;
use crate::signal::{InterruptGuard, SignalRegistry};
use crate::state::LoopState;
use crate::terminal::{ConsoleTerminal, ReadError, ScriptTerminal, SharedBuffer, Terminal};

/// A SQL client bound to one executor session.
pub struct CliClient<E, P = SqlParser> {
    executor: E,
    parser: P,
    history: Option<PathBuf>,
    signals: Option<SignalRegistry>,
}

impl<E: Executor> CliClient<E, SqlParser> {
    pub fn new(executor: E) -> Self {
        Self::with_parser(executor, SqlParser::new())
    }
}

impl<E: Executor, P: OperationParser> CliClient<E, P> {
    pub fn with_parser(executor: E, parser: P) -> Self {
        Self {
            executor,
            parser,
            history: None,
            signals: None,
        }
    }

    /// Keep console history in `path`.
    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history = Some(path.into());
        self
    }

    /// Route interrupts through `signals` instead of the process's Ctrl-C.
    pub fn with_signals(mut self, signals: SignalRegistry) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    fn signals(&self) -> SignalRegistry {
        self.signals.clone().unwrap_or_else(SignalRegistry::process)
    }

    // ==================== ENTRY POINTS ====================

    /// Run statements typed at the console until `QUIT;` or Ctrl-D.
    pub fn execute_in_interactive_mode(&mut self) -> CliResult<()> {
        let mut out = io::stdout();
        writeln!(out)?;
        write!(out, "{}", MESSAGE_WELCOME)?;

        let history = self.history.clone().and_then(|path| prepare_history(&path, &mut out));
        out.flush()?;

        let mut terminal = ConsoleTerminal::new(history, self.signals()).map_err(|e| CliError::Io {
            context: "Could not open the console".to_string(),
            source: io::Error::other(e.to_string()),
        })?;
        self.run_statements(&mut terminal, RunMode::Interactive);
        Ok(())
    }

    /// Run a script, printing to stdout. Stops at the first failure.
    pub fn execute_in_non_interactive_mode(&mut self, content: &str) -> bool {
        self.execute_file(content, io::stdout(), RunMode::NonInteractive)
    }

    /// Run an initialization file. Its output is logged, not printed.
    pub fn execute_initialization(&mut self, content: &str) -> bool {
        let capture = SharedBuffer::new();
        let success = self.execute_file(content, capture.clone(), RunMode::Initialization);
        info!(success, output = %capture.contents(), "Executed initialization file");
        success
    }

    /// Run `content` as a script in `mode`, writing to `out`.
    pub fn execute_file<W: Write>(&mut self, content: &str, mut out: W, mode: RunMode) -> bool {
        if let Err(e) = writeln!(out, "{}", format::info(MESSAGE_EXECUTE_FILE, true)) {
            warn!(error = %e, "Could not write to the output");
            return false;
        }
        let script = format_sql_file(content);
        let mut terminal = ScriptTerminal::new(&script, out).with_signals(self.signals());
        self.run_statements(&mut terminal, mode)
    }

    // ==================== LOOP ====================

    /// Read, parse and dispatch statements until the input ends or a
    /// statement stops the loop.
    ///
    /// Returns `false` when a failure aborted the loop.
    pub fn run_statements(&mut self, terminal: &mut dyn Terminal, mode: RunMode) -> bool {
        info!(mode = %mode, "Starting statement loop");
        let mut state = LoopState::new(mode);
        let mut reader = StatementReader::new(PROMPT);

        while state.running {
            if let Err(e) = writeln!(terminal.writer()) {
                warn!(error = %e, "Could not write to the terminal");
                return false;
            }

            let statement = match reader.read_statement(terminal, &self.parser) {
                Ok(statement) => statement,
                Err(ReadError::Interrupted) => continue,
                Err(ReadError::Eof) => break,
                Err(ReadError::Io(e)) => {
                    let message = message_input_closed(&e.to_string());
                    info!(error = %e, "Input channel closed");
                    let plain = terminal.is_plain();
                    let _ = writeln!(terminal.writer(), "{}", format::info(&message, plain));
                    break;
                }
            };
            if statement.trim().is_empty() {
                continue;
            }

            let operation = match self.parser.parse(&statement) {
                Ok(Some(operation)) => operation,
                Ok(None) => continue,
                Err(e) => {
                    self.report(terminal, &CliError::Parse(e));
                    if mode.exits_on_failure() {
                        return false;
                    }
                    continue;
                }
            };

            if self.parser.command() != statement {
                let error = CliError::invariant(format!(
                    "the parsed text '{}' differs from the statement read '{}'",
                    self.parser.command(),
                    statement
                ));
                self.report(terminal, &error);
                return false;
            }

            let cancel = CancelToken::new();
            let result = {
                let _interrupt = InterruptGuard::install(&terminal.signals(), cancel.clone());
                OperationDispatcher::new(&mut self.executor, &mut *terminal).dispatch(
                    &operation,
                    &mut state,
                    &cancel,
                )
            };

            match result {
                Ok(()) => debug!(kind = %operation.kind(), "Statement finished"),
                Err(error) => {
                    self.report(terminal, &error);
                    if error.is_internal() || mode.exits_on_failure() {
                        return false;
                    }
                }
            }
        }

        info!(mode = %mode, "Statement loop finished");
        true
    }

    fn report(&self, terminal: &mut dyn Terminal, error: &CliError) {
        let verbose = self.executor.session_config().get(&VERBOSE);
        let plain = terminal.is_plain();
        ErrorReporter::report(terminal.writer(), error, verbose, plain);
    }
}

/// Make sure the history file exists. Returns the path on success.
fn prepare_history(path: &Path, out: &mut dyn Write) -> Option<PathBuf> {
    let created = path.exists()
        || path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(path))
            .is_ok();

    if created {
        info!(path = %path.display(), "Using command history file");
        let _ = writeln!(out, "Command history file path: {}", path.display());
        Some(path.to_path_buf())
    } else {
        warn!(path = %path.display(), "Unable to create history file");
        let _ = writeln!(out, "Unable to create history file: {}", path.display());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_history_creates_file() {
        // GIVEN
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history");
        let mut out = Vec::new();

        // WHEN
        let prepared = prepare_history(&path, &mut out);

        // THEN
        assert_eq!(prepared.as_deref(), Some(path.as_path()));
        assert!(path.exists());
        assert!(String::from_utf8(out)
            .unwrap()
            .starts_with("Command history file path: "));
    }

    #[test]
    fn test_prepare_history_reports_failure() {
        // GIVEN
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("history");
        let mut out = Vec::new();

        // WHEN
        let prepared = prepare_history(&path, &mut out);

        // THEN
        assert!(prepared.is_none());
        assert!(String::from_utf8(out)
            .unwrap()
            .starts_with("Unable to create history file: "));
    }
}

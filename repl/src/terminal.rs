//! Terminals the statement loop reads from and writes to.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::signal::SignalRegistry;

/// Blank lines written to clear a terminal without cursor control.
const PLAIN_CLEAR_LINES: usize = 200;

/// Why no line was read.
#[derive(Debug)]
pub enum ReadError {
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D or end of script.
    Eof,
    /// The input channel failed.
    Io(io::Error),
}

pub trait Terminal {
    /// Read one line, without its terminator.
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadError>;

    fn writer(&mut self) -> &mut dyn Write;

    /// Whether output must stay free of ANSI styling and cursor control.
    fn is_plain(&self) -> bool;

    /// Where interrupts for this terminal are delivered.
    fn signals(&self) -> SignalRegistry;

    fn clear(&mut self) -> io::Result<()> {
        let out = self.writer();
        for _ in 0..PLAIN_CLEAR_LINES {
            writeln!(out)?;
        }
        out.flush()
    }

    /// Record a complete statement in the line history.
    fn add_history(&mut self, _statement: &str) {}
}

// ==================== CONSOLE ====================

/// Interactive terminal backed by a line editor with persistent history.
pub struct ConsoleTerminal {
    editor: DefaultEditor,
    history: Option<PathBuf>,
    out: io::Stdout,
    signals: SignalRegistry,
}

impl ConsoleTerminal {
    pub fn new(history: Option<PathBuf>, signals: SignalRegistry) -> Result<Self, ReadlineError> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &history {
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "No history loaded");
            }
        }
        Ok(Self {
            editor,
            history,
            out: io::stdout(),
            signals,
        })
    }
}

impl Terminal for ConsoleTerminal {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadError> {
        let _ = self.out.flush();
        let styled = prompt.green().bold().to_string();
        match self.editor.readline(&styled) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) => Err(ReadError::Interrupted),
            Err(ReadlineError::Eof) => Err(ReadError::Eof),
            Err(ReadlineError::Io(e)) => Err(ReadError::Io(e)),
            Err(e) => Err(ReadError::Io(io::Error::other(e.to_string()))),
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn is_plain(&self) -> bool {
        false
    }

    fn signals(&self) -> SignalRegistry {
        self.signals.clone()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.editor
            .clear_screen()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn add_history(&mut self, statement: &str) {
        if let Err(e) = self.editor.add_history_entry(statement) {
            warn!(error = %e, "Could not add statement to history");
            return;
        }
        if let Some(path) = &self.history {
            if let Err(e) = self.editor.save_history(path) {
                warn!(path = %path.display(), error = %e, "Could not write history file");
            }
        }
    }
}

// ==================== SCRIPT ====================

/// Plain terminal over in-memory input, used for script files,
/// initialization files and tests.
///
/// Every line read is echoed after its prompt, so the output reads like a
/// console transcript.
pub struct ScriptTerminal<W: Write> {
    lines: VecDeque<String>,
    out: W,
    signals: SignalRegistry,
}

impl<W: Write> ScriptTerminal<W> {
    pub fn new(content: &str, out: W) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
            out,
            signals: SignalRegistry::new(),
        }
    }

    pub fn with_signals(mut self, signals: SignalRegistry) -> Self {
        self.signals = signals;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Terminal for ScriptTerminal<W> {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadError> {
        let line = self.lines.pop_front().ok_or(ReadError::Eof)?;
        writeln!(self.out, "{}{}", prompt, line).map_err(ReadError::Io)?;
        Ok(line)
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn is_plain(&self) -> bool {
        true
    }

    fn signals(&self) -> SignalRegistry {
        self.signals.clone()
    }
}

/// A cloneable in-memory sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_terminal_echoes_and_ends() {
        // GIVEN
        let buffer = SharedBuffer::new();
        let mut terminal = ScriptTerminal::new("SELECT 1;\n", buffer.clone());

        // WHEN
        let line = terminal.read_line("sqlcli> ").unwrap();
        let end = terminal.read_line("sqlcli> ");

        // THEN
        assert_eq!(line, "SELECT 1;");
        assert!(matches!(end, Err(ReadError::Eof)));
        assert_eq!(buffer.contents(), "sqlcli> SELECT 1;\n");
    }

    #[test]
    fn test_plain_clear_writes_blank_lines() {
        let buffer = SharedBuffer::new();
        let mut terminal = ScriptTerminal::new("", buffer.clone());

        terminal.clear().unwrap();

        assert_eq!(buffer.contents().len(), PLAIN_CLEAR_LINES);
    }
}

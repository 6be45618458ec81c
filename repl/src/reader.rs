//! Multi-line statement accumulation.

use std::collections::VecDeque;

use sqlcli_parser::{split_statements, OperationParser};

use crate::terminal::{ReadError, Terminal};

/// Continuation marker shown for the second and later lines of a statement.
const CONTINUATION: &str = "> ";

/// Reads one statement at a time from a terminal.
///
/// Lines are accumulated until the parser considers the buffer complete.
/// A line that completes several statements at once queues the extra ones
/// for the following reads.
#[derive(Debug)]
pub struct StatementReader {
    prompt: String,
    continuation: String,
    queued: VecDeque<String>,
}

impl StatementReader {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            continuation: format!("{:>width$}", CONTINUATION, width = prompt.chars().count()),
            queued: VecDeque::new(),
        }
    }

    /// The next statement, or an empty string for input with nothing to run.
    ///
    /// An interrupt discards the partially typed statement.
    pub fn read_statement(
        &mut self,
        terminal: &mut dyn Terminal,
        parser: &dyn OperationParser,
    ) -> Result<String, ReadError> {
        if let Some(next) = self.queued.pop_front() {
            return Ok(next);
        }

        let mut buffer = String::new();
        loop {
            let prompt = if buffer.is_empty() {
                &self.prompt
            } else {
                &self.continuation
            };
            let line = terminal.read_line(prompt)?;
            buffer.push_str(&line);
            buffer.push('\n');

            if split_statements(&buffer).is_empty() {
                return Ok(String::new());
            }
            if parser.is_complete(&buffer) {
                break;
            }
        }

        terminal.add_history(buffer.trim());
        let mut statements = split_statements(&buffer).into_iter();
        let first = statements.next().unwrap_or_default();
        self.queued.extend(statements);
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{ScriptTerminal, SharedBuffer};
    use sqlcli_parser::SqlParser;

    fn read_all(input: &str) -> (Vec<String>, String) {
        let buffer = SharedBuffer::new();
        let mut terminal = ScriptTerminal::new(input, buffer.clone());
        let mut reader = StatementReader::new("sqlcli> ");
        let parser = SqlParser::new();
        let mut statements = Vec::new();
        while let Ok(statement) = reader.read_statement(&mut terminal, &parser) {
            statements.push(statement);
        }
        (statements, buffer.contents())
    }

    #[test]
    fn test_statement_spans_lines() {
        // GIVEN
        let input = "SELECT 1,\n2;\n";

        // WHEN
        let (statements, transcript) = read_all(input);

        // THEN
        assert_eq!(statements, vec!["SELECT 1,\n2;"]);
        assert_eq!(transcript, "sqlcli> SELECT 1,\n      > 2;\n");
    }

    #[test]
    fn test_one_line_with_two_statements() {
        let (statements, _) = read_all("SET 'a' = '1'; SET 'b' = '2';\n");
        assert_eq!(statements, vec!["SET 'a' = '1';", "SET 'b' = '2';"]);
    }

    #[test]
    fn test_blank_and_comment_lines_are_empty() {
        let (statements, _) = read_all("\n   \n-- note\nHELP;\n");
        assert_eq!(statements, vec!["", "", "", "HELP;"]);
    }

    #[test]
    fn test_semicolon_inside_string_does_not_end_statement() {
        let (statements, _) = read_all("SELECT ';'\n;\n");
        assert_eq!(statements, vec!["SELECT ';'\n;"]);
    }
}

//! Statement boundaries in multi-line input and script files.
//!
//! Statements end at a `;` outside of quotes and comments. The one exception
//! is `EXECUTE STATEMENT SET BEGIN ... END;`, whose inner statements carry
//! their own terminators and which only ends at `END;`.

/// Client commands accepted without a terminating `;`.
const BARE_COMMANDS: [&str; 4] = ["quit", "exit", "help", "clear"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuote,
    BackQuote,
    DoubleQuote,
    LineComment,
    BlockComment,
}

/// Result of scanning a buffer for statement terminators.
#[derive(Debug, Default)]
struct Scan {
    /// Complete statements, each ending with `;`.
    statements: Vec<String>,
    /// An `EXECUTE STATEMENT SET` block still waiting for `END;`.
    open_block: Option<String>,
    /// Text after the last terminator.
    rest: String,
    /// The buffer ends inside a literal or block comment.
    unterminated: bool,
}

fn scan(text: &str) -> Scan {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::Normal;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        current.push(c);
        state = match state {
            ScanState::Normal => match c {
                '\'' => ScanState::SingleQuote,
                '`' => ScanState::BackQuote,
                '"' => ScanState::DoubleQuote,
                '-' if next == Some('-') => {
                    current.push('-');
                    i += 1;
                    ScanState::LineComment
                }
                '/' if next == Some('*') => {
                    current.push('*');
                    i += 1;
                    ScanState::BlockComment
                }
                ';' => {
                    segments.push(std::mem::take(&mut current));
                    ScanState::Normal
                }
                _ => ScanState::Normal,
            },
            ScanState::SingleQuote if c == '\'' => ScanState::Normal,
            ScanState::BackQuote if c == '`' => ScanState::Normal,
            ScanState::DoubleQuote if c == '"' => ScanState::Normal,
            ScanState::LineComment if c == '\n' => ScanState::Normal,
            ScanState::BlockComment if c == '*' && next == Some('/') => {
                current.push('/');
                i += 1;
                ScanState::Normal
            }
            other => other,
        };
        i += 1;
    }

    let mut statements = Vec::new();
    let mut open_block: Option<String> = None;
    for segment in segments {
        match open_block.take() {
            Some(mut block) => {
                block.push_str(&segment);
                if closes_statement_set(&block) {
                    statements.push(block);
                } else {
                    open_block = Some(block);
                }
            }
            None if opens_statement_set(&segment) && !closes_statement_set(&segment) => {
                open_block = Some(segment);
            }
            None => statements.push(segment),
        }
    }

    Scan {
        statements,
        open_block,
        rest: current,
        unterminated: matches!(
            state,
            ScanState::SingleQuote
                | ScanState::BackQuote
                | ScanState::DoubleQuote
                | ScanState::BlockComment
        ),
    }
}

/// Drop leading whitespace and comments.
fn skip_leading_comments(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map(|(_, tail)| tail).unwrap_or("").trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, tail)| tail).unwrap_or("").trim_start();
        } else {
            return rest;
        }
    }
}

fn leading_words(text: &str, count: usize) -> Vec<String> {
    skip_leading_comments(text)
        .split_whitespace()
        .take(count)
        .map(|w| w.trim_end_matches(';').to_ascii_uppercase())
        .collect()
}

fn opens_statement_set(statement: &str) -> bool {
    leading_words(statement, 4) == ["EXECUTE", "STATEMENT", "SET", "BEGIN"]
}

fn closes_statement_set(statement: &str) -> bool {
    let body = statement.trim_end().trim_end_matches(';').trim_end();
    let Some(split) = body.len().checked_sub(3) else {
        return false;
    };
    match (body.get(..split), body.get(split..)) {
        (Some(head), Some(tail)) => {
            tail.eq_ignore_ascii_case("END")
                && head
                    .chars()
                    .next_back()
                    .map_or(true, |c| c.is_whitespace() || c == ';')
        }
        _ => false,
    }
}

fn is_blank(text: &str) -> bool {
    skip_leading_comments(text).is_empty()
}

fn is_bare_command(text: &str) -> bool {
    let word = text.trim().trim_end_matches(';').trim();
    BARE_COMMANDS.iter().any(|cmd| word.eq_ignore_ascii_case(cmd))
}

/// Whether `buffer` holds one or more complete statements and nothing else.
pub fn is_statement_complete(buffer: &str) -> bool {
    if is_bare_command(buffer) {
        return true;
    }
    let scan = scan(buffer);
    !scan.unterminated
        && scan.open_block.is_none()
        && !scan.statements.is_empty()
        && is_blank(&scan.rest)
}

/// Split text into trimmed statements.
///
/// Every complete statement keeps its `;`. Unterminated trailing text, if
/// any, becomes the last element as-is.
pub fn split_statements(text: &str) -> Vec<String> {
    if is_bare_command(text) {
        return vec![text.trim().to_string()];
    }
    let scan = scan(text);
    let mut statements: Vec<String> = scan
        .statements
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    let mut tail = scan.open_block.unwrap_or_default();
    tail.push_str(&scan.rest);
    if !is_blank(&tail) {
        statements.push(tail.trim().to_string());
    }
    statements
}

/// Normalize a script file: trim it and make sure the last statement is
/// terminated.
pub fn format_sql_file(content: &str) -> String {
    let trimmed = content.trim();
    let mut formatted = String::with_capacity(trimmed.len() + 2);
    formatted.push_str(trimmed);
    if !trimmed.ends_with(';') {
        formatted.push(';');
    }
    formatted.push('\n');
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_only_after_terminator() {
        assert!(!is_statement_complete("SELECT *\n"));
        assert!(!is_statement_complete("SELECT *\nFROM t\n"));
        assert!(is_statement_complete("SELECT *\nFROM t;\n"));
    }

    #[test]
    fn test_terminator_inside_literal_is_ignored() {
        assert!(!is_statement_complete("SELECT 'a;b\n"));
        assert!(is_statement_complete("SELECT 'a;b';"));
        assert!(!is_statement_complete("SELECT 1 /* ; */"));
        assert!(is_statement_complete("SELECT 1; -- trailing comment"));
    }

    #[test]
    fn test_statement_set_block_waits_for_end() {
        let partial = "EXECUTE STATEMENT SET BEGIN\nINSERT INTO a VALUES (1);\n";
        assert!(!is_statement_complete(partial));

        let full = format!("{}INSERT INTO b VALUES (2);\nEND;\n", partial);
        assert!(is_statement_complete(&full));
        assert_eq!(split_statements(&full).len(), 1);
    }

    #[test]
    fn test_bare_client_commands() {
        assert!(is_statement_complete("quit"));
        assert!(is_statement_complete("HELP"));
        assert!(!is_statement_complete("select"));
    }

    #[test]
    fn test_split_keeps_terminators() {
        let statements = split_statements("SET 'a' = '1'; SELECT 1;\nSHOW TABLES");
        assert_eq!(
            statements,
            vec!["SET 'a' = '1';", "SELECT 1;", "SHOW TABLES"]
        );
    }

    #[test]
    fn test_format_sql_file_terminates_last_statement() {
        assert_eq!(format_sql_file("  SELECT 1  \n"), "SELECT 1;\n");
        assert_eq!(format_sql_file("SELECT 1;"), "SELECT 1;\n");
    }

    #[test]
    fn test_closes_statement_set_requires_word_boundary() {
        assert!(closes_statement_set("EXECUTE STATEMENT SET BEGIN INSERT INTO a SELECT 1; END;"));
        assert!(!closes_statement_set("INSERT INTO backend;"));
    }
}

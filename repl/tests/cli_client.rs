//! End-to-end behavior of the statement loop.

mod common;

use common::{client, terminal, RecordingExecutor, ScriptedTerminal};
use sqlcli_core::{ModifyKind, Operation, RunMode};
use sqlcli_parser::{OperationParser, ParseResult, SqlParser};
use sqlcli_repl::messages::*;
use sqlcli_repl::{CliClient, ReadError, SharedBuffer, SignalRegistry, Terminal};

#[test]
fn test_statement_set_submits_one_batch() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, output) = terminal(
        "BEGIN STATEMENT SET;\n\
         INSERT INTO a VALUES (1);\n\
         INSERT INTO b VALUES (2);\n\
         END;\n",
    );

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert!(success);
    let submitted = &client.executor().submitted;
    assert_eq!(submitted.len(), 1);
    let targets: Vec<&str> = submitted[0].iter().map(|op| op.target.as_str()).collect();
    assert_eq!(targets, vec!["a", "b"]);
    assert!(submitted[0].iter().all(|op| op.kind == ModifyKind::InsertInto));

    let output = output.contents();
    assert_eq!(output.matches(MESSAGE_ADD_STATEMENT_TO_STATEMENT_SET).count(), 2);
    assert!(output.contains(&format!("Job ID: {:032x}", 1)));
}

#[test]
fn test_malformed_statement_continues_interactively() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, output) = terminal("SELEC 1;\nSET 'k' = 'v';\n");

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert!(success);
    assert_eq!(client.executor().properties.get("k").map(String::as_str), Some("v"));
    assert!(output.contents().contains(MESSAGE_SQL_EXECUTION_ERROR));
}

#[test]
fn test_malformed_statement_aborts_script() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());

    // WHEN
    let success = client.execute_file(
        "SELEC 1;\nSET 'k' = 'v';",
        SharedBuffer::new(),
        RunMode::NonInteractive,
    );

    // THEN
    assert!(!success);
    assert!(client.executor().properties.is_empty());
}

#[test]
fn test_script_output_starts_with_file_banner() {
    let mut client = client(RecordingExecutor::new());
    let output = SharedBuffer::new();

    let success = client.execute_file("SET 'k' = 'v'", output.clone(), RunMode::NonInteractive);

    assert!(success);
    let output = output.contents();
    assert!(output.starts_with(&format!("[INFO] {}\n", MESSAGE_EXECUTE_FILE)));
    assert!(output.contains("sqlcli> SET 'k' = 'v';"));
    assert!(output.contains(MESSAGE_SET_KEY));
}

#[test]
fn test_property_listing_is_sorted() {
    // GIVEN
    let executor = RecordingExecutor::new()
        .with_property("zeta", "3")
        .with_property("alpha", "it's")
        .with_property("mid", "2");
    let mut client = client(executor);
    let (mut terminal, output) = terminal("SET;\n");

    // WHEN
    client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    let output = output.contents();
    let listing: Vec<&str> = output.lines().filter(|l| l.starts_with('\'')).collect();
    assert_eq!(
        listing,
        vec!["'alpha' = 'it''s'", "'mid' = '2'", "'zeta' = '3'"]
    );
}

#[test]
fn test_empty_property_listing() {
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, output) = terminal("SET;\n");

    client.run_statements(&mut terminal, RunMode::Interactive);

    assert!(output.contents().contains(MESSAGE_EMPTY));
}

#[test]
fn test_set_and_reset_are_reflected() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let (mut first, _) = terminal(
        "SET 'a' = '1';\n\
         SET 'b' = '2';\n\
         RESET 'a';\n",
    );
    let (mut second, _) = terminal("RESET;\n");

    // WHEN
    client.run_statements(&mut first, RunMode::Interactive);

    // THEN
    let properties = &client.executor().properties;
    assert!(!properties.contains_key("a"));
    assert_eq!(properties.get("b").map(String::as_str), Some("2"));

    client.run_statements(&mut second, RunMode::Interactive);
    assert!(client.executor().properties.is_empty());
}

#[test]
fn test_script_query_requires_tableau() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let output = SharedBuffer::new();

    // WHEN
    let success = client.execute_file("SELECT 1;", output.clone(), RunMode::NonInteractive);

    // THEN
    assert!(!success);
    assert!(client.executor().queries.is_empty());
    assert!(output
        .contents()
        .contains("SET 'sql-client.execution.result-mode' = 'tableau';"));
}

#[test]
fn test_script_query_in_tableau_mode_runs() {
    let mut client = client(RecordingExecutor::new());
    let output = SharedBuffer::new();

    let success = client.execute_file(
        "SET 'sql-client.execution.result-mode' = 'tableau';\nSELECT 1;",
        output.clone(),
        RunMode::NonInteractive,
    );

    assert!(success);
    assert_eq!(client.executor().queries, vec!["SELECT 1"]);
    assert!(output.contents().contains("1 row in set"));
}

#[test]
fn test_stop_with_savepoint_without_path_is_internal_error() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, output) = terminal(
        "STOP JOB '0123456789abcdef0123456789abcdef' WITH SAVEPOINT;\n\
         SET 'after' = 'stop';\n",
    );

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert!(!success);
    assert!(output.contents().contains(MESSAGE_INTERNAL_ERROR));
    assert!(!client.executor().properties.contains_key("after"));
}

#[test]
fn test_stop_with_savepoint_reports_path() {
    let mut executor = RecordingExecutor::new();
    executor.savepoint = Some("file:///sp/savepoint-1".to_string());
    let mut client = client(executor);
    let (mut terminal, output) =
        terminal("STOP JOB '0123456789abcdef0123456789abcdef' WITH SAVEPOINT;\n");

    assert!(client.run_statements(&mut terminal, RunMode::Interactive));

    assert!(output
        .contents()
        .contains(&message_stop_job_with_savepoint("file:///sp/savepoint-1")));
}

#[test]
fn test_modify_without_job_handle_is_internal_error() {
    let mut executor = RecordingExecutor::new();
    executor.omit_job = true;
    let mut client = client(executor);
    let (mut terminal, output) = terminal("INSERT INTO t VALUES (1);\n");

    assert!(!client.run_statements(&mut terminal, RunMode::Interactive));
    assert!(output.contents().contains(MESSAGE_INTERNAL_ERROR));
}

#[test]
fn test_init_file_rejects_queries() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let output = SharedBuffer::new();

    // WHEN
    let success = client.execute_file(
        "SET 'k' = 'v';\nSELECT 1;\nSET 'never' = 'x';",
        output.clone(),
        RunMode::Initialization,
    );

    // THEN
    assert!(!success);
    assert!(output
        .contents()
        .contains(&format!("{}SELECT 1", MESSAGE_UNSUPPORTED_IN_INIT)));
    let properties = &client.executor().properties;
    assert!(properties.contains_key("k"));
    assert!(!properties.contains_key("never"));
}

#[test]
fn test_initialization_output_is_not_printed() {
    let mut client = client(RecordingExecutor::new());

    let success = client.execute_initialization("CREATE TABLE t (a INT);\nSET 'k' = 'v';");

    assert!(success);
    assert_eq!(client.executor().operations.len(), 1);
    assert!(matches!(client.executor().operations[0], Operation::Create(_)));
}

#[test]
fn test_init_file_rejects_create_table_as() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let output = SharedBuffer::new();

    // WHEN
    let success = client.execute_file(
        "CREATE TABLE t2 AS SELECT 1;",
        output.clone(),
        RunMode::Initialization,
    );

    // THEN
    assert!(!success);
    assert!(output.contents().contains(MESSAGE_UNSUPPORTED_IN_INIT));
    assert!(client.executor().submitted.is_empty());
}

#[test]
fn test_end_without_begin_is_reported() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, output) = terminal("END;\n");

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert!(success);
    assert!(output.contents().contains(MESSAGE_STATEMENT_SET_END_CALL_ERROR));
    assert!(client.executor().submitted.is_empty());
}

#[test]
fn test_failed_operation_aborts_script_only() {
    let input = "DROP TABLE missing;\nSET 'after' = 'drop';";

    let mut interactive = client(RecordingExecutor::new());
    let (mut terminal, output) = terminal(&format!("{}\n", input));
    assert!(interactive.run_statements(&mut terminal, RunMode::Interactive));
    assert!(interactive.executor().properties.contains_key("after"));
    assert!(output.contents().contains("table 'missing' does not exist"));

    let mut script = client(RecordingExecutor::new());
    assert!(!script.execute_file(input, SharedBuffer::new(), RunMode::NonInteractive));
    assert!(!script.executor().properties.contains_key("after"));
}

#[test]
fn test_verbose_report_shows_cause_chain() {
    let executor = RecordingExecutor::new().with_property("sql-client.verbose", "true");
    let mut client = client(executor);
    let (mut terminal, output) = terminal("DROP TABLE missing;\n");

    client.run_statements(&mut terminal, RunMode::Interactive);

    let output = output.contents();
    assert!(output.contains("Failed to execute operation 'DROP TABLE missing'"));
    assert!(output.contains("Caused by: table 'missing' does not exist"));
}

#[test]
fn test_quit_stops_before_remaining_input() {
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, output) = terminal("QUIT\nSET 'k' = 'v';\n");

    assert!(client.run_statements(&mut terminal, RunMode::Interactive));

    assert!(output.contents().contains(MESSAGE_QUIT));
    assert!(client.executor().properties.is_empty());
}

/// Parser that claims to have consumed different text than it was given.
#[derive(Default)]
struct DriftingParser {
    inner: SqlParser,
}

impl OperationParser for DriftingParser {
    fn parse(&mut self, statement: &str) -> ParseResult<Option<Operation>> {
        self.inner.parse(statement)
    }

    fn command(&self) -> &str {
        "SET 'other' = 'statement';"
    }
}

#[test]
fn test_parser_drift_is_internal_error() {
    // GIVEN
    let mut client = CliClient::with_parser(RecordingExecutor::new(), DriftingParser::default())
        .with_signals(SignalRegistry::new());
    let (mut terminal, output) = terminal("SET 'k' = 'v';\n");

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert!(!success);
    assert!(output.contents().contains(MESSAGE_INTERNAL_ERROR));
    assert!(client.executor().properties.is_empty());
}

#[test]
fn test_interrupted_read_keeps_the_loop_going() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, _output) = ScriptedTerminal::new(vec![
        Err(ReadError::Interrupted),
        ScriptedTerminal::line("SET 'k' = 'v';"),
    ]);

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert!(success);
    assert_eq!(client.executor().properties.get("k").map(String::as_str), Some("v"));
}

#[test]
fn test_broken_input_channel_ends_the_loop() {
    // GIVEN
    let mut client = client(RecordingExecutor::new());
    let (mut terminal, output) = ScriptedTerminal::new(vec![
        ScriptedTerminal::broken_pipe(),
        ScriptedTerminal::line("SET 'k' = 'v';"),
    ]);

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::NonInteractive);

    // THEN
    assert!(success);
    assert!(output.contents().contains("Input channel closed"));
    assert!(client.executor().properties.is_empty());
}

#[test]
fn test_interrupt_during_submit_cancels_the_job() {
    // GIVEN
    let (mut terminal, _output) =
        ScriptedTerminal::new(vec![ScriptedTerminal::line("INSERT INTO t VALUES (1);")]);
    let registry = terminal.signals();
    let mut executor = RecordingExecutor::new();
    executor.interrupt = Some(registry.clone());
    let mut client = client(executor);

    // WHEN
    client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert_eq!(client.executor().cancel_seen, Some(true));
    assert!(!registry.is_installed());
}

#[test]
fn test_explain_without_content_is_internal_error() {
    // GIVEN
    let mut executor = RecordingExecutor::new();
    executor.empty_content = true;
    let mut client = client(executor);
    let (mut terminal, output) = terminal("EXPLAIN SELECT 1;\nSET 'k' = 'v';\n");

    // WHEN
    let success = client.run_statements(&mut terminal, RunMode::Interactive);

    // THEN
    assert!(!success);
    assert!(output.contents().contains(MESSAGE_INTERNAL_ERROR));
    assert!(client.executor().properties.is_empty());
}

//! User-facing message texts.

pub const CLI_NAME: &str = "sqlcli";

pub const PROMPT: &str = "sqlcli> ";

pub const MESSAGE_WELCOME: &str = "\
Welcome! Enter 'HELP;' to list all available commands. 'QUIT;' to exit.

Command history file path and session properties can be changed with the
--history and -D options.
";

pub const MESSAGE_QUIT: &str = "Exiting sqlcli...";

pub const MESSAGE_SET_KEY: &str = "Session property has been set.";

pub const MESSAGE_EMPTY: &str = "Result was empty.";

pub const MESSAGE_RESET_KEY: &str = "Session property has been reset.";

pub const MESSAGE_RESET: &str = "All session properties have been set to their default values.";

pub const MESSAGE_ADD_STATEMENT_TO_STATEMENT_SET: &str =
    "Add SQL update statement to the statement set.";

pub const MESSAGE_SUBMITTING_STATEMENT: &str =
    "Submitting SQL update statement to the cluster...";

pub const MESSAGE_WAIT_EXECUTE: &str =
    "Execute statement in sync mode. Please wait for the execution finish...";

pub const MESSAGE_FINISH_STATEMENT: &str = "Complete execution of the SQL update statement.";

pub const MESSAGE_STATEMENT_SUBMITTED: &str =
    "SQL update statement has been successfully submitted to the cluster:";

pub const MESSAGE_RESULT_QUIT: &str = "Result retrieval cancelled.";

pub const MESSAGE_BEGIN_STATEMENT_SET: &str = "Begin a statement set.";

pub const MESSAGE_NO_STATEMENT_IN_STATEMENT_SET: &str =
    "No statement in the statement set, skip submit.";

pub const MESSAGE_STATEMENT_SET_END_CALL_ERROR: &str =
    "No Statement Set to submit, 'END;' command should be used after 'BEGIN STATEMENT SET;'.";

pub const MESSAGE_STATEMENT_SET_SQL_EXECUTION_ERROR: &str =
    "Only INSERT statement is allowed in Statement Set.";

pub const MESSAGE_REMOVE_JAR_STATEMENT: &str =
    "The specified jar is removed from session classloader.";

pub const MESSAGE_STOP_JOB_STATEMENT: &str = "The specified job is stopped.";

pub const MESSAGE_EXECUTE_STATEMENT: &str = "Execute statement succeed.";

pub const MESSAGE_EXECUTE_FILE: &str = "Executing SQL from file.";

pub const MESSAGE_SQL_EXECUTION_ERROR: &str = "Could not execute SQL statement.";

pub const MESSAGE_INTERNAL_ERROR: &str = "Internal error, this is a bug in sqlcli.";

pub const MESSAGE_UNSUPPORTED_IN_INIT: &str = "Unsupported operation in sql init file: ";

pub fn message_stop_job_with_savepoint(path: &str) -> String {
    format!("The specified job is stopped with savepoint {}.", path)
}

pub fn message_input_closed(reason: &str) -> String {
    format!("Input channel closed: {}", reason)
}

pub fn message_query_requires_tableau(current: &str) -> String {
    format!(
        "In non-interactive mode, queries can only be executed with result mode TABLEAU, \
         but 'sql-client.execution.result-mode' is {}. \
         Please add SET 'sql-client.execution.result-mode' = 'tableau'; to the sql file.",
        current
    )
}

/// Command reference printed by `HELP`.
pub const MESSAGE_HELP: &str = "\
The following commands are available:

CLEAR                 Clears the current terminal.
HELP                  Prints the available commands.
QUIT/EXIT             Quits the SQL CLI client.
RESET                 Resets a session configuration property. Syntax: 'RESET '<key>';'. Use 'RESET;' for reset all session properties.
SET                   Sets a session configuration property. Syntax: 'SET '<key>'='<value>';'. Use 'SET;' for listing all properties.
ADD JAR               Adds the specified jar file to the session. Syntax: 'ADD JAR '<path_to_filename>.jar';'
REMOVE JAR            Removes the specified jar file from the session. Syntax: 'REMOVE JAR '<path_to_filename>.jar';'
BEGIN STATEMENT SET   Begins a statement set. Syntax: 'BEGIN STATEMENT SET;'
END                   Ends a statement set and submits it. Syntax: 'END;'
STOP JOB              Stops a job. Syntax: 'STOP JOB '<job_id>' [WITH SAVEPOINT] [WITH DRAIN];'

Hint: Make sure that a statement ends with ';' for finalizing (multi-line) statements.
You can also type any SQL statement, please visit the SQL documentation for more details.";

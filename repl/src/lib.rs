//! sqlcli REPL library - the statement-execution core of the SQL client.
//!
//! It is split into modules for better maintainability:
//!
//! - `client`: the read-eval loop and its interactive, script and
//!   initialization entry points
//! - `guard`: admissibility of an operation in the current mode
//! - `statement_set`: batching of inserts between `BEGIN STATEMENT SET;`
//!   and `END;`
//! - `dispatcher`: routing of admitted operations to their handlers
//! - `reporter`: rendering of failed statements
//! - `terminal`, `reader`, `signal`: input, multi-line accumulation and
//!   interrupt routing
//! - `view`, `format`: result views and output formatting

mod client;
mod dispatcher;
mod error;
mod format;
mod guard;
pub mod logging;
pub mod messages;
mod reader;
mod reporter;
mod signal;
mod state;
mod statement_set;
mod terminal;
mod view;

pub use client::CliClient;
pub use dispatcher::OperationDispatcher;
pub use error::{CliError, CliResult};
pub use format::{escape_single_quotes, print_tableau, Tableau, TableauOptions};
pub use guard::{validate, Validation, INIT_ALLOWED, STATEMENT_SET_ALLOWED};
pub use reader::StatementReader;
pub use reporter::ErrorReporter;
pub use signal::{InterruptGuard, InterruptHandler, SignalRegistry};
pub use state::LoopState;
pub use statement_set::{StatementSetError, StatementSetSession};
pub use terminal::{ConsoleTerminal, ReadError, ScriptTerminal, SharedBuffer, Terminal};
pub use view::{ChangelogResultView, TableResultView, TableauResultView};

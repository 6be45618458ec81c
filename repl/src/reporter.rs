//! Rendering of statement failures.

use std::error::Error;
use std::io::Write;

use tracing::warn;

use crate::error::CliError;
use crate::format;
use crate::messages::{MESSAGE_INTERNAL_ERROR, MESSAGE_SQL_EXECUTION_ERROR};

/// Writes a failed statement's error to the terminal.
///
/// The terse form shows only the root cause. The verbose form
/// (`sql-client.verbose`) shows every layer of the error chain.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Log and print `error`. Failures to write are ignored.
    pub fn report(out: &mut dyn Write, error: &CliError, verbose: bool, plain: bool) {
        warn!(error = %error, internal = error.is_internal(), "Statement failed");
        let _ = writeln!(out, "{}", Self::format(error, verbose, plain));
        let _ = out.flush();
    }

    pub fn format(error: &CliError, verbose: bool, plain: bool) -> String {
        let header = if error.is_internal() {
            MESSAGE_INTERNAL_ERROR
        } else {
            MESSAGE_SQL_EXECUTION_ERROR
        };
        let mut text = format::error_header(header, plain);
        text.push_str(" Reason:\n");

        if verbose {
            text.push_str(&error.to_string());
            let mut source = error.source();
            while let Some(cause) = source {
                text.push_str("\nCaused by: ");
                text.push_str(&cause.to_string());
                source = cause.source();
            }
        } else {
            text.push_str(&root_cause(error).to_string());
        }
        text
    }
}

fn root_cause<'a>(error: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    let mut current = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

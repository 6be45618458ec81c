//! Routing of admitted operations to their handlers.

use sqlcli_core::{CancelToken, ModifyOperation, Operation, QueryOperation, DML_SYNC};
use sqlcli_gateway::Executor;
use tracing::{debug, info};

use crate::error::{CliError, CliResult};
use crate::format::{self, escape_single_quotes, print_tableau, TableauOptions};
use crate::guard::{validate, Validation};
use crate::messages::*;
use crate::state::LoopState;
use crate::terminal::Terminal;
use crate::view::{ChangelogResultView, TableResultView, TableauResultView};

/// Executes one operation against the executor and reports to the terminal.
///
/// Every operation passes the validation guard first. Statement-set state
/// lives in the [`LoopState`] handed in by the loop.
pub struct OperationDispatcher<'a> {
    executor: &'a mut dyn Executor,
    terminal: &'a mut dyn Terminal,
}

impl<'a> OperationDispatcher<'a> {
    pub fn new(executor: &'a mut dyn Executor, terminal: &'a mut dyn Terminal) -> Self {
        Self { executor, terminal }
    }

    pub fn dispatch(
        &mut self,
        operation: &Operation,
        state: &mut LoopState,
        cancel: &CancelToken,
    ) -> CliResult<()> {
        let config = self.executor.session_config();
        if let Validation::Denied(reason) =
            validate(operation, state.mode, &config, state.statement_set.is_active())
        {
            return Err(CliError::Validation(reason));
        }

        debug!(kind = %operation.kind(), mode = %state.mode, "Dispatching operation");
        match operation {
            Operation::Quit => self.call_quit(state),
            Operation::Clear => self.call_clear(),
            Operation::Help => self.call_help(),
            Operation::Set {
                key: Some(key),
                value: Some(value),
            } => self.call_set(key, value),
            Operation::Set { .. } => self.call_list_properties(),
            Operation::Reset { key } => self.call_reset(key.as_deref()),
            Operation::Insert(modify) | Operation::CreateTableAs(modify) => {
                self.call_insert(modify, state, cancel)
            }
            Operation::Query(query) => self.call_select(query, cancel),
            Operation::Explain(_)
            | Operation::ShowCreateTable { .. }
            | Operation::ShowCreateView { .. } => self.print_raw_content(operation),
            Operation::BeginStatementSet => {
                state.statement_set.begin()?;
                self.print_info(MESSAGE_BEGIN_STATEMENT_SET)
            }
            Operation::EndStatementSet => self.call_end_statement_set(state, cancel),
            Operation::StatementSet(modifies) => self.call_inserts(modifies, cancel),
            Operation::RemoveJar { path } => self.call_remove_jar(path),
            Operation::StopJob {
                job_id,
                with_savepoint,
                with_drain,
            } => self.call_stop_job(job_id, *with_savepoint, *with_drain),
            Operation::AddJar { .. }
            | Operation::Create(_)
            | Operation::Drop(_)
            | Operation::Alter(_)
            | Operation::Use(_)
            | Operation::LoadModule { .. }
            | Operation::UnloadModule { .. }
            | Operation::Other(_) => self.execute_operation(operation),
        }
    }

    // ==================== OUTPUT ====================

    fn print_info(&mut self, message: &str) -> CliResult<()> {
        let plain = self.terminal.is_plain();
        let out = self.terminal.writer();
        writeln!(out, "{}", format::info(message, plain))?;
        out.flush()?;
        Ok(())
    }

    fn print_line(&mut self, line: &str) -> CliResult<()> {
        let out = self.terminal.writer();
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }

    // ==================== CLIENT COMMANDS ====================

    fn call_quit(&mut self, state: &mut LoopState) -> CliResult<()> {
        self.print_info(MESSAGE_QUIT)?;
        state.stop();
        Ok(())
    }

    fn call_clear(&mut self) -> CliResult<()> {
        self.terminal.clear()?;
        Ok(())
    }

    fn call_help(&mut self) -> CliResult<()> {
        self.print_line(MESSAGE_HELP)
    }

    fn call_set(&mut self, key: &str, value: &str) -> CliResult<()> {
        let (key, value) = (key.trim(), value.trim());
        self.executor
            .set_session_property(key, value)
            .map_err(|e| CliError::execution(format!("Failed to set session property '{}'", key), e))?;
        info!(key, value, "Session property set");
        self.print_info(MESSAGE_SET_KEY)
    }

    fn call_list_properties(&mut self) -> CliResult<()> {
        let mut properties: Vec<(String, String)> =
            self.executor.session_config_map().into_iter().collect();
        if properties.is_empty() {
            return self.print_info(MESSAGE_EMPTY);
        }
        properties.sort();
        let out = self.terminal.writer();
        for (key, value) in &properties {
            writeln!(
                out,
                "'{}' = '{}'",
                escape_single_quotes(key),
                escape_single_quotes(value)
            )?;
        }
        out.flush()?;
        Ok(())
    }

    fn call_reset(&mut self, key: Option<&str>) -> CliResult<()> {
        match key {
            Some(key) => {
                let key = key.trim();
                self.executor.reset_session_property(key).map_err(|e| {
                    CliError::execution(format!("Failed to reset session property '{}'", key), e)
                })?;
                self.print_info(MESSAGE_RESET_KEY)
            }
            None => {
                self.executor
                    .reset_session_properties()
                    .map_err(|e| CliError::execution("Failed to reset session properties", e))?;
                self.print_info(MESSAGE_RESET)
            }
        }
    }

    // ==================== MODIFY ====================

    fn call_insert(
        &mut self,
        modify: &ModifyOperation,
        state: &mut LoopState,
        cancel: &CancelToken,
    ) -> CliResult<()> {
        if state.statement_set.is_active() {
            state.statement_set.add(modify.clone())?;
            return self.print_info(MESSAGE_ADD_STATEMENT_TO_STATEMENT_SET);
        }
        self.call_inserts(std::slice::from_ref(modify), cancel)
    }

    fn call_end_statement_set(
        &mut self,
        state: &mut LoopState,
        cancel: &CancelToken,
    ) -> CliResult<()> {
        if !state.statement_set.is_active() {
            return Err(CliError::Validation(
                MESSAGE_STATEMENT_SET_END_CALL_ERROR.to_string(),
            ));
        }
        let modifies = state.statement_set.end()?;
        if modifies.is_empty() {
            return self.print_info(MESSAGE_NO_STATEMENT_IN_STATEMENT_SET);
        }
        self.call_inserts(&modifies, cancel)
    }

    /// Submit operations as one job.
    fn call_inserts(&mut self, modifies: &[ModifyOperation], cancel: &CancelToken) -> CliResult<()> {
        self.print_info(MESSAGE_SUBMITTING_STATEMENT)?;

        let sync = self.executor.session_config().get(&DML_SYNC);
        if sync {
            self.print_info(MESSAGE_WAIT_EXECUTE)?;
        }

        let result = self
            .executor
            .execute_modify(modifies, cancel)
            .map_err(|e| CliError::execution("Failed to submit SQL update statement", e))?;
        let job = result.job.ok_or_else(|| {
            CliError::invariant("the executor accepted a modify operation without a job handle")
        })?;
        info!(job_id = %job.job_id, statements = modifies.len(), sync, "Submitted job");

        if sync {
            self.print_info(MESSAGE_FINISH_STATEMENT)
        } else {
            self.print_info(MESSAGE_STATEMENT_SUBMITTED)?;
            self.print_line(&format!("Job ID: {}\n", job.job_id))
        }
    }

    // ==================== QUERY ====================

    fn call_select(&mut self, query: &QueryOperation, cancel: &CancelToken) -> CliResult<()> {
        let descriptor = self.executor.execute_query(query, cancel).map_err(|e| {
            CliError::execution(format!("Failed to execute query '{}'", query.statement), e)
        })?;
        debug!(result_id = %descriptor.result_id, "Opening result view");

        if descriptor.is_tableau_mode() {
            return TableauResultView::new(self.terminal.writer(), descriptor, cancel.clone())
                .open();
        }
        if descriptor.is_materialized() {
            TableResultView::new(self.terminal.writer(), descriptor, cancel.clone()).open()?;
        } else {
            ChangelogResultView::new(self.terminal.writer(), descriptor, cancel.clone()).open()?;
        }
        self.print_info(MESSAGE_RESULT_QUIT)
    }

    // ==================== OTHER OPERATIONS ====================

    /// Print the single text field of a result (plans, DDL).
    fn print_raw_content(&mut self, operation: &Operation) -> CliResult<()> {
        let result = self.executor.execute_operation(operation).map_err(|e| {
            CliError::execution(format!("Failed to execute operation '{}'", operation.summary()), e)
        })?;
        let content = match result.first_field() {
            Some(value) if !value.is_null() => value.to_string(),
            _ => {
                return Err(CliError::invariant(format!(
                    "the result of '{}' has no content to print",
                    operation.summary()
                )))
            }
        };
        self.print_line(&content)
    }

    fn call_remove_jar(&mut self, path: &str) -> CliResult<()> {
        self.executor
            .remove_jar(path)
            .map_err(|e| CliError::execution(format!("Failed to remove jar '{}'", path), e))?;
        self.print_info(MESSAGE_REMOVE_JAR_STATEMENT)
    }

    fn call_stop_job(&mut self, job_id: &str, with_savepoint: bool, with_drain: bool) -> CliResult<()> {
        let savepoint = self
            .executor
            .stop_job(job_id, with_savepoint, with_drain)
            .map_err(|e| CliError::execution(format!("Could not stop job {}", job_id), e))?;
        info!(job_id, with_savepoint, with_drain, "Stopped job");

        if !with_savepoint {
            return self.print_info(MESSAGE_STOP_JOB_STATEMENT);
        }
        let path = savepoint.ok_or_else(|| {
            CliError::invariant(format!(
                "job {} was stopped with a savepoint but no savepoint path was returned",
                job_id
            ))
        })?;
        self.print_info(&message_stop_job_with_savepoint(&path))
    }

    fn execute_operation(&mut self, operation: &Operation) -> CliResult<()> {
        let result = self.executor.execute_operation(operation).map_err(|e| {
            CliError::execution(format!("Failed to execute operation '{}'", operation.summary()), e)
        })?;
        if result.is_ok_only() {
            return self.print_info(MESSAGE_EXECUTE_STATEMENT);
        }
        let out = self.terminal.writer();
        print_tableau(out, &result.schema, &result.rows, TableauOptions::inferred())?;
        out.flush()?;
        Ok(())
    }
}

//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};

use sqlcli_core::{
    CancelToken, JobClient, ModifyOperation, Operation, QueryOperation, ResultMode, ResultSchema,
    Row, TableResult, Value, RESULT_MODE,
};
use sqlcli_gateway::{Executor, GatewayError, GatewayResult, ResultDescriptor, VecResultFetcher};
use sqlcli_repl::{CliClient, ReadError, ScriptTerminal, SharedBuffer, SignalRegistry, Terminal};

/// Executor that records what the client asked of it.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub properties: HashMap<String, String>,
    pub submitted: Vec<Vec<ModifyOperation>>,
    pub queries: Vec<String>,
    pub operations: Vec<Operation>,
    pub stopped: Vec<String>,
    /// Savepoint path handed back by `stop_job`.
    pub savepoint: Option<String>,
    /// Return modify results without a job handle.
    pub omit_job: bool,
    /// Answer `EXPLAIN` and `SHOW CREATE` with no rows.
    pub empty_content: bool,
    /// Raised from inside `execute_modify`, like a Ctrl-C during a job submit.
    pub interrupt: Option<SignalRegistry>,
    /// Whether the token handed to `execute_modify` was cancelled after the
    /// interrupt.
    pub cancel_seen: Option<bool>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

impl Executor for RecordingExecutor {
    fn set_session_property(&mut self, key: &str, value: &str) -> GatewayResult<()> {
        self.properties.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn reset_session_property(&mut self, key: &str) -> GatewayResult<()> {
        self.properties.remove(key);
        Ok(())
    }

    fn reset_session_properties(&mut self) -> GatewayResult<()> {
        self.properties.clear();
        Ok(())
    }

    fn session_config_map(&self) -> HashMap<String, String> {
        self.properties.clone()
    }

    fn execute_query(
        &mut self,
        query: &QueryOperation,
        _cancel: &CancelToken,
    ) -> GatewayResult<ResultDescriptor> {
        self.queries.push(query.statement.clone());
        let mode = self.session_config().get(&RESULT_MODE);
        let mut descriptor = ResultDescriptor::new(
            format!("result-{}", self.queries.len()),
            ResultSchema::single("v"),
            Box::new(VecResultFetcher::single_batch(vec![Row::insert(vec![
                Value::Int(1),
            ])])),
        );
        descriptor.tableau = mode == ResultMode::Tableau;
        descriptor.materialized = mode == ResultMode::Table;
        Ok(descriptor)
    }

    fn execute_modify(
        &mut self,
        operations: &[ModifyOperation],
        cancel: &CancelToken,
    ) -> GatewayResult<TableResult> {
        self.submitted.push(operations.to_vec());
        if let Some(registry) = &self.interrupt {
            registry.raise();
            self.cancel_seen = Some(cancel.is_cancelled());
        }
        if self.omit_job {
            return Ok(TableResult::ok());
        }
        Ok(TableResult::submitted(JobClient::new(format!(
            "{:032x}",
            self.submitted.len()
        ))))
    }

    fn execute_operation(&mut self, operation: &Operation) -> GatewayResult<TableResult> {
        self.operations.push(operation.clone());
        match operation {
            Operation::Drop(ddl) if ddl.name == "missing" => {
                Err(GatewayError::object_not_found("table", "missing"))
            }
            Operation::Explain(_)
            | Operation::ShowCreateTable { .. }
            | Operation::ShowCreateView { .. }
                if self.empty_content =>
            {
                Ok(TableResult::with_content(ResultSchema::single("result"), vec![]))
            }
            _ => Ok(TableResult::ok()),
        }
    }

    fn remove_jar(&mut self, _path: &str) -> GatewayResult<()> {
        Ok(())
    }

    fn stop_job(
        &mut self,
        job_id: &str,
        _with_savepoint: bool,
        _with_drain: bool,
    ) -> GatewayResult<Option<String>> {
        self.stopped.push(job_id.to_string());
        Ok(self.savepoint.clone())
    }
}

/// A client isolated from the process's Ctrl-C.
pub fn client(executor: RecordingExecutor) -> CliClient<RecordingExecutor> {
    CliClient::new(executor).with_signals(SignalRegistry::new())
}

/// A script terminal over `input` and the buffer it writes to.
pub fn terminal(input: &str) -> (ScriptTerminal<SharedBuffer>, SharedBuffer) {
    let buffer = SharedBuffer::new();
    (ScriptTerminal::new(input, buffer.clone()), buffer)
}

/// Terminal that replays a fixed sequence of reads, including failures a
/// script never produces.
pub struct ScriptedTerminal {
    reads: VecDeque<Result<String, ReadError>>,
    out: SharedBuffer,
    signals: SignalRegistry,
}

impl ScriptedTerminal {
    pub fn new(reads: Vec<Result<String, ReadError>>) -> (Self, SharedBuffer) {
        let out = SharedBuffer::new();
        let terminal = Self {
            reads: reads.into(),
            out: out.clone(),
            signals: SignalRegistry::new(),
        };
        (terminal, out)
    }

    pub fn line(text: &str) -> Result<String, ReadError> {
        Ok(text.to_string())
    }

    pub fn broken_pipe() -> Result<String, ReadError> {
        Err(ReadError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")))
    }
}

impl Terminal for ScriptedTerminal {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadError> {
        let line = self.reads.pop_front().unwrap_or(Err(ReadError::Eof))?;
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

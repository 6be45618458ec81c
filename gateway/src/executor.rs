//! The executor seam between the statement loop and the gateway.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use sqlcli_core::{
    CancelToken, ModifyOperation, Operation, QueryOperation, ResultSchema, Row, SessionConfig,
    TableResult,
};

use crate::{GatewayError, GatewayResult};

/// Everything the client asks of a gateway.
///
/// Calls are blocking. Long-running calls take a [`CancelToken`] and return
/// [`GatewayError::Cancelled`] once it fires.
pub trait Executor {
    fn set_session_property(&mut self, key: &str, value: &str) -> GatewayResult<()>;

    fn reset_session_property(&mut self, key: &str) -> GatewayResult<()>;

    /// Drop every session override.
    fn reset_session_properties(&mut self) -> GatewayResult<()>;

    /// Effective `key -> value` properties, defaults included.
    fn session_config_map(&self) -> HashMap<String, String>;

    fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.session_config_map())
    }

    /// Start a query and describe how to retrieve its rows.
    fn execute_query(
        &mut self,
        query: &QueryOperation,
        cancel: &CancelToken,
    ) -> GatewayResult<ResultDescriptor>;

    /// Submit one or more modify operations as a single job.
    fn execute_modify(
        &mut self,
        operations: &[ModifyOperation],
        cancel: &CancelToken,
    ) -> GatewayResult<TableResult>;

    /// Execute any other operation (DDL, `USE`, `SHOW ...`, `EXPLAIN ...`).
    fn execute_operation(&mut self, operation: &Operation) -> GatewayResult<TableResult>;

    fn remove_jar(&mut self, path: &str) -> GatewayResult<()>;

    /// Stop a job. Returns the savepoint path when one was requested and
    /// taken.
    fn stop_job(
        &mut self,
        job_id: &str,
        with_savepoint: bool,
        with_drain: bool,
    ) -> GatewayResult<Option<String>>;
}

/// Pull-based access to the rows of a running query.
pub trait ResultFetcher {
    /// The next batch of rows, or `None` once the result is exhausted.
    fn fetch(&mut self, cancel: &CancelToken) -> GatewayResult<Option<Vec<Row>>>;

    /// Release the result. Further fetches return `None`.
    fn close(&mut self);
}

/// Fetcher over rows that are already in memory.
#[derive(Debug, Default)]
pub struct VecResultFetcher {
    batches: VecDeque<Vec<Row>>,
}

impl VecResultFetcher {
    pub fn new(batches: Vec<Vec<Row>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }

    /// All rows in one batch.
    pub fn single_batch(rows: Vec<Row>) -> Self {
        Self::new(vec![rows])
    }
}

impl ResultFetcher for VecResultFetcher {
    fn fetch(&mut self, cancel: &CancelToken) -> GatewayResult<Option<Vec<Row>>> {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        Ok(self.batches.pop_front())
    }

    fn close(&mut self) {
        self.batches.clear();
    }
}

/// Describes a started query: its schema, how it should be shown and where
/// its rows come from.
pub struct ResultDescriptor {
    pub result_id: String,
    pub schema: ResultSchema,
    /// Rows are materialized into a table view rather than a changelog.
    pub materialized: bool,
    /// Rows are printed directly to the terminal.
    pub tableau: bool,
    /// The query is unbounded.
    pub streaming: bool,
    pub max_column_width: usize,
    fetcher: Box<dyn ResultFetcher>,
}

impl ResultDescriptor {
    pub fn new(
        result_id: impl Into<String>,
        schema: ResultSchema,
        fetcher: Box<dyn ResultFetcher>,
    ) -> Self {
        Self {
            result_id: result_id.into(),
            schema,
            materialized: true,
            tableau: false,
            streaming: false,
            max_column_width: 30,
            fetcher,
        }
    }

    pub fn is_tableau_mode(&self) -> bool {
        self.tableau
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn is_streaming_mode(&self) -> bool {
        self.streaming
    }

    pub fn fetcher_mut(&mut self) -> &mut dyn ResultFetcher {
        self.fetcher.as_mut()
    }

    /// Drain all remaining rows.
    pub fn collect_rows(&mut self, cancel: &CancelToken) -> GatewayResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(batch) = self.fetcher.fetch(cancel)? {
            rows.extend(batch);
        }
        Ok(rows)
    }
}

impl fmt::Debug for ResultDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultDescriptor")
            .field("result_id", &self.result_id)
            .field("schema", &self.schema)
            .field("materialized", &self.materialized)
            .field("tableau", &self.tableau)
            .field("streaming", &self.streaming)
            .field("max_column_width", &self.max_column_width)
            .finish_non_exhaustive()
    }
}

//! An in-process gateway.
//!
//! `LocalExecutor` keeps all session state in memory: property overrides
//! on top of defaults, a catalog holding the DDL text of every object,
//! loaded modules, added jars and the jobs submitted by modify operations.
//! It executes no dataflow; submitted jobs run until stopped, or finish at
//! once when `table.dml-sync` is on.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use regex_lite::Regex;
use sqlcli_core::{
    validate_property, CancelToken, Column, DdlOperation, JobClient, ModifyKind, ModifyOperation,
    ObjectKind, Operation, QueryOperation, ResultMode, ResultSchema, Row, RuntimeMode,
    TableResult, UseTarget, Value, DML_SYNC, MAX_COLUMN_WIDTH, RESULT_MODE, RUNTIME_MODE,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::query::{plan_query, QueryPlan};
use crate::{Executor, GatewayError, GatewayResult, ResultDescriptor, VecResultFetcher};

const JOB_ID_PATTERN: &str = "^[0-9a-fA-F]{32}$";
const DEFAULT_SAVEPOINT_DIR: &str = "file:///tmp/sqlcli/savepoints";

/// Lifecycle of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Finished,
    Stopped,
}

impl JobStatus {
    pub fn name(self) -> &'static str {
        match self {
            JobStatus::Running => "RUNNING",
            JobStatus::Finished => "FINISHED",
            JobStatus::Stopped => "CANCELED",
        }
    }
}

#[derive(Debug, Clone)]
struct Job {
    name: String,
    status: JobStatus,
}

pub struct LocalExecutor {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
    catalog: Catalog,
    jars: BTreeSet<String>,
    jobs: BTreeMap<String, Job>,
    savepoint_dir: String,
    next_result: u64,
    next_savepoint: u64,
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::with_defaults(HashMap::new())
    }

    /// Create an executor whose defaults are the built-in ones plus
    /// `defaults`.
    pub fn with_defaults(defaults: HashMap<String, String>) -> Self {
        let mut merged: HashMap<String, String> = [
            (RESULT_MODE.key, RESULT_MODE.default.name().to_ascii_lowercase()),
            (DML_SYNC.key, DML_SYNC.default.to_string()),
            (RUNTIME_MODE.key, "streaming".to_string()),
            (MAX_COLUMN_WIDTH.key, MAX_COLUMN_WIDTH.default.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        merged.extend(defaults);

        Self {
            defaults: merged,
            overrides: HashMap::new(),
            catalog: Catalog::new(),
            jars: BTreeSet::new(),
            jobs: BTreeMap::new(),
            savepoint_dir: DEFAULT_SAVEPOINT_DIR.to_string(),
            next_result: 0,
            next_savepoint: 0,
        }
    }

    pub fn with_savepoint_dir(mut self, dir: impl Into<String>) -> Self {
        self.savepoint_dir = dir.into();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn jars(&self) -> impl Iterator<Item = &str> {
        self.jars.iter().map(String::as_str)
    }

    /// Ids of every submitted job, in id order.
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs.keys().cloned().collect()
    }

    pub fn job_status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.get(job_id).map(|job| job.status)
    }

    // ==================== DDL ====================

    fn execute_create(&mut self, op: &DdlOperation) -> GatewayResult<()> {
        match op.object {
            ObjectKind::Catalog => self.catalog.create_catalog(&op.name, op.if_exists),
            ObjectKind::Database => self.catalog.create_database(&op.name, op.if_exists),
            kind => self
                .catalog
                .create_object(kind, &op.name, &op.statement, op.if_exists)
                .map(|_| ()),
        }
    }

    fn execute_drop(&mut self, op: &DdlOperation) -> GatewayResult<()> {
        match op.object {
            ObjectKind::Catalog => self.catalog.drop_catalog(&op.name, op.if_exists),
            ObjectKind::Database => self.catalog.drop_database(&op.name, op.if_exists),
            kind => self.catalog.drop_object(kind, &op.name, op.if_exists),
        }
    }

    fn execute_alter(&self, op: &DdlOperation) -> GatewayResult<()> {
        match op.object {
            ObjectKind::Catalog if !self.catalog.has_catalog(&op.name) && !op.if_exists => Err(
                GatewayError::object_not_found("catalog", op.name.as_str()),
            ),
            ObjectKind::Database if !self.catalog.has_database(&op.name) && !op.if_exists => {
                Err(GatewayError::object_not_found(
                    "database",
                    self.catalog.qualify_database(&op.name),
                ))
            }
            ObjectKind::Catalog | ObjectKind::Database => Ok(()),
            _ if op.if_exists => Ok(()),
            kind => self.catalog.require_object(kind, &op.name).map(|_| ()),
        }
    }

    fn show_create(&self, kind: ObjectKind, name: &str) -> GatewayResult<TableResult> {
        let object = match self.catalog.get(name) {
            Some(object) if object.kind == kind => object,
            Some(object) => {
                return Err(GatewayError::sql_execution(format!(
                    "SHOW CREATE {} is not supported for '{}', which is a {}",
                    kind.name(),
                    self.catalog.qualify(name),
                    object.kind.name().to_ascii_lowercase()
                )));
            }
            None => {
                let label = if kind == ObjectKind::View { "view" } else { "table" };
                return Err(GatewayError::object_not_found(label, self.catalog.qualify(name)));
            }
        };
        Ok(TableResult::text("result", object.ddl.clone()))
    }

    // ==================== SHOW ====================

    fn list_result(column: &str, names: Vec<String>) -> TableResult {
        TableResult::with_content(
            ResultSchema::single(column),
            names
                .into_iter()
                .map(|name| Row::insert(vec![Value::String(name)]))
                .collect(),
        )
    }

    /// `SHOW ...`, `DESCRIBE ...` and other pass-through statements.
    fn execute_generic(&self, statement: &str) -> GatewayResult<TableResult> {
        let words: Vec<String> = statement
            .trim()
            .trim_end_matches(';')
            .split_whitespace()
            .map(|w| w.to_ascii_uppercase())
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let result = match words.as_slice() {
            ["SHOW", "CATALOGS"] => Self::list_result("catalog name", self.catalog.list_catalogs()),
            ["SHOW", "DATABASES"] => {
                Self::list_result("database name", self.catalog.list_databases())
            }
            ["SHOW", "TABLES"] => {
                Self::list_result("table name", self.catalog.list_objects(ObjectKind::Table))
            }
            ["SHOW", "VIEWS"] => {
                Self::list_result("view name", self.catalog.list_objects(ObjectKind::View))
            }
            ["SHOW", "FUNCTIONS"] | ["SHOW", "USER", "FUNCTIONS"] => Self::list_result(
                "function name",
                self.catalog.list_objects(ObjectKind::Function),
            ),
            ["SHOW", "CURRENT", "CATALOG"] => TableResult::text(
                "current catalog name",
                self.catalog.current_catalog(),
            ),
            ["SHOW", "CURRENT", "DATABASE"] => TableResult::text(
                "current database name",
                self.catalog.current_database(),
            ),
            ["SHOW", "MODULES"] => Self::list_result(
                "module name",
                self.catalog
                    .list_modules()
                    .into_iter()
                    .filter(|(_, used)| *used)
                    .map(|(name, _)| name)
                    .collect(),
            ),
            ["SHOW", "FULL", "MODULES"] => TableResult::with_content(
                ResultSchema::new(vec![
                    Column::new("module name", "STRING"),
                    Column::new("used", "BOOLEAN"),
                ]),
                self.catalog
                    .list_modules()
                    .into_iter()
                    .map(|(name, used)| Row::insert(vec![Value::String(name), Value::Bool(used)]))
                    .collect(),
            ),
            ["SHOW", "JARS"] => Self::list_result("jars", self.jars.iter().cloned().collect()),
            ["SHOW", "JOBS"] => TableResult::with_content(
                ResultSchema::new(vec![
                    Column::new("job id", "STRING"),
                    Column::new("job name", "STRING"),
                    Column::new("status", "STRING"),
                ]),
                self.jobs
                    .iter()
                    .map(|(id, job)| {
                        Row::insert(vec![
                            Value::from(id.as_str()),
                            Value::from(job.name.as_str()),
                            Value::from(job.status.name()),
                        ])
                    })
                    .collect(),
            ),
            ["DESCRIBE", ..] | ["DESC", ..] => {
                let name = statement
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or_default()
                    .trim_end_matches(';');
                let object = self
                    .catalog
                    .get(name)
                    .ok_or_else(|| GatewayError::object_not_found("table", self.catalog.qualify(name)))?;
                TableResult::text("ddl", object.ddl.clone())
            }
            _ => {
                debug!(statement = %statement, "Acknowledging pass-through statement");
                TableResult::ok()
            }
        };
        Ok(result)
    }

    // ==================== JOBS ====================

    fn submit_job(&mut self, name: String) -> JobClient {
        let job_id = Uuid::new_v4().simple().to_string();
        let sync = self.session_config().get(&DML_SYNC);
        let status = if sync {
            JobStatus::Finished
        } else {
            JobStatus::Running
        };
        info!(job_id = %job_id, job_name = %name, status = status.name(), "Submitted job");
        self.jobs.insert(job_id.clone(), Job { name, status });
        JobClient::new(job_id)
    }
}

impl Executor for LocalExecutor {
    fn set_session_property(&mut self, key: &str, value: &str) -> GatewayResult<()> {
        validate_property(key, value)?;
        debug!(key = %key, value = %value, "Setting session property");
        self.overrides.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn reset_session_property(&mut self, key: &str) -> GatewayResult<()> {
        debug!(key = %key, "Resetting session property");
        self.overrides.remove(key);
        Ok(())
    }

    fn reset_session_properties(&mut self) -> GatewayResult<()> {
        debug!(count = self.overrides.len(), "Resetting all session properties");
        self.overrides.clear();
        Ok(())
    }

    fn session_config_map(&self) -> HashMap<String, String> {
        let mut properties = self.defaults.clone();
        properties.extend(self.overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        properties
    }

    fn execute_query(
        &mut self,
        query: &QueryOperation,
        cancel: &CancelToken,
    ) -> GatewayResult<ResultDescriptor> {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        let (schema, rows) = match plan_query(&query.statement)? {
            QueryPlan::Literal { schema, rows } => (schema, rows),
            QueryPlan::Scan { table } => {
                let object = self.catalog.get(&table).ok_or_else(|| {
                    GatewayError::object_not_found("table", self.catalog.qualify(&table))
                })?;
                if object.kind != ObjectKind::Table && object.kind != ObjectKind::View {
                    return Err(GatewayError::object_not_found(
                        "table",
                        self.catalog.qualify(&table),
                    ));
                }
                (ResultSchema::default(), Vec::new())
            }
        };

        let config = self.session_config();
        let result_mode = config.get(&RESULT_MODE);
        let streaming = config.get(&RUNTIME_MODE) == RuntimeMode::Streaming;
        // A streaming result trickles in one row at a time.
        let fetcher = if streaming {
            VecResultFetcher::new(rows.into_iter().map(|row| vec![row]).collect())
        } else {
            VecResultFetcher::single_batch(rows)
        };

        self.next_result += 1;
        let mut descriptor = ResultDescriptor::new(
            format!("result-{}", self.next_result),
            schema,
            Box::new(fetcher),
        );
        descriptor.materialized = result_mode == ResultMode::Table;
        descriptor.tableau = result_mode == ResultMode::Tableau;
        descriptor.streaming = streaming;
        descriptor.max_column_width = config.get(&MAX_COLUMN_WIDTH);
        debug!(result_id = %descriptor.result_id, mode = %result_mode, "Started query");
        Ok(descriptor)
    }

    fn execute_modify(
        &mut self,
        operations: &[ModifyOperation],
        cancel: &CancelToken,
    ) -> GatewayResult<TableResult> {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }
        if operations.is_empty() {
            return Err(GatewayError::sql_execution("no modify operation to execute"));
        }

        // Validate every sink first so a failing statement set submits nothing.
        for op in operations {
            match op.kind {
                ModifyKind::CreateTableAs => {
                    if self.catalog.get(&op.target).is_some() {
                        return Err(GatewayError::object_exists(
                            "table",
                            self.catalog.qualify(&op.target),
                        ));
                    }
                }
                ModifyKind::InsertInto | ModifyKind::InsertOverwrite => {
                    self.catalog.require_object(ObjectKind::Table, &op.target)?;
                }
            }
        }
        for op in operations {
            if op.kind == ModifyKind::CreateTableAs {
                self.catalog
                    .create_object(ObjectKind::Table, &op.target, &op.statement, false)?;
            }
        }

        let name = match operations {
            [single] => format!("insert-into_{}", self.catalog.qualify(&single.target)),
            _ => format!("statement-set_{}", operations.len()),
        };
        let job = self.submit_job(name);
        Ok(TableResult::submitted(job))
    }

    fn execute_operation(&mut self, operation: &Operation) -> GatewayResult<TableResult> {
        match operation {
            Operation::Create(op) => self.execute_create(op).map(|_| TableResult::ok()),
            Operation::Drop(op) => self.execute_drop(op).map(|_| TableResult::ok()),
            Operation::Alter(op) => self.execute_alter(op).map(|_| TableResult::ok()),
            Operation::Use(op) => {
                match &op.target {
                    UseTarget::Catalog(name) => self.catalog.use_catalog(name)?,
                    UseTarget::Database(name) => self.catalog.use_database(name)?,
                    UseTarget::Modules(names) => self.catalog.use_modules(names)?,
                }
                Ok(TableResult::ok())
            }
            Operation::LoadModule { name } => {
                self.catalog.load_module(name)?;
                Ok(TableResult::ok())
            }
            Operation::UnloadModule { name } => {
                self.catalog.unload_module(name)?;
                Ok(TableResult::ok())
            }
            Operation::AddJar { path } => {
                info!(path = %path, "Adding jar to session");
                self.jars.insert(path.clone());
                Ok(TableResult::ok())
            }
            Operation::ShowCreateTable { name } => self.show_create(ObjectKind::Table, name),
            Operation::ShowCreateView { name } => self.show_create(ObjectKind::View, name),
            Operation::Explain(op) => {
                let plan = match plan_query(&op.statement) {
                    Ok(QueryPlan::Literal { rows, .. }) => {
                        format!("Values(tuples=[{} rows])", rows.len())
                    }
                    Ok(QueryPlan::Scan { table }) => {
                        format!("TableSourceScan(table=[[{}]])", self.catalog.qualify(&table))
                    }
                    Err(_) => "LogicalSink(statement=[modify])".to_string(),
                };
                Ok(TableResult::text(
                    "result",
                    format!(
                        "== Abstract Syntax Tree ==\n{}\n\n== Optimized Execution Plan ==\n{}\n",
                        op.statement, plan
                    ),
                ))
            }
            Operation::Insert(op) | Operation::CreateTableAs(op) => {
                self.execute_modify(std::slice::from_ref(op), &CancelToken::new())
            }
            Operation::StatementSet(ops) => self.execute_modify(ops, &CancelToken::new()),
            Operation::Other(op) => self.execute_generic(&op.statement),
            other => Err(GatewayError::sql_execution(format!(
                "{} is a client command and cannot be executed by the gateway",
                other.kind()
            ))),
        }
    }

    fn remove_jar(&mut self, path: &str) -> GatewayResult<()> {
        if !self.jars.remove(path) {
            return Err(GatewayError::JarNotFound {
                path: path.to_string(),
            });
        }
        info!(path = %path, "Removed jar from session");
        Ok(())
    }

    fn stop_job(
        &mut self,
        job_id: &str,
        with_savepoint: bool,
        with_drain: bool,
    ) -> GatewayResult<Option<String>> {
        let pattern =
            Regex::new(JOB_ID_PATTERN).map_err(|e| GatewayError::sql_execution(e.to_string()))?;
        if !pattern.is_match(job_id) {
            return Err(GatewayError::InvalidJobId {
                job_id: job_id.to_string(),
            });
        }
        let key = job_id.to_ascii_lowercase();
        let job = self.jobs.get_mut(&key).ok_or_else(|| GatewayError::UnknownJob {
            job_id: job_id.to_string(),
        })?;
        if job.status != JobStatus::Running {
            return Err(GatewayError::JobNotRunning {
                job_id: job_id.to_string(),
            });
        }
        job.status = JobStatus::Stopped;
        info!(job_id = %key, with_savepoint, with_drain, "Stopped job");

        if !with_savepoint {
            return Ok(None);
        }
        self.next_savepoint += 1;
        Ok(Some(format!(
            "{}/savepoint-{}-{:012x}",
            self.savepoint_dir,
            &key[..6],
            self.next_savepoint
        )))
    }
}

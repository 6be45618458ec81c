//! Parsed operations.
//!
//! An [`Operation`] is the typed form of one user statement. It is produced
//! once by the parser and consumed exactly once by the dispatcher, which
//! matches on it exhaustively.

use std::fmt;

/// One parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `QUIT` / `EXIT`.
    Quit,
    /// `CLEAR`.
    Clear,
    /// `HELP`.
    Help,
    /// `SET` or `SET 'key' = 'value'`.
    Set {
        key: Option<String>,
        value: Option<String>,
    },
    /// `RESET` or `RESET 'key'`.
    Reset { key: Option<String> },
    /// `INSERT INTO|OVERWRITE ...`.
    Insert(ModifyOperation),
    /// `SELECT ...`, `WITH ...`, `VALUES ...`.
    Query(QueryOperation),
    /// `EXPLAIN ...`.
    Explain(ExplainOperation),
    /// `BEGIN STATEMENT SET`.
    BeginStatementSet,
    /// `END`.
    EndStatementSet,
    /// `EXECUTE STATEMENT SET BEGIN ... END`.
    StatementSet(Vec<ModifyOperation>),
    /// `ADD JAR '<path>'`.
    AddJar { path: String },
    /// `REMOVE JAR '<path>'`.
    RemoveJar { path: String },
    /// `SHOW CREATE TABLE <name>`.
    ShowCreateTable { name: String },
    /// `SHOW CREATE VIEW <name>`.
    ShowCreateView { name: String },
    /// `CREATE TABLE <name> ... AS SELECT ...`.
    CreateTableAs(ModifyOperation),
    /// `STOP JOB '<id>' [WITH SAVEPOINT] [WITH DRAIN]`.
    StopJob {
        job_id: String,
        with_savepoint: bool,
        with_drain: bool,
    },
    /// `CREATE ...` other than CTAS.
    Create(DdlOperation),
    /// `DROP ...`.
    Drop(DdlOperation),
    /// `ALTER ...`.
    Alter(DdlOperation),
    /// `USE [CATALOG] <name>` / `USE MODULES ...`.
    Use(UseOperation),
    /// `LOAD MODULE <name>`.
    LoadModule { name: String },
    /// `UNLOAD MODULE <name>`.
    UnloadModule { name: String },
    /// Anything else the gateway executes without client-side handling
    /// (`SHOW TABLES`, `DESCRIBE t`, ...).
    Other(GenericOperation),
}

/// Fieldless discriminant of [`Operation`], used for validation and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Quit,
    Clear,
    Help,
    Set,
    Reset,
    Insert,
    Query,
    Explain,
    BeginStatementSet,
    EndStatementSet,
    StatementSet,
    AddJar,
    RemoveJar,
    ShowCreateTable,
    ShowCreateView,
    CreateTableAs,
    StopJob,
    Create,
    Drop,
    Alter,
    Use,
    LoadModule,
    UnloadModule,
    Other,
}

impl OperationKind {
    /// Every kind, in declaration order.
    pub const ALL: [OperationKind; 24] = [
        OperationKind::Quit,
        OperationKind::Clear,
        OperationKind::Help,
        OperationKind::Set,
        OperationKind::Reset,
        OperationKind::Insert,
        OperationKind::Query,
        OperationKind::Explain,
        OperationKind::BeginStatementSet,
        OperationKind::EndStatementSet,
        OperationKind::StatementSet,
        OperationKind::AddJar,
        OperationKind::RemoveJar,
        OperationKind::ShowCreateTable,
        OperationKind::ShowCreateView,
        OperationKind::CreateTableAs,
        OperationKind::StopJob,
        OperationKind::Create,
        OperationKind::Drop,
        OperationKind::Alter,
        OperationKind::Use,
        OperationKind::LoadModule,
        OperationKind::UnloadModule,
        OperationKind::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Quit => "QUIT",
            OperationKind::Clear => "CLEAR",
            OperationKind::Help => "HELP",
            OperationKind::Set => "SET",
            OperationKind::Reset => "RESET",
            OperationKind::Insert => "INSERT",
            OperationKind::Query => "QUERY",
            OperationKind::Explain => "EXPLAIN",
            OperationKind::BeginStatementSet => "BEGIN STATEMENT SET",
            OperationKind::EndStatementSet => "END",
            OperationKind::StatementSet => "EXECUTE STATEMENT SET",
            OperationKind::AddJar => "ADD JAR",
            OperationKind::RemoveJar => "REMOVE JAR",
            OperationKind::ShowCreateTable => "SHOW CREATE TABLE",
            OperationKind::ShowCreateView => "SHOW CREATE VIEW",
            OperationKind::CreateTableAs => "CREATE TABLE AS",
            OperationKind::StopJob => "STOP JOB",
            OperationKind::Create => "CREATE",
            OperationKind::Drop => "DROP",
            OperationKind::Alter => "ALTER",
            OperationKind::Use => "USE",
            OperationKind::LoadModule => "LOAD MODULE",
            OperationKind::UnloadModule => "UNLOAD MODULE",
            OperationKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Quit => OperationKind::Quit,
            Operation::Clear => OperationKind::Clear,
            Operation::Help => OperationKind::Help,
            Operation::Set { .. } => OperationKind::Set,
            Operation::Reset { .. } => OperationKind::Reset,
            Operation::Insert(_) => OperationKind::Insert,
            Operation::Query(_) => OperationKind::Query,
            Operation::Explain(_) => OperationKind::Explain,
            Operation::BeginStatementSet => OperationKind::BeginStatementSet,
            Operation::EndStatementSet => OperationKind::EndStatementSet,
            Operation::StatementSet(_) => OperationKind::StatementSet,
            Operation::AddJar { .. } => OperationKind::AddJar,
            Operation::RemoveJar { .. } => OperationKind::RemoveJar,
            Operation::ShowCreateTable { .. } => OperationKind::ShowCreateTable,
            Operation::ShowCreateView { .. } => OperationKind::ShowCreateView,
            Operation::CreateTableAs(_) => OperationKind::CreateTableAs,
            Operation::StopJob { .. } => OperationKind::StopJob,
            Operation::Create(_) => OperationKind::Create,
            Operation::Drop(_) => OperationKind::Drop,
            Operation::Alter(_) => OperationKind::Alter,
            Operation::Use(_) => OperationKind::Use,
            Operation::LoadModule { .. } => OperationKind::LoadModule,
            Operation::UnloadModule { .. } => OperationKind::UnloadModule,
            Operation::Other(_) => OperationKind::Other,
        }
    }

    /// One-line description used in error messages.
    pub fn summary(&self) -> String {
        match self {
            Operation::Set {
                key: Some(key),
                value: Some(value),
            } => format!("SET {}={}", key, value),
            Operation::Reset { key: Some(key) } => format!("RESET {}", key),
            Operation::Insert(op) | Operation::CreateTableAs(op) => op.statement.clone(),
            Operation::Query(op) => op.statement.clone(),
            Operation::Explain(op) => format!("EXPLAIN {}", op.statement),
            Operation::StatementSet(ops) => format!("EXECUTE STATEMENT SET ({} statements)", ops.len()),
            Operation::AddJar { path } => format!("ADD JAR '{}'", path),
            Operation::RemoveJar { path } => format!("REMOVE JAR '{}'", path),
            Operation::ShowCreateTable { name } => format!("SHOW CREATE TABLE {}", name),
            Operation::ShowCreateView { name } => format!("SHOW CREATE VIEW {}", name),
            Operation::StopJob { job_id, .. } => format!("STOP JOB '{}'", job_id),
            Operation::Create(op) | Operation::Drop(op) | Operation::Alter(op) => {
                op.statement.clone()
            }
            Operation::Use(op) => op.statement.clone(),
            Operation::LoadModule { name } => format!("LOAD MODULE {}", name),
            Operation::UnloadModule { name } => format!("UNLOAD MODULE {}", name),
            Operation::Other(op) => op.statement.clone(),
            _ => self.kind().name().to_string(),
        }
    }
}

/// How a modify operation writes into its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyKind {
    InsertInto,
    InsertOverwrite,
    CreateTableAs,
}

/// A write that produces a job when submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyOperation {
    pub kind: ModifyKind,
    /// Sink table name.
    pub target: String,
    /// Statement text without the trailing `;`.
    pub statement: String,
}

impl ModifyOperation {
    pub fn new(kind: ModifyKind, target: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            statement: statement.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOperation {
    pub statement: String,
}

impl QueryOperation {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
        }
    }
}

/// `EXPLAIN [details] <statement>`; `statement` is the explained text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainOperation {
    pub statement: String,
}

/// The object a DDL statement is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Table,
    View,
    Function,
    Database,
    Catalog,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Function => "FUNCTION",
            ObjectKind::Database => "DATABASE",
            ObjectKind::Catalog => "CATALOG",
        }
    }
}

/// `CREATE` / `DROP` / `ALTER` of a named object.
#[derive(Debug, Clone, PartialEq)]
pub struct DdlOperation {
    pub object: ObjectKind,
    pub name: String,
    /// `IF [NOT] EXISTS` was given.
    pub if_exists: bool,
    pub statement: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UseTarget {
    Catalog(String),
    Database(String),
    Modules(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseOperation {
    pub target: UseTarget,
    pub statement: String,
}

/// A statement the client passes through to the gateway untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericOperation {
    pub statement: String,
}

impl GenericOperation {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
        }
    }
}

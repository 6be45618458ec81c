//! Result types returned by the gateway.

use std::fmt;

use crate::Value;

/// A result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// The resolved schema of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSchema {
    pub columns: Vec<Column>,
}

impl ResultSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// A single `STRING` column named `name`.
    pub fn single(name: impl Into<String>) -> Self {
        Self::new(vec![Column::new(name, "STRING")])
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Changelog kind of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Insert,
    UpdateBefore,
    UpdateAfter,
    Delete,
}

impl RowKind {
    pub fn short_string(self) -> &'static str {
        match self {
            RowKind::Insert => "+I",
            RowKind::UpdateBefore => "-U",
            RowKind::UpdateAfter => "+U",
            RowKind::Delete => "-D",
        }
    }

    /// Whether the row adds to (rather than retracts from) a materialized view.
    pub fn is_accumulate(self) -> bool {
        matches!(self, RowKind::Insert | RowKind::UpdateAfter)
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(kind: RowKind, values: Vec<Value>) -> Self {
        Self { kind, values }
    }

    pub fn insert(values: Vec<Value>) -> Self {
        Self::new(RowKind::Insert, values)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Whether a result carries content worth printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Plain acknowledgement, nothing to show.
    Success,
    /// Rows to show.
    SuccessWithContent,
}

/// Handle to a job submitted by a modify operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobClient {
    pub job_id: String,
}

impl JobClient {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

/// The outcome of a statement executed by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct TableResult {
    pub kind: ResultKind,
    pub schema: ResultSchema,
    pub rows: Vec<Row>,
    /// Present for results of submitted modify operations.
    pub job: Option<JobClient>,
}

impl TableResult {
    /// The plain "OK" acknowledgement.
    pub fn ok() -> Self {
        Self {
            kind: ResultKind::Success,
            schema: ResultSchema::single("result"),
            rows: vec![Row::insert(vec![Value::from("OK")])],
            job: None,
        }
    }

    pub fn with_content(schema: ResultSchema, rows: Vec<Row>) -> Self {
        Self {
            kind: ResultKind::SuccessWithContent,
            schema,
            rows,
            job: None,
        }
    }

    /// Result of a job submission.
    pub fn submitted(job: JobClient) -> Self {
        Self {
            kind: ResultKind::SuccessWithContent,
            schema: ResultSchema::single("job id"),
            rows: vec![Row::insert(vec![Value::from(job.job_id.as_str())])],
            job: Some(job),
        }
    }

    /// A one-row, one-column textual result (plans, DDL).
    pub fn text(column: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_content(
            ResultSchema::single(column),
            vec![Row::insert(vec![Value::String(text.into())])],
        )
    }

    pub fn is_ok_only(&self) -> bool {
        self.kind == ResultKind::Success
    }

    /// First field of the first row, if any.
    pub fn first_field(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(0))
    }
}

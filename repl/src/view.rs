//! Result views for queries.
//!
//! A view owns the query's [`ResultDescriptor`] and closes its fetcher when
//! dropped, whether the rows were drained, the user interrupted or fetching
//! failed.

use std::io::Write;

use sqlcli_core::{CancelToken, Row, RowKind};
use sqlcli_gateway::{GatewayError, ResultDescriptor};
use tracing::debug;

use crate::error::{CliError, CliResult};
use crate::format::{Tableau, TableauOptions};

const TABLE_TITLE: &str = "SQL Query Result (Table)";
const CHANGELOG_TITLE: &str = "SQL Query Result (Changelog)";

fn total_rows(count: usize) -> String {
    if count == 1 {
        "1 row".to_string()
    } else {
        format!("{} rows", count)
    }
}

/// Rows fetched until exhaustion or interruption.
struct Fetched {
    rows: Vec<Row>,
    cancelled: bool,
}

fn fetch_all(descriptor: &mut ResultDescriptor, cancel: &CancelToken) -> CliResult<Fetched> {
    let mut rows = Vec::new();
    loop {
        match descriptor.fetcher_mut().fetch(cancel) {
            Ok(Some(batch)) => rows.extend(batch),
            Ok(None) => return Ok(Fetched { rows, cancelled: false }),
            Err(GatewayError::Cancelled) => return Ok(Fetched { rows, cancelled: true }),
            Err(e) => return Err(CliError::execution("Failed to fetch the query result", e)),
        }
    }
}

fn close(descriptor: &mut ResultDescriptor) {
    debug!(result_id = %descriptor.result_id, "Closing result");
    descriptor.fetcher_mut().close();
}

// ==================== TABLEAU ====================

/// Prints rows straight into the terminal.
///
/// Bounded results are printed once complete, with widths fitted to the
/// data. Streaming results are printed as they arrive, with the row kind in
/// front and fixed widths.
pub struct TableauResultView<'a> {
    out: &'a mut dyn Write,
    descriptor: ResultDescriptor,
    cancel: CancelToken,
}

impl<'a> TableauResultView<'a> {
    pub fn new(out: &'a mut dyn Write, descriptor: ResultDescriptor, cancel: CancelToken) -> Self {
        Self {
            out,
            descriptor,
            cancel,
        }
    }

    pub fn open(&mut self) -> CliResult<()> {
        if self.descriptor.is_streaming_mode() {
            self.print_streaming()
        } else {
            self.print_batch()
        }
    }

    fn print_batch(&mut self) -> CliResult<()> {
        let fetched = fetch_all(&mut self.descriptor, &self.cancel)?;
        if fetched.cancelled {
            writeln!(
                self.out,
                "Query terminated, received a total of {}",
                total_rows(fetched.rows.len())
            )?;
            return Ok(());
        }
        let options = TableauOptions {
            max_column_width: Some(self.descriptor.max_column_width),
            null_as_empty: false,
            print_row_kind: false,
        };
        Tableau::fitted(&self.descriptor.schema, &fetched.rows, options)
            .print(self.out, &fetched.rows)?;
        self.out.flush()?;
        Ok(())
    }

    fn print_streaming(&mut self) -> CliResult<()> {
        let options = TableauOptions {
            max_column_width: Some(self.descriptor.max_column_width),
            null_as_empty: false,
            print_row_kind: true,
        };
        let tableau = Tableau::fixed(
            &self.descriptor.schema,
            self.descriptor.max_column_width,
            options,
        );
        tableau.border(self.out)?;
        tableau.header(self.out)?;
        tableau.border(self.out)?;

        let mut received = 0usize;
        loop {
            match self.descriptor.fetcher_mut().fetch(&self.cancel) {
                Ok(Some(batch)) => {
                    for row in &batch {
                        tableau.row(self.out, row)?;
                        received += 1;
                    }
                    self.out.flush()?;
                }
                Ok(None) => break,
                Err(GatewayError::Cancelled) => {
                    tableau.border(self.out)?;
                    writeln!(
                        self.out,
                        "Query terminated, received a total of {}",
                        total_rows(received)
                    )?;
                    return Ok(());
                }
                Err(e) => return Err(CliError::execution("Failed to fetch the query result", e)),
            }
        }
        tableau.border(self.out)?;
        writeln!(self.out, "Received a total of {}", total_rows(received))?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TableauResultView<'_> {
    fn drop(&mut self) {
        close(&mut self.descriptor);
    }
}

// ==================== TABLE ====================

/// Shows the materialized state of a changelog: retractions remove the row
/// they retract.
pub struct TableResultView<'a> {
    out: &'a mut dyn Write,
    descriptor: ResultDescriptor,
    cancel: CancelToken,
}

impl<'a> TableResultView<'a> {
    pub fn new(out: &'a mut dyn Write, descriptor: ResultDescriptor, cancel: CancelToken) -> Self {
        Self {
            out,
            descriptor,
            cancel,
        }
    }

    pub fn open(&mut self) -> CliResult<()> {
        let fetched = fetch_all(&mut self.descriptor, &self.cancel)?;
        let table = materialize(fetched.rows);
        writeln!(self.out, "{}", TABLE_TITLE)?;
        let options = TableauOptions {
            max_column_width: Some(self.descriptor.max_column_width),
            null_as_empty: false,
            print_row_kind: false,
        };
        Tableau::fitted(&self.descriptor.schema, &table, options).print(self.out, &table)?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TableResultView<'_> {
    fn drop(&mut self) {
        close(&mut self.descriptor);
    }
}

/// Apply a changelog to an empty table.
fn materialize(changelog: Vec<Row>) -> Vec<Row> {
    let mut table: Vec<Row> = Vec::new();
    for row in changelog {
        if row.kind.is_accumulate() {
            table.push(Row::new(RowKind::Insert, row.values));
        } else if let Some(pos) = table.iter().position(|r| r.values == row.values) {
            table.remove(pos);
        }
    }
    table
}

// ==================== CHANGELOG ====================

/// Shows every change with its row kind.
pub struct ChangelogResultView<'a> {
    out: &'a mut dyn Write,
    descriptor: ResultDescriptor,
    cancel: CancelToken,
}

impl<'a> ChangelogResultView<'a> {
    pub fn new(out: &'a mut dyn Write, descriptor: ResultDescriptor, cancel: CancelToken) -> Self {
        Self {
            out,
            descriptor,
            cancel,
        }
    }

    pub fn open(&mut self) -> CliResult<()> {
        let fetched = fetch_all(&mut self.descriptor, &self.cancel)?;
        writeln!(self.out, "{}", CHANGELOG_TITLE)?;
        let options = TableauOptions {
            max_column_width: Some(self.descriptor.max_column_width),
            null_as_empty: false,
            print_row_kind: true,
        };
        Tableau::fitted(&self.descriptor.schema, &fetched.rows, options)
            .print(self.out, &fetched.rows)?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for ChangelogResultView<'_> {
    fn drop(&mut self) {
        close(&mut self.descriptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlcli_core::{ResultSchema, Value};
    use sqlcli_gateway::{GatewayResult, ResultFetcher, VecResultFetcher};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn int_row(kind: RowKind, n: i64) -> Row {
        Row::new(kind, vec![Value::Int(n)])
    }

    fn descriptor(batches: Vec<Vec<Row>>) -> ResultDescriptor {
        ResultDescriptor::new(
            "r1",
            ResultSchema::single("n"),
            Box::new(VecResultFetcher::new(batches)),
        )
    }

    /// Records whether it was closed.
    struct ClosingFetcher {
        closed: Arc<AtomicBool>,
    }

    impl ResultFetcher for ClosingFetcher {
        fn fetch(&mut self, _cancel: &CancelToken) -> GatewayResult<Option<Vec<Row>>> {
            Err(GatewayError::sql_execution("connection reset"))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_materialize_applies_retractions() {
        // GIVEN
        let changelog = vec![
            int_row(RowKind::Insert, 1),
            int_row(RowKind::Insert, 2),
            int_row(RowKind::UpdateBefore, 1),
            int_row(RowKind::UpdateAfter, 3),
            int_row(RowKind::Delete, 2),
        ];

        // WHEN
        let table = materialize(changelog);

        // THEN
        assert_eq!(table, vec![int_row(RowKind::Insert, 3)]);
    }

    #[test]
    fn test_streaming_tableau_prints_row_kinds() {
        // GIVEN
        let mut descriptor = descriptor(vec![
            vec![int_row(RowKind::Insert, 1)],
            vec![int_row(RowKind::Delete, 1)],
        ]);
        descriptor.tableau = true;
        descriptor.streaming = true;
        descriptor.max_column_width = 4;
        let mut out = Vec::new();

        // WHEN
        TableauResultView::new(&mut out, descriptor, CancelToken::new())
            .open()
            .unwrap();

        // THEN
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("| +I   |    1 |"));
        assert!(text.contains("| -D   |    1 |"));
        assert!(text.ends_with("Received a total of 2 rows\n"));
    }

    #[test]
    fn test_cancelled_tableau_reports_partial_count() {
        // GIVEN
        let mut descriptor = descriptor(vec![vec![int_row(RowKind::Insert, 1)]]);
        descriptor.tableau = true;
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut out = Vec::new();

        // WHEN
        TableauResultView::new(&mut out, descriptor, cancel)
            .open()
            .unwrap();

        // THEN
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Query terminated, received a total of 0 rows\n");
    }

    #[test]
    fn test_failed_fetch_still_closes_result() {
        // GIVEN
        let closed = Arc::new(AtomicBool::new(false));
        let descriptor = ResultDescriptor::new(
            "r2",
            ResultSchema::single("n"),
            Box::new(ClosingFetcher {
                closed: closed.clone(),
            }),
        );
        let mut out = Vec::new();

        // WHEN
        let result = TableResultView::new(&mut out, descriptor, CancelToken::new()).open();

        // THEN
        assert!(matches!(result, Err(CliError::Execution { .. })));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_changelog_view_keeps_every_change() {
        let descriptor = descriptor(vec![vec![
            int_row(RowKind::Insert, 1),
            int_row(RowKind::Delete, 1),
        ]]);
        let mut out = Vec::new();

        ChangelogResultView::new(&mut out, descriptor, CancelToken::new())
            .open()
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(CHANGELOG_TITLE));
        assert!(text.ends_with("2 rows in set\n"));
    }
}

//! Output formatting for the statement loop.

use std::io::{self, Write};

use colored::Colorize;
use sqlcli_core::{ResultSchema, Row, Value};

/// Header of the row-kind column.
const ROW_KIND_HEADER: &str = "op";

const ELLIPSIS: &str = "...";

/// Double every `'` so the text can sit inside a single-quoted literal.
pub fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', "''")
}

pub fn info(message: &str, plain: bool) -> String {
    if plain {
        format!("[INFO] {}", message)
    } else {
        format!("{} {}", "[INFO]".blue().bold(), message)
    }
}

pub fn error_header(message: &str, plain: bool) -> String {
    if plain {
        format!("[ERROR] {}", message)
    } else {
        format!("{} {}", "[ERROR]".red().bold(), message.red())
    }
}

/// `Empty set`, `1 row in set`, `N rows in set`.
pub fn row_count_footer(count: usize) -> String {
    match count {
        0 => "Empty set".to_string(),
        1 => "1 row in set".to_string(),
        n => format!("{} rows in set", n),
    }
}

// ==================== TABLEAU ====================

/// How a tableau renders cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableauOptions {
    /// Cells wider than this are cut with `...`. `None` never cuts.
    pub max_column_width: Option<usize>,
    /// Print null as an empty cell instead of `<NULL>`.
    pub null_as_empty: bool,
    /// Prepend the `op` column holding each row's kind.
    pub print_row_kind: bool,
}

impl TableauOptions {
    /// Widths from the data, nothing cut, nulls blank, no `op` column.
    pub fn inferred() -> Self {
        Self {
            max_column_width: None,
            null_as_empty: true,
            print_row_kind: false,
        }
    }
}

/// A bordered text table with fixed column widths.
#[derive(Debug, Clone)]
pub struct Tableau {
    headers: Vec<String>,
    widths: Vec<usize>,
    options: TableauOptions,
}

impl Tableau {
    /// Widths fitted to the header and the given rows.
    pub fn fitted(schema: &ResultSchema, rows: &[Row], options: TableauOptions) -> Self {
        let headers = headers(schema, options);
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (i, cell) in cells(row, options).iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.text.chars().count());
                }
            }
        }
        Self::with_widths(headers, widths, options)
    }

    /// Widths fixed up front, for rows that arrive later.
    pub fn fixed(schema: &ResultSchema, width: usize, options: TableauOptions) -> Self {
        let headers = headers(schema, options);
        let widths = headers
            .iter()
            .map(|h| width.max(h.chars().count()))
            .collect();
        Self::with_widths(headers, widths, options)
    }

    fn with_widths(headers: Vec<String>, widths: Vec<usize>, options: TableauOptions) -> Self {
        let widths = match options.max_column_width {
            Some(max) => widths.into_iter().map(|w| w.min(max.max(1))).collect(),
            None => widths,
        };
        Self {
            headers,
            widths,
            options,
        }
    }

    pub fn border(&self, out: &mut dyn Write) -> io::Result<()> {
        let mut line = String::from("+");
        for width in &self.widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        writeln!(out, "{}", line)
    }

    pub fn header(&self, out: &mut dyn Write) -> io::Result<()> {
        let cells: Vec<Cell> = self
            .headers
            .iter()
            .map(|h| Cell {
                text: h.clone(),
                right: false,
            })
            .collect();
        self.line(out, &cells)
    }

    pub fn row(&self, out: &mut dyn Write, row: &Row) -> io::Result<()> {
        self.line(out, &cells(row, self.options))
    }

    /// Border, header, rows, border and the row count.
    pub fn print(&self, out: &mut dyn Write, rows: &[Row]) -> io::Result<()> {
        if rows.is_empty() {
            return writeln!(out, "{}", row_count_footer(0));
        }
        self.border(out)?;
        self.header(out)?;
        self.border(out)?;
        for row in rows {
            self.row(out, row)?;
        }
        self.border(out)?;
        writeln!(out, "{}", row_count_footer(rows.len()))
    }

    fn line(&self, out: &mut dyn Write, cells: &[Cell]) -> io::Result<()> {
        let mut line = String::from("|");
        for (width, cell) in self.widths.iter().zip(cells) {
            let text = truncate(&cell.text, *width);
            let padded = if cell.right {
                format!(" {:>w$} |", text, w = width)
            } else {
                format!(" {:<w$} |", text, w = width)
            };
            line.push_str(&padded);
        }
        writeln!(out, "{}", line)
    }
}

/// Print a whole result as a tableau.
pub fn print_tableau(
    out: &mut dyn Write,
    schema: &ResultSchema,
    rows: &[Row],
    options: TableauOptions,
) -> io::Result<()> {
    Tableau::fitted(schema, rows, options).print(out, rows)
}

struct Cell {
    text: String,
    right: bool,
}

fn headers(schema: &ResultSchema, options: TableauOptions) -> Vec<String> {
    let mut headers = Vec::with_capacity(schema.len() + 1);
    if options.print_row_kind {
        headers.push(ROW_KIND_HEADER.to_string());
    }
    headers.extend(schema.column_names().into_iter().map(str::to_string));
    headers
}

fn cells(row: &Row, options: TableauOptions) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(row.values.len() + 1);
    if options.print_row_kind {
        cells.push(Cell {
            text: row.kind.short_string().to_string(),
            right: false,
        });
    }
    cells.extend(row.values.iter().map(|value| Cell {
        text: match value {
            Value::Null if options.null_as_empty => String::new(),
            other => other.to_string(),
        },
        right: value.is_numeric(),
    }));
    cells
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= ELLIPSIS.len() {
        return text.chars().take(width).collect();
    }
    let mut cut: String = text.chars().take(width - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    cut
}

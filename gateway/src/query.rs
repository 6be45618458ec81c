//! Local planning of queries.
//!
//! The local gateway has no execution engine. It evaluates constant
//! projections (`SELECT 1 AS a, 'x'`) and `VALUES` lists itself and treats
//! `SELECT ... FROM <table>` as a scan of a table without data.

use sqlcli_core::{Column, ResultSchema, Row, Value};
use sqlcli_parser::{Lexer, Token, TokenKind};

use crate::{GatewayError, GatewayResult};

/// What a query resolves to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum QueryPlan {
    /// Rows computed from literals.
    Literal { schema: ResultSchema, rows: Vec<Row> },
    /// A read of a catalog table.
    Scan { table: String },
}

pub(crate) fn plan_query(statement: &str) -> GatewayResult<QueryPlan> {
    let mut tokens = Lexer::new(statement)
        .tokenize()
        .map_err(|e| GatewayError::sql_execution(e.to_string()))?;
    tokens.retain(|t| !matches!(t.kind, TokenKind::Eof | TokenKind::Symbol(';')));

    let Some(first) = tokens.first() else {
        return Err(GatewayError::sql_execution("empty query"));
    };
    if first.kind.is_keyword("VALUES") {
        return plan_values(statement, &tokens[1..]);
    }
    if !first.kind.is_keyword("SELECT") {
        return Err(unsupported(statement));
    }

    let body = &tokens[1..];
    match top_level_position(body, "FROM") {
        Some(from) => Ok(QueryPlan::Scan {
            table: table_name(statement, &body[from + 1..])?,
        }),
        None => plan_projection(statement, body),
    }
}

fn unsupported(statement: &str) -> GatewayError {
    GatewayError::sql_execution(format!(
        "the local gateway can only evaluate constant SELECT and VALUES queries, got: {}",
        statement.trim()
    ))
}

fn source_text<'a>(statement: &'a str, tokens: &[Token]) -> &'a str {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => statement
            .get(first.span.start..last.span.end)
            .unwrap_or_default(),
        _ => "",
    }
}

/// Index of the first depth-0 occurrence of `keyword`.
fn top_level_position(tokens: &[Token], keyword: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::Symbol('(') => depth += 1,
            TokenKind::Symbol(')') => depth = depth.saturating_sub(1),
            kind if depth == 0 && kind.is_keyword(keyword) => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split at depth-0 commas.
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Symbol('(') => depth += 1,
            TokenKind::Symbol(')') => depth = depth.saturating_sub(1),
            TokenKind::Symbol(',') if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

fn is_identifier(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Word(_) | TokenKind::QuotedIdent(_))
}

fn identifier(kind: &TokenKind) -> Option<&str> {
    match kind {
        TokenKind::Word(w) | TokenKind::QuotedIdent(w) => Some(w),
        _ => None,
    }
}

fn literal(tokens: &[Token]) -> Option<Value> {
    match tokens {
        [token] => match &token.kind {
            TokenKind::Number(n) => number(n, false),
            TokenKind::String(s) => Some(Value::String(s.clone())),
            kind if kind.is_keyword("TRUE") => Some(Value::Bool(true)),
            kind if kind.is_keyword("FALSE") => Some(Value::Bool(false)),
            kind if kind.is_keyword("NULL") => Some(Value::Null),
            _ => None,
        },
        [sign, token] => match (&sign.kind, &token.kind) {
            (TokenKind::Symbol('-'), TokenKind::Number(n)) => number(n, true),
            (TokenKind::Symbol('+'), TokenKind::Number(n)) => number(n, false),
            _ => None,
        },
        _ => None,
    }
}

fn number(text: &str, negative: bool) -> Option<Value> {
    let signed = if negative {
        format!("-{}", text)
    } else {
        text.to_string()
    };
    signed
        .parse::<i64>()
        .map(Value::Int)
        .or_else(|_| signed.parse::<f64>().map(Value::Float))
        .ok()
}

/// A projection item: a literal with an optional `[AS] alias`.
fn projection_item(statement: &str, tokens: &[Token]) -> GatewayResult<(Value, Option<String>)> {
    if let Some(value) = literal(tokens) {
        return Ok((value, None));
    }
    let n = tokens.len();
    if n >= 3 && tokens[n - 2].kind.is_keyword("AS") {
        if let (Some(value), Some(alias)) = (literal(&tokens[..n - 2]), identifier(&tokens[n - 1].kind)) {
            return Ok((value, Some(alias.to_string())));
        }
    }
    if n >= 2 && is_identifier(&tokens[n - 1].kind) {
        if let (Some(value), Some(alias)) = (literal(&tokens[..n - 1]), identifier(&tokens[n - 1].kind)) {
            return Ok((value, Some(alias.to_string())));
        }
    }
    Err(GatewayError::sql_execution(format!(
        "cannot evaluate expression '{}' locally",
        source_text(statement, tokens)
    )))
}

fn expr_name(index: usize) -> String {
    format!("EXPR${}", index)
}

fn plan_projection(statement: &str, tokens: &[Token]) -> GatewayResult<QueryPlan> {
    if tokens.is_empty() {
        return Err(unsupported(statement));
    }
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (i, item) in split_top_level(tokens).into_iter().enumerate() {
        let (value, alias) = projection_item(statement, item)?;
        columns.push(Column::new(
            alias.unwrap_or_else(|| expr_name(i)),
            value.type_name(),
        ));
        values.push(value);
    }
    Ok(QueryPlan::Literal {
        schema: ResultSchema::new(columns),
        rows: vec![Row::insert(values)],
    })
}

fn plan_values(statement: &str, tokens: &[Token]) -> GatewayResult<QueryPlan> {
    let mut rows: Vec<Row> = Vec::new();
    for group in split_top_level(tokens) {
        let inner = match group {
            [open, inner @ .., close]
                if open.kind == TokenKind::Symbol('(') && close.kind == TokenKind::Symbol(')') =>
            {
                inner
            }
            _ => return Err(unsupported(statement)),
        };
        let mut values = Vec::new();
        for item in split_top_level(inner) {
            let value = literal(item).ok_or_else(|| {
                GatewayError::sql_execution(format!(
                    "cannot evaluate expression '{}' locally",
                    source_text(statement, item)
                ))
            })?;
            values.push(value);
        }
        if let Some(first) = rows.first() {
            if first.values.len() != values.len() {
                return Err(GatewayError::sql_execution(
                    "all rows of a VALUES list must have the same number of columns",
                ));
            }
        }
        rows.push(Row::insert(values));
    }

    let schema = match rows.first() {
        Some(first) => ResultSchema::new(
            first
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| Column::new(expr_name(i), v.type_name()))
                .collect(),
        ),
        None => return Err(unsupported(statement)),
    };
    Ok(QueryPlan::Literal { schema, rows })
}

fn table_name(statement: &str, tokens: &[Token]) -> GatewayResult<String> {
    let mut parts = Vec::new();
    let mut expect_part = true;
    for token in tokens {
        match (&token.kind, expect_part) {
            (kind, true) if is_identifier(kind) => {
                parts.push(identifier(kind).unwrap_or_default().to_string());
                expect_part = false;
            }
            (TokenKind::Symbol('.'), false) => expect_part = true,
            _ => break,
        }
    }
    if parts.is_empty() || expect_part {
        return Err(unsupported(statement));
    }
    Ok(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal_plan(statement: &str) -> (ResultSchema, Vec<Row>) {
        match plan_query(statement).unwrap() {
            QueryPlan::Literal { schema, rows } => (schema, rows),
            other => panic!("expected literal plan, got {:?}", other),
        }
    }

    #[test]
    fn test_constant_projection() {
        // GIVEN/WHEN
        let (schema, rows) = literal_plan("SELECT 1 AS a, 'x', -2.5 b, TRUE;");

        // THEN
        assert_eq!(schema.column_names(), vec!["a", "EXPR$1", "b", "EXPR$3"]);
        assert_eq!(
            rows[0].values,
            vec![
                Value::Int(1),
                Value::from("x"),
                Value::Float(-2.5),
                Value::Bool(true)
            ]
        );
        assert_eq!(schema.columns[0].data_type, "BIGINT");
    }

    #[test]
    fn test_values_list() {
        let (schema, rows) = literal_plan("VALUES (1, 'a'), (2, NULL)");
        assert_eq!(schema.len(), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values[1], Value::Null);
    }

    #[test]
    fn test_values_rows_must_have_equal_width() {
        let err = plan_query("VALUES (1, 2), (3)").unwrap_err();
        assert!(err.to_string().contains("same number of columns"));
    }

    #[test]
    fn test_select_from_is_scan() {
        assert_eq!(
            plan_query("SELECT a, b FROM db.orders WHERE a > 1").unwrap(),
            QueryPlan::Scan {
                table: "db.orders".to_string()
            }
        );
    }

    #[test]
    fn test_subquery_from_is_not_top_level() {
        assert_eq!(
            plan_query("SELECT (SELECT 1 FROM t) FROM s").unwrap(),
            QueryPlan::Scan {
                table: "s".to_string()
            }
        );
    }

    #[test]
    fn test_expression_is_rejected() {
        let err = plan_query("SELECT 1 + 1").unwrap_err();
        assert_eq!(err.to_string(), "cannot evaluate expression '1 + 1' locally");
    }

    #[test]
    fn test_with_query_is_unsupported() {
        assert!(plan_query("WITH t AS (SELECT 1) SELECT * FROM t").is_err());
    }
}

//! Parser for SQL client statements.
//!
//! This module is organized into submodules by parsing category:
//! - `stmt`: Statement classification (SET, INSERT, CREATE, STOP JOB, etc.)

mod stmt;

use sqlcli_core::Operation;

use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::script::is_statement_complete;

// ==================== PUBLIC API ====================

/// The parsing capability the statement loop consumes.
pub trait OperationParser {
    /// Whether `buffer` forms complete statement(s) and reading may stop.
    fn is_complete(&self, buffer: &str) -> bool {
        is_statement_complete(buffer)
    }

    /// Parse one statement. `Ok(None)` means the text holds no operation
    /// (only a terminator or comments).
    fn parse(&mut self, statement: &str) -> ParseResult<Option<Operation>>;

    /// The text consumed by the last call to [`OperationParser::parse`].
    fn command(&self) -> &str;
}

/// Statement parser producing client operations.
#[derive(Debug, Default)]
pub struct SqlParser {
    command: String,
}

impl SqlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single statement without recording it.
    pub fn parse_statement(statement: &str) -> ParseResult<Option<Operation>> {
        Parser::new(statement)?.parse_operation()
    }
}

impl OperationParser for SqlParser {
    fn parse(&mut self, statement: &str) -> ParseResult<Option<Operation>> {
        self.command = statement.trim().to_string();
        let operation = Self::parse_statement(&self.command)?;
        if let Some(ref op) = operation {
            tracing::debug!(kind = %op.kind(), "parsed statement");
        }
        Ok(operation)
    }

    fn command(&self) -> &str {
        &self.command
    }
}

// ==================== PARSER STATE ====================

/// Parser state for one statement.
pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Byte offset where the statement body ends (the trailing `;`, if any).
    end: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str) -> ParseResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        let end = match tokens.len().checked_sub(2).map(|i| &tokens[i]) {
            Some(Token {
                kind: TokenKind::Symbol(';'),
                span,
            }) => span.start,
            _ => source.len(),
        };
        Ok(Self {
            source,
            tokens,
            pos: 0,
            end,
        })
    }
}

// ==================== TOKEN HELPERS ====================

impl<'a> Parser<'a> {
    pub(crate) fn peek(&self) -> &Token {
        // tokenize() always ends with Eof, so the fallback is never empty
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .unwrap_or(&EOF_TOKEN)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .unwrap_or(&EOF_TOKEN)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().kind.is_keyword(keyword)
    }

    pub(crate) fn check_symbol(&self, symbol: char) -> bool {
        self.peek().kind == TokenKind::Symbol(symbol)
    }

    /// Consume `keyword` if it is next.
    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a run of keywords only if all of them are next.
    pub(crate) fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let all = keywords
            .iter()
            .enumerate()
            .all(|(i, kw)| self.peek_at(i).kind.is_keyword(kw));
        if all {
            self.pos += keywords.len();
        }
        all
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Token> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    pub(crate) fn expect_symbol(&mut self, symbol: char) -> ParseResult<Token> {
        if self.check_symbol(symbol) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", symbol)))
        }
    }

    pub(crate) fn expect_string(&mut self, what: &str) -> ParseResult<String> {
        match self.peek().kind.clone() {
            TokenKind::String(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// A single identifier part: bare word or quoted identifier.
    pub(crate) fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Word(name) | TokenKind::QuotedIdent(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// A dotted name such as `catalog.db.table`.
    pub(crate) fn expect_qualified_name(&mut self) -> ParseResult<String> {
        let mut name = self.expect_ident()?;
        while self.check_symbol('.') {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    /// Whether only the optional terminator remains.
    pub(crate) fn at_end(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Eof => true,
            TokenKind::Symbol(';') => matches!(self.peek_at(1).kind, TokenKind::Eof),
            _ => false,
        }
    }

    pub(crate) fn expect_end(&self) -> ParseResult<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    /// Source text from the current token to the end of the statement body.
    pub(crate) fn rest_text(&self) -> &'a str {
        let start = self.peek().span.start.min(self.end);
        self.source[start..self.end].trim()
    }

    /// Source text between two byte offsets.
    pub(crate) fn text_between(&self, start: usize, end: usize) -> &'a str {
        self.source
            .get(start..end.min(self.end))
            .unwrap_or("")
            .trim()
    }

    /// The whole statement body without its terminator.
    pub(crate) fn statement_text(&self) -> &'a str {
        self.source[..self.end].trim()
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            ParseError::unexpected_eof(token.span, expected)
        } else {
            ParseError::unexpected_token(token.span, expected, &token.kind.name())
        }
    }
}

static EOF_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    span: Span {
        start: 0,
        end: 0,
        line: 1,
        column: 1,
    },
};

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use sqlcli_core::{DdlOperation, ModifyKind, ModifyOperation, ObjectKind, UseTarget};

    fn parse(input: &str) -> Operation {
        SqlParser::parse_statement(input).unwrap().unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        SqlParser::parse_statement(input).unwrap_err()
    }

    // ==================== CLIENT COMMAND TESTS ====================

    #[test]
    fn test_parse_client_commands() {
        assert_eq!(parse("QUIT;"), Operation::Quit);
        assert_eq!(parse("exit"), Operation::Quit);
        assert_eq!(parse("clear;"), Operation::Clear);
        assert_eq!(parse("HELP;"), Operation::Help);
    }

    #[test]
    fn test_empty_statement_has_no_operation() {
        assert_eq!(SqlParser::parse_statement(";").unwrap(), None);
        assert_eq!(SqlParser::parse_statement("-- only a comment").unwrap(), None);
    }

    // ==================== SET / RESET TESTS ====================

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse("SET 'table.dml-sync' = 'true';"),
            Operation::Set {
                key: Some("table.dml-sync".into()),
                value: Some("true".into()),
            }
        );
        assert_eq!(
            parse("SET sql-client.execution.result-mode = tableau;"),
            Operation::Set {
                key: Some("sql-client.execution.result-mode".into()),
                value: Some("tableau".into()),
            }
        );
        assert_eq!(
            parse("SET;"),
            Operation::Set {
                key: None,
                value: None
            }
        );
    }

    #[test]
    fn test_parse_set_without_value_fails() {
        let err = parse_err("SET 'a' =;");
        assert_eq!(err.message, "expected value, found ';'");
    }

    #[test]
    fn test_parse_reset() {
        assert_eq!(parse("RESET;"), Operation::Reset { key: None });
        assert_eq!(
            parse("RESET 'pipeline.name';"),
            Operation::Reset {
                key: Some("pipeline.name".into())
            }
        );
    }

    // ==================== MODIFY TESTS ====================

    #[test]
    fn test_parse_insert() {
        assert_eq!(
            parse("INSERT INTO db.t VALUES (1);"),
            Operation::Insert(ModifyOperation::new(
                ModifyKind::InsertInto,
                "db.t",
                "INSERT INTO db.t VALUES (1)"
            ))
        );
        assert!(matches!(
            parse("insert overwrite t select * from s"),
            Operation::Insert(ModifyOperation {
                kind: ModifyKind::InsertOverwrite,
                ..
            })
        ));
        assert!(matches!(
            parse("EXECUTE INSERT INTO t SELECT 1;"),
            Operation::Insert(_)
        ));
    }

    #[test]
    fn test_parse_ctas() {
        match parse("CREATE TABLE t WITH ('connector' = 'blackhole') AS SELECT * FROM s;") {
            Operation::CreateTableAs(op) => {
                assert_eq!(op.kind, ModifyKind::CreateTableAs);
                assert_eq!(op.target, "t");
            }
            other => panic!("expected CTAS, got {:?}", other),
        }
    }

    #[test]
    fn test_computed_column_is_not_ctas() {
        assert!(matches!(
            parse("CREATE TABLE t (a INT, b AS a + 1);"),
            Operation::Create(DdlOperation {
                object: ObjectKind::Table,
                ..
            })
        ));
    }

    // ==================== STATEMENT SET TESTS ====================

    #[test]
    fn test_parse_statement_set_markers() {
        assert_eq!(parse("BEGIN STATEMENT SET;"), Operation::BeginStatementSet);
        assert_eq!(parse("END;"), Operation::EndStatementSet);
    }

    #[test]
    fn test_parse_execute_statement_set() {
        let op = parse(
            "EXECUTE STATEMENT SET BEGIN\n  INSERT INTO a VALUES (1);\n  INSERT INTO b VALUES (2);\nEND;",
        );
        match op {
            Operation::StatementSet(ops) => {
                let targets: Vec<&str> = ops.iter().map(|o| o.target.as_str()).collect();
                assert_eq!(targets, vec!["a", "b"]);
            }
            other => panic!("expected statement set, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_statement_set_rejects_queries() {
        let err = parse_err("EXECUTE STATEMENT SET BEGIN SELECT 1; END;");
        assert!(err.message.contains("only INSERT statements"));
    }

    // ==================== DDL TESTS ====================

    #[test]
    fn test_parse_ddl() {
        match parse("CREATE TEMPORARY VIEW IF NOT EXISTS v AS SELECT 1;") {
            Operation::Create(ddl) => {
                assert_eq!(ddl.object, ObjectKind::View);
                assert_eq!(ddl.name, "v");
                assert!(ddl.if_exists);
            }
            other => panic!("expected CREATE, got {:?}", other),
        }
        assert!(matches!(parse("DROP TABLE IF EXISTS t;"), Operation::Drop(_)));
        assert!(matches!(
            parse("ALTER TABLE t RENAME TO u;"),
            Operation::Alter(_)
        ));
    }

    #[test]
    fn test_parse_use() {
        match parse("USE CATALOG my_catalog;") {
            Operation::Use(op) => assert_eq!(op.target, UseTarget::Catalog("my_catalog".into())),
            other => panic!("expected USE, got {:?}", other),
        }
        match parse("USE MODULES core, hive;") {
            Operation::Use(op) => assert_eq!(
                op.target,
                UseTarget::Modules(vec!["core".into(), "hive".into()])
            ),
            other => panic!("expected USE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_jars_and_modules() {
        assert_eq!(
            parse("ADD JAR '/tmp/udf.jar';"),
            Operation::AddJar {
                path: "/tmp/udf.jar".into()
            }
        );
        assert_eq!(
            parse("REMOVE JAR '/tmp/udf.jar';"),
            Operation::RemoveJar {
                path: "/tmp/udf.jar".into()
            }
        );
        assert_eq!(
            parse("LOAD MODULE hive WITH ('hive-version' = '3.1.2');"),
            Operation::LoadModule {
                name: "hive".into()
            }
        );
        assert_eq!(
            parse("UNLOAD MODULE hive;"),
            Operation::UnloadModule {
                name: "hive".into()
            }
        );
    }

    // ==================== QUERY / SHOW TESTS ====================

    #[test]
    fn test_parse_queries() {
        assert!(matches!(parse("SELECT 1;"), Operation::Query(_)));
        assert!(matches!(
            parse("WITH x AS (SELECT 1) SELECT * FROM x;"),
            Operation::Query(_)
        ));
        assert!(matches!(parse("EXPLAIN PLAN FOR SELECT 1;"), Operation::Explain(_)));
        assert_eq!(
            parse("SHOW CREATE TABLE t;"),
            Operation::ShowCreateTable { name: "t".into() }
        );
        assert_eq!(
            parse("SHOW CREATE VIEW v;"),
            Operation::ShowCreateView { name: "v".into() }
        );
        assert!(matches!(parse("SHOW TABLES;"), Operation::Other(_)));
        assert!(matches!(parse("DESCRIBE t;"), Operation::Other(_)));
    }

    #[test]
    fn test_parse_explain_details() {
        match parse("EXPLAIN ESTIMATED_COST, CHANGELOG_MODE SELECT * FROM t;") {
            Operation::Explain(op) => assert_eq!(op.statement, "SELECT * FROM t"),
            other => panic!("expected EXPLAIN, got {:?}", other),
        }
    }

    // ==================== STOP JOB TESTS ====================

    #[test]
    fn test_parse_stop_job() {
        assert_eq!(
            parse("STOP JOB 'abc' WITH SAVEPOINT WITH DRAIN;"),
            Operation::StopJob {
                job_id: "abc".into(),
                with_savepoint: true,
                with_drain: true,
            }
        );
        assert_eq!(
            parse("STOP JOB 'abc';"),
            Operation::StopJob {
                job_id: "abc".into(),
                with_savepoint: false,
                with_drain: false,
            }
        );
    }

    // ==================== ERROR TESTS ====================

    #[test]
    fn test_unknown_statement_has_location() {
        let err = parse_err("\n  FROBNICATE t;");
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 3);
        assert_eq!(err.to_string(), "Parse error at line 2, column 3: unsupported statement starting with 'FROBNICATE'");
    }

    #[test]
    fn test_insert_requires_target() {
        let err = parse_err("INSERT t VALUES (1);");
        assert_eq!(err.message, "expected INTO or OVERWRITE, found 't'");
    }

    #[test]
    fn test_multiple_statements_rejected() {
        let err = parse_err("SELECT 1; SELECT 2;");
        assert!(err.message.contains("one statement"));
    }

    #[test]
    fn test_parser_records_command() {
        let mut parser = SqlParser::new();
        parser.parse("  SELECT 1;\n").unwrap();
        assert_eq!(parser.command(), "SELECT 1;");
    }
}

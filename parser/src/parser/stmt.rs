//! Statement classification.

use sqlcli_core::{
    DdlOperation, ExplainOperation, GenericOperation, ModifyKind, ModifyOperation, ObjectKind,
    Operation, QueryOperation, UseOperation, UseTarget,
};

use super::{Parser, SqlParser};
use crate::error::{ParseError, ParseResult};
use crate::lexer::TokenKind;
use crate::script::split_statements;

/// Detail keywords accepted between `EXPLAIN` and the explained statement.
const EXPLAIN_DETAILS: [&str; 4] = [
    "ESTIMATED_COST",
    "CHANGELOG_MODE",
    "JSON_EXECUTION_PLAN",
    "PLAN_ADVICE",
];

/// Leading keywords passed through to the gateway as generic statements.
const GENERIC_KEYWORDS: [&str; 8] = [
    "SHOW", "DESCRIBE", "DESC", "ANALYZE", "CALL", "TRUNCATE", "UPDATE", "DELETE",
];

impl<'a> Parser<'a> {
    /// Parse the statement into an operation.
    pub(crate) fn parse_operation(&mut self) -> ParseResult<Option<Operation>> {
        if self.at_end() {
            return Ok(None);
        }
        self.reject_inner_terminators()?;

        let keyword = match &self.peek().kind {
            TokenKind::Word(word) => word.to_ascii_uppercase(),
            TokenKind::Symbol('(') => return Ok(Some(self.query())),
            other => {
                return Err(ParseError::unexpected_token(
                    self.current_span(),
                    "statement keyword",
                    &other.name(),
                ))
            }
        };

        let operation = match keyword.as_str() {
            "QUIT" | "EXIT" => self.bare_command(Operation::Quit)?,
            "CLEAR" => self.bare_command(Operation::Clear)?,
            "HELP" => self.bare_command(Operation::Help)?,
            "SET" => self.parse_set()?,
            "RESET" => self.parse_reset()?,
            "INSERT" => Operation::Insert(self.parse_insert()?),
            "SELECT" | "WITH" | "VALUES" => self.query(),
            "EXPLAIN" => self.parse_explain()?,
            "BEGIN" => {
                self.advance();
                self.expect_keyword("STATEMENT")?;
                self.expect_keyword("SET")?;
                self.expect_end()?;
                Operation::BeginStatementSet
            }
            "END" => self.bare_command(Operation::EndStatementSet)?,
            "EXECUTE" => self.parse_execute()?,
            "ADD" => {
                self.advance();
                self.expect_keyword("JAR")?;
                let path = self.expect_string("jar path")?;
                self.expect_end()?;
                Operation::AddJar { path }
            }
            "REMOVE" => {
                self.advance();
                self.expect_keyword("JAR")?;
                let path = self.expect_string("jar path")?;
                self.expect_end()?;
                Operation::RemoveJar { path }
            }
            "SHOW" if self.peek_at(1).kind.is_keyword("CREATE") => self.parse_show_create()?,
            "CREATE" => self.parse_create()?,
            "DROP" => Operation::Drop(self.parse_ddl("DROP", "IF EXISTS")?),
            "ALTER" => Operation::Alter(self.parse_ddl("ALTER", "IF EXISTS")?),
            "USE" => self.parse_use()?,
            "LOAD" => {
                self.advance();
                self.expect_keyword("MODULE")?;
                let name = self.expect_ident()?;
                Operation::LoadModule { name }
            }
            "UNLOAD" => {
                self.advance();
                self.expect_keyword("MODULE")?;
                let name = self.expect_ident()?;
                self.expect_end()?;
                Operation::UnloadModule { name }
            }
            "STOP" => self.parse_stop_job()?,
            kw if GENERIC_KEYWORDS.contains(&kw) => {
                Operation::Other(GenericOperation::new(self.statement_text()))
            }
            _ => {
                let word = match &self.peek().kind {
                    TokenKind::Word(w) => w.clone(),
                    other => other.name(),
                };
                return Err(ParseError::unsupported_statement(self.current_span(), &word));
            }
        };

        Ok(Some(operation))
    }

    /// Only `EXECUTE STATEMENT SET` blocks may contain inner terminators.
    fn reject_inner_terminators(&self) -> ParseResult<()> {
        if self.peek().kind.is_keyword("EXECUTE")
            && self.peek_at(1).kind.is_keyword("STATEMENT")
        {
            return Ok(());
        }
        let last = self.tokens.len().saturating_sub(2);
        let inner = self.tokens[..last]
            .iter()
            .find(|t| t.kind == TokenKind::Symbol(';'));
        match inner {
            Some(token) => Err(ParseError::new(
                "only one statement can be executed at a time",
                token.span,
            )),
            None => Ok(()),
        }
    }

    fn bare_command(&mut self, operation: Operation) -> ParseResult<Operation> {
        self.advance();
        self.expect_end()?;
        Ok(operation)
    }

    fn query(&self) -> Operation {
        Operation::Query(QueryOperation::new(self.statement_text()))
    }

    // ==================== SET / RESET ====================

    fn parse_set(&mut self) -> ParseResult<Operation> {
        self.advance();
        if self.at_end() {
            return Ok(Operation::Set {
                key: None,
                value: None,
            });
        }

        let key = if let TokenKind::String(key) = self.peek().kind.clone() {
            self.advance();
            key
        } else {
            // Legacy unquoted form: everything up to '=' is the key.
            let start = self.peek().span.start;
            while !self.check_symbol('=') && !self.at_end() {
                self.advance();
            }
            self.text_between(start, self.peek().span.start).to_string()
        };
        self.expect_symbol('=')?;

        if self.at_end() {
            return Err(self.unexpected("value"));
        }
        let value = if let TokenKind::String(value) = self.peek().kind.clone() {
            self.advance();
            self.expect_end()?;
            value
        } else {
            self.rest_text().to_string()
        };

        Ok(Operation::Set {
            key: Some(key.trim().to_string()),
            value: Some(value.trim().to_string()),
        })
    }

    fn parse_reset(&mut self) -> ParseResult<Operation> {
        self.advance();
        if self.at_end() {
            return Ok(Operation::Reset { key: None });
        }
        let key = if let TokenKind::String(key) = self.peek().kind.clone() {
            self.advance();
            self.expect_end()?;
            key
        } else {
            self.rest_text().to_string()
        };
        Ok(Operation::Reset {
            key: Some(key.trim().to_string()),
        })
    }

    // ==================== MODIFY ====================

    /// `INSERT INTO|OVERWRITE [TABLE] <name> ...`, cursor on `INSERT`.
    fn parse_insert(&mut self) -> ParseResult<ModifyOperation> {
        let start = self.peek().span.start;
        self.expect_keyword("INSERT")?;
        let kind = if self.eat_keyword("INTO") {
            ModifyKind::InsertInto
        } else if self.eat_keyword("OVERWRITE") {
            ModifyKind::InsertOverwrite
        } else {
            return Err(self.unexpected("INTO or OVERWRITE"));
        };
        self.eat_keyword("TABLE");
        let target = self.expect_qualified_name()?;
        if self.at_end() {
            return Err(self.unexpected("query or VALUES"));
        }
        let statement = self.text_between(start, self.end);
        Ok(ModifyOperation::new(kind, target, statement))
    }

    fn parse_execute(&mut self) -> ParseResult<Operation> {
        self.advance();
        if self.eat_keywords(&["STATEMENT", "SET", "BEGIN"]) {
            return self.parse_statement_set_block();
        }
        if self.check_keyword("INSERT") {
            return Ok(Operation::Insert(self.parse_insert()?));
        }
        Err(self.unexpected("STATEMENT SET or INSERT"))
    }

    /// Inner statements of `EXECUTE STATEMENT SET BEGIN ... END`.
    fn parse_statement_set_block(&mut self) -> ParseResult<Operation> {
        let body_start = self.peek().span.start;
        let body_end = self
            .tokens
            .iter()
            .rev()
            .find(|t| t.kind.is_keyword("END"))
            .map(|t| t.span.start)
            .filter(|end| *end >= body_start)
            .ok_or_else(|| self.unexpected_at_end("END"))?;

        let mut operations = Vec::new();
        for inner in split_statements(self.text_between(body_start, body_end)) {
            match SqlParser::parse_statement(&inner)? {
                Some(Operation::Insert(op)) => operations.push(op),
                None => {}
                Some(_) => {
                    return Err(ParseError::new(
                        format!(
                            "only INSERT statements are allowed in EXECUTE STATEMENT SET, found: {}",
                            inner.trim_end_matches(';')
                        ),
                        self.current_span(),
                    ))
                }
            }
        }

        while !self.check_keyword("END") || self.peek().span.start != body_end {
            self.advance();
        }
        self.advance();
        self.expect_end()?;
        Ok(Operation::StatementSet(operations))
    }

    fn unexpected_at_end(&self, expected: &str) -> ParseError {
        let eof = self.tokens.last().map(|t| t.span).unwrap_or_default();
        ParseError::unexpected_eof(eof, expected)
    }

    // ==================== EXPLAIN / SHOW CREATE ====================

    fn parse_explain(&mut self) -> ParseResult<Operation> {
        self.advance();
        if !self.eat_keywords(&["PLAN", "FOR"]) {
            while EXPLAIN_DETAILS.iter().any(|d| self.check_keyword(d)) {
                self.advance();
                if self.check_symbol(',') {
                    self.advance();
                }
            }
        }
        if self.at_end() {
            return Err(self.unexpected("statement to explain"));
        }
        Ok(Operation::Explain(ExplainOperation {
            statement: self.rest_text().to_string(),
        }))
    }

    fn parse_show_create(&mut self) -> ParseResult<Operation> {
        self.advance();
        self.expect_keyword("CREATE")?;
        let operation = if self.eat_keyword("TABLE") {
            Operation::ShowCreateTable {
                name: self.expect_qualified_name()?,
            }
        } else if self.eat_keyword("VIEW") {
            Operation::ShowCreateView {
                name: self.expect_qualified_name()?,
            }
        } else {
            return Err(self.unexpected("TABLE or VIEW"));
        };
        self.expect_end()?;
        Ok(operation)
    }

    // ==================== DDL ====================

    fn parse_create(&mut self) -> ParseResult<Operation> {
        let ddl = self.parse_ddl("CREATE", "IF NOT EXISTS")?;
        if ddl.object == ObjectKind::Table && self.has_top_level_as() {
            return Ok(Operation::CreateTableAs(ModifyOperation::new(
                ModifyKind::CreateTableAs,
                ddl.name,
                ddl.statement,
            )));
        }
        Ok(Operation::Create(ddl))
    }

    /// `<verb> [OR REPLACE] [TEMPORARY] [SYSTEM] <object> [<guard>] <name>`.
    fn parse_ddl(&mut self, verb: &str, guard: &str) -> ParseResult<DdlOperation> {
        self.expect_keyword(verb)?;
        self.eat_keywords(&["OR", "REPLACE"]);
        self.eat_keyword("TEMPORARY");
        self.eat_keyword("SYSTEM");

        let object = if self.eat_keyword("TABLE") {
            ObjectKind::Table
        } else if self.eat_keyword("VIEW") {
            ObjectKind::View
        } else if self.eat_keyword("FUNCTION") {
            ObjectKind::Function
        } else if self.eat_keyword("DATABASE") {
            ObjectKind::Database
        } else if self.eat_keyword("CATALOG") {
            ObjectKind::Catalog
        } else {
            return Err(self.unexpected("TABLE, VIEW, FUNCTION, DATABASE or CATALOG"));
        };

        let guard_words: Vec<&str> = guard.split(' ').collect();
        let if_exists = self.eat_keywords(&guard_words);
        let name = self.expect_qualified_name()?;

        Ok(DdlOperation {
            object,
            name,
            if_exists,
            statement: self.statement_text().to_string(),
        })
    }

    /// Whether an `AS` followed by a query appears outside parentheses.
    fn has_top_level_as(&self) -> bool {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            match &token.kind {
                TokenKind::Symbol('(') => depth += 1,
                TokenKind::Symbol(')') => depth = depth.saturating_sub(1),
                kind if depth == 0 && kind.is_keyword("AS") => {
                    if let Some(next) = self.tokens.get(i + 1) {
                        let starts_query = ["SELECT", "WITH", "VALUES"]
                            .iter()
                            .any(|kw| next.kind.is_keyword(kw))
                            || next.kind == TokenKind::Symbol('(');
                        if starts_query {
                            return true;
                        }
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn parse_use(&mut self) -> ParseResult<Operation> {
        self.advance();
        let target = if self.eat_keyword("CATALOG") {
            UseTarget::Catalog(self.expect_ident()?)
        } else if self.eat_keyword("MODULES") {
            let mut modules = vec![self.expect_ident()?];
            while self.check_symbol(',') {
                self.advance();
                modules.push(self.expect_ident()?);
            }
            UseTarget::Modules(modules)
        } else {
            UseTarget::Database(self.expect_qualified_name()?)
        };
        self.expect_end()?;
        Ok(Operation::Use(UseOperation {
            target,
            statement: self.statement_text().to_string(),
        }))
    }

    // ==================== STOP JOB ====================

    fn parse_stop_job(&mut self) -> ParseResult<Operation> {
        self.advance();
        self.expect_keyword("JOB")?;
        let job_id = self.expect_string("job id")?;
        let mut with_savepoint = false;
        let mut with_drain = false;
        while self.eat_keyword("WITH") {
            if self.eat_keyword("SAVEPOINT") {
                with_savepoint = true;
            } else if self.eat_keyword("DRAIN") {
                with_drain = true;
            } else {
                return Err(self.unexpected("SAVEPOINT or DRAIN"));
            }
        }
        self.expect_end()?;
        Ok(Operation::StopJob {
            job_id,
            with_savepoint,
            with_drain,
        })
    }
}

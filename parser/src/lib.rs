//! sqlcli Parser
//!
//! This crate turns statement text into [`sqlcli_core::Operation`]s:
//! - Tokenizing SQL text (quoted identifiers, string literals, comments)
//! - Deciding when multi-line input forms a complete statement
//! - Splitting and normalizing script files
//! - Classifying statements into the operation kinds the client handles
//! - Error handling with location information

mod error;
mod lexer;
mod parser;
mod script;

pub use error::*;
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{OperationParser, SqlParser};
pub use script::{format_sql_file, is_statement_complete, split_statements};

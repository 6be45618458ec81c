//! Lexer (tokenizer) for SQL statement text.
//!
//! The client never interprets SQL expressions, so the token set is coarse:
//! words (keywords and identifiers alike), quoted identifiers, string
//! literals, numbers and single-character symbols. Comments are skipped.

use crate::{ParseError, ParseResult};

/// Byte range plus the 1-based position of its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Token types.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare word: keyword or unquoted identifier.
    Word(String),
    /// `` `ident` `` or `"ident"`.
    QuotedIdent(String),
    /// `'text'` with `''` unescaped.
    String(String),
    Number(String),
    /// Any other single character (`=`, `;`, `(`, `.`, ...).
    Symbol(char),
    Eof,
}

impl TokenKind {
    pub fn name(&self) -> String {
        match self {
            TokenKind::Word(w) => format!("'{}'", w),
            TokenKind::QuotedIdent(w) => format!("`{}`", w),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Number(n) => n.clone(),
            TokenKind::Symbol(c) => format!("'{}'", c),
            TokenKind::Eof => "end of statement".to_string(),
        }
    }

    /// Whether this is the bare word `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

/// A token with its span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

/// Lexer state.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize all input into a vector of tokens ending with `Eof`.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn span_from(&self, start: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(start, self.pos, start_line, start_col)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next_char(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.pos = pos + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> ParseResult<()> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.next_char();
                }
                Some('-') if self.lookahead_is('-') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.next_char();
                    }
                }
                Some('/') if self.lookahead_is('*') => {
                    let (start, line, col) = (self.pos, self.line, self.column);
                    self.next_char();
                    self.next_char();
                    let mut prev = '\0';
                    loop {
                        match self.next_char() {
                            Some('/') if prev == '*' => break,
                            Some(c) => prev = c,
                            None => {
                                return Err(ParseError::new(
                                    "unterminated block comment",
                                    self.span_from(start, line, col),
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Whether the character after the next one is `expected`.
    fn lookahead_is(&self, expected: char) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        matches!(ahead.next(), Some((_, c)) if c == expected)
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace_and_comments()?;

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let Some(c) = self.next_char() else {
            return Ok(Token::eof(self.pos, self.line, self.column));
        };

        let kind = match c {
            '\'' => TokenKind::String(self.scan_quoted('\'', start, start_line, start_col)?),
            '`' => TokenKind::QuotedIdent(self.scan_quoted('`', start, start_line, start_col)?),
            '"' => TokenKind::QuotedIdent(self.scan_quoted('"', start, start_line, start_col)?),
            c if c.is_ascii_digit() => TokenKind::Number(self.scan_number(c)),
            c if c.is_alphabetic() || c == '_' => TokenKind::Word(self.scan_word(c)),
            c => TokenKind::Symbol(c),
        };

        Ok(Token::new(kind, self.span_from(start, start_line, start_col)))
    }

    /// Scan up to the closing `quote`; a doubled quote stands for itself.
    fn scan_quoted(
        &mut self,
        quote: char,
        start: usize,
        start_line: usize,
        start_col: usize,
    ) -> ParseResult<String> {
        let mut value = String::new();
        loop {
            match self.next_char() {
                None => {
                    let what = if quote == '\'' {
                        "unterminated string literal"
                    } else {
                        "unterminated quoted identifier"
                    };
                    return Err(ParseError::new(
                        what,
                        self.span_from(start, start_line, start_col),
                    ));
                }
                Some(c) if c == quote => {
                    if self.peek_char() == Some(quote) {
                        self.next_char();
                        value.push(quote);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn scan_number(&mut self, first: char) -> String {
        let mut value = String::from(first);
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                value.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        value
    }

    fn scan_word(&mut self, first: char) -> String {
        let mut value = String::from(first);
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                value.push(c);
                self.next_char();
            } else {
                break;
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_words_strings_and_symbols() {
        assert_eq!(
            kinds("SET 'a.b' = 'it''s';"),
            vec![
                TokenKind::Word("SET".into()),
                TokenKind::String("a.b".into()),
                TokenKind::Symbol('='),
                TokenKind::String("it's".into()),
                TokenKind::Symbol(';'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("-- header\nSHOW /* inline */ TABLES"),
            vec![
                TokenKind::Word("SHOW".into()),
                TokenKind::Word("TABLES".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::new("SELECT\n  1").tokenize().unwrap();
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("SELECT 'abc").tokenize().unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.column(), 8);
    }
}

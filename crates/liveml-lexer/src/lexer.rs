//! Core LiveML lexer: converts source text to a token stream.
//!
//! Features:
//! - One scanner for both surface syntaxes; keywords and comment forms
//!   are selected by [`Syntax`]
//! - Nested `(* ... *)` comments in ML, `//` and `/* ... */` in Reason
//! - Operators scanned by maximal munch over the symbol characters, so
//!   user-defined infix operators such as `|||` arrive as a single token
//! - Character literals are told apart from type variables by looking for
//!   the closing quote
//! - Error recovery: collects up to [`liveml_types::MAX_ERRORS`] errors

use liveml_types::{Diagnostics, ErrorCode, LiveError, SourceFile, Span, Syntax};

use crate::token::{Token, TokenKind};

/// The LiveML lexer.
pub struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    source_file: &'src SourceFile,
    syntax: Syntax,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    errors: Diagnostics,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

fn is_symbol_char(ch: u8) -> bool {
    matches!(
        ch,
        b'!' | b'$'
            | b'%'
            | b'&'
            | b'*'
            | b'+'
            | b'-'
            | b'.'
            | b'/'
            | b':'
            | b'<'
            | b'='
            | b'>'
            | b'?'
            | b'@'
            | b'^'
            | b'|'
            | b'~'
    )
}

fn is_ident_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'\''
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile, syntax: Syntax) -> Self {
        Self {
            source: &source_file.source,
            bytes: source_file.source.as_bytes(),
            source_file,
            syntax,
            pos: 0,
            line: 1,
            col: 1,
            errors: Diagnostics::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.is_full() {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if ch & 0xC0 != 0x80 {
            // Continuation bytes of a multi-byte char do not start a column.
            self.col += 1;
        }
        Some(ch)
    }

    /// Consume one full UTF-8 character.
    fn advance_char(&mut self) -> Option<char> {
        let ch = self.source[self.pos..].chars().next()?;
        for _ in 0..ch.len_utf8() {
            self.advance();
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = LiveError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and comments. Returns once the next byte starts a
    /// token or the input is exhausted.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b' ' | b'\t' | b'\r' | b'\n'), _) => {
                    self.advance();
                }
                (Some(b'('), Some(b'*')) if self.syntax == Syntax::Ml => {
                    self.skip_block_comment(b'(', b')');
                }
                (Some(b'/'), Some(b'*')) if self.syntax == Syntax::Reason => {
                    self.skip_block_comment(b'/', b'/');
                }
                (Some(b'/'), Some(b'/')) if self.syntax == Syntax::Reason => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Skip a block comment opened by `open*` and closed by `*close`.
    /// Comments nest.
    fn skip_block_comment(&mut self, open: u8, close: u8) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();
        self.advance();
        let mut depth = 1u32;
        while depth > 0 {
            match (self.peek(), self.peek_at(1)) {
                (None, _) => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "Unterminated comment",
                        span,
                    );
                    return;
                }
                (Some(b'*'), Some(c)) if c == close => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                (Some(c), Some(b'*')) if c == open => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        let start_line = self.line;
        let start_col = self.col;
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        let kind = match ch {
            b'0'..=b'9' => self.scan_number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(start),
            b'"' => self.scan_string(start_line, start_col),
            b'\'' => self.scan_quote(start_line, start_col),
            b'(' | b')' | b'[' | b']' | b'{' | b'}' | b',' => {
                self.advance();
                match ch {
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    _ => TokenKind::Comma,
                }
            }
            b';' => {
                self.advance();
                if self.peek() == Some(b';') {
                    self.advance();
                    TokenKind::SemiSemi
                } else {
                    TokenKind::Semi
                }
            }
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance();
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    self.advance();
                    TokenKind::Dot
                }
            }
            c if is_symbol_char(c) => self.scan_symbol(start),
            _ => {
                let bad = self.advance_char().unwrap_or('?');
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("Unexpected character '{bad}'"),
                    span,
                );
                return self.scan_token();
            }
        };

        Token::new(kind, self.span_from(start_line, start_col))
    }

    fn scan_symbol(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if is_symbol_char(c)) {
            self.advance();
        }
        TokenKind::symbol(&self.source[start..self.pos])
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: usize) -> TokenKind {
        let start_line = self.line;
        let start_col = self.col;

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.advance();
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit() || c == b'_') {
                self.advance();
            }
            let digits: String = self.source[start + 2..self.pos]
                .chars()
                .filter(|&c| c != '_')
                .collect();
            return match i64::from_str_radix(&digits, 16) {
                Ok(n) => TokenKind::Int(n),
                Err(_) => self.invalid_number(start, start_line, start_col),
            };
        }

        let mut is_float = false;
        self.skip_digits();
        if self.peek() == Some(b'.') && self.peek_at(1) != Some(b'.') {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            if matches!(self.peek_at(1 + sign), Some(b'0'..=b'9')) {
                is_float = true;
                for _ in 0..=sign {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text: String = self.source[start..self.pos]
            .chars()
            .filter(|&c| c != '_')
            .collect();
        if is_float {
            match text.parse::<f64>() {
                Ok(x) => TokenKind::Float(x),
                Err(_) => self.invalid_number(start, start_line, start_col),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => self.invalid_number(start, start_line, start_col),
            }
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9' | b'_')) {
            self.advance();
        }
    }

    fn invalid_number(&mut self, start: usize, start_line: u32, start_col: u32) -> TokenKind {
        let span = self.span_from(start_line, start_col);
        let text = self.source[start..self.pos].to_string();
        self.emit_error(
            ErrorCode::INVALID_LITERAL,
            format!("Invalid number literal '{text}'"),
            span,
        );
        TokenKind::Int(0)
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        if text == "_" {
            return TokenKind::Underscore;
        }
        if let Some(kw) = TokenKind::keyword(text, self.syntax) {
            return kw;
        }
        if text.starts_with(|c: char| c.is_ascii_uppercase()) {
            TokenKind::UIdent(text.to_string())
        } else {
            TokenKind::LIdent(text.to_string())
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Strings, characters and type variables
    // ─────────────────────────────────────────────────────────────

    fn scan_string(&mut self, start_line: u32, start_col: u32) -> TokenKind {
        self.advance();
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                    );
                    return TokenKind::Str(buf);
                }
                Some(b'"') => {
                    self.advance();
                    return TokenKind::Str(buf);
                }
                Some(b'\\') => {
                    if let Some(c) = self.scan_escape() {
                        buf.push(c);
                    }
                }
                Some(_) => {
                    if let Some(c) = self.advance_char() {
                        buf.push(c);
                    }
                }
            }
        }
    }

    /// Scan an escape sequence starting at the backslash.
    ///
    /// A backslash before a newline is a line continuation: the newline and
    /// the next line's indentation are dropped and `None` is returned.
    fn scan_escape(&mut self) -> Option<char> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();
        let ch = self.peek()?;
        let simple = match ch {
            b'n' => Some('\n'),
            b't' => Some('\t'),
            b'r' => Some('\r'),
            b'b' => Some('\u{8}'),
            b' ' => Some(' '),
            b'\\' => Some('\\'),
            b'"' => Some('"'),
            b'\'' => Some('\''),
            _ => None,
        };
        if let Some(c) = simple {
            self.advance();
            return Some(c);
        }
        match ch {
            b'\n' => {
                self.advance();
                while matches!(self.peek(), Some(b' ' | b'\t')) {
                    self.advance();
                }
                None
            }
            b'0'..=b'9' => {
                let digits = self.take_while_n(3, |c| c.is_ascii_digit());
                match digits.parse::<u32>().ok().filter(|&n| n < 256) {
                    Some(n) => char::from_u32(n),
                    None => {
                        let span = self.span_from(start_line, start_col);
                        self.emit_error(
                            ErrorCode::INVALID_LITERAL,
                            format!("Invalid escape sequence '\\{digits}'"),
                            span,
                        );
                        None
                    }
                }
            }
            b'x' => {
                self.advance();
                let digits = self.take_while_n(2, |c| c.is_ascii_hexdigit());
                match u32::from_str_radix(&digits, 16) {
                    Ok(n) if digits.len() == 2 => char::from_u32(n),
                    _ => {
                        let span = self.span_from(start_line, start_col);
                        self.emit_error(
                            ErrorCode::INVALID_LITERAL,
                            format!("Invalid escape sequence '\\x{digits}'"),
                            span,
                        );
                        None
                    }
                }
            }
            _ => {
                let bad = self.advance_char().unwrap_or('?');
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::INVALID_LITERAL,
                    format!("Invalid escape sequence '\\{bad}'"),
                    span,
                );
                None
            }
        }
    }

    fn take_while_n(&mut self, max: usize, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.pos - start < max && matches!(self.peek(), Some(c) if pred(c)) {
            self.advance();
        }
        self.source[start..self.pos].to_string()
    }

    /// A leading `'` starts either a character literal (`'a'`, `'\n'`) or
    /// a type variable (`'a`).
    fn scan_quote(&mut self, start_line: u32, start_col: u32) -> TokenKind {
        let rest = &self.source[self.pos + 1..];
        let mut chars = rest.chars();
        let is_char_literal = match chars.next() {
            Some('\\') => true,
            Some(_) => chars.next() == Some('\''),
            None => false,
        };

        self.advance();
        if is_char_literal {
            let value = if self.peek() == Some(b'\\') {
                self.scan_escape()
            } else {
                self.advance_char()
            };
            if self.peek() == Some(b'\'') {
                self.advance();
            } else {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::INVALID_LITERAL,
                    "Unterminated character literal",
                    span,
                );
            }
            return TokenKind::Char(value.unwrap_or('\0'));
        }

        let name_start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.advance();
        }
        if self.pos == name_start {
            let span = self.span_from(start_line, start_col);
            self.emit_error(ErrorCode::UNEXPECTED_CHARACTER, "Unexpected character '''", span);
            return self.scan_token().kind;
        }
        TokenKind::TypeVar(self.source[name_start..self.pos].to_string())
    }
}

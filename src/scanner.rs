//! Module `scanner` implements a one‑pass, streaming lexer for the Stellar language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src, keywords) -> Scanner`
//!   Create a new lexer over the input; identifiers are classified through the
//!   supplied [`KeywordTable`].
//!
//! - `impl Iterator for Scanner`
//!   Yields `Result<Token, StellarError>` on each `.next()`. An error never stops
//!   the scan; the following call continues after the offending input.
//!
//! - `Scanner::scan_all(self)`
//!   Drains the iterator into `(tokens, diagnostics)`.
//!
//! # Token Recognition
//!
//! - Single‑character punctuators: `( ) { } , . ; ? : ~`.
//! - Greedy multi‑character operators: `++ += -- -= ** **= *= // //= /= %= == => != <= << >= >>`.
//! - `//` is floor division right after an operand (number, string, identifier,
//!   `)`, `this`, `true`, `false`, `nil`); anywhere else it opens a line comment.
//! - Comments: `# …`, `// …` to end of line, `/* … */` blocks.
//! - Strings: `'…'` or `"…"`, multi‑line, no escape processing.
//! - Numbers: `123`, `1_000`, `3.14`, `0xFF`, `0o17`, `0b1010`.
//! - Identifiers / keywords: alphanumeric or `_` sequences, resolved via the keyword table.
//!
//! # Performance
//!
//! - Bulk comment skipping via `memchr` / `memmem`.
//! - `#[inline(always)]` on hot path helpers.

use crate::error::{Result, StellarError};
use crate::keywords::KeywordTable;
use crate::token::{Literal, Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter, memmem};
use std::iter::FusedIterator;

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a [u8],                // entire source text
    keywords: &'a KeywordTable,   // spelling → keyword classification
    start: usize,                 // index of the *first* byte of the current lexeme
    curr: usize,                  // index *one past* the last byte examined
    line: usize,                  // 1‑based line counter (\n increments)
    pending: Option<(TokenType, Option<Literal>)>, // recognised token waiting to be emitted
    last_kind: Option<TokenType>, // kind of the previously emitted token
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str, keywords: &'a KeywordTable) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src: src.as_bytes(),
            keywords,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            last_kind: None,
        }
    }

    /// Scan the whole input, separating tokens from diagnostics.
    pub fn scan_all(self) -> (Vec<Token>, Vec<StellarError>) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<StellarError> = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Scanned {} token(s) with {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input slice.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn emit(&mut self, kind: TokenType) {
        self.pending = Some((kind, None));
    }

    /// The source text of the current lexeme.
    fn lexeme(&self) -> &'a str {
        // Token boundaries always fall on ASCII bytes, so the slice is valid UTF‑8.
        std::str::from_utf8(&self.src[self.start..self.curr]).unwrap_or_default()
    }

    /// Did the previous token end an operand? Decides whether `//` divides.
    fn after_operand(&self) -> bool {
        matches!(
            self.last_kind,
            Some(
                TokenType::NUMBER
                    | TokenType::STRING
                    | TokenType::IDENTIFIER
                    | TokenType::RIGHT_PAREN
                    | TokenType::THIS
                    | TokenType::TRUE
                    | TokenType::FALSE
                    | TokenType::NIL
            )
        )
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.emit(TokenType::LEFT_PAREN),
            b')' => self.emit(TokenType::RIGHT_PAREN),
            b'{' => self.emit(TokenType::LEFT_BRACE),
            b'}' => self.emit(TokenType::RIGHT_BRACE),
            b',' => self.emit(TokenType::COMMA),
            b'.' => self.emit(TokenType::DOT),
            b';' => self.emit(TokenType::SEMICOLON),
            b'?' => self.emit(TokenType::QUESTION),
            b':' => self.emit(TokenType::COLON),
            b'~' => self.emit(TokenType::TILDE),

            // ── greedy multi‑character operators ─────────────────────────
            b'+' => {
                let tt = if self.match_byte(b'+') {
                    TokenType::PLUS_PLUS
                } else if self.match_byte(b'=') {
                    TokenType::PLUS_EQUAL
                } else {
                    TokenType::PLUS
                };

                self.emit(tt);
            }

            b'-' => {
                let tt = if self.match_byte(b'-') {
                    TokenType::MINUS_MINUS
                } else if self.match_byte(b'=') {
                    TokenType::MINUS_EQUAL
                } else {
                    TokenType::MINUS
                };

                self.emit(tt);
            }

            b'*' => {
                let tt = if self.match_byte(b'*') {
                    if self.match_byte(b'=') {
                        TokenType::STAR_STAR_EQUAL
                    } else {
                        TokenType::STAR_STAR
                    }
                } else if self.match_byte(b'=') {
                    TokenType::STAR_EQUAL
                } else {
                    TokenType::STAR
                };

                self.emit(tt);
            }

            b'%' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::PERCENT_EQUAL
                } else {
                    TokenType::PERCENT
                };

                self.emit(tt);
            }

            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.emit(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else if self.match_byte(b'>') {
                    TokenType::ARROW
                } else {
                    TokenType::EQUAL
                };

                self.emit(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else if self.match_byte(b'<') {
                    TokenType::LESS_LESS
                } else {
                    TokenType::LESS
                };

                self.emit(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else if self.match_byte(b'>') {
                    TokenType::GREATER_GREATER
                } else {
                    TokenType::GREATER
                };

                self.emit(tt);
            }

            // ── slash family: division, floor division, comments ─────────
            b'/' => {
                if self.peek() == b'/' && self.after_operand() {
                    self.advance();

                    let tt = if self.match_byte(b'=') {
                        TokenType::SLASH_SLASH_EQUAL
                    } else {
                        TokenType::SLASH_SLASH
                    };

                    self.emit(tt);
                } else if self.match_byte(b'/') {
                    self.skip_line_comment();
                } else if self.match_byte(b'*') {
                    return self.skip_block_comment();
                } else if self.match_byte(b'=') {
                    self.emit(TokenType::SLASH_EQUAL);
                } else {
                    self.emit(TokenType::SLASH);
                }
            }

            b'#' => self.skip_line_comment(),

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(()); // skip insignificants
            }

            b'\n' => {
                self.line += 1; // track for diagnostics

                return Ok(());
            }

            // ── string literal ' … ' or " … " ─────────────────────────────
            b'"' | b'\'' => {
                return self.parse_string(b);
            }

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => {
                return self.parse_number();
            }

            // ── identifiers / keywords (alpha or underscore‑leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Swallow the remaining bytes of a multi‑byte character.
                let rest = std::str::from_utf8(&self.src[self.start..]).unwrap_or_default();
                let symbol: char = rest.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);

                self.curr = self.start + symbol.len_utf8().max(1);

                return Err(StellarError::lex(
                    self.line,
                    format!("Unrecognized symbol '{}'", symbol),
                ));
            }
        }

        Ok(())
    }

    fn skip_line_comment(&mut self) {
        // Fast‑forward to next newline; if none found, skip to EOF.
        if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
            self.curr += pos;
        } else {
            self.curr = self.len();
        }
    }

    /// Skip a `/* … */` comment. `self.curr` is just past the opening `/*`.
    fn skip_block_comment(&mut self) -> Result<()> {
        let rest: &[u8] = &self.src[self.curr..];

        match memmem::find(rest, b"*/") {
            Some(pos) => {
                self.line += memchr_iter(b'\n', &rest[..pos]).count();
                self.curr += pos + 2;

                Ok(())
            }

            None => {
                let opened_at = self.line;

                self.line += memchr_iter(b'\n', rest).count();
                self.curr = self.len();

                Err(StellarError::lex(
                    opened_at,
                    "Unterminated comment: couldn't find matching '*/' for '/*'",
                ))
            }
        }
    }

    /// Parse a quoted string literal.
    ///
    /// * `self.start` still points to the opening quote.
    /// * When we return, `self.curr` points **past** the closing quote.
    fn parse_string(&mut self, quote: u8) -> Result<()> {
        while !self.is_at_end() && self.peek() != quote {
            if self.advance() == b'\n' {
                self.line += 1; // multi‑line strings are allowed
            }
        }

        if self.is_at_end() {
            return Err(StellarError::lex(self.line, "Unterminated string"));
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let value: &str = std::str::from_utf8(&self.src[self.start + 1..self.curr - 1])
            .unwrap_or_default();

        self.pending = Some((TokenType::STRING, Some(Literal::Str(value.to_owned()))));

        Ok(())
    }

    /// Parse a numeric literal: decimal integers and floats with optional `_`
    /// separators, and `0x` / `0o` / `0b` prefixed integers.
    fn parse_number(&mut self) -> Result<()> {
        let first: u8 = self.src[self.start];
        let radix: Option<u32> = match (first, self.peek().to_ascii_lowercase()) {
            (b'0', b'x') => Some(16),
            (b'0', b'o') => Some(8),
            (b'0', b'b') => Some(2),
            _ => None,
        };

        if let Some(radix) = radix {
            self.advance(); // consume the base letter

            while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                self.advance();
            }

            let digits: String = self.lexeme()[2..].chars().filter(|c| *c != '_').collect();

            return match i64::from_str_radix(&digits, radix) {
                Ok(n) if !digits.is_empty() => {
                    self.pending = Some((TokenType::NUMBER, Some(Literal::Int(n))));
                    Ok(())
                }
                _ => Err(StellarError::lex(
                    self.line,
                    format!(
                        "Expected number to be complete base '{}' number, got '{}'",
                        radix,
                        self.lexeme()
                    ),
                )),
            };
        }

        while self.peek().is_ascii_digit() || self.peek() == b'_' {
            self.advance();
        }

        // Optional fractional part; a dangling '.' is an error.
        if self.peek() == b'.' {
            if !self.peek_next().is_ascii_digit() {
                self.advance(); // drop the '.' so scanning resumes after it

                return Err(StellarError::lex(
                    self.line,
                    "Expected number after '.'. Did you mean float or int?",
                ));
            }

            self.advance(); // consume "."

            while self.peek().is_ascii_digit() || self.peek() == b'_' {
                self.advance();
            }

            let text: String = self.lexeme().chars().filter(|c| *c != '_').collect();
            let n: f64 = text.parse::<f64>().map_err(|_| {
                StellarError::lex(self.line, format!("Malformed float '{}'", self.lexeme()))
            })?;

            self.pending = Some((TokenType::NUMBER, Some(Literal::Float(n))));

            return Ok(());
        }

        let text: String = self.lexeme().chars().filter(|c| *c != '_').collect();
        let n: i64 = text.parse::<i64>().map_err(|_| {
            StellarError::lex(
                self.line,
                format!("Integer literal '{}' is out of range", self.lexeme()),
            )
        })?;

        self.pending = Some((TokenType::NUMBER, Some(Literal::Int(n))));

        Ok(())
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let tt: TokenType = self
            .keywords
            .lookup(self.lexeme())
            .map(|kw| kw.token_type())
            .unwrap_or(TokenType::IDENTIFIER);

        self.emit(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", None, self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some((tt, literal)) = self.pending.take() {
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                self.last_kind = Some(tt);

                return Some(Ok(Token::new(tt, self.lexeme(), literal, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

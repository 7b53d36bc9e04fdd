use log::debug;
use serde::Serialize;
use std::fmt;

/// The different kinds of tokens recognised by the Stellar scanner.
///
/// Keyword variants are produced through the [`KeywordTable`], so their source
/// spelling may differ from the variant name.
///
/// [`KeywordTable`]: crate::keywords::KeywordTable
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// ';'
    SEMICOLON,

    /// '?'
    QUESTION,

    /// ':'
    COLON,

    /// '~'
    TILDE,

    /// '-'
    MINUS,

    /// '--'
    MINUS_MINUS,

    /// '-='
    MINUS_EQUAL,

    /// '+'
    PLUS,

    /// '++'
    PLUS_PLUS,

    /// '+='
    PLUS_EQUAL,

    /// '/'
    SLASH,

    /// '/='
    SLASH_EQUAL,

    /// '//'
    SLASH_SLASH,

    /// '//='
    SLASH_SLASH_EQUAL,

    /// '*'
    STAR,

    /// '*='
    STAR_EQUAL,

    /// '**'
    STAR_STAR,

    /// '**='
    STAR_STAR_EQUAL,

    /// '%'
    PERCENT,

    /// '%='
    PERCENT_EQUAL,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '=>'
    ARROW,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '>>'
    GREATER_GREATER,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// '<<'
    LESS_LESS,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING,

    /// A numeric literal
    NUMBER,

    AND,
    BREAK,
    CLASS,
    CONST,
    DEL,
    ELSE,
    FALSE,
    FOR,
    FUNC,
    IF,
    IMPORT,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Tokens that begin a declaration or statement; the parser stops
    /// discarding tokens when it sees one of these.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenType::CLASS
                | TokenType::FUNC
                | TokenType::VAR
                | TokenType::CONST
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN
                | TokenType::BREAK
                | TokenType::DEL
                | TokenType::IMPORT
        )
    }
}

/// Literal value carried by `NUMBER` and `STRING` tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }

            // 3 → "3.0", 3.14 → "3.14"
            Literal::Float(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{:.1}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::Str(s) => f.write_str(s),
        }
    }
}

/// A scanned token: its kind, the exact source text, an optional literal
/// value and the line where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub kind: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// Value of number and string literals.
    pub literal: Option<Literal>,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new(kind: TokenType, lexeme: &str, literal: Option<Literal>, line: usize) -> Self {
        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            kind, lexeme, line
        );

        Self {
            kind,
            lexeme: lexeme.to_owned(),
            literal,
            line,
        }
    }

    /// Same position and lexeme, different kind. Used to turn a compound
    /// assignment operator (`+=`) into its arithmetic operator (`+`).
    pub fn with_kind(&self, kind: TokenType) -> Self {
        Self {
            kind,
            lexeme: self.lexeme.clone(),
            literal: None,
            line: self.line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(lit) => write!(f, "{:?} {} {}", self.kind, self.lexeme, lit),
            None => write!(f, "{:?} {} null", self.kind, self.lexeme),
        }
    }
}

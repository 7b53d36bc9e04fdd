//! Keyword spelling table shared by the scanner, parser, resolver and
//! interpreter.
//!
//! Every keyword has a canonical identity ([`Keyword`]) and a spelling. The
//! defaults are the canonical lowercase words; a host may remap any of them,
//! typically by loading the JSON object produced by the external remapping
//! tool:
//!
//! ```
//! use stellar::keywords::{Keyword, KeywordTable};
//!
//! let table = KeywordTable::from_json(r#"{ "print": "bake", "func": "def" }"#).unwrap();
//! assert_eq!(table.spelling(Keyword::Print), "bake");
//! assert_eq!(table.lookup("def"), Some(Keyword::Func));
//! assert_eq!(table.lookup("print"), None);
//! ```

use std::collections::HashMap;

use log::{debug, info};
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StellarError};
use crate::token::TokenType;

/// Canonical identity of every reserved word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    And,
    Break,
    Class,
    Const,
    Del,
    Else,
    False,
    For,
    Func,
    If,
    Import,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical spellings (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static CANONICAL: phf::Map<&'static str, Keyword> = phf_map! {
    "and"    => Keyword::And,
    "break"  => Keyword::Break,
    "class"  => Keyword::Class,
    "const"  => Keyword::Const,
    "del"    => Keyword::Del,
    "else"   => Keyword::Else,
    "false"  => Keyword::False,
    "for"    => Keyword::For,
    "func"   => Keyword::Func,
    "if"     => Keyword::If,
    "import" => Keyword::Import,
    "nil"    => Keyword::Nil,
    "or"     => Keyword::Or,
    "print"  => Keyword::Print,
    "return" => Keyword::Return,
    "super"  => Keyword::Super,
    "this"   => Keyword::This,
    "true"   => Keyword::True,
    "var"    => Keyword::Var,
    "while"  => Keyword::While,
};

impl Keyword {
    /// The canonical lowercase spelling.
    pub fn canonical(self) -> &'static str {
        CANONICAL
            .entries()
            .find(|(_, kw)| **kw == self)
            .map(|(spelling, _)| *spelling)
            .unwrap_or("")
    }

    pub fn all() -> impl Iterator<Item = Keyword> {
        CANONICAL.values().copied()
    }

    /// Token kind emitted by the scanner for this keyword.
    pub fn token_type(self) -> TokenType {
        match self {
            Keyword::And => TokenType::AND,
            Keyword::Break => TokenType::BREAK,
            Keyword::Class => TokenType::CLASS,
            Keyword::Const => TokenType::CONST,
            Keyword::Del => TokenType::DEL,
            Keyword::Else => TokenType::ELSE,
            Keyword::False => TokenType::FALSE,
            Keyword::For => TokenType::FOR,
            Keyword::Func => TokenType::FUNC,
            Keyword::If => TokenType::IF,
            Keyword::Import => TokenType::IMPORT,
            Keyword::Nil => TokenType::NIL,
            Keyword::Or => TokenType::OR,
            Keyword::Print => TokenType::PRINT,
            Keyword::Return => TokenType::RETURN,
            Keyword::Super => TokenType::SUPER,
            Keyword::This => TokenType::THIS,
            Keyword::True => TokenType::TRUE,
            Keyword::Var => TokenType::VAR,
            Keyword::While => TokenType::WHILE,
        }
    }
}

/// Mapping from keyword identity to its spelling, plus the reverse index the
/// scanner uses to classify identifiers.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    spellings: HashMap<Keyword, String>,
    reverse: HashMap<String, Keyword>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        let spellings: HashMap<Keyword, String> = CANONICAL
            .entries()
            .map(|(spelling, kw)| (*kw, (*spelling).to_string()))
            .collect();

        Self::build(spellings).unwrap_or_else(|_| unreachable!("canonical spellings are unique"))
    }
}

impl KeywordTable {
    /// Start from the defaults and apply `overrides`.
    pub fn new(overrides: HashMap<Keyword, String>) -> Result<Self> {
        let mut spellings: HashMap<Keyword, String> = KeywordTable::default().spellings;

        for (kw, spelling) in overrides {
            debug!("Remapping keyword {:?} -> '{}'", kw, spelling);
            spellings.insert(kw, spelling);
        }

        Self::build(spellings)
    }

    /// Parse a JSON object `{ "<canonical>": "<spelling>", ... }`.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: HashMap<Keyword, String> = serde_json::from_str(json)?;

        info!("Loaded {} keyword override(s) from JSON", overrides.len());

        Self::new(overrides)
    }

    fn build(spellings: HashMap<Keyword, String>) -> Result<Self> {
        let mut reverse: HashMap<String, Keyword> = HashMap::with_capacity(spellings.len());

        for (kw, spelling) in &spellings {
            if !is_identifier(spelling) {
                return Err(StellarError::Keywords(format!(
                    "spelling '{}' for '{}' is not an identifier",
                    spelling,
                    kw.canonical()
                )));
            }

            if let Some(other) = reverse.insert(spelling.clone(), *kw) {
                return Err(StellarError::Keywords(format!(
                    "'{}' and '{}' share the spelling '{}'",
                    other.canonical(),
                    kw.canonical(),
                    spelling
                )));
            }
        }

        Ok(Self { spellings, reverse })
    }

    /// The spelling currently assigned to `kw`.
    pub fn spelling(&self, kw: Keyword) -> &str {
        self.spellings
            .get(&kw)
            .map(String::as_str)
            .unwrap_or_else(|| kw.canonical())
    }

    /// Classify an identifier lexeme.
    #[inline]
    pub fn lookup(&self, word: &str) -> Option<Keyword> {
        self.reverse.get(word).copied()
    }
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

//! Token types for the SQL lexer.

use std::fmt;

use super::Span;

/// Keywords the cursor engine cares about.
///
/// Bare words are always lexed as [`TokenKind::Identifier`]; keyword
/// classification happens on demand through [`Token::keyword`], so a column
/// named `key` or `first` stays usable in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Expression keywords
    And,
    Or,
    Not,
    Is,
    Null,
    Like,
    Glob,
    In,
    Between,
    Escape,
    True,
    False,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
    As,
    Collate,

    // Table definition keywords
    Constraint,
    Primary,
    Key,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            "IS" => Some(Self::Is),
            "NULL" => Some(Self::Null),
            "LIKE" => Some(Self::Like),
            "GLOB" => Some(Self::Glob),
            "IN" => Some(Self::In),
            "BETWEEN" => Some(Self::Between),
            "ESCAPE" => Some(Self::Escape),
            "TRUE" => Some(Self::True),
            "FALSE" => Some(Self::False),
            "CASE" => Some(Self::Case),
            "WHEN" => Some(Self::When),
            "THEN" => Some(Self::Then),
            "ELSE" => Some(Self::Else),
            "END" => Some(Self::End),
            "CAST" => Some(Self::Cast),
            "AS" => Some(Self::As),
            "COLLATE" => Some(Self::Collate),
            "CONSTRAINT" => Some(Self::Constraint),
            "PRIMARY" => Some(Self::Primary),
            "KEY" => Some(Self::Key),
            _ => None,
        }
    }

    /// Returns the keyword as upper-case SQL text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::Like => "LIKE",
            Self::Glob => "GLOB",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Escape => "ESCAPE",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::End => "END",
            Self::Cast => "CAST",
            Self::As => "AS",
            Self::Collate => "COLLATE",
            Self::Constraint => "CONSTRAINT",
            Self::Primary => "PRIMARY",
            Self::Key => "KEY",
        }
    }

    /// Whether the keyword may appear inside a boolean filter expression.
    #[must_use]
    pub const fn is_expression_keyword(&self) -> bool {
        !matches!(self, Self::Constraint | Self::Primary | Self::Key)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare word: identifier, function name or keyword.
    Identifier(String),
    /// `"quoted"` or `` `quoted` `` identifier, unescaped.
    QuotedIdentifier(String),
    /// `'string'` literal, unescaped.
    String(String),
    /// Integer literal.
    Integer(i64),
    /// Float literal.
    Float(f64),
    /// `X'..'` blob literal.
    Blob(Vec<u8>),

    LeftParen,
    RightParen,
    Comma,
    Dot,
    Semicolon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Concat,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    /// Lexing error with a description.
    Error(String),
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns the fixed SQL text of punctuation and operator tokens.
    #[must_use]
    pub const fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::LeftParen => Some("("),
            Self::RightParen => Some(")"),
            Self::Comma => Some(","),
            Self::Dot => Some("."),
            Self::Semicolon => Some(";"),
            Self::Plus => Some("+"),
            Self::Minus => Some("-"),
            Self::Star => Some("*"),
            Self::Slash => Some("/"),
            Self::Percent => Some("%"),
            Self::Concat => Some("||"),
            Self::Eq => Some("="),
            Self::NotEq => Some("<>"),
            Self::Lt => Some("<"),
            Self::LtEq => Some("<="),
            Self::Gt => Some(">"),
            Self::GtEq => Some(">="),
            _ => None,
        }
    }
}

/// A token with its location in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Classifies a bare word as a keyword.
    #[must_use]
    pub fn keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Identifier(word) => Keyword::from_str(word),
            _ => None,
        }
    }

    /// Returns the identifier text for bare and quoted identifiers.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => Some(name),
            _ => None,
        }
    }
}

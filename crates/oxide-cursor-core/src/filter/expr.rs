//! Per-column filter expressions.
//!
//! A small language for the value side of a column filter:
//!
//! ```text
//! expr    := term ('|' term)*
//! term    := unary ('&' unary)*
//! unary   := '!' unary | atom
//! atom    := '(' expr ')' | 'null' | op value | '..' value
//!          | value '..' value? | pattern | value
//! ```
//!
//! `>1`, `'b'%`, `foo%`, `1..5`, `..10`, `null|>3` and `!null` are all valid.
//! Literals are typed by the column the filter is set on.

use std::fmt;

use crate::error::{CoreError, Result};
use crate::schema::ColumnType;
use crate::value::SqlValue;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// Parsed filter expression over a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// IS NULL check
    Null,
    /// Simple comparison: column op value
    Compare(CompareOp, SqlValue),
    /// Inclusive range; an open end is unbounded.
    Range {
        from: Option<SqlValue>,
        to: Option<SqlValue>,
    },
    /// LIKE pattern match
    Like(String),
    /// NOT negation
    Not(Box<FilterExpr>),
    /// AND combination
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// OR combination
    Or(Box<FilterExpr>, Box<FilterExpr>),
}

impl FilterExpr {
    /// Parses `source` for a column of type `column_type`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFilter`] naming `column` when the text is
    /// malformed or a literal does not fit the column type.
    pub fn parse(column: &str, column_type: ColumnType, source: &str) -> Result<Self> {
        let invalid = |message: String| CoreError::InvalidFilter {
            column: column.to_string(),
            message,
        };
        if column_type == ColumnType::Blob {
            return Err(invalid("blob columns cannot be filtered".to_string()));
        }
        let tokens = tokenize(source).map_err(invalid)?;
        if tokens.is_empty() {
            return Err(invalid("empty filter".to_string()));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            column_type,
        };
        let expr = parser.expr().map_err(invalid)?;
        if let Some(token) = parser.peek() {
            return Err(invalid(format!("unexpected {token}")));
        }
        Ok(expr)
    }

    /// Builds the SQL predicate for `column_sql` and its parameters.
    #[must_use]
    pub fn to_sql(&self, column_sql: &str) -> (String, Vec<SqlValue>) {
        match self {
            Self::Null => (format!("{column_sql} IS NULL"), vec![]),
            Self::Compare(op, value) => (format!("{column_sql} {op} ?"), vec![value.clone()]),
            Self::Range {
                from: Some(from),
                to: Some(to),
            } => (
                format!("{column_sql} BETWEEN ? AND ?"),
                vec![from.clone(), to.clone()],
            ),
            Self::Range {
                from: Some(from),
                to: None,
            } => (format!("{column_sql} >= ?"), vec![from.clone()]),
            Self::Range { from: None, to } => (
                format!("{column_sql} <= ?"),
                vec![to.clone().unwrap_or(SqlValue::Null)],
            ),
            Self::Like(pattern) => (
                format!("{column_sql} LIKE ?"),
                vec![SqlValue::Text(pattern.clone())],
            ),
            Self::Not(inner) => {
                let (inner_sql, params) = inner.to_sql(column_sql);
                (format!("NOT ({inner_sql})"), params)
            }
            Self::And(left, right) => {
                let (left_sql, mut left_params) = left.to_sql(column_sql);
                let (right_sql, right_params) = right.to_sql(column_sql);
                left_params.extend(right_params);
                (format!("({left_sql}) AND ({right_sql})"), left_params)
            }
            Self::Or(left, right) => {
                let (left_sql, mut left_params) = left.to_sql(column_sql);
                let (right_sql, right_params) = right.to_sql(column_sql);
                left_params.extend(right_params);
                (format!("({left_sql}) OR ({right_sql})"), left_params)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Or,
    And,
    Not,
    LeftParen,
    RightParen,
    Range,
    Percent,
    Op(CompareOp),
    Word(String),
    Quoted(String),
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or => f.write_str("'|'"),
            Self::And => f.write_str("'&'"),
            Self::Not => f.write_str("'!'"),
            Self::LeftParen => f.write_str("'('"),
            Self::RightParen => f.write_str("')'"),
            Self::Range => f.write_str("'..'"),
            Self::Percent => f.write_str("'%'"),
            Self::Op(op) => write!(f, "'{op}'"),
            Self::Word(w) => write!(f, "'{w}'"),
            Self::Quoted(q) => write!(f, "'{q}' literal"),
        }
    }
}

const fn is_special(c: char) -> bool {
    matches!(c, '|' | '&' | '!' | '(' | ')' | '%' | '\'' | '<' | '>' | '=')
}

fn tokenize(source: &str) -> std::result::Result<Vec<Tok>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let (tok, width) = match (c, next) {
            ('|', _) => (Tok::Or, 1),
            ('&', _) => (Tok::And, 1),
            ('(', _) => (Tok::LeftParen, 1),
            (')', _) => (Tok::RightParen, 1),
            ('%', _) => (Tok::Percent, 1),
            ('.', Some('.')) => (Tok::Range, 2),
            ('>', Some('=')) => (Tok::Op(CompareOp::Gte), 2),
            ('<', Some('=')) => (Tok::Op(CompareOp::Lte), 2),
            ('<', Some('>')) | ('!', Some('=')) => (Tok::Op(CompareOp::Ne), 2),
            ('!', _) => (Tok::Not, 1),
            ('>', _) => (Tok::Op(CompareOp::Gt), 1),
            ('<', _) => (Tok::Op(CompareOp::Lt), 1),
            ('=', _) => (Tok::Op(CompareOp::Eq), 1),
            ('\'', _) => {
                let mut text = String::new();
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                            text.push('\'');
                            j += 2;
                        }
                        Some('\'') => break,
                        Some(ch) => {
                            text.push(*ch);
                            j += 1;
                        }
                        None => return Err("unterminated quoted literal".to_string()),
                    }
                }
                (Tok::Quoted(text), j + 1 - i)
            }
            _ => {
                let mut j = i;
                while j < chars.len()
                    && !chars[j].is_whitespace()
                    && !is_special(chars[j])
                    && !(chars[j] == '.' && chars.get(j + 1) == Some(&'.'))
                {
                    j += 1;
                }
                (Tok::Word(chars[i..j].iter().collect()), j - i)
            }
        };
        tokens.push(tok);
        i += width;
    }
    Ok(tokens)
}

/// Deepest `!`/`(` nesting accepted before parsing gives up.
const MAX_NESTING: usize = 256;

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
    depth: usize,
    column_type: ColumnType,
}

type ParseResult<T> = std::result::Result<T, String>;

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err("filter nested too deeply".to_string());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> ParseResult<FilterExpr> {
        let mut left = self.term()?;
        while self.eat(&Tok::Or) {
            let right = self.term()?;
            left = FilterExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> ParseResult<FilterExpr> {
        let mut left = self.unary()?;
        while self.eat(&Tok::And) {
            let right = self.unary()?;
            left = FilterExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<FilterExpr> {
        if self.eat(&Tok::Not) {
            let inner = self.nested(Self::unary)?;
            return Ok(FilterExpr::Not(Box::new(inner)));
        }
        self.atom()
    }

    fn atom(&mut self) -> ParseResult<FilterExpr> {
        match self.peek().cloned() {
            Some(Tok::LeftParen) => {
                self.pos += 1;
                let inner = self.nested(Self::expr)?;
                if !self.eat(&Tok::RightParen) {
                    return Err("expected ')'".to_string());
                }
                Ok(inner)
            }
            Some(Tok::Op(op)) => {
                self.pos += 1;
                let value = self.value()?;
                Ok(FilterExpr::Compare(op, value))
            }
            Some(Tok::Range) => {
                self.pos += 1;
                let to = self.value()?;
                Ok(FilterExpr::Range {
                    from: None,
                    to: Some(to),
                })
            }
            Some(Tok::Word(_) | Tok::Quoted(_) | Tok::Percent) => self.literal_run(),
            Some(tok) => Err(format!("unexpected {tok}")),
            None => Err("unexpected end of filter".to_string()),
        }
    }

    /// Parses adjacent literals: a pattern when any `%` is present, otherwise
    /// a single value optionally followed by a range.
    fn literal_run(&mut self) -> ParseResult<FilterExpr> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(Tok::Word(_) | Tok::Quoted(_) | Tok::Percent)
        ) {
            self.pos += 1;
        }
        let run = &self.tokens[start..self.pos];

        if run.contains(&Tok::Percent) {
            if self.column_type != ColumnType::Text {
                return Err("patterns are only allowed on text columns".to_string());
            }
            let pattern = run
                .iter()
                .map(|tok| match tok {
                    Tok::Word(s) | Tok::Quoted(s) => s.as_str(),
                    _ => "%",
                })
                .collect();
            return Ok(FilterExpr::Like(pattern));
        }

        let [single] = run else {
            return Err(format!("unexpected {}", run[1]));
        };
        if matches!(single, Tok::Word(w) if w.eq_ignore_ascii_case("null")) {
            return Ok(FilterExpr::Null);
        }
        let from = self.convert(single)?;

        if !self.eat(&Tok::Range) {
            return Ok(FilterExpr::Compare(CompareOp::Eq, from));
        }
        let to = if matches!(self.peek(), Some(Tok::Word(_) | Tok::Quoted(_))) {
            Some(self.value()?)
        } else {
            None
        };
        Ok(FilterExpr::Range {
            from: Some(from),
            to,
        })
    }

    fn value(&mut self) -> ParseResult<SqlValue> {
        match self.bump() {
            Some(tok @ (Tok::Word(_) | Tok::Quoted(_))) => self.convert(&tok),
            Some(tok) => Err(format!("expected a value, found {tok}")),
            None => Err("expected a value".to_string()),
        }
    }

    fn convert(&self, tok: &Tok) -> ParseResult<SqlValue> {
        let (Tok::Word(text) | Tok::Quoted(text)) = tok else {
            return Err(format!("expected a value, found {tok}"));
        };
        match self.column_type {
            ColumnType::Text => Ok(SqlValue::Text(text.clone())),
            ColumnType::Integer => text
                .parse::<i64>()
                .map(SqlValue::Int)
                .map_err(|_| format!("'{text}' is not an integer")),
            ColumnType::Real => match text.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(SqlValue::Float(x)),
                Ok(_) => Err(format!("'{text}' is not a finite number")),
                Err(_) => Err(format!("'{text}' is not a number")),
            },
            ColumnType::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(SqlValue::Bool(true)),
                "false" => Ok(SqlValue::Bool(false)),
                _ => Err(format!("'{text}' is not a boolean")),
            },
            ColumnType::Blob => Err("blob columns cannot be filtered".to_string()),
        }
    }
}

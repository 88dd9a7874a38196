//! Canonical form of free-form boolean filter expressions.

use crate::error::{CoreError, Result};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::schema::{quote_identifier, TableMeta};

/// Canonicalizes a complex filter against `meta`.
///
/// Whitespace runs collapse to single spaces, column references are checked
/// and double-quoted, expression keywords are upper-cased and literals are
/// re-rendered, so `i = m` and `i   =   m` both become `"i" = "m"`. The word
/// after `AS` or `COLLATE` names a type or collation and is upper-cased
/// instead of resolved. Returns `None` for blank input.
///
/// # Errors
///
/// Fails with [`CoreError::UnknownColumn`] for references to columns the
/// table lacks and [`CoreError::InvalidExpression`] for lexing errors,
/// statement separators and unbalanced parentheses.
pub fn canonicalize(source: &str, meta: &TableMeta) -> Result<Option<String>> {
    let tokens = Lexer::new(source).tokenize();
    if tokens.iter().all(Token::is_eof) {
        return Ok(None);
    }

    let mut pieces: Vec<(String, bool)> = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;
    let mut after_function = false;
    let mut names_operand = false;
    for (i, token) in tokens.iter().enumerate() {
        let followed_by_paren = matches!(
            tokens.get(i + 1).map(|t| &t.kind),
            Some(TokenKind::LeftParen)
        );
        let call_paren = after_function;
        after_function = false;
        let operand = names_operand;
        names_operand = false;
        let piece = match &token.kind {
            TokenKind::Eof => break,
            TokenKind::Error(message) => {
                return Err(CoreError::InvalidExpression(message.clone()));
            }
            TokenKind::Semicolon => {
                return Err(CoreError::InvalidExpression(
                    "statement separators are not allowed".to_string(),
                ));
            }
            TokenKind::LeftParen => {
                depth += 1;
                "(".to_string()
            }
            TokenKind::RightParen => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    CoreError::InvalidExpression("unbalanced parentheses".to_string())
                })?;
                ")".to_string()
            }
            TokenKind::Identifier(word) => match token.keyword() {
                _ if operand => {
                    after_function = followed_by_paren;
                    word.to_ascii_uppercase()
                }
                Some(keyword) if keyword.is_expression_keyword() => {
                    names_operand = matches!(keyword, Keyword::As | Keyword::Collate);
                    after_function = followed_by_paren && matches!(keyword, Keyword::Cast);
                    keyword.as_str().to_string()
                }
                _ if followed_by_paren => {
                    after_function = true;
                    word.clone()
                }
                _ => column_reference(word, meta)?,
            },
            TokenKind::QuotedIdentifier(name) => column_reference(name, meta)?,
            TokenKind::String(s) => format!("'{}'", s.replace('\'', "''")),
            TokenKind::Integer(n) => n.to_string(),
            TokenKind::Float(x) => format!("{x:?}"),
            TokenKind::Blob(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
                format!("X'{hex}'")
            }
            other => other.symbol().unwrap_or_default().to_string(),
        };
        pieces.push((piece, call_paren));
    }
    if depth != 0 {
        return Err(CoreError::InvalidExpression(
            "unbalanced parentheses".to_string(),
        ));
    }

    Ok(Some(join(&pieces)))
}

fn column_reference(name: &str, meta: &TableMeta) -> Result<String> {
    meta.column_index(name)?;
    Ok(quote_identifier(name))
}

/// Joins pieces with single spaces, except inside call and group parentheses
/// and before commas. The flag marks a piece glued to its predecessor.
fn join(pieces: &[(String, bool)]) -> String {
    let mut out = String::new();
    let mut previous: Option<&str> = None;
    for (piece, glued) in pieces {
        let tight = *glued
            || matches!(previous, None | Some("(" | "."))
            || matches!(piece.as_str(), ")" | "," | ".");
        if !tight {
            out.push(' ');
        }
        out.push_str(piece);
        previous = Some(piece.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnMeta, ColumnType};

    fn meta() -> TableMeta {
        TableMeta::builder("log_setup")
            .column(ColumnMeta::new("grain_id", ColumnType::Text))
            .column(ColumnMeta::new("table_name", ColumnType::Text))
            .column(ColumnMeta::new("i", ColumnType::Boolean))
            .column(ColumnMeta::new("m", ColumnType::Boolean))
            .primary_key(&["grain_id", "table_name"])
            .build()
            .unwrap()
    }

    fn canon(source: &str) -> String {
        canonicalize(source, &meta()).unwrap().unwrap()
    }

    #[test]
    fn test_whitespace_insensitive() {
        assert_eq!(canon("i = m"), "\"i\" = \"m\"");
        assert_eq!(canon("i   =\n   m"), "\"i\" = \"m\"");
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(
            canon("table_name like 'foo''s%' and not (i)"),
            "\"table_name\" LIKE 'foo''s%' AND NOT (\"i\")"
        );
        assert_eq!(canon("\"grain_id\" is null"), "\"grain_id\" IS NULL");
    }

    #[test]
    fn test_functions_are_kept() {
        assert_eq!(
            canon("length( table_name ) > 3"),
            "length(\"table_name\") > 3"
        );
        assert_eq!(
            canon("substr(grain_id, 1, 2) != 'ab'"),
            "substr(\"grain_id\", 1, 2) <> 'ab'"
        );
    }

    #[test]
    fn test_type_and_collation_operands() {
        assert_eq!(
            canon("cast( i as integer ) = 1"),
            "CAST(\"i\" AS INTEGER) = 1"
        );
        assert_eq!(
            canon("CAST(grain_id AS varchar(30))"),
            "CAST(\"grain_id\" AS VARCHAR(30))"
        );
        assert_eq!(
            canon("table_name = 'x' collate nocase"),
            canon("table_name='x'   COLLATE   NOCASE")
        );
        assert_eq!(
            canon("table_name collate nocase = grain_id"),
            "\"table_name\" COLLATE NOCASE = \"grain_id\""
        );
        assert_eq!(
            canonicalize("cast(x as integer) = 1", &meta()).unwrap_err(),
            CoreError::UnknownColumn("x".to_string())
        );
    }

    #[test]
    fn test_blank_clears() {
        assert_eq!(canonicalize("   ", &meta()).unwrap(), None);
        assert_eq!(canonicalize("-- only a comment", &meta()).unwrap(), None);
    }

    #[test]
    fn test_unknown_column() {
        assert_eq!(
            canonicalize("x = 1", &meta()).unwrap_err(),
            CoreError::UnknownColumn("x".to_string())
        );
    }

    #[test]
    fn test_rejects_injection_shapes() {
        for source in ["i = m; DROP TABLE log", "(i = m", "i = m)", "'open"] {
            assert!(
                matches!(
                    canonicalize(source, &meta()),
                    Err(CoreError::InvalidExpression(_))
                ),
                "{source}"
            );
        }
    }
}

//! MySQL identifier and literal quoting.
//!
//! - Identifiers are wrapped in backticks, each `.`-separated part on its own
//!   (`users.id` -> `` `users`.`id` ``). Embedded backticks are doubled.
//! - Literals go through the driver's escape routine and are wrapped in single quotes.
//! - Raw fragments are emitted verbatim.
//!
//! Fragments that are emitted without literal escaping (identifiers and raw
//! SQL) are scanned for stray single quotes first. A hit raises
//! [`SqlError::InjectionSuspected`].

use crate::error::{SqlError, SqlResult};
use crate::marker::{Classification, Token};

/// String escaping as performed by the database driver.
pub trait Escape {
    /// Escape `value` for inclusion between single quotes.
    fn escape(&self, value: &str) -> String;
}

/// Escaping compatible with `mysql_real_escape_string` on a UTF-8 connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlEscape;

impl Escape for MysqlEscape {
    fn escape(&self, value: &str) -> String {
        escape_mysql(value)
    }
}

/// Backslash-escape the characters MySQL treats specially inside string literals.
pub fn escape_mysql(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

/// Indices of single quotes not immediately preceded by a backslash.
fn unescaped_quotes(fragment: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = fragment.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(move |&(i, &b)| b == b'\'' && (i == 0 || bytes[i - 1] != b'\\'))
        .map(|(i, _)| i)
}

/// Whether `fragment` contains a single quote not preceded by a backslash.
pub fn has_unescaped_quote(fragment: &str) -> bool {
    unescaped_quotes(fragment).next().is_some()
}

/// Whether `fragment` leaves a string literal open.
///
/// Raw SQL may legitimately contain quoted literals (`status = 'open'`); only
/// an odd number of unescaped quotes is suspicious.
pub fn has_unbalanced_quote(fragment: &str) -> bool {
    unescaped_quotes(fragment).count() % 2 == 1
}

/// Quote a (possibly dotted) identifier with backticks.
///
/// `*` parts are left bare (`t.*`), and parts already wrapped in backticks are kept.
pub fn quote_identifier(name: &str) -> SqlResult<String> {
    if name.is_empty() {
        return Err(SqlError::validation("Identifier cannot be empty"));
    }
    if has_unescaped_quote(name) {
        return Err(SqlError::InjectionSuspected(name.to_string()));
    }

    let mut out = String::with_capacity(name.len() + 4);
    for (i, part) in name.split('.').enumerate() {
        let part = part.trim();
        if part.is_empty() {
            return Err(SqlError::validation(format!(
                "Empty identifier segment in '{name}'"
            )));
        }
        if i > 0 {
            out.push('.');
        }
        if part == "*" {
            out.push('*');
        } else if part.len() >= 2 && part.starts_with('`') && part.ends_with('`') {
            out.push_str(part);
        } else {
            out.push('`');
            for ch in part.chars() {
                if ch == '`' {
                    out.push_str("``");
                } else {
                    out.push(ch);
                }
            }
            out.push('`');
        }
    }
    Ok(out)
}

/// Escape `value` with `escaper` and wrap it in single quotes.
pub fn quote_literal<E: Escape + ?Sized>(value: &str, escaper: &E) -> String {
    let escaped = escaper.escape(value);
    let mut out = String::with_capacity(escaped.len() + 2);
    out.push('\'');
    out.push_str(&escaped);
    out.push('\'');
    out
}

/// Reject a raw fragment that would leave a string literal open.
///
/// Looser than identifier checking: raw SQL may hold complete literals such
/// as `s = 'open'`, so only an odd number of unescaped quotes is refused.
/// Anything with balanced quotes passes through unchanged.
pub fn guard_raw(fragment: &str) -> SqlResult<()> {
    if has_unbalanced_quote(fragment) {
        return Err(SqlError::InjectionSuspected(fragment.to_string()));
    }
    Ok(())
}

/// Render a classified token as SQL text.
///
/// Blank tokens render as the empty string; callers decide what to omit.
pub fn render_token<E: Escape + ?Sized>(token: &Token, escaper: &E) -> SqlResult<String> {
    match token.classification() {
        Classification::NormalColumn | Classification::ColumnReference => {
            quote_identifier(token.text())
        }
        Classification::NormalValue | Classification::ForcedLiteral => {
            Ok(quote_literal(token.text(), escaper))
        }
        Classification::RawQuery => {
            if !token.is_null() {
                if token.text().trim().is_empty() {
                    return Err(SqlError::validation("Raw SQL fragment is empty"));
                }
                guard_raw(token.text())?;
            }
            Ok(token.text().to_string())
        }
        Classification::BlankColumn => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_simple() {
        assert_eq!(quote_identifier("users").unwrap(), "`users`");
    }

    #[test]
    fn identifier_dotted() {
        assert_eq!(quote_identifier("users.id").unwrap(), "`users`.`id`");
    }

    #[test]
    fn identifier_star() {
        assert_eq!(quote_identifier("u.*").unwrap(), "`u`.*");
        assert_eq!(quote_identifier("*").unwrap(), "*");
    }

    #[test]
    fn identifier_already_quoted() {
        assert_eq!(quote_identifier("`users`.id").unwrap(), "`users`.`id`");
    }

    #[test]
    fn identifier_doubles_backticks() {
        assert_eq!(quote_identifier("we`ird").unwrap(), "`we``ird`");
    }

    #[test]
    fn identifier_rejects_empty_segments() {
        assert!(quote_identifier("").is_err());
        assert!(quote_identifier("a..b").is_err());
        assert!(quote_identifier("a.").is_err());
    }

    #[test]
    fn identifier_with_quote_is_suspected() {
        let err = quote_identifier("name' OR 1=1 --").unwrap_err();
        assert!(err.is_injection_suspected());
    }

    #[test]
    fn literal_escapes_quotes_and_backslashes() {
        assert_eq!(quote_literal("O'Brien", &MysqlEscape), r"'O\'Brien'");
        assert_eq!(quote_literal(r"a\b", &MysqlEscape), r"'a\\b'");
        assert_eq!(quote_literal("line\nbreak", &MysqlEscape), r"'line\nbreak'");
    }

    #[test]
    fn unescaped_quote_detection() {
        assert!(has_unescaped_quote("it's"));
        assert!(has_unescaped_quote("'leading"));
        assert!(!has_unescaped_quote(r"it\'s"));
        assert!(!has_unescaped_quote("plain"));
    }

    #[test]
    fn raw_fragments_may_hold_balanced_literals() {
        assert!(guard_raw("(SELECT id FROM t WHERE s = 'open')").is_ok());
        assert!(guard_raw("NOW()").is_ok());
        assert!(guard_raw("1 = 1' --").is_err());
    }

    #[test]
    fn raw_guard_is_looser_than_identifiers() {
        let fragment = "note = 'a' OR note = 'b'";
        assert!(guard_raw(fragment).is_ok());
        assert!(quote_identifier(fragment).unwrap_err().is_injection_suspected());
        assert!(guard_raw(r"note = 'it\'s'").is_ok());
    }

    #[test]
    fn empty_raw_fragment_is_rejected() {
        for token in [Token::value("|q"), Token::raw("  ")] {
            let err = render_token(&token, &MysqlEscape).unwrap_err();
            assert!(matches!(err, SqlError::Validation(_)));
        }
    }

    #[test]
    fn render_by_classification() {
        let e = MysqlEscape;
        assert_eq!(render_token(&Token::column("t.c"), &e).unwrap(), "`t`.`c`");
        assert_eq!(render_token(&Token::value("x"), &e).unwrap(), "'x'");
        assert_eq!(render_token(&Token::value("t.c|c"), &e).unwrap(), "`t`.`c`");
        assert_eq!(render_token(&Token::value("NOW()|q"), &e).unwrap(), "NOW()");
        assert_eq!(render_token(&Token::column("lit|v"), &e).unwrap(), "'lit'");
        assert_eq!(render_token(&Token::blank(), &e).unwrap(), "");
        assert_eq!(render_token(&Token::null(), &e).unwrap(), "NULL");
    }
}

//! Comparison operators accepted in `[operator, operand...]` lists.

use crate::error::{SqlError, SqlResult};
use std::fmt;

/// Query operator for a single predicate.
///
/// # Example
/// ```ignore
/// use sqlmark::Op;
///
/// assert_eq!(Op::parse("not in")?, Op::NotIn);
/// assert_eq!(Op::parse(">=")?.keyword(), ">=");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Equal: column = value
    Eq,
    /// Not equal: column != value
    Ne,
    /// Less than: column < value
    Lt,
    /// Less than or equal: column <= value
    Lte,
    /// Greater than: column > value
    Gt,
    /// Greater than or equal: column >= value
    Gte,
    /// IN (list)
    In,
    /// NOT IN (list)
    NotIn,
    /// BETWEEN a AND b
    Between,
    /// NOT BETWEEN a AND b
    NotBetween,
}

/// Number of operands an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one operand.
    One,
    /// Any number of operands, including none.
    Many,
    /// Exactly two operands.
    Two,
}

impl Op {
    /// Parse an operator keyword.
    ///
    /// Keywords are matched case-insensitively; inner whitespace is collapsed,
    /// so `"not   between"` is `NOT BETWEEN`. `<>` is accepted as `!=`.
    pub fn parse(keyword: &str) -> SqlResult<Self> {
        let normalized = keyword
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        match normalized.as_str() {
            "=" => Ok(Op::Eq),
            "!=" | "<>" => Ok(Op::Ne),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Lte),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Gte),
            "IN" => Ok(Op::In),
            "NOT IN" => Ok(Op::NotIn),
            "BETWEEN" => Ok(Op::Between),
            "NOT BETWEEN" => Ok(Op::NotBetween),
            _ => Err(SqlError::OperatorUnsupported(keyword.to_string())),
        }
    }

    /// The SQL keyword emitted for this operator.
    pub fn keyword(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::Between => "BETWEEN",
            Op::NotBetween => "NOT BETWEEN",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Op::In | Op::NotIn => Arity::Many,
            Op::Between | Op::NotBetween => Arity::Two,
            _ => Arity::One,
        }
    }

    /// Check an operand count against this operator's arity.
    pub fn check_arity(self, got: usize) -> SqlResult<()> {
        let ok = match self.arity() {
            Arity::One => got == 1,
            Arity::Two => got == 2,
            Arity::Many => true,
        };
        if ok {
            return Ok(());
        }
        let expected = match self.arity() {
            Arity::One => "1",
            Arity::Two => "2",
            Arity::Many => "any",
        };
        Err(SqlError::operand_count(self.keyword(), expected, got))
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Op::parse("in").unwrap(), Op::In);
        assert_eq!(Op::parse("Not Between").unwrap(), Op::NotBetween);
        assert_eq!(Op::parse("  not   in ").unwrap(), Op::NotIn);
        assert_eq!(Op::parse("<>").unwrap(), Op::Ne);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = Op::parse("LIKE").unwrap_err();
        assert!(matches!(err, SqlError::OperatorUnsupported(ref k) if k == "LIKE"));
    }

    #[test]
    fn arity_checks() {
        assert!(Op::Eq.check_arity(1).is_ok());
        assert!(Op::Eq.check_arity(2).is_err());
        assert!(Op::Between.check_arity(2).is_ok());
        assert!(Op::Between.check_arity(3).is_err());
        assert!(Op::In.check_arity(0).is_ok());
        assert!(Op::NotIn.check_arity(7).is_ok());
    }
}

//! Declarative predicate specs.
//!
//! A [`WhereSpec`] is an ordered list of `key -> value` entries. Entry order is
//! preserved all the way into the generated SQL.
//!
//! # Example
//! ```ignore
//! use sqlmark::{OrSpec, WhereSpec};
//!
//! // WHERE `status` = '1' AND (`username` = 'ann' OR `email` = 'ann')
//! let spec = WhereSpec::new()
//!     .eq("status", 1)
//!     .or_group(OrSpec::new().any("username", ["ann"]).any("email", ["ann"]));
//! ```
//!
//! The same shape can be read from JSON produced by an outer layer with
//! [`WhereSpec::from_json`]:
//!
//! ```ignore
//! let spec = WhereSpec::from_json(&serde_json::json!({
//!     "status": 1,
//!     "id": ["IN", [2, 3, 4]],
//!     "0": { "username": ["ann"], "email": ["ann"] }
//! }))?;
//! ```

use crate::error::{SqlError, SqlResult};
use crate::marker::Token;
use serde_json::Value as JsonValue;

/// How an entry is joined to the entries before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Join {
    #[default]
    And,
    Or,
}

impl Join {
    pub fn keyword(self) -> &'static str {
        match self {
            Join::And => "AND",
            Join::Or => "OR",
        }
    }
}

/// One operand of an operator call: a single token or a list of tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Token(Token),
    List(Vec<Token>),
}

impl From<Token> for Operand {
    fn from(value: Token) -> Self {
        Operand::Token(value)
    }
}

impl From<Vec<Token>> for Operand {
    fn from(values: Vec<Token>) -> Self {
        Operand::List(values)
    }
}

impl Operand {
    /// Build a single-token operand.
    pub fn token(value: impl Into<Token>) -> Self {
        Operand::Token(value.into())
    }

    /// Build a list operand.
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        Operand::List(values.into_iter().map(Into::into).collect())
    }
}

/// The value side of a spec entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecValue {
    /// `column = value`
    Scalar(Token),
    /// `[operator, operand...]`
    Call { op: String, operands: Vec<Operand> },
    /// A nested OR combination.
    OrGroup(OrSpec),
    /// SQL with `?` placeholders, each replaced by a quoted argument.
    Template { sql: String, args: Vec<Token> },
}

/// One `key -> value` entry of a [`WhereSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecEntry {
    pub join: Join,
    pub key: Token,
    pub value: SpecValue,
}

/// Ordered predicate spec compiled into a WHERE clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereSpec {
    entries: Vec<SpecEntry>,
}

impl WhereSpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append an entry joined with `AND`.
    pub fn push(&mut self, key: Token, value: SpecValue) {
        self.push_with(Join::And, key, value);
    }

    /// Append an entry with an explicit join.
    pub fn push_with(&mut self, join: Join, key: Token, value: SpecValue) {
        self.entries.push(SpecEntry { join, key, value });
    }

    fn with(mut self, join: Join, key: Token, value: SpecValue) -> Self {
        self.push_with(join, key, value);
        self
    }

    /// `column = value`. The column string may carry a marker (`"DATE(at)|q"`);
    /// a string value is always a literal unless built with [`Token::value`].
    pub fn eq(self, column: &str, value: impl Into<Token>) -> Self {
        self.with(Join::And, Token::column(column), SpecValue::Scalar(value.into()))
    }

    /// `OR column = value`
    pub fn or_eq(self, column: &str, value: impl Into<Token>) -> Self {
        self.with(Join::Or, Token::column(column), SpecValue::Scalar(value.into()))
    }

    /// `[operator, operand...]` entry; the operator is checked at compile time.
    pub fn call<I, T>(self, column: &str, op: &str, operands: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Operand>,
    {
        let value = SpecValue::Call {
            op: op.to_string(),
            operands: operands.into_iter().map(Into::into).collect(),
        };
        self.with(Join::And, Token::column(column), value)
    }

    /// `column op value` for the comparison operators.
    pub fn cmp(self, column: &str, op: &str, value: impl Into<Token>) -> Self {
        self.call(column, op, [Operand::Token(value.into())])
    }

    /// `column IN (values...)`
    pub fn in_list<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        self.call(column, "IN", [Operand::list(values)])
    }

    /// `column NOT IN (values...)`
    pub fn not_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        self.call(column, "NOT IN", [Operand::list(values)])
    }

    /// `column BETWEEN from AND to`
    pub fn between(self, column: &str, from: impl Into<Token>, to: impl Into<Token>) -> Self {
        self.call(
            column,
            "BETWEEN",
            [Operand::Token(from.into()), Operand::Token(to.into())],
        )
    }

    /// `column NOT BETWEEN from AND to`
    pub fn not_between(self, column: &str, from: impl Into<Token>, to: impl Into<Token>) -> Self {
        self.call(
            column,
            "NOT BETWEEN",
            [Operand::Token(from.into()), Operand::Token(to.into())],
        )
    }

    /// Splice a parenthesized OR combination, joined with `AND`.
    pub fn or_group(self, group: OrSpec) -> Self {
        self.with(Join::And, Token::blank(), SpecValue::OrGroup(group))
    }

    /// Splice a parenthesized OR combination, joined with `OR`.
    pub fn or_else_group(self, group: OrSpec) -> Self {
        self.with(Join::Or, Token::blank(), SpecValue::OrGroup(group))
    }

    /// Add a template with `?` placeholders.
    ///
    /// The template text is emitted verbatim. Only the arguments are quoted.
    pub fn template<I, T>(self, sql: &str, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        let value = SpecValue::Template {
            sql: sql.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        };
        self.with(Join::And, Token::blank(), value)
    }

    /// Add a raw predicate, emitted verbatim.
    pub fn raw(self, sql: &str) -> Self {
        self.with(Join::And, Token::blank(), SpecValue::Scalar(Token::raw(sql)))
    }

    /// Read a spec from a JSON object.
    ///
    /// - keys are column names, optionally marker-suffixed;
    /// - scalar values are equality predicates (strings may carry markers);
    /// - arrays are `[operator, operand...]` where an operand may itself be an array;
    /// - a purely numeric key with an object value is an OR group (see [`OrSpec::from_json`]).
    pub fn from_json(value: &JsonValue) -> SqlResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| SqlError::validation("Where spec must be a JSON object"))?;

        let mut spec = WhereSpec::new();
        for (key, value) in obj {
            if is_numeric_key(key) && !is_scalar(value) {
                let group = OrSpec::from_json(value)?;
                spec.push(Token::blank(), SpecValue::OrGroup(group));
                continue;
            }
            let entry = match value {
                JsonValue::Array(items) => {
                    let (op, operands) = call_from_json(key, items)?;
                    SpecValue::Call { op, operands }
                }
                JsonValue::Object(_) => {
                    return Err(SqlError::validation(format!(
                        "Nested object under column '{key}' is not a predicate"
                    )));
                }
                scalar => SpecValue::Scalar(token_from_json(scalar)?),
            };
            spec.push(Token::column(key), entry);
        }
        Ok(spec)
    }
}

/// One alternative inside an [`OrSpec`] column list.
#[derive(Debug, Clone, PartialEq)]
pub enum OrItem {
    /// `column = value`
    Value(Token),
    /// `column op operand...`
    Call { op: String, operands: Vec<Operand> },
    /// A nested spec compiled as an AND sub-expression.
    All(WhereSpec),
}

/// A column's entry in an [`OrSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrEntry {
    /// Alternatives joined with `OR`.
    Any(Vec<OrItem>),
    /// A plain value; collected into the `AND` part.
    All(SpecValue),
}

/// An OR combination: `column -> [alternatives...]`.
///
/// Plain (non-list) values are gathered into a separate `AND` part that is
/// combined as `(or-part OR and-part)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrSpec {
    entries: Vec<(Token, OrEntry)>,
}

impl OrSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(Token, OrEntry)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, column: Token, entry: OrEntry) {
        self.entries.push((column, entry));
    }

    /// `column = v1 OR column = v2 ...`
    pub fn any<I, T>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        let items = values.into_iter().map(|v| OrItem::Value(v.into())).collect();
        self.push(Token::column(column), OrEntry::Any(items));
        self
    }

    /// Alternatives given as explicit [`OrItem`]s.
    pub fn any_of(mut self, column: &str, items: Vec<OrItem>) -> Self {
        self.push(Token::column(column), OrEntry::Any(items));
        self
    }

    /// A value for the `AND` part.
    pub fn all(mut self, column: &str, value: impl Into<Token>) -> Self {
        self.push(Token::column(column), OrEntry::All(SpecValue::Scalar(value.into())));
        self
    }

    /// Read an OR group from a JSON object of `column -> [alternatives...]`.
    ///
    /// Array items are values, `[operator, ...]` arrays, or nested objects
    /// (AND sub-expressions). Non-array values go to the `AND` part.
    pub fn from_json(value: &JsonValue) -> SqlResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| SqlError::validation("OR group must be a JSON object"))?;

        let mut spec = OrSpec::new();
        for (column, value) in obj {
            let entry = match value {
                JsonValue::Array(items) => {
                    let items = items
                        .iter()
                        .map(or_item_from_json)
                        .collect::<SqlResult<Vec<_>>>()?;
                    OrEntry::Any(items)
                }
                JsonValue::Object(_) => {
                    return Err(SqlError::validation(format!(
                        "Nested object under OR column '{column}' must be wrapped in a list"
                    )));
                }
                scalar => OrEntry::All(SpecValue::Scalar(token_from_json(scalar)?)),
            };
            spec.push(Token::column(column), entry);
        }
        Ok(spec)
    }
}

fn or_item_from_json(item: &JsonValue) -> SqlResult<OrItem> {
    match item {
        JsonValue::Object(_) => Ok(OrItem::All(WhereSpec::from_json(item)?)),
        JsonValue::Array(items) => {
            let (op, operands) = call_from_json("OR item", items)?;
            Ok(OrItem::Call { op, operands })
        }
        scalar => Ok(OrItem::Value(token_from_json(scalar)?)),
    }
}

fn call_from_json(key: &str, items: &[JsonValue]) -> SqlResult<(String, Vec<Operand>)> {
    let (op, rest) = items
        .split_first()
        .ok_or_else(|| SqlError::validation(format!("Empty operator list for '{key}'")))?;
    let op = op.as_str().ok_or_else(|| {
        SqlError::validation(format!("Operator for '{key}' must be a string"))
    })?;

    let operands = rest
        .iter()
        .map(|operand| match operand {
            JsonValue::Array(list) => list
                .iter()
                .map(token_from_json)
                .collect::<SqlResult<Vec<_>>>()
                .map(Operand::List),
            other => token_from_json(other).map(Operand::Token),
        })
        .collect::<SqlResult<Vec<_>>>()?;

    Ok((op.to_string(), operands))
}

/// Convert a JSON scalar into a value token.
pub(crate) fn token_from_json(value: &JsonValue) -> SqlResult<Token> {
    match value {
        JsonValue::Null => Ok(Token::null()),
        JsonValue::Bool(b) => Ok(Token::from(*b)),
        JsonValue::Number(n) => Ok(Token::value(&n.to_string())),
        JsonValue::String(s) => Ok(Token::value(s)),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(SqlError::validation(format!(
            "Expected a scalar value, got {value}"
        ))),
    }
}

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn is_scalar(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Classification;
    use serde_json::json;

    #[test]
    fn builder_keeps_insertion_order() {
        let spec = WhereSpec::new().eq("b", 1).eq("a", 2).in_list("c", [1, 2]);
        let keys: Vec<_> = spec.entries().iter().map(|e| e.key.text()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn from_json_reads_scalars_and_calls() {
        let spec = WhereSpec::from_json(&json!({
            "status": 1,
            "id": ["IN", [2, 3, 4]],
            "created_at|q": "NOW()|q"
        }))
        .unwrap();

        assert_eq!(spec.len(), 3);
        assert_eq!(
            spec.entries()[0].value,
            SpecValue::Scalar(Token::value("1"))
        );
        match &spec.entries()[1].value {
            SpecValue::Call { op, operands } => {
                assert_eq!(op, "IN");
                assert_eq!(operands.len(), 1);
                assert!(matches!(&operands[0], Operand::List(l) if l.len() == 3));
            }
            other => panic!("expected call, got {other:?}"),
        }
        assert_eq!(
            spec.entries()[2].key.classification(),
            Classification::RawQuery
        );
    }

    #[test]
    fn from_json_numeric_key_is_or_group() {
        let spec = WhereSpec::from_json(&json!({
            "0": { "username": ["a@x.com"], "email": ["a@x.com"] }
        }))
        .unwrap();
        assert!(matches!(&spec.entries()[0].value, SpecValue::OrGroup(g) if g.entries().len() == 2));
        assert!(spec.entries()[0].key.is_blank());
    }

    #[test]
    fn from_json_numeric_key_with_scalar_is_a_column() {
        let spec = WhereSpec::from_json(&json!({ "1": 1 })).unwrap();
        assert_eq!(spec.entries()[0].key.text(), "1");
        assert!(matches!(spec.entries()[0].value, SpecValue::Scalar(_)));
    }

    #[test]
    fn from_json_rejects_bad_shapes() {
        assert!(WhereSpec::from_json(&json!([1, 2])).is_err());
        assert!(WhereSpec::from_json(&json!({ "a": [] })).is_err());
        assert!(WhereSpec::from_json(&json!({ "a": [1, 2] })).is_err());
        assert!(WhereSpec::from_json(&json!({ "a": { "b": 1 } })).is_err());
    }

    #[test]
    fn or_spec_from_json_mixed_items() {
        let group = OrSpec::from_json(&json!({
            "username": ["ann", { "email": "ann", "active": 1 }, [">=", 3]],
            "status": 1
        }))
        .unwrap();
        match &group.entries()[0].1 {
            OrEntry::Any(items) => {
                assert!(matches!(items[0], OrItem::Value(_)));
                assert!(matches!(&items[1], OrItem::All(s) if s.len() == 2));
                assert!(matches!(&items[2], OrItem::Call { op, .. } if op == ">="));
            }
            other => panic!("expected alternatives, got {other:?}"),
        }
        assert!(matches!(group.entries()[1].1, OrEntry::All(_)));
    }
}

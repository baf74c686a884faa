//! Suffix markers and token classification.
//!
//! Callers may annotate a key or value string with a trailing marker made of the
//! separator `|` and a one-letter code:
//!
//! | code | meaning |
//! |------|---------|
//! | `q`  | raw SQL, inserted verbatim |
//! | `v`  | forced literal, always single-quoted |
//! | `b`  | blank, the position contributes nothing of its own |
//! | `c`  | column reference, backtick-quoted instead of single-quoted |
//!
//! Only a marker at the very tail of the string counts: `"a|qb"` is a plain
//! token, `"a|x|q"` is raw SQL `a|x`.
//!
//! Markers are parsed exactly once, when a [`Token`] is built through
//! [`Token::parse`], [`Token::column`], [`Token::value`] or JSON input. The
//! `From` conversions for strings never parse markers, so a plain string
//! value is always a quoted literal. The compiler never looks at marker
//! strings again.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use std::fmt;

/// Separator between a token and its marker code.
pub const MARKER_SEPARATOR: char = '|';

/// A recognised marker code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `|q`: raw query/expression passthrough.
    Raw,
    /// `|v`: forced literal.
    Literal,
    /// `|b`: blank position.
    Blank,
    /// `|c`: `table.column` reference used as a value.
    ColumnRef,
}

impl Marker {
    /// Parse a marker code letter.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'q' => Some(Marker::Raw),
            b'v' => Some(Marker::Literal),
            b'b' => Some(Marker::Blank),
            b'c' => Some(Marker::ColumnRef),
            _ => None,
        }
    }

    /// The code letter for this marker.
    pub fn code(self) -> char {
        match self {
            Marker::Raw => 'q',
            Marker::Literal => 'v',
            Marker::Blank => 'b',
            Marker::ColumnRef => 'c',
        }
    }
}

/// Where a token appears in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Left-hand side: a column name or expression.
    Column,
    /// Right-hand side: a value or operand.
    Value,
}

/// How a token is rendered into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Unmarked key: backtick-quoted identifier.
    NormalColumn,
    /// Unmarked value: escaped, single-quoted literal.
    NormalValue,
    /// Inserted verbatim, never quoted or escaped.
    RawQuery,
    /// Single-quoted even in column position.
    ForcedLiteral,
    /// Contributes nothing; only the paired side is emitted.
    BlankColumn,
    /// A value that is really an identifier; backtick-quoted.
    ColumnReference,
}

impl Classification {
    fn from_marker(marker: Option<Marker>, position: Position) -> Self {
        match (marker, position) {
            (None, Position::Column) => Classification::NormalColumn,
            (None, Position::Value) => Classification::NormalValue,
            (Some(Marker::Raw), _) => Classification::RawQuery,
            (Some(Marker::Literal), _) => Classification::ForcedLiteral,
            (Some(Marker::Blank), _) => Classification::BlankColumn,
            // A column reference in column position is just a column.
            (Some(Marker::ColumnRef), Position::Column) => Classification::NormalColumn,
            (Some(Marker::ColumnRef), Position::Value) => Classification::ColumnReference,
        }
    }

    /// Whether this classification renders as a backtick-quoted identifier.
    pub fn is_identifier(self) -> bool {
        matches!(
            self,
            Classification::NormalColumn | Classification::ColumnReference
        )
    }

    /// Whether this classification renders as a single-quoted literal.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Classification::NormalValue | Classification::ForcedLiteral
        )
    }
}

/// Split a trailing marker off a raw token string.
///
/// Returns the unmarked text and the marker, if the string ends in a
/// recognised `|x` suffix.
pub fn split_marker(token: &str) -> (&str, Option<Marker>) {
    let bytes = token.as_bytes();
    let len = bytes.len();
    if len >= 2 && bytes[len - 2] == MARKER_SEPARATOR as u8 {
        if let Some(marker) = Marker::from_code(bytes[len - 1]) {
            // Both trailing bytes are ASCII, so `len - 2` is a char boundary.
            return (&token[..len - 2], Some(marker));
        }
    }
    (token, None)
}

/// Classify a raw token string found at `position`.
///
/// Pure function: returns the unmarked text and its classification.
pub fn classify(token: &str, position: Position) -> (&str, Classification) {
    let (clean, marker) = split_marker(token);
    (clean, Classification::from_marker(marker, position))
}

/// A classified key or value fragment.
///
/// The text never contains the marker suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    text: String,
    class: Classification,
    null: bool,
}

impl Token {
    fn new(text: impl Into<String>, class: Classification) -> Self {
        Self {
            text: text.into(),
            class,
            null: false,
        }
    }

    /// Parse a marker-annotated string found at `position`.
    pub fn parse(token: &str, position: Position) -> Self {
        let (clean, class) = classify(token, position);
        Self::new(clean, class)
    }

    /// Parse a key string (column position).
    pub fn column(name: &str) -> Self {
        Self::parse(name, Position::Column)
    }

    /// Parse a value string (value position).
    pub fn value(text: &str) -> Self {
        Self::parse(text, Position::Value)
    }

    /// A raw SQL fragment, inserted verbatim.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Classification::RawQuery)
    }

    /// A literal that is never interpreted as a marker.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(text, Classification::ForcedLiteral)
    }

    /// A `table.column` reference in value position.
    pub fn column_ref(name: impl Into<String>) -> Self {
        Self::new(name, Classification::ColumnReference)
    }

    /// A position that contributes nothing.
    pub fn blank() -> Self {
        Self::new(String::new(), Classification::BlankColumn)
    }

    /// SQL `NULL`.
    pub fn null() -> Self {
        Self {
            text: "NULL".to_string(),
            class: Classification::RawQuery,
            null: true,
        }
    }

    /// The unmarked text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn classification(&self) -> Classification {
        self.class
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    pub fn is_blank(&self) -> bool {
        self.class == Classification::BlankColumn
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// Plain string values are data. Use `Token::value` to opt into markers.
impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::new(value, Classification::NormalValue)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::new(value, Classification::NormalValue)
    }
}

impl From<&String> for Token {
    fn from(value: &String) -> Self {
        Token::new(value.as_str(), Classification::NormalValue)
    }
}

macro_rules! impl_token_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Token {
                fn from(value: $ty) -> Self {
                    Token::new(value.to_string(), Classification::NormalValue)
                }
            }
        )*
    };
}

impl_token_from_display!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl From<bool> for Token {
    fn from(value: bool) -> Self {
        Token::new(if value { "1" } else { "0" }, Classification::NormalValue)
    }
}

impl From<NaiveDate> for Token {
    fn from(value: NaiveDate) -> Self {
        Token::new(
            value.format("%Y-%m-%d").to_string(),
            Classification::NormalValue,
        )
    }
}

impl From<NaiveDateTime> for Token {
    fn from(value: NaiveDateTime) -> Self {
        Token::new(
            value.format("%Y-%m-%d %H:%M:%S").to_string(),
            Classification::NormalValue,
        )
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Token {
    fn from(value: DateTime<Tz>) -> Self {
        Token::from(value.naive_utc())
    }
}

impl From<uuid::Uuid> for Token {
    fn from(value: uuid::Uuid) -> Self {
        Token::new(value.hyphenated().to_string(), Classification::NormalValue)
    }
}

impl<T: Into<Token>> From<Option<T>> for Token {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Token::null(),
        }
    }
}

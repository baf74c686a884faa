//! Compiled predicate tree.
//!
//! Everything in here is already rendered: identifiers are quoted, literals are
//! escaped. Building the final clause cannot fail.

use crate::operator::Op;
use crate::spec::Join;

/// One `column op operand...` comparison with rendered fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Rendered left-hand side; `None` for a blank column.
    pub column: Option<String>,
    pub op: Op,
    /// Rendered operands; `None` entries mark `NULL`.
    pub operands: Vec<Option<String>>,
}

impl Predicate {
    pub fn new(column: Option<String>, op: Op, operands: Vec<Option<String>>) -> Self {
        Self {
            column,
            op,
            operands,
        }
    }

    /// Render this predicate as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        match self.op {
            Op::In | Op::NotIn => {
                if self.operands.is_empty() {
                    // Empty IN list - always false / true
                    out.push_str(if self.op == Op::In { "1=0" } else { "1=1" });
                    return;
                }
                self.write_lhs(out);
                out.push_str(" (");
                for (i, operand) in self.operands.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(operand.as_deref().unwrap_or("NULL"));
                }
                out.push(')');
            }
            Op::Between | Op::NotBetween => {
                self.write_lhs(out);
                out.push(' ');
                out.push_str(self.operand(0));
                out.push_str(" AND ");
                out.push_str(self.operand(1));
            }
            Op::Eq | Op::Ne if self.operands.first().is_some_and(Option::is_none) => {
                if let Some(column) = &self.column {
                    out.push_str(column);
                    out.push(' ');
                }
                out.push_str(if self.op == Op::Eq {
                    "IS NULL"
                } else {
                    "IS NOT NULL"
                });
            }
            _ => {
                self.write_lhs(out);
                let operand = self.operand(0);
                if !operand.is_empty() {
                    out.push(' ');
                    out.push_str(operand);
                }
            }
        }
    }

    fn operand(&self, idx: usize) -> &str {
        match self.operands.get(idx) {
            Some(Some(s)) => s,
            Some(None) => "NULL",
            None => "",
        }
    }

    fn write_lhs(&self, out: &mut String) {
        if let Some(column) = &self.column {
            out.push_str(column);
            out.push(' ');
        }
        out.push_str(self.op.keyword());
    }
}

/// A node of a [`PredicateGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Predicate(Predicate),
    /// Nested group, parenthesized when rendered.
    Group(PredicateGroup),
    /// Pre-rendered fragment (raw SQL, templates, bare values).
    Fragment(String),
}

impl Node {
    fn write_sql(&self, out: &mut String) {
        match self {
            Node::Predicate(p) => p.write_sql(out),
            Node::Group(g) => {
                out.push('(');
                g.write_sql(out);
                out.push(')');
            }
            Node::Fragment(s) => out.push_str(s),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Node::Group(g) => g.is_empty(),
            Node::Fragment(s) => s.is_empty(),
            Node::Predicate(_) => false,
        }
    }
}

/// An ordered AND/OR combination of predicates and nested groups.
///
/// The root group renders without parentheses; nested groups are wrapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateGroup {
    nodes: Vec<(Join, Node)>,
    voided: bool,
}

impl PredicateGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group that stands for a statement which must not run.
    pub fn voided() -> Self {
        Self {
            nodes: Vec::new(),
            voided: true,
        }
    }

    pub(crate) fn push(&mut self, join: Join, node: Node) {
        if !node.is_empty() {
            self.nodes.push((join, node));
        }
    }

    pub fn nodes(&self) -> &[(Join, Node)] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether an injection guard voided this group.
    pub fn is_voided(&self) -> bool {
        self.voided
    }

    /// Render the boolean expression without a `WHERE` prefix.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    fn write_sql(&self, out: &mut String) {
        for (i, (join, node)) in self.nodes.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                out.push_str(join.keyword());
                out.push(' ');
            }
            node.write_sql(out);
        }
    }

    /// Render as a parenthesized expression, or an empty string if empty.
    pub fn to_parenthesized(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("({})", self.to_sql())
    }

    /// Render `WHERE ...`, or an empty string if there are no predicates.
    pub fn to_where_clause(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("WHERE {}", self.to_sql())
    }
}

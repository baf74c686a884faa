//! Predicate compiler.
//!
//! Turns a [`WhereSpec`] into a [`PredicateGroup`]:
//!
//! - entries are emitted in insertion order and joined with their [`Join`];
//! - a scalar value is `column = value`;
//! - `[operator, operand...]` is resolved through [`Op`], with one level of
//!   operand lists flattened;
//! - OR groups become a single parenthesized expression;
//! - templates have their `?` placeholders replaced by quoted arguments.
//!
//! Compilation is pure. Each call builds and returns its own tree; nothing is
//! kept between calls, so sub-queries can be compiled while an outer query is
//! being assembled.
//!
//! # Example
//! ```ignore
//! use sqlmark::{compile_where, WhereSpec};
//!
//! let spec = WhereSpec::new().eq("status", 1).in_list("id", [2, 3, 4]);
//! assert_eq!(
//!     compile_where(&spec)?.to_where_clause(),
//!     "WHERE `status` = '1' AND `id` IN ('2','3','4')"
//! );
//! ```

mod expr;


pub use expr::{Node, Predicate, PredicateGroup};

use crate::error::{SqlError, SqlResult};
use crate::marker::Token;
use crate::operator::Op;
use crate::quote::{Escape, MysqlEscape, guard_raw, render_token};
use crate::spec::{Join, Operand, OrEntry, OrItem, OrSpec, SpecValue, WhereSpec};

/// What to do when a fragment fails the injection guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjectionPolicy {
    /// Raise [`SqlError::InjectionSuspected`].
    #[default]
    Raise,
    /// Compile the whole predicate set to a voided group; the statement is never run.
    VoidQuery,
}

/// Compile a spec with MySQL escaping and the default injection policy.
pub fn compile_where(spec: &WhereSpec) -> SqlResult<PredicateGroup> {
    Compiler::new(&MysqlEscape).compile_where(spec)
}

/// Compile an OR combination into a parenthesized expression.
pub fn compile_or_group(spec: &OrSpec) -> SqlResult<String> {
    Compiler::new(&MysqlEscape).compile_or_group(spec)
}

/// Predicate compiler bound to a driver's escaping routine.
pub struct Compiler<'a, E: Escape + ?Sized> {
    escaper: &'a E,
    policy: InjectionPolicy,
}

impl<'a, E: Escape + ?Sized> Compiler<'a, E> {
    pub fn new(escaper: &'a E) -> Self {
        Self {
            escaper,
            policy: InjectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InjectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> InjectionPolicy {
        self.policy
    }

    /// Compile a spec into a predicate group.
    pub fn compile_where(&self, spec: &WhereSpec) -> SqlResult<PredicateGroup> {
        match self.build_where(spec) {
            Err(SqlError::InjectionSuspected(fragment))
                if self.policy == InjectionPolicy::VoidQuery =>
            {
                tracing::warn!(
                    target: "sqlmark.sql",
                    fragment = %fragment,
                    "unescaped quote in fragment, predicate set voided"
                );
                Ok(PredicateGroup::voided())
            }
            other => other,
        }
    }

    /// Compile an OR combination into a parenthesized expression.
    ///
    /// Returns an empty string for an empty spec, or when the group was voided.
    pub fn compile_or_group(&self, spec: &OrSpec) -> SqlResult<String> {
        match self.build_or_group(spec) {
            Ok(group) => Ok(group.to_parenthesized()),
            Err(SqlError::InjectionSuspected(fragment))
                if self.policy == InjectionPolicy::VoidQuery =>
            {
                tracing::warn!(
                    target: "sqlmark.sql",
                    fragment = %fragment,
                    "unescaped quote in fragment, OR group voided"
                );
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Render a single token the way predicates render it.
    pub fn render(&self, token: &Token) -> SqlResult<String> {
        if token.is_null() {
            return Ok("NULL".to_string());
        }
        render_token(token, self.escaper)
    }

    fn build_where(&self, spec: &WhereSpec) -> SqlResult<PredicateGroup> {
        let mut group = PredicateGroup::new();
        for entry in spec.entries() {
            let node = self.build_entry(&entry.key, &entry.value)?;
            group.push(entry.join, node);
        }
        Ok(group)
    }

    fn build_entry(&self, key: &Token, value: &SpecValue) -> SqlResult<Node> {
        match value {
            SpecValue::Scalar(token) => self.scalar_node(key, token),
            SpecValue::Call { op, operands } => {
                self.call_predicate(key, op, operands).map(Node::Predicate)
            }
            SpecValue::OrGroup(group) => self.build_or_group(group).map(Node::Group),
            SpecValue::Template { sql, args } => {
                let rendered = self.render_template(sql, args)?;
                match self.lhs(key)? {
                    Some(column) => Ok(Node::Fragment(format!("{column} {rendered}"))),
                    None => Ok(Node::Fragment(rendered)),
                }
            }
        }
    }

    fn build_or_group(&self, spec: &OrSpec) -> SqlResult<PredicateGroup> {
        let mut any = Vec::new();
        let mut all = Vec::new();

        for (column, entry) in spec.entries() {
            match entry {
                OrEntry::Any(items) => {
                    for item in items {
                        let node = match item {
                            OrItem::Value(token) => self.scalar_node(column, token)?,
                            OrItem::Call { op, operands } => {
                                Node::Predicate(self.call_predicate(column, op, operands)?)
                            }
                            OrItem::All(sub) => Node::Group(self.build_where(sub)?),
                        };
                        any.push(node);
                    }
                }
                OrEntry::All(value) => all.push(self.build_entry(column, value)?),
            }
        }

        let mut group = PredicateGroup::new();
        for node in any {
            group.push(Join::Or, node);
        }
        // (or-part OR and-part): the first AND node hangs off the OR chain.
        let mut join = Join::Or;
        for node in all {
            let before = group.len();
            group.push(join, node);
            if group.len() > before {
                join = Join::And;
            }
        }
        Ok(group)
    }

    fn scalar_node(&self, key: &Token, value: &Token) -> SqlResult<Node> {
        let column = self.lhs(key)?;
        if value.is_blank() {
            return Ok(Node::Fragment(column.unwrap_or_default()));
        }
        match column {
            Some(column) => Ok(Node::Predicate(Predicate::new(
                Some(column),
                Op::Eq,
                vec![self.operand(value)?],
            ))),
            None => self.render(value).map(Node::Fragment),
        }
    }

    fn call_predicate(&self, key: &Token, op: &str, operands: &[Operand]) -> SqlResult<Predicate> {
        let op = Op::parse(op)?;
        let flat = flatten(operands);
        op.check_arity(flat.len())?;

        let column = self.lhs(key)?;
        let rendered = flat
            .into_iter()
            .map(|token| self.operand(token))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(Predicate::new(column, op, rendered))
    }

    fn render_template(&self, sql: &str, args: &[Token]) -> SqlResult<String> {
        let expected = sql.matches('?').count();
        if expected != args.len() {
            return Err(SqlError::ArgumentCountMismatch {
                expected,
                got: args.len(),
            });
        }
        guard_raw(sql)?;

        let mut out = String::with_capacity(sql.len() + args.len() * 8);
        let mut args = args.iter();
        for ch in sql.chars() {
            if ch != '?' {
                out.push(ch);
            } else if let Some(arg) = args.next() {
                out.push_str(&self.render(arg)?);
            }
        }
        Ok(out)
    }

    fn lhs(&self, key: &Token) -> SqlResult<Option<String>> {
        if key.is_blank() {
            return Ok(None);
        }
        self.render(key).map(Some)
    }

    fn operand(&self, token: &Token) -> SqlResult<Option<String>> {
        if token.is_null() {
            return Ok(None);
        }
        render_token(token, self.escaper).map(Some)
    }
}

/// Flatten one level of operand lists.
fn flatten(operands: &[Operand]) -> Vec<&Token> {
    operands
        .iter()
        .flat_map(|operand| match operand {
            Operand::Token(token) => std::slice::from_ref(token).iter(),
            Operand::List(list) => list.iter(),
        })
        .collect()
}

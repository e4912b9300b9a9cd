//! # Intermediate Query Module
//!
//! The structured, pre-SQL representation of select, insert, update and
//! delete statements. The query builder produces these values and the
//! formatter renders them; nothing here talks to a database.
//!
//! A [`Query`] is a plain snapshot: it is built fresh for every call and
//! never shared between calls, so hooks are free to rewrite it.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{fmt, str::FromStr};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{errors::Error, value::Value};

// ============================================================================
// Terms
// ============================================================================

/// An expression inside a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// SQL `NULL`.
    Null,
    /// A column, optionally qualified by a table alias.
    Field { table: Option<String>, field: String },
    /// Raw SQL text, inserted verbatim. The caller is trusted.
    AsIs(String),
    /// A function call, `FUNC(arg1, arg2, ...)`.
    Func { func: String, args: Vec<Term> },
    /// A literal, escaped by the dialect.
    Value(Value),
    /// A parenthesized list of terms, used on the right of `IN`.
    List(Vec<Term>),
    /// A sub-query, used on the right of `IN_QUERY`.
    Query(Box<Query>),
}

impl Term {
    /// A column qualified by a table alias.
    pub fn field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Term::Field {
            table: Some(table.into()),
            field: field.into(),
        }
    }

    /// An unqualified column.
    pub fn column(field: impl Into<String>) -> Self {
        Term::Field {
            table: None,
            field: field.into(),
        }
    }

    /// An escaped literal.
    pub fn value(value: impl Into<Value>) -> Self {
        Term::Value(value.into())
    }

    /// Verbatim SQL text.
    pub fn as_is(sql: impl Into<String>) -> Self {
        Term::AsIs(sql.into())
    }

    /// A function call.
    pub fn func(func: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Func {
            func: func.into(),
            args,
        }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Term::Null,
            other => Term::Value(other),
        }
    }
}

// ============================================================================
// Operators and Conditions
// ============================================================================

/// Operators understood by the condition grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    In,
    NotIn,
    /// Unary `NOT lhs`; the right-hand side is ignored.
    Not,
    /// `lhs BETWEEN a AND b`; the right-hand side is a two-term list.
    Between,
    /// `lhs IN (sub-query)`.
    InQuery,
}

impl Operator {
    /// The SQL keyword or symbol.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
            Operator::In | Operator::InQuery => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Not => "NOT",
            Operator::Between => "BETWEEN",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_uppercase().as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::NotEq,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "LIKE" => Operator::Like,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "NOT" => Operator::Not,
            "BETWEEN" => Operator::Between,
            "IN_QUERY" => Operator::InQuery,
            _ => return Err(Error::invalid_argument(format!("unknown operator '{}'", s))),
        };
        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single `lhs op rhs` predicate. Conditions in a `WHERE` are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub lhs: Term,
    pub op: Operator,
    pub rhs: Term,
}

impl Condition {
    pub fn new(lhs: Term, op: Operator, rhs: Term) -> Self {
        Self { lhs, op, rhs }
    }
}

// ============================================================================
// Select, From and Order Terms
// ============================================================================

/// A select-list entry with an optional `AS` alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectTerm {
    pub term: Term,
    pub alias: Option<String>,
}

impl SelectTerm {
    pub fn new(term: Term) -> Self {
        Self { term, alias: None }
    }

    pub fn aliased(term: Term, alias: impl Into<String>) -> Self {
        Self {
            term,
            alias: Some(alias.into()),
        }
    }
}

/// The keyword introducing a joined table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    /// Unqualified `JOIN`.
    #[default]
    Plain,
    Left,
    Right,
    Inner,
    Outer,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Plain => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Outer => "OUTER JOIN",
        }
    }
}

/// One table taking part in a statement.
///
/// The first entry of a `FROM` list has no `join`; every following entry is
/// joined with an `ON` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FromEntry {
    pub join: Option<JoinKind>,
    pub table: String,
    pub alias: Option<String>,
    pub on: Option<Condition>,
}

impl FromEntry {
    /// The root table of a statement.
    pub fn table(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            join: None,
            table: table.into(),
            alias: Some(alias.into()),
            on: None,
        }
    }

    /// The name this entry is referred to by: its alias, else the table.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// Sort direction of an order term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Asc,
    Desc,
}

impl Sort {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Sort::Asc => "ASC",
            Sort::Desc => "DESC",
        }
    }
}

/// An `ORDER BY` / `GROUP BY` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub term: Term,
    pub sort: Option<Sort>,
}

/// `LIMIT [offset,] count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    pub offset: Option<u64>,
    pub count: u64,
}

impl Limit {
    pub fn count(count: u64) -> Self {
        Self {
            offset: None,
            count,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

/// The intermediate representation of a `SELECT`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Empty means `SELECT *`.
    pub select: Vec<SelectTerm>,
    /// Deduplicated by alias; the first entry is the root table.
    pub from: Vec<FromEntry>,
    pub conditions: Vec<Condition>,
    pub order_by: Vec<OrderTerm>,
    pub group_by: Vec<OrderTerm>,
    pub limit: Option<Limit>,
    pub distinct: bool,
    /// Orders by the dialect's random function ahead of `order_by`.
    pub random: bool,
}

/// A multi-row `INSERT ... VALUES`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertStatement {
    pub into: String,
    pub fields: Vec<String>,
    /// One entry per row, parallel to `fields`.
    pub values: Vec<Vec<Term>>,
}

/// One `target = value` pair of an `UPDATE ... SET`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Term,
    pub value: Term,
}

/// An `UPDATE ... SET ... WHERE ... LIMIT`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateStatement {
    pub update: Vec<FromEntry>,
    pub set: Vec<Assignment>,
    pub conditions: Vec<Condition>,
    pub limit: Option<Limit>,
}

/// A `DELETE [targets] FROM ... WHERE ... LIMIT`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteStatement {
    /// Explicit delete targets, needed when `from` holds joins.
    pub delete: Vec<FromEntry>,
    pub from: Vec<FromEntry>,
    pub conditions: Vec<Condition>,
    pub limit: Option<Limit>,
}

/// Bare transaction control statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatement {
    Begin,
    Commit,
    Rollback,
}

/// Any statement a connector can run.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(Query),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Control(ControlStatement),
}

impl Statement {
    /// `true` for statements that return rows.
    pub fn returns_rows(&self) -> bool {
        matches!(self, Statement::Query(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_parse_case_insensitively() {
        assert_eq!("like".parse::<Operator>().unwrap(), Operator::Like);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEq);
        assert_eq!("not in".parse::<Operator>().unwrap(), Operator::NotIn);
        assert_eq!("IN_QUERY".parse::<Operator>().unwrap().as_sql(), "IN");
    }

    #[test]
    fn unknown_operator_is_invalid_argument() {
        assert!(matches!("~=".parse::<Operator>(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn from_entry_key_falls_back_to_table() {
        let mut entry = FromEntry::table("users", "U");
        assert_eq!(entry.key(), "U");
        entry.alias = None;
        assert_eq!(entry.key(), "users");
    }
}

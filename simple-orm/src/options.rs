//! # Options Module
//!
//! Typed per-call options for `find`, `insert`, `update` and `delete`.
//!
//! Control settings (`show`, `order_by`, `limit`, ...) are explicit fields, so
//! they can never be mistaken for conditions. Conditions are an ordered list
//! of `(key, value)` pairs where the key is a field name or a dotted path.
//!
//! ## Example
//!
//! ```rust,ignore
//! use simple_orm::{ConditionValue, FindOptions, OrderItem};
//!
//! let options = FindOptions::new()
//!     .show("user.name")
//!     .order_by(OrderItem::desc("id"))
//!     .limit((10, 20))
//!     .filter("user.id", vec![1, 2, 3])
//!     .filter("createdAt", ConditionValue::op(">=", "2024-01-01"));
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{fmt, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    connector::Connector,
    query::{Limit, Sort, Term},
    value::{Row, Value},
};

/// Transforms each result row of a `find`.
pub type RowMapper = Arc<dyn Fn(Row) -> Row + Send + Sync>;

// ============================================================================
// Conditions
// ============================================================================

/// The value side of a condition.
///
/// - `Value` with a scalar compares with `=`, with a list uses `IN`.
/// - `Operator` names the operator explicitly, e.g. `{ ">": 5 }`,
///   `BETWEEN`, `NOT` or `IN_QUERY`. The operator is checked when the query
///   is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Value(Value),
    Operator { op: String, rhs: Term },
}

impl ConditionValue {
    /// An explicit operator with a literal right-hand side.
    pub fn op(op: impl Into<String>, rhs: impl Into<Value>) -> Self {
        ConditionValue::Operator {
            op: op.into(),
            rhs: Term::from(rhs.into()),
        }
    }

    /// An explicit operator with any right-hand term (fields, sub-queries).
    pub fn op_term(op: impl Into<String>, rhs: Term) -> Self {
        ConditionValue::Operator { op: op.into(), rhs }
    }

    /// `BETWEEN low AND high`.
    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::op_term("BETWEEN", Term::List(vec![Term::from(low.into()), Term::from(high.into())]))
    }
}

macro_rules! impl_condition_from {
    ($($t:ty),*) => {
        $(impl From<$t> for ConditionValue {
            fn from(v: $t) -> Self {
                ConditionValue::Value(Value::from(v))
            }
        })*
    };
}

impl_condition_from!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, &str, String,
    chrono::NaiveDateTime, chrono::NaiveDate, uuid::Uuid
);

impl From<Value> for ConditionValue {
    fn from(v: Value) -> Self {
        ConditionValue::Value(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for ConditionValue {
    fn from(v: Vec<T>) -> Self {
        ConditionValue::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for ConditionValue {
    fn from(v: Option<T>) -> Self {
        ConditionValue::Value(Value::from(v))
    }
}

// ============================================================================
// Show, Order and Group
// ============================================================================

/// An entry of the select list requested by `show`/`show_only`.
#[derive(Debug, Clone, PartialEq)]
pub enum Show {
    /// A field name or dotted path.
    Path(String),
    /// A function call over other entries, optionally aliased.
    Func {
        func: String,
        args: Vec<Show>,
        alias: Option<String>,
    },
    /// A literal argument of a function call.
    Value(Value),
    /// Verbatim SQL.
    AsIs(String),
}

impl Show {
    pub fn func(func: impl Into<String>, args: Vec<Show>) -> Self {
        Show::Func {
            func: func.into(),
            args,
            alias: None,
        }
    }

    /// Sets the `AS` alias of a function entry.
    pub fn alias(self, alias: impl Into<String>) -> Self {
        match self {
            Show::Func { func, args, .. } => Show::Func {
                func,
                args,
                alias: Some(alias.into()),
            },
            other => other,
        }
    }
}

impl From<&str> for Show {
    fn from(path: &str) -> Self {
        Show::Path(path.to_string())
    }
}

impl From<String> for Show {
    fn from(path: String) -> Self {
        Show::Path(path)
    }
}

/// An `order_by`/`group_by` entry: a field or dotted path and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub path: String,
    pub sort: Option<Sort>,
}

impl OrderItem {
    pub fn asc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sort: Some(Sort::Asc),
        }
    }

    pub fn desc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sort: Some(Sort::Desc),
        }
    }
}

impl From<&str> for OrderItem {
    fn from(path: &str) -> Self {
        Self {
            path: path.to_string(),
            sort: None,
        }
    }
}

impl From<String> for OrderItem {
    fn from(path: String) -> Self {
        Self { path, sort: None }
    }
}

impl From<u64> for Limit {
    fn from(count: u64) -> Self {
        Limit::count(count)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit {
            offset: Some(offset),
            count,
        }
    }
}

// ============================================================================
// Find Options
// ============================================================================

/// Options of a `find` call.
#[derive(Clone, Default)]
pub struct FindOptions {
    /// Extra select entries, added to the default visible fields.
    pub show: Vec<Show>,
    /// When set, only these entries are selected. An empty list selects `*`.
    pub show_only: Option<Vec<Show>>,
    pub order_by: Vec<OrderItem>,
    pub group_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
    pub random: bool,
    pub select_distinct: bool,
    /// Paths joined even if nothing is selected or filtered through them.
    pub join: Vec<String>,
    /// Runs the query on this connector instead of the model's.
    pub transaction: Option<Arc<dyn Connector>>,
    pub map_row: Option<RowMapper>,
    /// ANDed conditions, keyed by field name or dotted path.
    pub conditions: Vec<(String, ConditionValue)>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(mut self, show: impl Into<Show>) -> Self {
        self.show.push(show.into());
        self
    }

    pub fn show_only<I, S>(mut self, shows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Show>,
    {
        self.show_only = Some(shows.into_iter().map(Into::into).collect());
        self
    }

    pub fn order_by(mut self, item: impl Into<OrderItem>) -> Self {
        self.order_by.push(item.into());
        self
    }

    pub fn group_by(mut self, item: impl Into<OrderItem>) -> Self {
        self.group_by.push(item.into());
        self
    }

    /// A bare count, or an `(offset, count)` pair.
    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn random(mut self) -> Self {
        self.random = true;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.select_distinct = true;
        self
    }

    pub fn join(mut self, path: impl Into<String>) -> Self {
        self.join.push(path.into());
        self
    }

    pub fn transaction(mut self, connector: Arc<dyn Connector>) -> Self {
        self.transaction = Some(connector);
        self
    }

    pub fn map_row<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Row) -> Row + Send + Sync + 'static,
    {
        self.map_row = Some(Arc::new(mapper));
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }
}

impl fmt::Debug for FindOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindOptions")
            .field("show", &self.show)
            .field("show_only", &self.show_only)
            .field("order_by", &self.order_by)
            .field("group_by", &self.group_by)
            .field("limit", &self.limit)
            .field("random", &self.random)
            .field("select_distinct", &self.select_distinct)
            .field("join", &self.join)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Insert, Update and Delete Options
// ============================================================================

/// Options of an `insert` call: one row or many.
///
/// Keys are field names or reference names; a reference name takes the
/// referenced row's primary key value.
#[derive(Clone, Default)]
pub struct InsertOptions {
    pub rows: Vec<Row>,
    pub transaction: Option<Arc<dyn Connector>>,
}

impl InsertOptions {
    pub fn row(row: Row) -> Self {
        Self {
            rows: vec![row],
            transaction: None,
        }
    }

    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            transaction: None,
        }
    }

    pub fn transaction(mut self, connector: Arc<dyn Connector>) -> Self {
        self.transaction = Some(connector);
        self
    }
}

/// The right-hand side of an `UPDATE ... SET` assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Value(Value),
    /// A field or dotted path, joined as needed.
    Path(String),
    Term(Term),
}

macro_rules! impl_set_from {
    ($($t:ty),*) => {
        $(impl From<$t> for SetValue {
            fn from(v: $t) -> Self {
                SetValue::Value(Value::from(v))
            }
        })*
    };
}

impl_set_from!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, &str, String,
    chrono::NaiveDateTime, chrono::NaiveDate, uuid::Uuid, Value
);

impl<T: Into<Value>> From<Option<T>> for SetValue {
    fn from(v: Option<T>) -> Self {
        SetValue::Value(Value::from(v))
    }
}

/// Options of an `update` call.
#[derive(Clone, Default)]
pub struct UpdateOptions {
    pub conditions: Vec<(String, ConditionValue)>,
    pub set: Vec<(String, SetValue)>,
    pub limit: Option<u64>,
    pub transaction: Option<Arc<dyn Connector>>,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn set(mut self, target: impl Into<String>, value: impl Into<SetValue>) -> Self {
        self.set.push((target.into(), value.into()));
        self
    }

    /// Assigns the value of another field or dotted path.
    pub fn set_path(mut self, target: impl Into<String>, path: impl Into<String>) -> Self {
        self.set.push((target.into(), SetValue::Path(path.into())));
        self
    }

    pub fn set_term(mut self, target: impl Into<String>, term: Term) -> Self {
        self.set.push((target.into(), SetValue::Term(term)));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn transaction(mut self, connector: Arc<dyn Connector>) -> Self {
        self.transaction = Some(connector);
        self
    }
}

/// Options of a `delete` call.
#[derive(Clone, Default)]
pub struct DeleteOptions {
    pub conditions: Vec<(String, ConditionValue)>,
    pub limit: Option<u64>,
    pub transaction: Option<Arc<dyn Connector>>,
}

impl DeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn transaction(mut self, connector: Arc<dyn Connector>) -> Self {
        self.transaction = Some(connector);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_become_list_values() {
        let value: ConditionValue = vec![1, 2].into();
        assert_eq!(value, ConditionValue::Value(Value::List(vec![Value::Int(1), Value::Int(2)])));
    }

    #[test]
    fn limit_accepts_count_or_range() {
        let options = FindOptions::new().limit(5u64);
        assert_eq!(options.limit, Some(Limit { offset: None, count: 5 }));
        let options = FindOptions::new().limit((10u64, 5u64));
        assert_eq!(options.limit, Some(Limit { offset: Some(10), count: 5 }));
    }

    #[test]
    fn show_alias_only_applies_to_functions() {
        let show = Show::func("COUNT", vec!["id".into()]).alias("total");
        assert!(matches!(show, Show::Func { alias: Some(ref a), .. } if a == "total"));
        assert_eq!(Show::from("name").alias("x"), Show::Path("name".into()));
    }
}

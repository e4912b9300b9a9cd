//! # Query Builder Module
//!
//! Turns a model plus per-call options into the intermediate statements of
//! [`crate::query`]. Building has no side effect on the model or its schema;
//! the only state is the table list of the statement being built.
//!
//! ## Key Resolution
//!
//! - A key naming a field of the root model is used as is.
//! - Any other key goes through the path resolver, and every hop of the path
//!   is registered as a join exactly once.
//! - Unresolved condition, join and update keys fail with
//!   [`Error::InvalidArgument`]: silently dropping one would widen the
//!   statement. Unresolved show, order and group entries are skipped.
//!
//! ## Example
//!
//! ```rust,ignore
//! let query = schema.model("avatars")?
//!     .query_builder()?
//!     .find_query(&FindOptions::new().filter("user.id", 3))?;
//! assert_eq!(query.from.len(), 2);
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use indexmap::IndexMap;
use log::warn;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    errors::{Error, Result},
    field::Field,
    model::{Model, ModelId},
    options::{ConditionValue, DeleteOptions, FindOptions, InsertOptions, SetValue, Show, UpdateOptions},
    path::{self, ResolvedPath},
    query::{
        Assignment, Condition, DeleteStatement, FromEntry, InsertStatement, Limit, Operator, OrderTerm,
        Query, SelectTerm, Term, UpdateStatement,
    },
    schema::Schema,
    table_list::TableListBuilder,
    value::Value,
};

// ============================================================================
// Condition Grammar
// ============================================================================

/// Builds one condition on `table.field`.
///
/// - a scalar compares with `=`
/// - a list compares with `IN`
/// - an explicit operator is used with its right-hand side
///
/// # Errors
///
/// * [`Error::InvalidArgument`] for an unknown operator, or a `BETWEEN`
///   without exactly two bounds.
///
/// # Example
///
/// ```rust,ignore
/// let c = condition(Some("U"), "age", &ConditionValue::op(">", 5))?;
/// assert_eq!(c.op, Operator::Gt);
/// ```
pub fn condition(table: Option<&str>, field: &str, value: &ConditionValue) -> Result<Condition> {
    let lhs = Term::Field {
        table: table.map(str::to_string),
        field: field.to_string(),
    };

    let condition = match value {
        ConditionValue::Value(Value::List(items)) => Condition::new(
            lhs,
            Operator::In,
            Term::List(items.iter().cloned().map(Term::Value).collect()),
        ),
        ConditionValue::Value(scalar) => Condition::new(lhs, Operator::Eq, Term::Value(scalar.clone())),
        ConditionValue::Operator { op, rhs } => {
            let op: Operator = op.parse()?;
            let rhs = match rhs {
                Term::Value(Value::List(items)) => {
                    Term::List(items.iter().cloned().map(Term::from).collect())
                }
                other => other.clone(),
            };
            if op == Operator::Between && !matches!(&rhs, Term::List(bounds) if bounds.len() == 2) {
                return Err(Error::invalid_argument(format!(
                    "BETWEEN on `{}` needs exactly two bounds",
                    field
                )));
            }
            Condition::new(lhs, op, rhs)
        }
    };

    Ok(condition)
}

// ============================================================================
// Query Builder
// ============================================================================

/// Builds statements rooted at one model of a schema.
pub struct QueryBuilder<'s> {
    schema: &'s Schema,
    model: ModelId,
    prefix: String,
    tables: TableListBuilder,
}

/// A key resolved against the builder's root model.
struct Resolved<'s> {
    alias: String,
    field: &'s Field,
    /// The key crossed at least one join.
    joined: bool,
}

impl<'s> QueryBuilder<'s> {
    /// Creates a builder whose table list holds the root model's table.
    ///
    /// Every alias emitted by the builder is prefixed with `prefix`.
    pub fn new(schema: &'s Schema, model: ModelId, prefix: &str) -> Result<Self> {
        let root = schema.get(model);
        let tables = TableListBuilder::with_tables([FromEntry::table(
            root.name(),
            format!("{}{}", prefix, root.alias()),
        )])?;

        Ok(Self {
            schema,
            model,
            prefix: prefix.to_string(),
            tables,
        })
    }

    fn root(&self) -> &'s Model {
        self.schema.get(self.model)
    }

    /// The prefixed alias of a model.
    pub fn alias_of(&self, model: ModelId) -> String {
        format!("{}{}", self.prefix, self.schema.get(model).alias())
    }

    pub fn root_alias(&self) -> String {
        self.alias_of(self.model)
    }

    /// Tables registered so far.
    pub fn tables(&self) -> &TableListBuilder {
        &self.tables
    }

    /// Registers every hop of a resolved path.
    fn add_path(&mut self, resolved: &ResolvedPath) -> Result<()> {
        for entry in &resolved.path {
            self.tables.add_table(path::join(self.schema, entry, &self.prefix))?;
        }
        Ok(())
    }

    /// Resolves a key: root fields first, then the path resolver.
    fn resolve(&mut self, key: &str) -> Result<Option<Resolved<'s>>> {
        let root = self.root();
        if let Some(field) = root.field(key) {
            return Ok(Some(Resolved {
                alias: self.root_alias(),
                field,
                joined: false,
            }));
        }

        let Some(resolved) = path::follow_references(self.schema, self.model, key) else {
            return Ok(None);
        };
        self.add_path(&resolved)?;

        let last = self.schema.get(resolved.last_model);
        Ok(last.field(&resolved.field).map(|field| Resolved {
            alias: self.alias_of(resolved.last_model),
            field,
            joined: !resolved.is_local(),
        }))
    }

    /// Resolves a key that must exist.
    fn require(&mut self, key: &str, usage: &str) -> Result<Resolved<'s>> {
        self.resolve(key)?.ok_or_else(|| {
            Error::invalid_argument(format!(
                "{} key '{}' matches no field or path of model {}",
                usage,
                key,
                self.root().name()
            ))
        })
    }

    fn conditions(&mut self, conditions: &[(String, ConditionValue)]) -> Result<Vec<Condition>> {
        conditions
            .iter()
            .map(|(key, value)| {
                let resolved = self.require(key, "condition")?;
                condition(Some(&resolved.alias), resolved.field.name(), value)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Select
    // ------------------------------------------------------------------------

    /// Converts a show entry into a select term. `None` means skip it.
    fn show_term(&mut self, show: &Show) -> Result<Option<SelectTerm>> {
        match show {
            Show::Path(key) => {
                let Some(resolved) = self.resolve(key)? else {
                    warn!("show: '{}' does not resolve on {}, skipped", key, self.root().name());
                    return Ok(None);
                };
                if !resolved.field.can_be_shown() {
                    return Err(Error::visibility(format!(
                        "field {} of {} cannot be shown",
                        resolved.field.name(),
                        key
                    )));
                }

                let term = Term::field(resolved.alias, resolved.field.name());
                Ok(Some(if resolved.joined {
                    SelectTerm::aliased(term, key.as_str())
                } else {
                    SelectTerm::new(term)
                }))
            }
            Show::Func { func, args, alias } => {
                let mut terms = Vec::with_capacity(args.len());
                for arg in args {
                    match self.show_term(arg)? {
                        Some(select) => terms.push(select.term),
                        None => return Ok(None),
                    }
                }
                let term = Term::func(func.as_str(), terms);
                Ok(Some(SelectTerm {
                    term,
                    alias: alias.clone(),
                }))
            }
            Show::Value(value) => Ok(Some(SelectTerm::new(Term::from(value.clone())))),
            Show::AsIs(sql) => Ok(Some(SelectTerm::new(Term::as_is(sql.as_str())))),
        }
    }

    fn order_terms(&mut self, items: &[crate::options::OrderItem], usage: &str) -> Result<Vec<OrderTerm>> {
        let mut terms = Vec::new();
        for item in items {
            match self.resolve(&item.path)? {
                Some(resolved) => terms.push(OrderTerm {
                    term: Term::field(resolved.alias, resolved.field.name()),
                    sort: item.sort,
                }),
                None => warn!(
                    "{}: '{}' does not resolve on {}, skipped",
                    usage,
                    item.path,
                    self.root().name()
                ),
            }
        }
        Ok(terms)
    }

    /// Builds the `SELECT` for a `find` call.
    ///
    /// # Errors
    ///
    /// * [`Error::Visibility`] when showing a field that cannot be shown.
    /// * [`Error::InvalidArgument`] for unresolved conditions or joins and
    ///   unknown operators.
    /// * [`Error::Conflict`] when two tables end up with the same alias.
    pub fn find_query(mut self, options: &FindOptions) -> Result<Query> {
        let root_alias = self.root_alias();
        let root = self.root();

        let mut select: Vec<SelectTerm> = match &options.show_only {
            Some(_) => Vec::new(),
            None => root
                .fields()
                .iter()
                .filter(|f| f.show())
                .map(|f| SelectTerm::new(Term::field(root_alias.as_str(), f.name())))
                .collect(),
        };

        let shows = options.show_only.as_ref().unwrap_or(&options.show);
        for show in shows {
            if let Some(term) = self.show_term(show)? {
                if !select.contains(&term) {
                    select.push(term);
                }
            }
        }

        for key in &options.join {
            let resolved = path::follow_references(self.schema, self.model, key).ok_or_else(|| {
                Error::invalid_argument(format!("join path '{}' does not resolve on {}", key, root.name()))
            })?;
            self.add_path(&resolved)?;
        }

        let conditions = self.conditions(&options.conditions)?;
        let order_by = self.order_terms(&options.order_by, "order by")?;
        let group_by = self.order_terms(&options.group_by, "group by")?;

        Ok(Query {
            select,
            from: self.tables.into_entries(),
            conditions,
            order_by,
            group_by,
            limit: options.limit,
            distinct: options.select_distinct,
            random: options.random,
        })
    }

    // ------------------------------------------------------------------------
    // Insert, Update, Delete
    // ------------------------------------------------------------------------

    /// Maps an insert key to its column: a field, else a reference name.
    fn insert_column(&self, key: &str) -> Result<String> {
        let root = self.root();
        if root.has_field(key) {
            return Ok(key.to_string());
        }
        root.get_reference(key)
            .map(|reference| reference.field.clone())
            .ok_or_else(|| {
                Error::invalid_argument(format!("cannot insert '{}' into {}: no such field or reference", key, root.name()))
            })
    }

    /// Builds a multi-row `INSERT`.
    ///
    /// Columns are the union of all row keys, in first-seen order. Rows
    /// missing a column insert `NULL`.
    pub fn insert_statement(self, options: &InsertOptions) -> Result<InsertStatement> {
        if options.rows.is_empty() {
            return Err(Error::invalid_argument(format!(
                "nothing to insert into {}",
                self.root().name()
            )));
        }

        let mut rows: Vec<IndexMap<String, Value>> = Vec::with_capacity(options.rows.len());
        let mut fields: Vec<String> = Vec::new();
        for row in &options.rows {
            let mut columns = IndexMap::new();
            for (key, value) in row {
                let column = self.insert_column(key)?;
                if !fields.contains(&column) {
                    fields.push(column.clone());
                }
                columns.insert(column, value.clone());
            }
            rows.push(columns);
        }

        let values = rows
            .into_iter()
            .map(|mut columns| {
                fields
                    .iter()
                    .map(|f| Term::from(columns.swap_remove(f).unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();

        Ok(InsertStatement {
            into: self.root().name().to_string(),
            fields,
            values,
        })
    }

    /// Builds an `UPDATE`. Targets and path values may cross joins.
    pub fn update_statement(mut self, options: &UpdateOptions) -> Result<UpdateStatement> {
        let conditions = self.conditions(&options.conditions)?;

        let mut set = Vec::with_capacity(options.set.len());
        for (key, value) in &options.set {
            let target = self.require(key, "update")?;
            let value = match value {
                SetValue::Value(value) => Term::from(value.clone()),
                SetValue::Path(path) => {
                    let resolved = self.require(path, "update value")?;
                    Term::field(resolved.alias, resolved.field.name())
                }
                SetValue::Term(term) => term.clone(),
            };
            set.push(Assignment {
                target: Term::field(target.alias, target.field.name()),
                value,
            });
        }

        if set.is_empty() {
            return Err(Error::invalid_argument(format!(
                "update of {} sets nothing",
                self.root().name()
            )));
        }

        Ok(UpdateStatement {
            update: self.tables.into_entries(),
            set,
            conditions,
            limit: options.limit.map(Limit::count),
        })
    }

    /// Builds a `DELETE`. With joins, the root table is named as the only
    /// delete target.
    pub fn delete_statement(mut self, options: &DeleteOptions) -> Result<DeleteStatement> {
        let conditions = self.conditions(&options.conditions)?;
        let from = self.tables.into_entries();

        let delete = if from.len() > 1 {
            from.first().cloned().into_iter().collect()
        } else {
            Vec::new()
        };

        Ok(DeleteStatement {
            delete,
            from,
            conditions,
            limit: options.limit.map(Limit::count),
        })
    }
}

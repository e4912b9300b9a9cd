//! # SQL Formatter Module
//!
//! Renders the intermediate statements of [`crate::query`] as SQL text.
//!
//! The formatter knows the statement grammar; the [`Dialect`] knows how
//! literals and identifiers are quoted. Keeping the two apart lets the same
//! formatter serve MySQL in production and a predictable mock dialect in
//! tests.
//!
//! ## Output Shape
//!
//! Each clause of a `SELECT` ends with a newline, and statements end with
//! `;`:
//!
//! ```text
//! SELECT `U`.`id`, `U`.`name`
//! FROM  `users` `U`
//! WHERE (`U`.`id` = 3)
//! LIMIT 1
//! ;
//! ```

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    query::{
        Condition, ControlStatement, DeleteStatement, FromEntry, InsertStatement, Limit, Operator,
        OrderTerm, Query, SelectTerm, Statement, Term, UpdateStatement,
    },
    value::Value,
};

// ============================================================================
// Dialect
// ============================================================================

/// Quoting rules of a SQL dialect.
pub trait Dialect: Send + Sync {
    /// Renders a literal.
    fn escape(&self, value: &Value) -> String;

    /// Quotes a single identifier, without splitting on `.`.
    fn quote_id(&self, name: &str) -> String;

    /// Quotes a possibly qualified identifier, `table.field` becoming two
    /// quoted parts.
    fn escape_id(&self, id: &str) -> String {
        id.split('.').map(|part| self.quote_id(part)).collect::<Vec<_>>().join(".")
    }

    /// Name of the function ordering rows randomly.
    fn random_function(&self) -> &str {
        "RAND"
    }
}

// ============================================================================
// Formatter
// ============================================================================

fn is_empty_list(term: &Term) -> bool {
    match term {
        Term::List(items) => items.is_empty(),
        Term::Value(Value::List(items)) => items.is_empty(),
        _ => false,
    }
}

/// Renders statements through a dialect.
#[derive(Clone, Copy)]
pub struct Formatter<'d> {
    pub(crate) dialect: &'d dyn Dialect,
}

impl<'d> Formatter<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    fn terms(&self, terms: &[Term]) -> String {
        terms.iter().map(|t| self.term(t)).collect::<Vec<_>>().join(", ")
    }

    fn conditions(&self, conditions: &[Condition]) -> String {
        conditions
            .iter()
            .map(|c| format!("({})", self.condition(c)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn limit(&self, limit: &Limit) -> String {
        match limit.offset {
            Some(offset) => format!("LIMIT {}, {}", offset, limit.count),
            None => format!("LIMIT {}", limit.count),
        }
    }

    /// Renders one term.
    pub fn term(&self, term: &Term) -> String {
        match term {
            Term::Null => "NULL".to_string(),
            Term::Field { table: Some(table), field } => self.dialect.escape_id(&format!("{}.{}", table, field)),
            Term::Field { table: None, field } => self.dialect.escape_id(field),
            Term::AsIs(sql) => sql.clone(),
            Term::Func { func, args } => format!("{}({})", func, self.terms(args)),
            Term::Value(value) => self.dialect.escape(value),
            Term::List(items) => format!("({})", self.terms(items)),
            Term::Query(query) => format!("({})", self.select(query)),
        }
    }

    pub fn select_term(&self, select: &SelectTerm) -> String {
        match &select.alias {
            Some(alias) => format!("{} AS {}", self.term(&select.term), self.dialect.quote_id(alias)),
            None => self.term(&select.term),
        }
    }

    /// Right-hand side of `IN`, always parenthesized once.
    fn in_list(&self, rhs: &Term) -> String {
        match rhs {
            Term::List(_) | Term::Query(_) => self.term(rhs),
            other => format!("({})", self.term(other)),
        }
    }

    pub fn condition(&self, condition: &Condition) -> String {
        let lhs = self.term(&condition.lhs);
        let is_null = matches!(condition.rhs, Term::Null | Term::Value(Value::Null));

        match condition.op {
            Operator::Not => format!("NOT {}", lhs),
            Operator::Eq if is_null => format!("{} IS NULL", lhs),
            Operator::NotEq if is_null => format!("{} IS NOT NULL", lhs),
            Operator::Between => match &condition.rhs {
                Term::List(bounds) if bounds.len() == 2 => format!(
                    "{} BETWEEN {} AND {}",
                    lhs,
                    self.term(&bounds[0]),
                    self.term(&bounds[1])
                ),
                Term::Value(Value::List(bounds)) if bounds.len() == 2 => format!(
                    "{} BETWEEN {} AND {}",
                    lhs,
                    self.dialect.escape(&bounds[0]),
                    self.dialect.escape(&bounds[1])
                ),
                other => format!("{} BETWEEN {}", lhs, self.term(other)),
            },
            // `IN ()` is a syntax error; an empty list matches nothing
            Operator::In if is_empty_list(&condition.rhs) => "FALSE".to_string(),
            Operator::NotIn if is_empty_list(&condition.rhs) => "TRUE".to_string(),
            Operator::In | Operator::NotIn | Operator::InQuery => {
                format!("{} {} {}", lhs, condition.op.as_sql(), self.in_list(&condition.rhs))
            }
            op => format!("{} {} {}", lhs, op.as_sql(), self.term(&condition.rhs)),
        }
    }

    /// Renders a `FROM` entry: `[JOIN] table [alias] [ON condition]`.
    pub fn from(&self, entry: &FromEntry) -> String {
        format!(
            "{} {} {} {}",
            entry.join.map(|j| j.keyword()).unwrap_or(""),
            self.dialect.escape_id(&entry.table),
            entry.alias.as_deref().map(|a| self.dialect.quote_id(a)).unwrap_or_default(),
            entry
                .on
                .as_ref()
                .map(|on| format!("ON {}", self.condition(on)))
                .unwrap_or_default()
        )
    }

    /// The name an entry is referred to by in `DELETE` targets.
    pub fn from_alias(&self, entry: &FromEntry) -> String {
        match &entry.alias {
            Some(alias) => self.dialect.quote_id(alias),
            None => self.dialect.escape_id(&entry.table),
        }
    }

    pub fn order_by(&self, order: &OrderTerm) -> String {
        format!(
            "{} {}",
            self.term(&order.term),
            order.sort.map(|s| s.as_sql()).unwrap_or("")
        )
    }

    fn order_list(&self, order: &[OrderTerm]) -> String {
        order.iter().map(|o| self.order_by(o)).collect::<Vec<_>>().join(", ")
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    /// The body of a `SELECT`, without the terminating `;`. Used for
    /// sub-queries.
    pub fn select(&self, query: &Query) -> String {
        let mut sql = String::from("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }
        if query.select.is_empty() {
            sql.push('*');
        } else {
            let terms: Vec<String> = query.select.iter().map(|s| self.select_term(s)).collect();
            sql.push_str(&terms.join(", "));
        }
        sql.push('\n');

        let from: Vec<String> = query.from.iter().map(|f| self.from(f)).collect();
        sql.push_str(&format!("FROM {}\n", from.join("\n")));

        if !query.conditions.is_empty() {
            sql.push_str(&format!("WHERE {}\n", self.conditions(&query.conditions)));
        }

        if !query.group_by.is_empty() {
            sql.push_str(&format!("GROUP BY {}\n", self.order_list(&query.group_by)));
        }

        let mut order = Vec::with_capacity(query.order_by.len() + 1);
        if query.random {
            order.push(OrderTerm {
                term: Term::func(self.dialect.random_function(), Vec::new()),
                sort: None,
            });
        }
        order.extend(query.order_by.iter().cloned());
        if !order.is_empty() {
            sql.push_str(&format!("ORDER BY {}\n", self.order_list(&order)));
        }

        if let Some(limit) = &query.limit {
            sql.push_str(&self.limit(limit));
            sql.push('\n');
        }

        sql
    }

    /// A complete `SELECT` statement.
    pub fn query(&self, query: &Query) -> String {
        format!("{};", self.select(query))
    }

    pub fn insert(&self, insert: &InsertStatement) -> String {
        let fields: Vec<String> = insert.fields.iter().map(|f| self.dialect.escape_id(f)).collect();
        let rows: Vec<String> = insert
            .values
            .iter()
            .map(|row| format!("    ({})", self.terms(row)))
            .collect();

        format!(
            "INSERT INTO {}({}) VALUES \n{};",
            self.dialect.escape_id(&insert.into),
            fields.join(", "),
            rows.join(",\n")
        )
    }

    pub fn update(&self, update: &UpdateStatement) -> String {
        let tables: Vec<String> = update.update.iter().map(|f| self.from(f)).collect();
        let set: Vec<String> = update
            .set
            .iter()
            .map(|a| format!("{} = ({})", self.term(&a.target), self.term(&a.value)))
            .collect();

        let mut lines = vec![
            format!("UPDATE {}", tables.join("\n")),
            format!("   SET {}", set.join(",\n       ")),
        ];
        if !update.conditions.is_empty() {
            lines.push(format!("WHERE {}", self.conditions(&update.conditions)));
        }
        if let Some(limit) = &update.limit {
            lines.push(self.limit(limit));
        }
        lines.push(";".to_string());
        lines.join("\n")
    }

    pub fn delete(&self, delete: &DeleteStatement) -> String {
        let targets: Vec<String> = delete.delete.iter().map(|f| self.from_alias(f)).collect();

        let mut lines = vec![if targets.is_empty() {
            "DELETE".to_string()
        } else {
            format!("DELETE {}", targets.join(", "))
        }];

        let mut from = delete.from.iter();
        if let Some(root) = from.next() {
            lines.push(format!("FROM {}", self.from(root)));
        }
        lines.extend(from.map(|f| self.from(f)));

        if !delete.conditions.is_empty() {
            lines.push(format!("WHERE {}", self.conditions(&delete.conditions)));
        }
        if let Some(limit) = &delete.limit {
            lines.push(self.limit(limit));
        }
        lines.push(";".to_string());
        lines.join("\n")
    }

    pub fn control(&self, control: ControlStatement) -> String {
        match control {
            ControlStatement::Begin => "BEGIN",
            ControlStatement::Commit => "COMMIT",
            ControlStatement::Rollback => "ROLLBACK",
        }
        .to_string()
    }

    pub fn statement(&self, statement: &Statement) -> String {
        match statement {
            Statement::Query(query) => self.query(query),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
            Statement::Control(control) => self.control(*control),
        }
    }
}

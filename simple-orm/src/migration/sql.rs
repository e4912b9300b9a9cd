//! Rendering migration steps as DDL.
//!
//! Each schema-level step becomes zero or more statements: `createModel` a
//! `CREATE TABLE`, `deleteModel` a `DROP TABLE`, `changeModel` one
//! `ALTER TABLE` holding all its clauses, `insertData` an `INSERT`.

use indexmap::IndexMap;
use log::warn;

use super::{Migration, MigrationStep, ModelStep};
use crate::{
    ddl::{Alteration, Position},
    format::Formatter,
    query::{InsertStatement, Term},
    value::{Row, Value},
};

fn alterations(model: &str, steps: &[ModelStep]) -> Vec<Alteration> {
    let mut clauses = Vec::new();
    let mut rename = None;

    for step in steps {
        match step {
            ModelStep::Rename { to } => rename = Some(to.clone()),
            ModelStep::SetPrimaryKey { to } => {
                clauses.push(Alteration::DropPrimaryKey);
                if !to.is_empty() {
                    clauses.push(Alteration::AddPrimaryKey(to.clone()));
                }
            }
            ModelStep::CreateKey(key) => clauses.push(Alteration::AddKey(key.clone())),
            ModelStep::SetKey(key) => {
                clauses.push(Alteration::DropKey(key.name.clone()));
                clauses.push(Alteration::AddKey(key.clone()));
            }
            ModelStep::DeleteKey { name } => clauses.push(Alteration::DropKey(name.clone())),
            ModelStep::CreateConstraint(c) => clauses.push(Alteration::AddConstraint(c.clone())),
            ModelStep::SetConstraint(c) => {
                clauses.push(Alteration::DropForeignKey(c.name.clone()));
                clauses.push(Alteration::AddConstraint(c.clone()));
            }
            ModelStep::DeleteConstraint { name } => clauses.push(Alteration::DropForeignKey(name.clone())),
            ModelStep::CreateDbOption { name, value } | ModelStep::SetDbOption { name, value } => {
                clauses.push(Alteration::Option {
                    name: name.clone(),
                    value: value.clone(),
                })
            }
            ModelStep::DeleteDbOption { name } => {
                warn!("{}: removing table option {} has no DDL equivalent, skipped", model, name)
            }
            ModelStep::CreateField(field) => clauses.push(Alteration::AddColumn {
                field: field.clone(),
                position: Position::Unspecified,
            }),
            ModelStep::SetField(field) => clauses.push(Alteration::ChangeColumn {
                old_name: field.name.clone(),
                field: field.clone(),
                position: Position::Unspecified,
            }),
            ModelStep::DeleteField { name } => clauses.push(Alteration::DropColumn(name.clone())),
        }
    }

    // last, so earlier clauses still address the old name
    if let Some(to) = rename {
        clauses.push(Alteration::RenameTo(to));
    }
    clauses
}

fn insert_rows(model: &str, rows: &[Row]) -> InsertStatement {
    let mut fields: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !fields.contains(key) {
                fields.push(key.clone());
            }
        }
    }
    let values = rows
        .iter()
        .map(|row| {
            fields
                .iter()
                .map(|f| Term::from(row.get(f).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect();

    InsertStatement {
        into: model.to_string(),
        fields,
        values,
    }
}

/// The statements of one step.
pub fn step_sql(formatter: &Formatter<'_>, step: &MigrationStep) -> Vec<String> {
    match step {
        MigrationStep::CreateModel(model) => vec![formatter.create_table(model)],
        MigrationStep::DeleteModel { name } => vec![formatter.drop_table(name)],
        MigrationStep::ChangeModel { model, steps } => {
            let clauses = alterations(model, steps);
            if clauses.is_empty() {
                Vec::new()
            } else {
                vec![formatter.alter_table(model, &clauses)]
            }
        }
        MigrationStep::InsertData { model, rows } if !rows.is_empty() => {
            vec![formatter.insert(&insert_rows(model, rows))]
        }
        MigrationStep::InsertData { .. } | MigrationStep::ApplyMigration { .. } => Vec::new(),
    }
}

/// The statements of a whole migration, in step order.
pub fn migration_sql(formatter: &Formatter<'_>, migration: &Migration) -> Vec<String> {
    migration.steps.iter().flat_map(|step| step_sql(formatter, step)).collect()
}

/// Rows keyed by column, for building `insertData` steps.
pub fn row<I, K, V>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect::<IndexMap<_, _>>()
}

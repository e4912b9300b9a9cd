//! # DDL Module
//!
//! Renders schema snapshots as `CREATE TABLE` and `ALTER TABLE` statements.
//!
//! ```rust,ignore
//! let formatter = Formatter::new(&MysqlDialect);
//! println!("{}", formatter.create_table(&users.get_schema()));
//! // CREATE TABLE `users` (
//! //     `id` int NOT NULL AUTO_INCREMENT,
//! //     `name` varchar(255) NOT NULL,
//! //     PRIMARY KEY (`id`)
//! // ) ENGINE='InnoDB';
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use heck::ToTitleCase;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    format::Formatter,
    snapshot::{ConstraintSchema, FieldSchema, KeySchema, ModelSchema},
    value::Value,
};

/// Where an added or changed column goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    /// Leaves the column where the server puts it.
    #[default]
    Unspecified,
    First,
    After(String),
}

/// One clause of an `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub enum Alteration {
    AddColumn { field: FieldSchema, position: Position },
    ChangeColumn { old_name: String, field: FieldSchema, position: Position },
    DropColumn(String),
    AddPrimaryKey(Vec<String>),
    DropPrimaryKey,
    AddKey(KeySchema),
    DropKey(String),
    AddConstraint(ConstraintSchema),
    DropForeignKey(String),
    /// A table option such as `ENGINE`.
    Option { name: String, value: Value },
    RenameTo(String),
}

impl Formatter<'_> {
    fn id_list<'a, I: IntoIterator<Item = &'a str>>(&self, ids: I) -> String {
        ids.into_iter()
            .map(|id| self.dialect.escape_id(id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `PRIMARY KEY (`a`, `b`)`.
    pub fn primary_key(&self, columns: &[String]) -> String {
        format!("PRIMARY KEY ({})", self.id_list(columns.iter().map(String::as_str)))
    }

    /// A table option. camelCase names become spaced upper case, so
    /// `defaultCharset` renders as `DEFAULT CHARSET`.
    pub fn db_option(&self, name: &str, value: &Value) -> String {
        format!("{}={}", name.to_title_case().to_uppercase(), self.dialect.escape(value))
    }

    /// A column definition. The type is written upper case.
    pub fn field(&self, field: &FieldSchema) -> String {
        let field_type = if field.field_type.eq_ignore_ascii_case("enum") && !field.values.is_empty() {
            let values: Vec<String> = field
                .values
                .iter()
                .map(|v| self.dialect.escape(&Value::from(v.as_str())))
                .collect();
            format!("ENUM({})", values.join(","))
        } else {
            field.field_type.to_uppercase()
        };

        let mut sql = format!(
            "{} {} {}",
            self.dialect.escape_id(&field.name),
            field_type,
            if field.can_be_null { "NULL" } else { "NOT NULL" }
        );
        if field.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(default) = &field.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.dialect.escape(default));
        }
        sql
    }

    /// `KEY `name` (`a` ASC, `b`)`.
    pub fn key(&self, key: &KeySchema) -> String {
        let fields: Vec<String> = key
            .fields
            .iter()
            .map(|f| match f.sort {
                Some(sort) => format!("{} {}", self.dialect.escape_id(&f.name), sort.as_sql()),
                None => self.dialect.escape_id(&f.name),
            })
            .collect();
        format!("KEY {} ({})", self.dialect.quote_id(&key.name), fields.join(", "))
    }

    /// A foreign key constraint.
    pub fn constraint(&self, constraint: &ConstraintSchema) -> String {
        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
            self.dialect.quote_id(&constraint.name),
            self.dialect.escape_id(&constraint.field),
            self.dialect.escape_id(&constraint.references.table),
            self.dialect.escape_id(&constraint.references.field),
            constraint.on_delete.as_sql(),
            constraint.on_update.as_sql()
        )
    }

    fn position(&self, position: &Position) -> String {
        match position {
            Position::Unspecified => String::new(),
            Position::First => " FIRST".to_string(),
            Position::After(column) => format!(" AFTER {}", self.dialect.escape_id(column)),
        }
    }

    pub fn alteration(&self, alteration: &Alteration) -> String {
        match alteration {
            Alteration::AddColumn { field, position } => {
                format!("ADD COLUMN {}{}", self.field(field), self.position(position))
            }
            Alteration::ChangeColumn {
                old_name,
                field,
                position,
            } => format!(
                "CHANGE COLUMN {} {}{}",
                self.dialect.escape_id(old_name),
                self.field(field),
                self.position(position)
            ),
            Alteration::DropColumn(name) => format!("DROP COLUMN {}", self.dialect.escape_id(name)),
            Alteration::AddPrimaryKey(columns) => format!("ADD {}", self.primary_key(columns)),
            Alteration::DropPrimaryKey => "DROP PRIMARY KEY".to_string(),
            Alteration::AddKey(key) => format!("ADD {}", self.key(key)),
            Alteration::DropKey(name) => format!("DROP KEY {}", self.dialect.quote_id(name)),
            Alteration::AddConstraint(constraint) => format!("ADD {}", self.constraint(constraint)),
            Alteration::DropForeignKey(name) => format!("DROP FOREIGN KEY {}", self.dialect.quote_id(name)),
            Alteration::Option { name, value } => self.db_option(name, value),
            Alteration::RenameTo(name) => format!("RENAME TO {}", self.dialect.escape_id(name)),
        }
    }

    /// `CREATE TABLE` for a model snapshot: fields, primary key, keys and
    /// constraints, then table options.
    pub fn create_table(&self, model: &ModelSchema) -> String {
        let mut definitions: Vec<String> = model.fields.iter().map(|f| self.field(f)).collect();
        if !model.primary_key.is_empty() {
            definitions.push(self.primary_key(&model.primary_key));
        }
        definitions.extend(model.keys.iter().map(|k| self.key(k)));
        definitions.extend(model.constraints.iter().map(|c| self.constraint(c)));

        let options: Vec<String> = model
            .db_options
            .iter()
            .map(|(name, value)| self.db_option(name, value))
            .collect();

        format!(
            "CREATE TABLE {} (\n    {}\n) {};",
            self.dialect.escape_id(&model.name),
            definitions.join(",\n    "),
            options.join(" ")
        )
    }

    pub fn alter_table(&self, table: &str, alterations: &[Alteration]) -> String {
        let clauses: Vec<String> = alterations.iter().map(|a| self.alteration(a)).collect();
        format!(
            "ALTER TABLE {}\n\n{};",
            self.dialect.escape_id(table),
            clauses.join(",\n")
        )
    }

    pub fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {};", self.dialect.escape_id(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::tests::MockDialect,
        query::Sort,
        snapshot::{ConstraintTarget, ConstraintType, KeyField, OnAction},
    };
    use pretty_assertions::assert_eq;

    fn f() -> Formatter<'static> {
        Formatter::new(&MockDialect)
    }

    fn int_field(name: &str) -> FieldSchema {
        FieldSchema::new(name, "INT")
    }

    #[test]
    fn primary_key_and_option() {
        assert_eq!(f().primary_key(&["k1".into(), "k2".into()]), "PRIMARY KEY (`k1`, `k2`)");
        assert_eq!(f().db_option("option", &Value::from("value")), "OPTION=\"value\"");
        assert_eq!(
            f().db_option("defaultCharset", &Value::from("utf8mb4")),
            "DEFAULT CHARSET=\"utf8mb4\""
        );
    }

    #[test]
    fn field_definitions() {
        assert_eq!(f().field(&int_field("f1")), "`f1` INT NOT NULL");

        let mut field = int_field("f1");
        field.can_be_null = true;
        field.auto_increment = true;
        field.default = Some(Value::from(3));
        assert_eq!(f().field(&field), "`f1` INT NULL AUTO_INCREMENT DEFAULT 3");

        assert_eq!(
            f().field(&FieldSchema::new("name", "varchar(255)")),
            "`name` VARCHAR(255) NOT NULL"
        );

        let mut field = FieldSchema::new("e", "enum");
        field.values = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(f().field(&field), "`e` ENUM(\"a\",\"b\",\"c\") NOT NULL");
    }

    #[test]
    fn key_and_constraint() {
        let key = KeySchema {
            name: "k1".into(),
            fields: vec![KeyField {
                name: "f1".into(),
                sort: Some(Sort::Asc),
            }],
        };
        assert_eq!(f().key(&key), "KEY `k1` (`f1` ASC)");

        let constraint = ConstraintSchema {
            name: "name".into(),
            constraint_type: ConstraintType::ForeignKey,
            field: "f1".into(),
            references: ConstraintTarget {
                table: "rft".into(),
                field: "rff1".into(),
            },
            on_delete: OnAction::NoAction,
            on_update: OnAction::NoAction,
        };
        assert_eq!(
            f().constraint(&constraint),
            "CONSTRAINT `name` FOREIGN KEY (`f1`) REFERENCES `rft` (`rff1`) ON DELETE NO ACTION ON UPDATE NO ACTION"
        );
    }

    #[test]
    fn column_alterations() {
        assert_eq!(f().alteration(&Alteration::DropColumn("f1".into())), "DROP COLUMN `f1`");
        assert_eq!(
            f().alteration(&Alteration::AddColumn {
                field: int_field("f1"),
                position: Position::First
            }),
            "ADD COLUMN `f1` INT NOT NULL FIRST"
        );
        assert_eq!(
            f().alteration(&Alteration::ChangeColumn {
                old_name: "oldf1".into(),
                field: int_field("f1"),
                position: Position::After("aff".into())
            }),
            "CHANGE COLUMN `oldf1` `f1` INT NOT NULL AFTER `aff`"
        );
    }

    #[test]
    fn create_and_alter_table() {
        let mut model = ModelSchema::new("name");
        model.fields = vec![int_field("f1"), int_field("f2")];
        model.primary_key = vec!["f1".into()];
        model.db_options.insert("engine".into(), Value::from("InnoDB"));

        assert_eq!(
            f().create_table(&model),
            "CREATE TABLE `name` (\n    `f1` INT NOT NULL,\n    `f2` INT NOT NULL,\n    PRIMARY KEY (`f1`)\n) ENGINE=\"InnoDB\";"
        );

        assert_eq!(
            f().alter_table(
                "name",
                &[Alteration::DropColumn("f2".into()), Alteration::DropPrimaryKey]
            ),
            "ALTER TABLE `name`\n\nDROP COLUMN `f2`,\nDROP PRIMARY KEY;"
        );
    }
}

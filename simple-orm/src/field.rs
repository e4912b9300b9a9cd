//! # Field Module
//!
//! Column definitions. A [`FieldDefinition`] is the declarative input; the
//! owning model turns it into an immutable [`Field`] when it is added.
//!
//! ## Example
//!
//! ```rust,ignore
//! use simple_orm::FieldDefinition;
//!
//! let fields = vec![
//!     FieldDefinition::id(),
//!     FieldDefinition::new("name", "varchar(255)"),
//!     FieldDefinition::new("password", "varchar(255)").can_be_shown(false),
//!     FieldDefinition::references("users").reference_name("owner"),
//! ];
//! ```

use crate::{snapshot::FieldSchema, value::Value};

// ============================================================================
// Field
// ============================================================================

/// One column of a model. Owned exclusively by its model.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) field_type: String,
    pub(crate) can_be_null: bool,
    pub(crate) auto_increment: bool,
    pub(crate) values: Vec<String>,
    pub(crate) default: Option<Value>,
    pub(crate) can_be_shown: bool,
    pub(crate) show: bool,
    pub(crate) reference_name: Option<String>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &str {
        &self.field_type
    }

    pub fn can_be_null(&self) -> bool {
        self.can_be_null
    }

    pub fn auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Enum values, empty unless the field type is `enum`.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the field may ever appear in a select list.
    pub fn can_be_shown(&self) -> bool {
        self.can_be_shown
    }

    /// Whether the field is selected when a query does not say otherwise.
    pub fn show(&self) -> bool {
        self.show && self.can_be_shown
    }

    /// Name of the reference this column backs, if any.
    pub fn reference_name(&self) -> Option<&str> {
        self.reference_name.as_deref()
    }

    /// Exports the column as a snapshot.
    pub fn schema(&self) -> FieldSchema {
        FieldSchema {
            name: self.name.clone(),
            field_type: self.field_type.clone(),
            can_be_null: self.can_be_null,
            auto_increment: self.auto_increment,
            values: self.values.clone(),
            default: self.default.clone(),
        }
    }
}

// ============================================================================
// Field Definition
// ============================================================================

/// Declarative description of a field, consumed by `Model::add_field`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub(crate) name: Option<String>,
    pub(crate) field_type: Option<String>,
    pub(crate) can_be_null: bool,
    pub(crate) auto_increment: Option<bool>,
    pub(crate) enum_values: Option<Vec<String>>,
    pub(crate) default: Option<Value>,
    pub(crate) primary_key: bool,
    pub(crate) id: bool,
    pub(crate) references: Option<String>,
    pub(crate) reference_name: Option<String>,
    pub(crate) can_be_shown: bool,
    pub(crate) show: bool,
}

impl Default for FieldDefinition {
    fn default() -> Self {
        Self {
            name: None,
            field_type: None,
            can_be_null: false,
            auto_increment: None,
            enum_values: None,
            default: None,
            primary_key: false,
            id: false,
            references: None,
            reference_name: None,
            can_be_shown: true,
            show: true,
        }
    }
}

impl FieldDefinition {
    /// A plain column.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            field_type: Some(field_type.into()),
            ..Self::default()
        }
    }

    /// The `id` shorthand: an auto-incremented, non-null `int` primary key
    /// named `id`. Name, type and auto-increment can still be overridden.
    pub fn id() -> Self {
        Self {
            id: true,
            ..Self::default()
        }
    }

    /// A column referencing another model by name.
    ///
    /// The reference is named after the field name if one is given, else
    /// after the target. The column name gets an `Id` suffix unless it
    /// already ends with one, and its type defaults to the type of the
    /// target's primary key.
    pub fn references(target: impl Into<String>) -> Self {
        Self {
            references: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.can_be_null = true;
        self
    }

    pub fn can_be_null(mut self, can_be_null: bool) -> Self {
        self.can_be_null = can_be_null;
        self
    }

    pub fn auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = Some(auto_increment);
        self
    }

    /// Makes the field an `enum` with the given values.
    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Names the reference explicitly. The field name, if any, is then used
    /// verbatim as the column name.
    pub fn reference_name(mut self, name: impl Into<String>) -> Self {
        self.reference_name = Some(name.into());
        self
    }

    pub fn can_be_shown(mut self, can_be_shown: bool) -> Self {
        self.can_be_shown = can_be_shown;
        self
    }

    pub fn show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key || self.id
    }

    /// Target model name when this definition declares a reference.
    pub fn target(&self) -> Option<&str> {
        self.references.as_deref()
    }
}

impl From<FieldSchema> for FieldDefinition {
    fn from(schema: FieldSchema) -> Self {
        let mut def = FieldDefinition::new(schema.name, schema.field_type)
            .can_be_null(schema.can_be_null)
            .auto_increment(schema.auto_increment);
        if !schema.values.is_empty() {
            def = def.enum_values(schema.values);
        }
        def.default = schema.default;
        def
    }
}

/// Column layout derived from a definition, before any reference is linked.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedField {
    pub field: Field,
    pub primary_key: bool,
    /// `(reference name, target model, type was given explicitly)`.
    pub reference: Option<(String, String, bool)>,
}

impl FieldDefinition {
    /// Applies the `id`, reference and enum shorthands.
    pub(crate) fn resolve(self) -> ResolvedField {
        let mut name = self.name;
        let mut field_type = self.field_type;
        let mut auto_increment = self.auto_increment.unwrap_or(false);
        let mut primary_key = self.primary_key;

        if self.id {
            name.get_or_insert_with(|| "id".to_string());
            field_type.get_or_insert_with(|| "int".to_string());
            auto_increment = self.auto_increment.unwrap_or(true);
            primary_key = true;
        }

        let mut reference = None;
        let mut reference_name = None;
        if let Some(target) = self.references {
            let explicit_type = field_type.is_some();
            let (ref_name, column) = match (self.reference_name, name) {
                (Some(ref_name), Some(column)) => (ref_name, column),
                (Some(ref_name), None) => {
                    let column = id_column(&ref_name);
                    (ref_name, column)
                }
                (None, Some(given)) => {
                    let column = id_column(&given);
                    (given, column)
                }
                (None, None) => (target.clone(), id_column(&target)),
            };
            name = Some(column);
            reference_name = Some(ref_name.clone());
            reference = Some((ref_name, target, explicit_type));
        }

        let values = match self.enum_values {
            Some(values) => {
                field_type = Some("enum".to_string());
                values
            }
            None => Vec::new(),
        };

        ResolvedField {
            field: Field {
                name: name.unwrap_or_default(),
                field_type: field_type.unwrap_or_default(),
                can_be_null: self.can_be_null,
                auto_increment,
                values,
                default: self.default,
                can_be_shown: self.can_be_shown,
                show: self.show,
                reference_name,
            },
            primary_key,
            reference,
        }
    }
}

fn id_column(name: &str) -> String {
    if name.ends_with("Id") {
        name.to_string()
    } else {
        format!("{}Id", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_shorthand_declares_auto_increment_primary_key() {
        let resolved = FieldDefinition::id().resolve();
        assert_eq!(resolved.field.name, "id");
        assert_eq!(resolved.field.field_type, "int");
        assert!(resolved.field.auto_increment);
        assert!(!resolved.field.can_be_null);
        assert!(resolved.primary_key);
    }

    #[test]
    fn id_shorthand_keeps_overrides() {
        let resolved = FieldDefinition::id().name("code").field_type("char(8)").auto_increment(false).resolve();
        assert_eq!(resolved.field.name, "code");
        assert_eq!(resolved.field.field_type, "char(8)");
        assert!(!resolved.field.auto_increment);
    }

    #[test]
    fn reference_columns_get_id_suffix() {
        let resolved = FieldDefinition::references("users").name("author").resolve();
        assert_eq!(resolved.field.name, "authorId");
        assert_eq!(resolved.reference, Some(("author".into(), "users".into(), false)));

        let resolved = FieldDefinition::references("users").name("userId").resolve();
        assert_eq!(resolved.field.name, "userId");
        assert_eq!(resolved.reference.unwrap().0, "userId");

        let resolved = FieldDefinition::references("user").resolve();
        assert_eq!(resolved.field.name, "userId");
    }

    #[test]
    fn explicit_reference_name_keeps_column_name() {
        let resolved = FieldDefinition::references("users")
            .name("owner_id")
            .reference_name("owner")
            .field_type("bigint")
            .resolve();
        assert_eq!(resolved.field.name, "owner_id");
        assert_eq!(resolved.field.reference_name(), Some("owner"));
        assert_eq!(resolved.reference, Some(("owner".into(), "users".into(), true)));
    }

    #[test]
    fn enum_values_force_enum_type() {
        let resolved = FieldDefinition::new("role", "text").enum_values(["a", "b"]).resolve();
        assert_eq!(resolved.field.field_type, "enum");
        assert_eq!(resolved.field.values, vec!["a", "b"]);
    }

    #[test]
    fn hidden_fields_are_never_shown() {
        let resolved = FieldDefinition::new("password", "text").can_be_shown(false).resolve();
        assert!(!resolved.field.show());
        assert!(!resolved.field.can_be_shown());
    }
}

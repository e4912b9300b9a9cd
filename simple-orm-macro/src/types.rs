//! # Type Mapping Module
//!
//! Maps Rust field types onto the MySQL column types written into model
//! definitions.

use syn::{GenericArgument, PathArguments, Type};

/// A Rust field type as seen by the derive.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    /// Column type, lowercase as in model snapshots.
    pub sql_type: String,
    /// `true` for `Option<T>`.
    pub nullable: bool,
    /// `true` for the integer types, the only ones that can auto-increment.
    pub integer: bool,
}

impl ColumnType {
    fn new(sql_type: &str, integer: bool) -> Self {
        Self {
            sql_type: sql_type.to_string(),
            nullable: false,
            integer,
        }
    }
}

/// Maps a Rust type to its column type.
///
/// `Option<T>` maps like `T` and is nullable. Unknown types map to `text`.
///
/// # Type Mappings
///
/// * `i8`/`i16`/`i32`/`i64` → `tinyint`/`smallint`/`int`/`bigint`
/// * `u8`..`u64` → the same with `unsigned`
/// * `String` → `text` (`varchar(N)` when a size is given)
/// * `bool` → `boolean`
/// * `f32` → `float`, `f64` → `double`
/// * `Uuid` → `char(36)`
/// * `NaiveDateTime`, `DateTime` → `datetime`
/// * `NaiveDate` → `date`, `NaiveTime` → `time`
pub fn rust_type_to_sql(ty: &Type) -> ColumnType {
    let Type::Path(type_path) = ty else {
        return ColumnType::new("text", false);
    };
    let Some(segment) = type_path.path.segments.last() else {
        return ColumnType::new("text", false);
    };

    let type_name = segment.ident.to_string();
    if type_name == "Option"
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner_ty)) = args.args.first()
    {
        let mut inner = rust_type_to_sql(inner_ty);
        inner.nullable = true;
        return inner;
    }

    match type_name.as_str() {
        "i8" => ColumnType::new("tinyint", true),
        "i16" => ColumnType::new("smallint", true),
        "i32" => ColumnType::new("int", true),
        "i64" => ColumnType::new("bigint", true),
        "u8" => ColumnType::new("tinyint unsigned", true),
        "u16" => ColumnType::new("smallint unsigned", true),
        "u32" => ColumnType::new("int unsigned", true),
        "u64" => ColumnType::new("bigint unsigned", true),
        "bool" => ColumnType::new("boolean", false),
        "f32" => ColumnType::new("float", false),
        "f64" => ColumnType::new("double", false),
        "Uuid" => ColumnType::new("char(36)", false),
        "DateTime" | "NaiveDateTime" => ColumnType::new("datetime", false),
        "NaiveDate" => ColumnType::new("date", false),
        "NaiveTime" => ColumnType::new("time", false),
        _ => ColumnType::new("text", false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn maps_scalars_and_options() {
        let t: Type = parse_quote!(i32);
        assert_eq!(rust_type_to_sql(&t), ColumnType::new("int", true));

        let t: Type = parse_quote!(Option<chrono::NaiveDateTime>);
        let mapped = rust_type_to_sql(&t);
        assert_eq!(mapped.sql_type, "datetime");
        assert!(mapped.nullable);

        let t: Type = parse_quote!(Vec<u8>);
        assert_eq!(rust_type_to_sql(&t).sql_type, "text");
    }
}

//! # Entity Derive Module
//!
//! Expansion of `#[derive(Entity)]`.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitInt, LitStr, ext::IdentExt};

use crate::types::rust_type_to_sql;

/// `#[orm(...)]` options of one field.
#[derive(Default)]
struct FieldAttrs {
    primary_key: bool,
    id: bool,
    auto_increment: bool,
    size: Option<usize>,
    sql_type: Option<String>,
    references: Option<String>,
    values: Option<Vec<String>>,
    omit: bool,
    hidden: bool,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("orm")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    parsed.primary_key = true;
                } else if meta.path.is_ident("id") {
                    parsed.id = true;
                } else if meta.path.is_ident("auto_increment") {
                    parsed.auto_increment = true;
                } else if meta.path.is_ident("size") {
                    let value: LitInt = meta.value()?.parse()?;
                    parsed.size = Some(value.base10_parse::<usize>()?);
                } else if meta.path.is_ident("sql_type") {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.sql_type = Some(value.value());
                } else if meta.path.is_ident("references") {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.references = Some(value.value());
                } else if meta.path.is_ident("values") {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.values = Some(value.value().split(',').map(|v| v.trim().to_string()).collect());
                } else if meta.path.is_ident("omit") {
                    parsed.omit = true;
                } else if meta.path.is_ident("hidden") {
                    parsed.hidden = true;
                } else {
                    return Err(meta.error("unknown orm field attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

fn table_name(ast: &DeriveInput) -> syn::Result<String> {
    let mut table = None;
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                table = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown orm struct attribute, expected `table`"))
            }
        })?;
    }
    Ok(table.unwrap_or_else(|| ast.ident.to_string().to_lower_camel_case()))
}

/// Reference name for a referencing column: `user_id` and `userId` name the
/// reference `user`; any other column names it after the target.
fn reference_name(column: &str, target: &str) -> String {
    column
        .strip_suffix("_id")
        .or_else(|| column.strip_suffix("Id"))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(target)
        .to_string()
}

fn field_definition(column: &str, ty: &syn::Type, attrs: &FieldAttrs) -> TokenStream {
    let mapped = rust_type_to_sql(ty);
    let mut sql_type = attrs.sql_type.clone().unwrap_or(mapped.sql_type);
    if attrs.sql_type.is_none()
        && let Some(size) = attrs.size
        && sql_type == "text"
    {
        sql_type = format!("varchar({})", size);
    }

    let mut def = match (&attrs.references, attrs.id) {
        (Some(target), _) => {
            let ref_name = reference_name(column, target);
            let mut def = quote! {
                ::simple_orm::FieldDefinition::references(#target)
                    .name(#column)
                    .reference_name(#ref_name)
            };
            // the target's key type applies unless one is given
            if let Some(explicit) = &attrs.sql_type {
                def = quote! { #def.field_type(#explicit) };
            }
            def
        }
        (None, true) => {
            let mut def = quote! { ::simple_orm::FieldDefinition::id().name(#column).field_type(#sql_type) };
            if !mapped.integer {
                def = quote! { #def.auto_increment(false) };
            }
            def
        }
        (None, false) => quote! { ::simple_orm::FieldDefinition::new(#column, #sql_type) },
    };

    if attrs.primary_key {
        def = quote! { #def.primary_key() };
    }
    if attrs.auto_increment {
        def = quote! { #def.auto_increment(true) };
    }
    if mapped.nullable {
        def = quote! { #def.nullable() };
    }
    if let Some(values) = &attrs.values {
        def = quote! { #def.enum_values([#(#values),*]) };
    }
    if attrs.omit {
        def = quote! { #def.show(false) };
    }
    if attrs.hidden {
        def = quote! { #def.can_be_shown(false) };
    }
    def
}

pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;
    let Data::Struct(data) = &ast.data else {
        return Err(syn::Error::new_spanned(struct_name, "Entity must be a struct"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(struct_name, "Entity must have named fields"));
    };

    let table = table_name(&ast)?;

    let mut definitions = Vec::new();
    let mut inserts = Vec::new();
    let mut constants = Vec::new();
    for field in &fields.named {
        let Some(ident) = &field.ident else { continue };
        let column = ident.unraw().to_string();
        let attrs = FieldAttrs::parse(&field.attrs)?;

        definitions.push(field_definition(&column, &field.ty, &attrs));
        inserts.push(quote! {
            row.insert(#column.to_string(), ::simple_orm::Value::from(self.#ident));
        });
        let constant = Ident::new(&column.to_shouty_snake_case(), Span::call_site());
        constants.push(quote! { pub const #constant: &str = #column; });
    }

    let fields_mod = format_ident!("{}_fields", struct_name.to_string().to_snake_case());
    let doc = format!("Column names of `{}`.", struct_name);
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::simple_orm::Entity for #struct_name #ty_generics #where_clause {
            fn model_name() -> &'static str {
                #table
            }

            fn definition() -> ::simple_orm::ModelDefinition {
                ::simple_orm::ModelDefinition::new(#table)
                    #(.field(#definitions))*
            }

            fn into_row(self) -> ::simple_orm::Row {
                let mut row = ::simple_orm::Row::new();
                #(#inserts)*
                row
            }
        }

        #[doc = #doc]
        #[allow(dead_code)]
        pub mod #fields_mod {
            #(#constants)*
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn reference_names_drop_the_id_suffix() {
        assert_eq!(reference_name("user_id", "users"), "user");
        assert_eq!(reference_name("ownerId", "users"), "owner");
        assert_eq!(reference_name("author", "users"), "users");
        assert_eq!(reference_name("_id", "users"), "users");
    }

    #[test]
    fn default_table_name_is_lower_camel_case() {
        let ast: DeriveInput = parse_quote! {
            struct UserAvatar { id: i32 }
        };
        assert_eq!(table_name(&ast).unwrap(), "userAvatar");

        let ast: DeriveInput = parse_quote! {
            #[orm(table = "avatars")]
            struct UserAvatar { id: i32 }
        };
        assert_eq!(table_name(&ast).unwrap(), "avatars");
    }

    #[test]
    fn sized_strings_become_varchar() {
        let attrs = FieldAttrs {
            size: Some(64),
            ..FieldAttrs::default()
        };
        let ty: syn::Type = parse_quote!(String);
        let tokens = field_definition("name", &ty, &attrs).to_string();
        assert!(tokens.contains("\"varchar(64)\""));
    }

    #[test]
    fn tuple_structs_are_rejected() {
        let ast: DeriveInput = parse_quote! { struct Pair(i32, i32); };
        assert!(expand(ast).is_err());
    }
}

//! # Simple ORM Procedural Macros
//!
//! `#[derive(Entity)]` implements `simple_orm::Entity` for a struct with
//! named fields. It is re-exported by the `simple-orm` crate and not meant to
//! be used directly.
//!
//! ## Architecture
//!
//! - **`lib.rs`** (this file): macro entry point
//! - **`derive_entity.rs`**: attribute parsing and expansion
//! - **`types.rs`**: Rust → MySQL column type mapping
//!
//! ## Usage
//!
//! ```rust,ignore
//! use simple_orm::Entity;
//!
//! #[derive(Entity)]
//! #[orm(table = "avatars")]
//! struct Avatar {
//!     #[orm(id)]
//!     id: i32,
//!     #[orm(references = "users")]
//!     user_id: i32,
//!     #[orm(size = 255)]
//!     url: Option<String>,
//! }
//! ```
//!
//! The struct also gets an `avatar_fields` module with one constant per
//! column (`avatar_fields::USER_ID == "user_id"`).
//!
//! ## Supported Attributes
//!
//! On the struct:
//!
//! - `table = "name"`: model name, defaults to the lowerCamelCase struct name
//!
//! On fields:
//!
//! - `id`: auto-incremented primary key (no auto-increment for non-integers)
//! - `primary_key`: part of the primary key
//! - `auto_increment`
//! - `size = N`: `varchar(N)` instead of `text` for strings
//! - `sql_type = "..."`: explicit column type
//! - `references = "model"`: reference to another model; `user_id` names the
//!   reference `user`, the column keeps the field name
//! - `values = "a,b"`: enum values
//! - `omit`: not selected unless asked for
//! - `hidden`: can never be selected
//!
//! ## Type Mapping
//!
//! See `types::rust_type_to_sql`. `Option<T>` makes the column nullable.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive_entity;
mod types;

/// Derives `simple_orm::Entity`.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_entity::expand(ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

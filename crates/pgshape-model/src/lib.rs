//! Typed table models for pgshape.
//!
//! This crate contains the pure half of the generator: the column
//! descriptors read from `information_schema`, the mapping from Postgres
//! data types to column kinds and Rust types, and the per-table model that
//! emitters consume. Nothing in here performs I/O.
//!
//! ```
//! use pgshape_model::{ColumnDescriptor, ColumnKind, LanguageType, build};
//!
//! let model = build(
//!     "dvds",
//!     "film_category",
//!     &[
//!         ColumnDescriptor::new("film_id", false, "integer"),
//!         ColumnDescriptor::new("last_update", false, "timestamp without time zone"),
//!     ],
//! );
//!
//! let names: Vec<_> = model.all_columns().map(|c| c.field_name.as_str()).collect();
//! assert_eq!(names, ["FilmID", "LastUpdate"]);
//! assert_eq!(model.columns[0].kind, ColumnKind::Integer);
//! assert_eq!(model.columns[0].ty, LanguageType::Int32);
//! ```

mod casing;
mod descriptor;
mod kind;
mod table;
mod typemap;

pub use casing::{rust_ident, snake_to_camel, to_snake_case, type_ident};
pub use descriptor::ColumnDescriptor;
pub use kind::{ColumnKind, LanguageType};
pub use table::{
    ColumnModel, EXCLUDED_TABLE, MutabilityPolicy, TableModel, TableModelBuilder, TableSet,
    UnmappedType, build,
};
pub use typemap::{Classification, TypeMap, USER_DEFINED, classify};

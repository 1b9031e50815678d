//! Generate typed table bindings from a Postgres catalog.
//!
//! This crate provides:
//! - Catalog reads against `information_schema` ([`CatalogReader`])
//! - A concurrent introspection pipeline producing [`TableModel`]s ([`Generator`])
//! - Rust source emission for those models ([`Emitter`])
//!
//! The pure model types live in `pgshape-model` and are re-exported here.
//!
//! # Example
//!
//! ```ignore
//! let pool = pgshape::pool::connect("postgres://localhost/dvds", 4)?;
//! let report = Generator::new(pool, GenerateOptions::new("dvds")).run().await?;
//!
//! let emitted = Emitter::new("src/gen", EmitOptions::default()).emit_all(&report.tables)?;
//! ```

mod emit;
mod error;
mod generate;
mod introspect;
pub mod pool;
mod traced;

pub use emit::{DEFAULT_RUNTIME_CRATE, EmitOptions, EmitReport, Emitter};
pub use error::{Cause, Error, QueryTimeout, TableNotFound};
pub use generate::{DEFAULT_SCHEMA, GenerateOptions, GenerationReport, Generator};
pub use introspect::{CatalogReader, fetch_columns};
pub use traced::{Connection, ConnectionExt, TracedConn};

pub use pgshape_model::*;

/// Result type for pgshape operations.
pub type Result<T> = std::result::Result<T, Error>;

//!
//! metacat
//! -------
//! Metadata catalog for a SQL query engine: the records describing databases,
//! tables, partitions and functions, the `ExternalCatalog` contract a backing
//! metadata store implements, and the projection of a stored table into the
//! output columns a query plan consumes.

pub mod error;
pub mod config;
pub mod ident;
pub mod catalog;

pub use catalog::*;
pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult, ObjectKind};
pub use ident::{parse_table_identifier, FunctionIdentifier, TableIdentifier};

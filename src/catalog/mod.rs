//! Catalog core: value model, the `ExternalCatalog` contract, an in-memory
//! adapter and the relation projector used by query planning.

pub mod data_type;
pub mod types;
pub mod pattern;
pub mod external;
pub mod in_memory;
pub mod relation;

pub use data_type::{DataType, StructField};
pub use types::{
    partition_spec_string, Column, Database, Function, FunctionResource, FunctionResourceType, Partition, Properties,
    StorageFormat, StorageUpdate, Table, TableBuilder, TablePartitionSpec, TableType,
};
pub use pattern::filter_pattern;
pub use external::{require_db_exists, require_function_exists, require_table_exists, ExternalCatalog};
pub use in_memory::InMemoryCatalog;
pub use relation::{CatalogRelation, OutputColumn, RelationId};

//! The `ExternalCatalog` contract.
//!
//! Every operation a query engine needs against durable catalog objects
//! (databases, tables, partitions, functions), without prescribing how they are
//! stored. Implementations must be callable from many threads at once; each
//! call is atomic for the single entity it targets and nothing is promised
//! across calls.
//!
//! Precondition helpers (`require_*`) are plain functions. The trait never runs
//! them on its own; an adapter decides where to call them.

use crate::catalog::pattern::filter_pattern;
use crate::catalog::types::{Database, Function, Partition, Table, TablePartitionSpec};
use crate::error::{CatalogError, CatalogResult, ObjectKind};

pub trait ExternalCatalog: Send + Sync {
    // ----------------------------------------------------------------------
    // Databases
    // ----------------------------------------------------------------------

    /// Fails `AlreadyExists` unless `ignore_if_exists`, in which case an existing database is left untouched.
    fn create_database(&self, db: Database, ignore_if_exists: bool) -> CatalogResult<()>;

    /// A non-empty database is only removed with `cascade`; otherwise `NotConfirmed`.
    fn drop_database(&self, db: &str, ignore_if_not_exists: bool, cascade: bool) -> CatalogResult<()>;

    /// Replace the definition of the database named by `db.name`. Fields the store
    /// cannot persist are ignored without error.
    fn alter_database(&self, db: Database) -> CatalogResult<()>;

    fn get_database(&self, db: &str) -> CatalogResult<Database>;

    fn database_exists(&self, db: &str) -> bool;

    fn list_databases(&self) -> Vec<String>;

    fn list_databases_by_pattern(&self, pattern: &str) -> Vec<String> {
        filter_pattern(self.list_databases(), pattern)
    }

    /// Switch the session default database used by callers for unqualified names.
    fn set_current_database(&self, db: &str) -> CatalogResult<()>;

    /// `None` once the current database is dropped and no default database exists.
    fn current_database(&self) -> Option<String>;

    // ----------------------------------------------------------------------
    // Tables
    // ----------------------------------------------------------------------

    fn create_table(&self, db: &str, table: Table, ignore_if_exists: bool) -> CatalogResult<()>;

    fn drop_table(&self, db: &str, table: &str, ignore_if_not_exists: bool) -> CatalogResult<()>;

    /// Rename within `db`. Fails `NotFound` for a missing source and `AlreadyExists` on collision.
    fn rename_table(&self, db: &str, old_name: &str, new_name: &str) -> CatalogResult<()>;

    /// Replace the definition of the table named by `table.identifier().table`.
    /// Fields the store cannot persist are ignored without error.
    fn alter_table(&self, db: &str, table: Table) -> CatalogResult<()>;

    fn get_table(&self, db: &str, table: &str) -> CatalogResult<Table>;

    /// `None` when the database or table is absent; never fails.
    fn get_table_option(&self, db: &str, table: &str) -> Option<Table> {
        if !self.table_exists(db, table) {
            return None;
        }
        self.get_table(db, table).ok()
    }

    /// `false` when the database or table is absent; never fails.
    fn table_exists(&self, db: &str, table: &str) -> bool;

    fn list_tables(&self, db: &str) -> CatalogResult<Vec<String>>;

    fn list_tables_by_pattern(&self, db: &str, pattern: &str) -> CatalogResult<Vec<String>> {
        Ok(filter_pattern(self.list_tables(db)?, pattern))
    }

    // ----------------------------------------------------------------------
    // Partitions
    // ----------------------------------------------------------------------

    fn create_partitions(&self, db: &str, table: &str, parts: Vec<Partition>, ignore_if_exists: bool) -> CatalogResult<()>;

    fn drop_partitions(&self, db: &str, table: &str, specs: &[TablePartitionSpec], ignore_if_not_exists: bool) -> CatalogResult<()>;

    /// Element `i` of `specs` is renamed to element `i` of `new_specs`; both slices
    /// must have the same length.
    fn rename_partitions(&self, db: &str, table: &str, specs: &[TablePartitionSpec], new_specs: &[TablePartitionSpec]) -> CatalogResult<()>;

    /// Replace partitions matched by spec. Fields the store cannot persist are ignored without error.
    fn alter_partitions(&self, db: &str, table: &str, parts: Vec<Partition>) -> CatalogResult<()>;

    fn get_partition(&self, db: &str, table: &str, spec: &TablePartitionSpec) -> CatalogResult<Partition>;

    fn list_partitions(&self, db: &str, table: &str) -> CatalogResult<Vec<Partition>>;

    // ----------------------------------------------------------------------
    // Functions
    // ----------------------------------------------------------------------

    fn create_function(&self, db: &str, func: Function, ignore_if_exists: bool) -> CatalogResult<()>;

    fn drop_function(&self, db: &str, name: &str, ignore_if_not_exists: bool) -> CatalogResult<()>;

    fn rename_function(&self, db: &str, old_name: &str, new_name: &str) -> CatalogResult<()>;

    fn get_function(&self, db: &str, name: &str) -> CatalogResult<Function>;

    fn function_exists(&self, db: &str, name: &str) -> bool;

    fn list_functions(&self, db: &str, pattern: &str) -> CatalogResult<Vec<String>>;
}

/// Fail `NotFound` unless database `db` exists.
pub fn require_db_exists<C: ExternalCatalog + ?Sized>(catalog: &C, db: &str) -> CatalogResult<()> {
    if catalog.database_exists(db) {
        Ok(())
    } else {
        Err(CatalogError::not_found(ObjectKind::Database, db))
    }
}

/// Fail `NotFound` for a missing database, then for a missing table.
pub fn require_table_exists<C: ExternalCatalog + ?Sized>(catalog: &C, db: &str, table: &str) -> CatalogResult<()> {
    require_db_exists(catalog, db)?;
    if catalog.table_exists(db, table) {
        Ok(())
    } else {
        Err(CatalogError::not_found(ObjectKind::Table, format!("{}.{}", db, table)))
    }
}

/// Fail `NotFound` for a missing database, then for a missing function.
pub fn require_function_exists<C: ExternalCatalog + ?Sized>(catalog: &C, db: &str, name: &str) -> CatalogResult<()> {
    require_db_exists(catalog, db)?;
    if catalog.function_exists(db, name) {
        Ok(())
    } else {
        Err(CatalogError::not_found(ObjectKind::Function, format!("{}.{}", db, name)))
    }
}

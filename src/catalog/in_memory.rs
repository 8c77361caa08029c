//! In-memory `ExternalCatalog` adapter.
//!
//! Catalog objects sit behind one `parking_lot::RwLock` that every call takes
//! once, so a call is atomic and conflicting mutations are serialised. The
//! current-database pointer has its own lock, only ever taken after the
//! catalog lock when both are needed, so it never names a dropped database.
//! Batch partition operations validate every target before touching anything:
//! they either apply completely or fail leaving the table unchanged.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

use crate::catalog::external::ExternalCatalog;
use crate::catalog::pattern::filter_pattern;
use crate::catalog::types::{
    partition_spec_string, Database, Function, Partition, Properties, StorageUpdate, Table, TablePartitionSpec, TableType,
};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult, ObjectKind};
use crate::ident::{FunctionIdentifier, TableIdentifier};

#[derive(Debug, Clone)]
struct TableEntry {
    table: Table,
    partitions: BTreeMap<TablePartitionSpec, Partition>,
}

#[derive(Debug, Clone)]
struct DatabaseEntry {
    db: Database,
    tables: HashMap<String, TableEntry>,
    functions: HashMap<String, Function>,
}

impl DatabaseEntry {
    fn new(db: Database) -> Self {
        Self { db, tables: HashMap::new(), functions: HashMap::new() }
    }

    fn is_empty(&self) -> bool { self.tables.is_empty() && self.functions.is_empty() }

    fn table_location(&self, table: &str) -> String {
        format!("{}/{}", self.db.location_uri.trim_end_matches('/'), table)
    }
}

type Databases = HashMap<String, DatabaseEntry>;

fn qualified(db: &str, name: &str) -> String { format!("{}.{}", db, name) }

fn partition_name(db: &str, table: &str, spec: &TablePartitionSpec) -> String {
    format!("{}.{} ({})", db, table, partition_spec_string(spec))
}

fn db_entry<'a>(dbs: &'a Databases, db: &str) -> CatalogResult<&'a DatabaseEntry> {
    dbs.get(db).ok_or_else(|| CatalogError::not_found(ObjectKind::Database, db))
}

fn db_entry_mut<'a>(dbs: &'a mut Databases, db: &str) -> CatalogResult<&'a mut DatabaseEntry> {
    dbs.get_mut(db).ok_or_else(|| CatalogError::not_found(ObjectKind::Database, db))
}

fn table_entry<'a>(dbs: &'a Databases, db: &str, table: &str) -> CatalogResult<&'a TableEntry> {
    db_entry(dbs, db)?.tables.get(table).ok_or_else(|| CatalogError::not_found(ObjectKind::Table, qualified(db, table)))
}

fn table_entry_mut<'a>(dbs: &'a mut Databases, db: &str, table: &str) -> CatalogResult<&'a mut TableEntry> {
    db_entry_mut(dbs, db)?.tables.get_mut(table).ok_or_else(|| CatalogError::not_found(ObjectKind::Table, qualified(db, table)))
}

/// A definition may name its database already; it must then agree with the target.
fn check_bound_database(kind: ObjectKind, bound: Option<&str>, db: &str, name: &str) -> CatalogResult<()> {
    match bound {
        Some(other) if other != db => Err(CatalogError::invalid(format!(
            "{} '{}' is defined in database '{}' but was submitted to database '{}'",
            kind, name, other, db
        ))),
        _ => Ok(()),
    }
}

/// A spec must name exactly the table's partition columns.
fn validate_spec(table: &Table, spec: &TablePartitionSpec) -> CatalogResult<()> {
    if !table.is_partitioned() {
        return Err(CatalogError::invalid(format!("table {} is not partitioned", table.identifier().quoted_string())));
    }
    let cols: BTreeSet<&str> = table.partition_column_names().iter().map(String::as_str).collect();
    let keys: BTreeSet<&str> = spec.keys().map(String::as_str).collect();
    if cols != keys {
        return Err(CatalogError::invalid(format!(
            "partition spec ({}) must match partition columns ({}) of table {}",
            partition_spec_string(spec),
            table.partition_column_names().join(", "),
            table.identifier().quoted_string()
        )));
    }
    Ok(())
}

/// Percent-encode the characters that would read as extra path levels or key/value separators.
fn escape_path_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}

/// `<table location>/k1=v1/k2=v2`, keys in partition-column order, values escaped.
fn default_partition_location(table: &Table, spec: &TablePartitionSpec) -> Option<String> {
    let base = table.storage().location_uri.as_deref()?;
    let path: Vec<String> = table
        .partition_column_names()
        .iter()
        .filter_map(|c| spec.get(c).map(|v| format!("{}={}", c, escape_path_value(v))))
        .collect();
    Some(format!("{}/{}", base.trim_end_matches('/'), path.join("/")))
}

fn with_default_location(table: &Table, part: Partition) -> Partition {
    if part.storage.location_uri.is_some() {
        return part;
    }
    let mut storage = part.storage.clone();
    storage.location_uri = default_partition_location(table, &part.spec);
    part.with_storage(storage)
}

pub struct InMemoryCatalog {
    config: CatalogConfig,
    databases: RwLock<Databases>,
    current_database: RwLock<Option<String>>,
}

impl InMemoryCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        let mut dbs = Databases::new();
        let mut current = None;
        if config.create_default_database {
            let name = config.default_database.clone();
            let location = config.default_database_location(&name);
            debug!(target: "metacat::catalog", "new: seeding default database '{}' at '{}'", name, location);
            dbs.insert(name.clone(), DatabaseEntry::new(Database::new(name.clone(), "default database", location, Properties::new())));
            current = Some(name);
        }
        Self { config, databases: RwLock::new(dbs), current_database: RwLock::new(current) }
    }

    pub fn from_env() -> Self { Self::new(CatalogConfig::from_env()) }

    pub fn config(&self) -> &CatalogConfig { &self.config }
}

impl Default for InMemoryCatalog {
    fn default() -> Self { Self::new(CatalogConfig::default()) }
}

impl ExternalCatalog for InMemoryCatalog {
    fn create_database(&self, db: Database, ignore_if_exists: bool) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        if dbs.contains_key(&db.name) {
            if ignore_if_exists {
                debug!(target: "metacat::catalog", "create_database: '{}' exists, ignored", db.name);
                return Ok(());
            }
            return Err(CatalogError::already_exists(ObjectKind::Database, db.name));
        }
        let db = if db.location_uri.is_empty() {
            let location = self.config.default_database_location(&db.name);
            db.with_location_uri(location)
        } else { db };
        info!(target: "metacat::catalog", "create_database: name='{}' location='{}'", db.name, db.location_uri);
        dbs.insert(db.name.clone(), DatabaseEntry::new(db));
        Ok(())
    }

    fn drop_database(&self, db: &str, ignore_if_not_exists: bool, cascade: bool) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        match dbs.get(db) {
            None if ignore_if_not_exists => {
                debug!(target: "metacat::catalog", "drop_database: '{}' missing, ignored", db);
                return Ok(());
            }
            None => return Err(CatalogError::not_found(ObjectKind::Database, db)),
            Some(entry) if !cascade && !entry.is_empty() => {
                return Err(CatalogError::not_confirmed(format!(
                    "database '{}' is not empty ({} table(s), {} function(s)); use cascade to drop it",
                    db,
                    entry.tables.len(),
                    entry.functions.len()
                )));
            }
            Some(_) => {}
        }
        if let Some(entry) = dbs.remove(db) {
            info!(target: "metacat::catalog", "drop_database: name='{}' cascade={} tables_removed={} functions_removed={}", db, cascade, entry.tables.len(), entry.functions.len());
        }
        let mut cur = self.current_database.write();
        if cur.as_deref() == Some(db) {
            let fallback = &self.config.default_database;
            *cur = dbs.contains_key(fallback).then(|| fallback.clone());
            debug!(target: "metacat::catalog", "drop_database: current database reset to {:?}", *cur);
        }
        Ok(())
    }

    fn alter_database(&self, db: Database) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let entry = db_entry_mut(&mut dbs, &db.name)?;
        // location is fixed once created
        let db = if db.location_uri.is_empty() { db.with_location_uri(entry.db.location_uri.clone()) } else { db };
        info!(target: "metacat::catalog", "alter_database: name='{}'", db.name);
        entry.db = db;
        Ok(())
    }

    fn get_database(&self, db: &str) -> CatalogResult<Database> {
        Ok(db_entry(&self.databases.read(), db)?.db.clone())
    }

    fn database_exists(&self, db: &str) -> bool {
        self.databases.read().contains_key(db)
    }

    fn list_databases(&self) -> Vec<String> {
        let mut out: Vec<String> = self.databases.read().keys().cloned().collect();
        out.sort();
        out
    }

    fn set_current_database(&self, db: &str) -> CatalogResult<()> {
        // held until the pointer is written so a concurrent drop cannot interleave
        let dbs = self.databases.read();
        db_entry(&dbs, db)?;
        debug!(target: "metacat::catalog", "set_current_database: '{}'", db);
        *self.current_database.write() = Some(db.to_string());
        Ok(())
    }

    fn current_database(&self) -> Option<String> {
        self.current_database.read().clone()
    }

    fn create_table(&self, db: &str, table: Table, ignore_if_exists: bool) -> CatalogResult<()> {
        let name = table.identifier().table.clone();
        check_bound_database(ObjectKind::Table, table.identifier().database.as_deref(), db, &name)?;
        let mut dbs = self.databases.write();
        let entry = db_entry_mut(&mut dbs, db)?;
        if entry.tables.contains_key(&name) {
            if ignore_if_exists {
                debug!(target: "metacat::catalog", "create_table: '{}' exists, ignored", qualified(db, &name));
                return Ok(());
            }
            return Err(CatalogError::already_exists(ObjectKind::Table, qualified(db, &name)));
        }
        let mut table = table.with_identifier(TableIdentifier::with_database(name.clone(), db));
        if table.table_type() == TableType::Managed && table.storage().location_uri.is_none() {
            table = table.with_new_storage(StorageUpdate::location(entry.table_location(&name)));
        }
        info!(target: "metacat::catalog", "create_table: table='{}' type={} columns={} partitions={:?}", qualified(db, &name), table.table_type(), table.schema().len(), table.partition_column_names());
        entry.tables.insert(name, TableEntry { table, partitions: BTreeMap::new() });
        Ok(())
    }

    fn drop_table(&self, db: &str, table: &str, ignore_if_not_exists: bool) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let entry = db_entry_mut(&mut dbs, db)?;
        match entry.tables.remove(table) {
            Some(te) => {
                info!(target: "metacat::catalog", "drop_table: table='{}' partitions_removed={}", qualified(db, table), te.partitions.len());
                Ok(())
            }
            None if ignore_if_not_exists => Ok(()),
            None => Err(CatalogError::not_found(ObjectKind::Table, qualified(db, table))),
        }
    }

    fn rename_table(&self, db: &str, old_name: &str, new_name: &str) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let entry = db_entry_mut(&mut dbs, db)?;
        if !entry.tables.contains_key(old_name) {
            return Err(CatalogError::not_found(ObjectKind::Table, qualified(db, old_name)));
        }
        if entry.tables.contains_key(new_name) {
            return Err(CatalogError::already_exists(ObjectKind::Table, qualified(db, new_name)));
        }
        let old_location = entry.table_location(old_name);
        let new_location = entry.table_location(new_name);
        let mut te = entry
            .tables
            .remove(old_name)
            .ok_or_else(|| CatalogError::not_found(ObjectKind::Table, qualified(db, old_name)))?;
        let mut table = te.table.with_identifier(TableIdentifier::with_database(new_name, db));
        // managed tables living at their default location follow the name
        if table.table_type() == TableType::Managed && table.storage().location_uri.as_deref() == Some(old_location.as_str()) {
            table = table.with_new_storage(StorageUpdate::location(new_location));
        }
        te.table = table;
        info!(target: "metacat::catalog", "rename_table: '{}' -> '{}'", qualified(db, old_name), qualified(db, new_name));
        entry.tables.insert(new_name.to_string(), te);
        Ok(())
    }

    fn alter_table(&self, db: &str, table: Table) -> CatalogResult<()> {
        let name = table.identifier().table.clone();
        check_bound_database(ObjectKind::Table, table.identifier().database.as_deref(), db, &name)?;
        let mut dbs = self.databases.write();
        let te = table_entry_mut(&mut dbs, db, &name)?;
        let stored = &te.table;
        let mut altered = table
            .with_identifier(TableIdentifier::with_database(name.clone(), db))
            .with_create_time(stored.create_time());
        // partition layout is fixed once partitions can exist
        if altered.partition_column_names() != stored.partition_column_names() {
            debug!(target: "metacat::catalog", "alter_table: ignoring partition column change on '{}'", qualified(db, &name));
            altered = altered.with_partition_column_names(stored.partition_column_names().to_vec())?;
        }
        info!(target: "metacat::catalog", "alter_table: table='{}'", qualified(db, &name));
        te.table = altered;
        Ok(())
    }

    fn get_table(&self, db: &str, table: &str) -> CatalogResult<Table> {
        Ok(table_entry(&self.databases.read(), db, table)?.table.clone())
    }

    fn get_table_option(&self, db: &str, table: &str) -> Option<Table> {
        self.databases.read().get(db).and_then(|e| e.tables.get(table)).map(|te| te.table.clone())
    }

    fn table_exists(&self, db: &str, table: &str) -> bool {
        self.databases.read().get(db).map(|e| e.tables.contains_key(table)).unwrap_or(false)
    }

    fn list_tables(&self, db: &str) -> CatalogResult<Vec<String>> {
        let dbs = self.databases.read();
        let mut out: Vec<String> = db_entry(&dbs, db)?.tables.keys().cloned().collect();
        out.sort();
        Ok(out)
    }

    fn create_partitions(&self, db: &str, table: &str, parts: Vec<Partition>, ignore_if_exists: bool) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let te = table_entry_mut(&mut dbs, db, table)?;
        let mut seen: BTreeSet<TablePartitionSpec> = BTreeSet::new();
        let mut accepted: Vec<Partition> = Vec::with_capacity(parts.len());
        for part in parts {
            validate_spec(&te.table, &part.spec)?;
            let duplicate = !seen.insert(part.spec.clone()) || te.partitions.contains_key(&part.spec);
            if duplicate {
                if ignore_if_exists { continue; }
                return Err(CatalogError::already_exists(ObjectKind::Partition, partition_name(db, table, &part.spec)));
            }
            accepted.push(with_default_location(&te.table, part));
        }
        info!(target: "metacat::catalog", "create_partitions: table='{}' added={}", qualified(db, table), accepted.len());
        for part in accepted {
            te.partitions.insert(part.spec.clone(), part);
        }
        Ok(())
    }

    fn drop_partitions(&self, db: &str, table: &str, specs: &[TablePartitionSpec], ignore_if_not_exists: bool) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let te = table_entry_mut(&mut dbs, db, table)?;
        for spec in specs {
            validate_spec(&te.table, spec)?;
            if !te.partitions.contains_key(spec) && !ignore_if_not_exists {
                return Err(CatalogError::not_found(ObjectKind::Partition, partition_name(db, table, spec)));
            }
        }
        let removed = specs.iter().filter(|s| te.partitions.remove(*s).is_some()).count();
        info!(target: "metacat::catalog", "drop_partitions: table='{}' removed={}", qualified(db, table), removed);
        Ok(())
    }

    fn rename_partitions(&self, db: &str, table: &str, specs: &[TablePartitionSpec], new_specs: &[TablePartitionSpec]) -> CatalogResult<()> {
        if specs.len() != new_specs.len() {
            return Err(CatalogError::invalid(format!(
                "rename_partitions needs the same number of old and new specs (got {} and {})",
                specs.len(),
                new_specs.len()
            )));
        }
        let mut dbs = self.databases.write();
        let te = table_entry_mut(&mut dbs, db, table)?;
        let mut seen_old: BTreeSet<&TablePartitionSpec> = BTreeSet::new();
        for spec in specs {
            validate_spec(&te.table, spec)?;
            if !te.partitions.contains_key(spec) {
                return Err(CatalogError::not_found(ObjectKind::Partition, partition_name(db, table, spec)));
            }
            if !seen_old.insert(spec) {
                return Err(CatalogError::invalid(format!("partition {} listed twice", partition_name(db, table, spec))));
            }
        }
        let mut seen_new: BTreeSet<&TablePartitionSpec> = BTreeSet::new();
        for spec in new_specs {
            validate_spec(&te.table, spec)?;
            if te.partitions.contains_key(spec) || !seen_new.insert(spec) {
                return Err(CatalogError::already_exists(ObjectKind::Partition, partition_name(db, table, spec)));
            }
        }
        let mut moved: Vec<Partition> = Vec::with_capacity(specs.len());
        for (old, new) in specs.iter().zip(new_specs) {
            if let Some(part) = te.partitions.remove(old) {
                let mut storage = part.storage.clone();
                if storage.location_uri.is_some() && storage.location_uri == default_partition_location(&te.table, old) {
                    storage.location_uri = default_partition_location(&te.table, new);
                }
                moved.push(Partition::new(new.clone(), storage));
            }
        }
        info!(target: "metacat::catalog", "rename_partitions: table='{}' renamed={}", qualified(db, table), moved.len());
        for part in moved {
            te.partitions.insert(part.spec.clone(), part);
        }
        Ok(())
    }

    fn alter_partitions(&self, db: &str, table: &str, parts: Vec<Partition>) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let te = table_entry_mut(&mut dbs, db, table)?;
        for part in &parts {
            validate_spec(&te.table, &part.spec)?;
            if !te.partitions.contains_key(&part.spec) {
                return Err(CatalogError::not_found(ObjectKind::Partition, partition_name(db, table, &part.spec)));
            }
        }
        info!(target: "metacat::catalog", "alter_partitions: table='{}' altered={}", qualified(db, table), parts.len());
        for part in parts {
            let part = with_default_location(&te.table, part);
            te.partitions.insert(part.spec.clone(), part);
        }
        Ok(())
    }

    fn get_partition(&self, db: &str, table: &str, spec: &TablePartitionSpec) -> CatalogResult<Partition> {
        let dbs = self.databases.read();
        let te = table_entry(&dbs, db, table)?;
        te.partitions
            .get(spec)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(ObjectKind::Partition, partition_name(db, table, spec)))
    }

    fn list_partitions(&self, db: &str, table: &str) -> CatalogResult<Vec<Partition>> {
        let dbs = self.databases.read();
        Ok(table_entry(&dbs, db, table)?.partitions.values().cloned().collect())
    }

    fn create_function(&self, db: &str, func: Function, ignore_if_exists: bool) -> CatalogResult<()> {
        let name = func.identifier.func_name.clone();
        check_bound_database(ObjectKind::Function, func.identifier.database.as_deref(), db, &name)?;
        let mut dbs = self.databases.write();
        let entry = db_entry_mut(&mut dbs, db)?;
        if entry.functions.contains_key(&name) {
            if ignore_if_exists { return Ok(()); }
            return Err(CatalogError::already_exists(ObjectKind::Function, qualified(db, &name)));
        }
        let func = func.with_identifier(FunctionIdentifier::with_database(name.clone(), db));
        info!(target: "metacat::catalog", "create_function: function='{}' class='{}'", qualified(db, &name), func.class_name);
        entry.functions.insert(name, func);
        Ok(())
    }

    fn drop_function(&self, db: &str, name: &str, ignore_if_not_exists: bool) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let entry = db_entry_mut(&mut dbs, db)?;
        match entry.functions.remove(name) {
            Some(_) => {
                info!(target: "metacat::catalog", "drop_function: function='{}'", qualified(db, name));
                Ok(())
            }
            None if ignore_if_not_exists => Ok(()),
            None => Err(CatalogError::not_found(ObjectKind::Function, qualified(db, name))),
        }
    }

    fn rename_function(&self, db: &str, old_name: &str, new_name: &str) -> CatalogResult<()> {
        let mut dbs = self.databases.write();
        let entry = db_entry_mut(&mut dbs, db)?;
        if !entry.functions.contains_key(old_name) {
            return Err(CatalogError::not_found(ObjectKind::Function, qualified(db, old_name)));
        }
        if entry.functions.contains_key(new_name) {
            return Err(CatalogError::already_exists(ObjectKind::Function, qualified(db, new_name)));
        }
        let func = entry
            .functions
            .remove(old_name)
            .ok_or_else(|| CatalogError::not_found(ObjectKind::Function, qualified(db, old_name)))?;
        let func = func.with_identifier(FunctionIdentifier::with_database(new_name, db));
        info!(target: "metacat::catalog", "rename_function: '{}' -> '{}'", qualified(db, old_name), qualified(db, new_name));
        entry.functions.insert(new_name.to_string(), func);
        Ok(())
    }

    fn get_function(&self, db: &str, name: &str) -> CatalogResult<Function> {
        let dbs = self.databases.read();
        db_entry(&dbs, db)?
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(ObjectKind::Function, qualified(db, name)))
    }

    fn function_exists(&self, db: &str, name: &str) -> bool {
        self.databases.read().get(db).map(|e| e.functions.contains_key(name)).unwrap_or(false)
    }

    fn list_functions(&self, db: &str, pattern: &str) -> CatalogResult<Vec<String>> {
        let dbs = self.databases.read();
        let entry = db_entry(&dbs, db)?;
        Ok(filter_pattern(entry.functions.keys(), pattern))
    }
}

#[cfg(test)]
#[path = "in_memory_tests.rs"]
mod in_memory_tests;

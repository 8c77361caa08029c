//! Relation projector: turns a stored table definition into the ordered,
//! typed output columns a query plan works with.
//!
//! - Data columns come first, partition columns last, each group in schema order.
//!   Partition pruning relies on partition columns trailing.
//! - Every output column is nullable. Storage is written outside the engine and
//!   its NOT NULL declarations are not trusted.
//! - Columns are qualified by the alias, or by the bare table name without one.

use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::data_type::DataType;
use crate::catalog::external::ExternalCatalog;
use crate::catalog::types::{Column, Table};
use crate::error::{CatalogError, CatalogResult};

/// Identity of one reference to a relation within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RelationId(Uuid);

impl RelationId {
    fn fresh() -> Self { RelationId(Uuid::new_v4()) }
}

impl Display for RelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputColumn {
    pub name: String,
    /// `None` while the stored column has no type descriptor.
    pub data_type: Option<DataType>,
    pub nullable: bool,
    pub qualifier: String,
    pub comment: Option<String>,
}

/// Plan leaf backed by a catalog table.
///
/// `PartialEq` compares values only (database, table, alias). Two references to
/// the same table in one plan are told apart with `same_instance`; `clone`
/// keeps the identity, `new_instance` mints a new one.
#[derive(Debug, Clone)]
pub struct CatalogRelation {
    database_name: String,
    metadata: Table,
    alias: Option<String>,
    output: Vec<OutputColumn>,
    partition_count: usize,
    id: RelationId,
}

impl CatalogRelation {
    pub fn new(database_name: impl Into<String>, metadata: Table, alias: Option<String>) -> CatalogResult<Self> {
        let database_name = database_name.into();
        let declared = metadata.database()?;
        if declared != database_name {
            return Err(CatalogError::invalid(format!(
                "relation bound to database '{}' but table {} belongs to database '{}'",
                database_name,
                metadata.identifier().quoted_string(),
                declared
            )));
        }
        let qualifier = alias.clone().unwrap_or_else(|| metadata.identifier().table.clone());
        let data = metadata.data_columns();
        let parts = metadata.partition_columns();
        let partition_count = parts.len();
        let output = data
            .into_iter()
            .chain(parts)
            .map(|c| project_column(c, &qualifier))
            .collect::<CatalogResult<Vec<_>>>()?;
        debug!(target: "metacat::relation", "new: table='{}.{}' qualifier='{}' columns={} partition_columns={}", database_name, metadata.identifier().table, qualifier, output.len(), partition_count);
        Ok(Self { database_name, metadata, alias, output, partition_count, id: RelationId::fresh() })
    }

    /// Resolve `db.table` through a catalog and project it.
    pub fn lookup<C: ExternalCatalog + ?Sized>(catalog: &C, db: &str, table: &str, alias: Option<String>) -> CatalogResult<Self> {
        let metadata = catalog.get_table(db, table)?;
        Self::new(db, metadata, alias)
    }

    pub fn database_name(&self) -> &str { &self.database_name }
    pub fn metadata(&self) -> &Table { &self.metadata }
    pub fn alias(&self) -> Option<&str> { self.alias.as_deref() }
    pub fn id(&self) -> RelationId { self.id }

    pub fn output(&self) -> &[OutputColumn] { &self.output }

    /// Non-partition columns, in schema order.
    pub fn data_output(&self) -> &[OutputColumn] { &self.output[..self.output.len() - self.partition_count] }

    /// Partition columns, in schema order.
    pub fn partition_output(&self) -> &[OutputColumn] { &self.output[self.output.len() - self.partition_count..] }

    /// Structurally equal copy with a fresh identity.
    pub fn new_instance(&self) -> Self {
        Self { id: RelationId::fresh(), ..self.clone() }
    }

    pub fn same_instance(&self, other: &CatalogRelation) -> bool { self.id == other.id }

    /// Re-qualify the output under `alias`, keeping this instance's identity.
    pub fn with_alias(&self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let output = self.output.iter().map(|c| OutputColumn { qualifier: alias.clone(), ..c.clone() }).collect();
        Self { alias: Some(alias), output, ..self.clone() }
    }
}

impl PartialEq for CatalogRelation {
    fn eq(&self, other: &Self) -> bool {
        self.database_name == other.database_name && self.metadata == other.metadata && self.alias == other.alias
    }
}

fn project_column(c: &Column, qualifier: &str) -> CatalogResult<OutputColumn> {
    Ok(OutputColumn {
        name: c.name.clone(),
        data_type: c.parsed_type()?,
        nullable: true,
        qualifier: qualifier.to_string(),
        comment: c.comment.clone(),
    })
}

#[cfg(test)]
#[path = "relation_tests.rs"]
mod relation_tests;

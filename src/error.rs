//! Catalog error model and mapping helpers.
//! Every contract call and every value-model constructor reports failures through
//! `CatalogError`; frontends map it to their own codes via the helpers below.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The kind of catalog object an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Database,
    Table,
    Partition,
    Function,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Database => "database",
            ObjectKind::Table => "table",
            ObjectKind::Partition => "partition",
            ObjectKind::Function => "function",
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ObjectKind, name: String },
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ObjectKind, name: String },
    #[error("not confirmed: {message}")]
    NotConfirmed { message: String },
    #[error("invalid definition: {message}")]
    InvalidDefinition { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self { CatalogError::NotFound { kind, name: name.into() } }
    pub fn already_exists(kind: ObjectKind, name: impl Into<String>) -> Self { CatalogError::AlreadyExists { kind, name: name.into() } }
    pub fn not_confirmed(message: impl Into<String>) -> Self { CatalogError::NotConfirmed { message: message.into() } }
    pub fn invalid(message: impl Into<String>) -> Self { CatalogError::InvalidDefinition { message: message.into() } }

    pub fn code_str(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::AlreadyExists { .. } => "already_exists",
            CatalogError::NotConfirmed { .. } => "not_confirmed",
            CatalogError::InvalidDefinition { .. } => "invalid_definition",
        }
    }

    pub fn is_not_found(&self) -> bool { matches!(self, CatalogError::NotFound { .. }) }
    pub fn is_already_exists(&self) -> bool { matches!(self, CatalogError::AlreadyExists { .. }) }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            CatalogError::NotFound { .. } => 404,
            CatalogError::AlreadyExists { .. } => 409,
            CatalogError::NotConfirmed { .. } => 412,
            CatalogError::InvalidDefinition { .. } => 400,
        }
    }

    /// Postgres SQLSTATE for pgwire-style frontends.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            CatalogError::NotFound { kind, .. } => match kind {
                ObjectKind::Database => "3D000",  // invalid_catalog_name
                ObjectKind::Table => "42P01",     // undefined_table
                ObjectKind::Partition => "42704", // undefined_object
                ObjectKind::Function => "42883",  // undefined_function
            },
            CatalogError::AlreadyExists { kind, .. } => match kind {
                ObjectKind::Database => "42P04",
                ObjectKind::Table => "42P07",
                ObjectKind::Partition => "42710",
                ObjectKind::Function => "42723",
            },
            CatalogError::NotConfirmed { .. } => "2BP01", // dependent_objects_still_exist
            CatalogError::InvalidDefinition { .. } => "42P16",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;

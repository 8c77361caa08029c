//! Catalog value model: databases, tables, storage formats, columns, partitions
//! and functions.
//!
//! All records are immutable values. "Changing" one means building a new value
//! through a `with_*` function. `Table` keeps its fields private because its
//! column-name lists must stay a subset of its schema; the check runs when the
//! value is built, never later.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::debug;

use crate::catalog::data_type::DataType;
use crate::error::{CatalogError, CatalogResult};
use crate::ident::{FunctionIdentifier, TableIdentifier};

pub type Properties = BTreeMap<String, String>;

/// Partition identity: partition column name -> value. Two specs name the same
/// partition iff their maps are equal.
pub type TablePartitionSpec = BTreeMap<String, String>;

/// Render a spec as `k1=v1/k2=v2` for messages and keys.
pub fn partition_spec_string(spec: &TablePartitionSpec) -> String {
    spec.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("/")
}

/// Default `create_time` for tables built or loaded without one.
fn now_millis() -> i64 { Utc::now().timestamp_millis() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub description: String,
    pub location_uri: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Database {
    pub fn new(name: impl Into<String>, description: impl Into<String>, location_uri: impl Into<String>, properties: Properties) -> Self {
        Self { name: name.into(), description: description.into(), location_uri: location_uri.into(), properties }
    }

    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self { description: description.into(), ..self.clone() }
    }

    pub fn with_location_uri(&self, location_uri: impl Into<String>) -> Self {
        Self { location_uri: location_uri.into(), ..self.clone() }
    }

    pub fn with_properties(&self, properties: Properties) -> Self {
        Self { properties, ..self.clone() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageFormat {
    #[serde(default)]
    pub location_uri: Option<String>,
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub serializer: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl StorageFormat {
    pub fn empty() -> Self { Self::default() }

    pub fn at_location(location_uri: impl Into<String>) -> Self {
        Self { location_uri: Some(location_uri.into()), ..Self::default() }
    }

    /// Apply an update; absent fields keep their current value.
    pub fn updated(&self, update: &StorageUpdate) -> Self {
        let mut out = self.clone();
        if let Some(v) = &update.location_uri { out.location_uri = v.clone(); }
        if let Some(v) = &update.input_format { out.input_format = v.clone(); }
        if let Some(v) = &update.output_format { out.output_format = v.clone(); }
        if let Some(v) = &update.serializer { out.serializer = v.clone(); }
        if let Some(v) = &update.properties { out.properties = v.clone(); }
        out
    }
}

/// Overrides for `Table::with_new_storage`. `None` keeps the current value;
/// `Some(None)` clears an optional sub-field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageUpdate {
    pub location_uri: Option<Option<String>>,
    pub input_format: Option<Option<String>>,
    pub output_format: Option<Option<String>>,
    pub serializer: Option<Option<String>>,
    pub properties: Option<Properties>,
}

impl StorageUpdate {
    pub fn location(uri: impl Into<String>) -> Self {
        Self { location_uri: Some(Some(uri.into())), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool { *self == Self::default() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Type descriptor text. Absent for view columns whose type is not resolved yet.
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default = "Column::default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Column {
    fn default_nullable() -> bool { true }

    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self { name: name.into(), data_type: Some(data_type.into()), nullable: true, comment: None }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self { name: name.into(), data_type: None, nullable: true, comment: None }
    }

    pub fn with_nullable(&self, nullable: bool) -> Self { Self { nullable, ..self.clone() } }

    pub fn with_comment(&self, comment: impl Into<String>) -> Self { Self { comment: Some(comment.into()), ..self.clone() } }

    /// Parse the descriptor, if any.
    pub fn parsed_type(&self) -> CatalogResult<Option<DataType>> {
        self.data_type.as_deref().map(DataType::parse).transpose()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    External,
    Managed,
    Index,
    VirtualView,
}

impl TableType {
    pub const ALL: [TableType; 4] = [TableType::External, TableType::Managed, TableType::Index, TableType::VirtualView];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::External => "EXTERNAL",
            TableType::Managed => "MANAGED",
            TableType::Index => "INDEX",
            TableType::VirtualView => "VIRTUAL_VIEW",
        }
    }

    pub fn parse(s: &str) -> CatalogResult<TableType> {
        let t = s.trim();
        TableType::ALL
            .iter()
            .copied()
            .find(|tt| tt.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| CatalogError::invalid(format!("unknown table type '{}'", s)))
    }
}

impl FromStr for TableType {
    type Err = CatalogError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { TableType::parse(s) }
}

impl Display for TableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// A stored table or view definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    identifier: TableIdentifier,
    table_type: TableType,
    storage: StorageFormat,
    schema: Vec<Column>,
    partition_column_names: Vec<String>,
    sort_column_names: Vec<String>,
    bucket_column_names: Vec<String>,
    num_buckets: i32,
    owner: String,
    create_time: i64,
    last_access_time: i64,
    properties: Properties,
    view_original_text: Option<String>,
    view_text: Option<String>,
    comment: Option<String>,
}

impl Table {
    pub fn builder(identifier: TableIdentifier, table_type: TableType, storage: StorageFormat) -> TableBuilder {
        TableBuilder {
            inner: Table {
                identifier,
                table_type,
                storage,
                schema: Vec::new(),
                partition_column_names: Vec::new(),
                sort_column_names: Vec::new(),
                bucket_column_names: Vec::new(),
                num_buckets: -1,
                owner: String::new(),
                create_time: now_millis(),
                last_access_time: -1,
                properties: Properties::new(),
                view_original_text: None,
                view_text: None,
                comment: None,
            },
        }
    }

    pub fn identifier(&self) -> &TableIdentifier { &self.identifier }
    pub fn table_type(&self) -> TableType { self.table_type }
    pub fn storage(&self) -> &StorageFormat { &self.storage }
    pub fn schema(&self) -> &[Column] { &self.schema }
    pub fn partition_column_names(&self) -> &[String] { &self.partition_column_names }
    pub fn sort_column_names(&self) -> &[String] { &self.sort_column_names }
    pub fn bucket_column_names(&self) -> &[String] { &self.bucket_column_names }
    pub fn num_buckets(&self) -> i32 { self.num_buckets }
    pub fn owner(&self) -> &str { &self.owner }
    pub fn create_time(&self) -> i64 { self.create_time }
    pub fn last_access_time(&self) -> i64 { self.last_access_time }
    pub fn properties(&self) -> &Properties { &self.properties }
    pub fn view_original_text(&self) -> Option<&str> { self.view_original_text.as_deref() }
    pub fn view_text(&self) -> Option<&str> { self.view_text.as_deref() }
    pub fn comment(&self) -> Option<&str> { self.comment.as_deref() }

    pub fn column_names(&self) -> Vec<&str> { self.schema.iter().map(|c| c.name.as_str()).collect() }

    /// Schema columns that are partition columns, in schema order.
    pub fn partition_columns(&self) -> Vec<&Column> {
        self.schema.iter().filter(|c| self.partition_column_names.contains(&c.name)).collect()
    }

    /// Schema columns that are not partition columns, in schema order.
    pub fn data_columns(&self) -> Vec<&Column> {
        self.schema.iter().filter(|c| !self.partition_column_names.contains(&c.name)).collect()
    }

    pub fn is_partitioned(&self) -> bool { !self.partition_column_names.is_empty() }
    pub fn is_view(&self) -> bool { self.table_type == TableType::VirtualView }

    /// Owning database. A table not yet bound to a database cannot answer this.
    pub fn database(&self) -> CatalogResult<&str> {
        self.identifier.database.as_deref().ok_or_else(|| {
            CatalogError::invalid(format!("table {} did not specify database", self.identifier.quoted_string()))
        })
    }

    /// `db.table`, unquoted.
    pub fn qualified_name(&self) -> CatalogResult<String> {
        Ok(format!("{}.{}", self.database()?, self.identifier.table))
    }

    pub fn with_new_storage(&self, update: StorageUpdate) -> Table {
        Table { storage: self.storage.updated(&update), ..self.clone() }
    }

    pub fn with_identifier(&self, identifier: TableIdentifier) -> Table {
        Table { identifier, ..self.clone() }
    }

    pub fn with_properties(&self, properties: Properties) -> Table {
        Table { properties, ..self.clone() }
    }

    pub fn with_comment(&self, comment: Option<String>) -> Table {
        Table { comment, ..self.clone() }
    }

    pub fn with_last_access_time(&self, last_access_time: i64) -> Table {
        Table { last_access_time, ..self.clone() }
    }

    /// Replace the schema; the column-name lists are checked against the new one.
    pub fn with_schema(&self, schema: Vec<Column>) -> CatalogResult<Table> {
        let t = Table { schema, ..self.clone() };
        t.validate()?;
        Ok(t)
    }

    pub fn with_partition_column_names(&self, names: Vec<String>) -> CatalogResult<Table> {
        let t = Table { partition_column_names: names, ..self.clone() };
        t.validate()?;
        Ok(t)
    }

    pub(crate) fn with_create_time(&self, create_time: i64) -> Table {
        Table { create_time, ..self.clone() }
    }

    fn validate(&self) -> CatalogResult<()> {
        let names: HashSet<&str> = self.schema.iter().map(|c| c.name.as_str()).collect();
        let checks = [
            ("partition", &self.partition_column_names),
            ("sort", &self.sort_column_names),
            ("bucket", &self.bucket_column_names),
        ];
        for (kind, cols) in checks {
            let missing: Vec<&str> = cols.iter().map(|c| c.as_str()).filter(|c| !names.contains(c)).collect();
            if !missing.is_empty() {
                debug!(target: "metacat::types", "validate: table={} rejected {} columns {:?}", self.identifier.quoted_string(), kind, missing);
                return Err(CatalogError::invalid(format!(
                    "{} columns ({}) must be a subset of schema ({}) in table {}",
                    kind,
                    missing.join(", "),
                    self.column_names().join(", "),
                    self.identifier.quoted_string()
                )));
            }
        }
        Ok(())
    }
}

/// Builder for `Table`; `build` enforces the subset invariant.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    inner: Table,
}

impl TableBuilder {
    pub fn schema(mut self, schema: Vec<Column>) -> Self { self.inner.schema = schema; self }
    pub fn column(mut self, column: Column) -> Self { self.inner.schema.push(column); self }
    pub fn partition_column_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.inner.partition_column_names = names.into_iter().map(Into::into).collect();
        self
    }
    pub fn sort_column_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.inner.sort_column_names = names.into_iter().map(Into::into).collect();
        self
    }
    pub fn bucket_column_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.inner.bucket_column_names = names.into_iter().map(Into::into).collect();
        self
    }
    pub fn num_buckets(mut self, n: i32) -> Self { self.inner.num_buckets = n; self }
    pub fn owner(mut self, owner: impl Into<String>) -> Self { self.inner.owner = owner.into(); self }
    pub fn create_time(mut self, ms: i64) -> Self { self.inner.create_time = ms; self }
    pub fn last_access_time(mut self, ms: i64) -> Self { self.inner.last_access_time = ms; self }
    pub fn properties(mut self, properties: Properties) -> Self { self.inner.properties = properties; self }
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.properties.insert(key.into(), value.into());
        self
    }
    pub fn view_original_text(mut self, text: impl Into<String>) -> Self { self.inner.view_original_text = Some(text.into()); self }
    pub fn view_text(mut self, text: impl Into<String>) -> Self { self.inner.view_text = Some(text.into()); self }
    pub fn comment(mut self, comment: impl Into<String>) -> Self { self.inner.comment = Some(comment.into()); self }

    pub fn build(self) -> CatalogResult<Table> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

/// Deserialization goes through the builder so stored definitions are checked too.
impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            identifier: TableIdentifier,
            table_type: TableType,
            #[serde(default)]
            storage: StorageFormat,
            #[serde(default)]
            schema: Vec<Column>,
            #[serde(default)]
            partition_column_names: Vec<String>,
            #[serde(default)]
            sort_column_names: Vec<String>,
            #[serde(default)]
            bucket_column_names: Vec<String>,
            #[serde(default = "unset")]
            num_buckets: i32,
            #[serde(default)]
            owner: String,
            #[serde(default = "now_millis")]
            create_time: i64,
            #[serde(default = "unset_time")]
            last_access_time: i64,
            #[serde(default)]
            properties: Properties,
            #[serde(default)]
            view_original_text: Option<String>,
            #[serde(default)]
            view_text: Option<String>,
            #[serde(default)]
            comment: Option<String>,
        }
        fn unset() -> i32 { -1 }
        fn unset_time() -> i64 { -1 }

        let r = Raw::deserialize(deserializer)?;
        let t = Table {
            identifier: r.identifier,
            table_type: r.table_type,
            storage: r.storage,
            schema: r.schema,
            partition_column_names: r.partition_column_names,
            sort_column_names: r.sort_column_names,
            bucket_column_names: r.bucket_column_names,
            num_buckets: r.num_buckets,
            owner: r.owner,
            create_time: r.create_time,
            last_access_time: r.last_access_time,
            properties: r.properties,
            view_original_text: r.view_original_text,
            view_text: r.view_text,
            comment: r.comment,
        };
        t.validate().map_err(serde::de::Error::custom)?;
        Ok(t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub spec: TablePartitionSpec,
    /// May override the owning table's format.
    #[serde(default)]
    pub storage: StorageFormat,
}

impl Partition {
    pub fn new(spec: TablePartitionSpec, storage: StorageFormat) -> Self { Self { spec, storage } }

    pub fn with_spec(&self, spec: TablePartitionSpec) -> Self { Self { spec, ..self.clone() } }

    pub fn with_storage(&self, storage: StorageFormat) -> Self { Self { storage, ..self.clone() } }

    pub fn spec_string(&self) -> String { partition_spec_string(&self.spec) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionResourceType {
    Jar,
    File,
    Archive,
}

impl FunctionResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionResourceType::Jar => "jar",
            FunctionResourceType::File => "file",
            FunctionResourceType::Archive => "archive",
        }
    }
}

impl FromStr for FunctionResourceType {
    type Err = CatalogError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jar" => Ok(FunctionResourceType::Jar),
            "file" => Ok(FunctionResourceType::File),
            "archive" => Ok(FunctionResourceType::Archive),
            other => Err(CatalogError::invalid(format!("unknown function resource type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResource {
    pub resource_type: FunctionResourceType,
    pub uri: String,
}

impl FunctionResource {
    pub fn new(resource_type: FunctionResourceType, uri: impl Into<String>) -> Self {
        Self { resource_type, uri: uri.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub identifier: FunctionIdentifier,
    pub class_name: String,
    #[serde(default)]
    pub resources: Vec<FunctionResource>,
}

impl Function {
    pub fn new(identifier: FunctionIdentifier, class_name: impl Into<String>, resources: Vec<FunctionResource>) -> Self {
        Self { identifier, class_name: class_name.into(), resources }
    }

    pub fn with_identifier(&self, identifier: FunctionIdentifier) -> Self { Self { identifier, ..self.clone() } }

    pub fn with_class_name(&self, class_name: impl Into<String>) -> Self { Self { class_name: class_name.into(), ..self.clone() } }

    pub fn with_resources(&self, resources: Vec<FunctionResource>) -> Self { Self { resources, ..self.clone() } }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

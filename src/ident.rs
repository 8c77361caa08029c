//! Identifiers for tables and functions
//! -----------------------------------
//! A table or function is named by its own name plus an optional owning database.
//! Records are only fully usable once the database part is bound.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{CatalogError, CatalogResult};

/// Normalize an identifier part:
/// - If enclosed in backticks, strip them (un-doubling embedded ones) and preserve case
/// - Otherwise, trim and convert to lowercase
pub fn normalize_identifier(ident: &str) -> String {
    let trimmed = ident.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('`') && trimmed.ends_with('`') {
        trimmed[1..trimmed.len() - 1].replace("``", "`")
    } else {
        trimmed.to_ascii_lowercase()
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn quoted_pair(database: Option<&str>, name: &str) -> String {
    match database {
        Some(db) => format!("{}.{}", quote_identifier(db), quote_identifier(name)),
        None => quote_identifier(name),
    }
}

fn unquoted_pair(database: Option<&str>, name: &str) -> String {
    match database {
        Some(db) => format!("{}.{}", db, name),
        None => name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    pub table: String,
    #[serde(default)]
    pub database: Option<String>,
}

impl TableIdentifier {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), database: None }
    }

    pub fn with_database(table: impl Into<String>, database: impl Into<String>) -> Self {
        Self { table: table.into(), database: Some(database.into()) }
    }

    pub fn quoted_string(&self) -> String { quoted_pair(self.database.as_deref(), &self.table) }
    pub fn unquoted_string(&self) -> String { unquoted_pair(self.database.as_deref(), &self.table) }
}

impl Display for TableIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.quoted_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionIdentifier {
    pub func_name: String,
    #[serde(default)]
    pub database: Option<String>,
}

impl FunctionIdentifier {
    pub fn new(func_name: impl Into<String>) -> Self {
        Self { func_name: func_name.into(), database: None }
    }

    pub fn with_database(func_name: impl Into<String>, database: impl Into<String>) -> Self {
        Self { func_name: func_name.into(), database: Some(database.into()) }
    }

    pub fn quoted_string(&self) -> String { quoted_pair(self.database.as_deref(), &self.func_name) }
    pub fn unquoted_string(&self) -> String { unquoted_pair(self.database.as_deref(), &self.func_name) }
}

impl Display for FunctionIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.quoted_string())
    }
}

/// Split on dots that are not inside backticks.
fn split_parts(text: &str) -> CatalogResult<Vec<String>> {
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '`' if in_quotes && chars.peek() == Some(&'`') => {
                cur.push_str("``");
                chars.next();
            }
            '`' => { in_quotes = !in_quotes; cur.push(c); }
            '.' if !in_quotes => parts.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    if in_quotes {
        return Err(CatalogError::invalid(format!("unterminated quoted identifier in '{}'", text)));
    }
    parts.push(cur);
    Ok(parts)
}

/// Parse `t`, `db.t` or their backtick-quoted forms.
pub fn parse_table_identifier(text: &str) -> CatalogResult<TableIdentifier> {
    let parts = split_parts(text)?;
    let names: Vec<String> = parts.iter().map(|p| normalize_identifier(p)).collect();
    if names.iter().any(|n| n.is_empty()) {
        return Err(CatalogError::invalid(format!("empty name part in identifier '{}'", text)));
    }
    match names.as_slice() {
        [t] => Ok(TableIdentifier::new(t.clone())),
        [db, t] => Ok(TableIdentifier::with_database(t.clone(), db.clone())),
        _ => Err(CatalogError::invalid(format!("identifier '{}' has more than two parts", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_and_quoted_forms() {
        let id = TableIdentifier::with_database("t", "db");
        assert_eq!(id.unquoted_string(), "db.t");
        assert_eq!(id.quoted_string(), "`db`.`t`");
        assert_eq!(TableIdentifier::new("we`ird").quoted_string(), "`we``ird`");
        assert_eq!(FunctionIdentifier::new("f").unquoted_string(), "f");
    }

    #[test]
    fn parse_lowercases_unquoted_parts() {
        let id = parse_table_identifier(" Sales . Orders ").unwrap();
        assert_eq!(id, TableIdentifier::with_database("orders", "sales"));
        let id = parse_table_identifier("`Mixed.Case`.t").unwrap();
        assert_eq!(id.database.as_deref(), Some("Mixed.Case"));
        assert_eq!(id.table, "t");
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(parse_table_identifier("a.b.c").is_err());
        assert!(parse_table_identifier("a.").is_err());
        assert!(parse_table_identifier("`open").is_err());
    }

    #[test]
    fn quoted_round_trip_through_parse() {
        let id = TableIdentifier::with_database("x`y", "Db");
        assert_eq!(parse_table_identifier(&id.quoted_string()).unwrap(), id);
    }
}

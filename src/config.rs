//! Catalog configuration.
//! Values come from `Default`, optionally overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_DEFAULT_DATABASE: &str = "METACAT_DEFAULT_DATABASE";
pub const ENV_WAREHOUSE_DIR: &str = "METACAT_WAREHOUSE_DIR";
pub const ENV_CREATE_DEFAULT_DB: &str = "METACAT_CREATE_DEFAULT_DB";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Database selected by a fresh session and created on startup when enabled.
    pub default_database: String,
    /// Root under which databases created without a location are placed.
    pub warehouse_dir: String,
    #[serde(default = "CatalogConfig::default_create_default_database")]
    pub create_default_database: bool,
}

impl CatalogConfig {
    fn default_create_default_database() -> bool { true }

    /// Apply environment overrides on top of the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(db) = env_string(ENV_DEFAULT_DATABASE) { cfg.default_database = db; }
        if let Some(dir) = env_string(ENV_WAREHOUSE_DIR) { cfg.warehouse_dir = dir; }
        if let Some(b) = env::var(ENV_CREATE_DEFAULT_DB).ok().as_deref().and_then(parse_bool) {
            cfg.create_default_database = b;
        }
        cfg
    }

    /// Location used for a database created without an explicit one.
    pub fn default_database_location(&self, db: &str) -> String {
        let root = self.warehouse_dir.trim_end_matches('/');
        if db == self.default_database {
            root.to_string()
        } else {
            format!("{}/{}.db", root, db)
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_database: "default".to_string(),
            warehouse_dir: "warehouse".to_string(),
            create_default_database: Self::default_create_default_database(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_location_under_warehouse() {
        let cfg = CatalogConfig { warehouse_dir: "/data/wh/".into(), ..CatalogConfig::default() };
        assert_eq!(cfg.default_database_location("sales"), "/data/wh/sales.db");
        assert_eq!(cfg.default_database_location("default"), "/data/wh");
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn missing_flag_uses_serde_default() {
        let cfg: CatalogConfig = serde_json::from_str(r#"{"default_database":"d","warehouse_dir":"w"}"#).unwrap();
        assert!(cfg.create_default_database);
    }
}

use std::sync::Arc;
use std::thread;

use metacat::{
    require_db_exists, require_function_exists, require_table_exists, CatalogConfig, CatalogError, CatalogRelation, Column, Database, ExternalCatalog, InMemoryCatalog, Partition,
    Properties, StorageFormat, Table, TableIdentifier, TablePartitionSpec, TableType,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn empty_catalog() -> InMemoryCatalog {
    init_tracing();
    InMemoryCatalog::new(CatalogConfig { create_default_database: false, ..CatalogConfig::default() })
}

fn sales_db() -> Database {
    Database::new("sales", "sales data", "/wh/sales.db", Properties::new())
}

fn spec(k: &str, v: &str) -> TablePartitionSpec {
    let mut s = TablePartitionSpec::new();
    s.insert(k.to_string(), v.to_string());
    s
}

fn table_t() -> Table {
    Table::builder(TableIdentifier::new("t"), TableType::Managed, StorageFormat::empty())
        .schema(vec![Column::new("v", "bigint"), Column::new("y", "string")])
        .partition_column_names(["y"])
        .build()
        .unwrap()
}

#[test]
fn create_database_honours_ignore_flag() {
    let cat = empty_catalog();
    cat.create_database(sales_db(), false).unwrap();
    let err = cat.create_database(sales_db(), false).unwrap_err();
    assert!(matches!(err, CatalogError::AlreadyExists { .. }), "{:?}", err);

    let changed = sales_db().with_description("other");
    cat.create_database(changed, true).unwrap();
    assert_eq!(cat.get_database("sales").unwrap().description, "sales data");
    assert_eq!(cat.list_databases(), vec!["sales"]);
}

#[test]
fn drop_non_empty_database_needs_cascade() {
    let cat = empty_catalog();
    cat.create_database(sales_db(), false).unwrap();
    cat.create_table("sales", table_t(), false).unwrap();

    let err = cat.drop_database("sales", false, false).unwrap_err();
    assert!(matches!(err, CatalogError::NotConfirmed { .. }), "{:?}", err);
    assert!(cat.table_exists("sales", "t"));

    cat.drop_database("sales", false, true).unwrap();
    assert!(!cat.database_exists("sales"));
    assert!(!cat.table_exists("sales", "t"));
    assert!(cat.get_table_option("sales", "t").is_none());
}

#[test]
fn drop_missing_database() {
    let cat = empty_catalog();
    assert!(matches!(cat.drop_database("ghost", false, false), Err(CatalogError::NotFound { .. })));
    cat.drop_database("ghost", true, false).unwrap();
}

#[test]
fn rename_partitions_reports_missing_and_colliding_specs() {
    let cat = empty_catalog();
    cat.create_database(sales_db(), false).unwrap();
    cat.create_table("sales", table_t(), false).unwrap();

    let err = cat.rename_partitions("sales", "t", &[spec("y", "2020")], &[spec("y", "2021")]).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }), "{:?}", err);

    cat.create_partitions(
        "sales",
        "t",
        vec![Partition::new(spec("y", "2020"), StorageFormat::empty()), Partition::new(spec("y", "2021"), StorageFormat::empty())],
        false,
    )
    .unwrap();
    let err = cat.rename_partitions("sales", "t", &[spec("y", "2020")], &[spec("y", "2021")]).unwrap_err();
    assert!(matches!(err, CatalogError::AlreadyExists { .. }), "{:?}", err);

    cat.rename_partitions("sales", "t", &[spec("y", "2020")], &[spec("y", "2019")]).unwrap();
    let specs: Vec<TablePartitionSpec> = cat.list_partitions("sales", "t").unwrap().into_iter().map(|p| p.spec).collect();
    assert_eq!(specs, vec![spec("y", "2019"), spec("y", "2021")]);
}

#[test]
fn table_lookups_distinguish_missing_database_and_table() {
    let cat = empty_catalog();
    assert!(matches!(cat.list_tables("sales"), Err(CatalogError::NotFound { .. })));
    assert!(!cat.table_exists("sales", "t"));

    cat.create_database(sales_db(), false).unwrap();
    assert!(cat.list_tables("sales").unwrap().is_empty());
    assert!(cat.list_tables_by_pattern("sales", "*").unwrap().is_empty());
    assert!(matches!(cat.get_table("sales", "t"), Err(CatalogError::NotFound { .. })));
    assert!(cat.get_table_option("sales", "t").is_none());
    assert!(cat.create_table("nowhere", table_t(), false).unwrap_err().is_not_found());
}

#[test]
fn pattern_listing() {
    let cat = empty_catalog();
    for name in ["sales", "sales_eu", "hr"] {
        cat.create_database(Database::new(name, "", "", Properties::new()), false).unwrap();
    }
    assert_eq!(cat.list_databases_by_pattern("sales*"), vec!["sales", "sales_eu"]);
    assert_eq!(cat.list_databases_by_pattern("HR|nothing"), vec!["hr"]);

    for t in ["orders", "order_items", "users"] {
        let table = table_t().with_identifier(TableIdentifier::new(t));
        cat.create_table("sales", table, false).unwrap();
    }
    assert_eq!(cat.list_tables_by_pattern("sales", "order*").unwrap(), vec!["order_items", "orders"]);
    assert!(cat.list_tables_by_pattern("ghost", "*").unwrap_err().is_not_found());
}

#[test]
fn rename_table_collisions() {
    let cat = empty_catalog();
    cat.create_database(sales_db(), false).unwrap();
    cat.create_table("sales", table_t(), false).unwrap();
    cat.create_table("sales", table_t().with_identifier(TableIdentifier::new("u")), false).unwrap();
    assert!(cat.rename_table("sales", "t", "u").unwrap_err().is_already_exists());
    assert!(cat.rename_table("sales", "ghost", "w").unwrap_err().is_not_found());
    cat.rename_table("sales", "t", "w").unwrap();
    assert_eq!(cat.list_tables("sales").unwrap(), vec!["u", "w"]);
}

#[test]
fn resolution_projects_stored_table() {
    let cat = empty_catalog();
    cat.create_database(sales_db(), false).unwrap();
    let t = Table::builder(TableIdentifier::new("events"), TableType::External, StorageFormat::at_location("/data/events"))
        .schema(vec![Column::new("p", "string"), Column::new("a", "int").with_nullable(false), Column::new("b", "double")])
        .partition_column_names(["p"])
        .build()
        .unwrap();
    cat.create_table("sales", t, false).unwrap();

    let rel = CatalogRelation::lookup(&cat, "sales", "events", None).unwrap();
    let out: Vec<(&str, bool, &str)> = rel.output().iter().map(|c| (c.name.as_str(), c.nullable, c.qualifier.as_str())).collect();
    assert_eq!(out, vec![("a", true, "events"), ("b", true, "events"), ("p", true, "events")]);

    let self_join = rel.new_instance();
    assert_eq!(self_join, rel);
    assert!(!self_join.same_instance(&rel));
}

#[test]
fn concurrent_creates_of_same_table_admit_exactly_one() {
    let cat = Arc::new(empty_catalog());
    cat.create_database(sales_db(), false).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cat = Arc::clone(&cat);
            thread::spawn(move || cat.create_table("sales", table_t(), false).is_ok())
        })
        .collect();
    let winners = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert_eq!(winners, 1);
}

#[test]
fn concurrent_partition_creation_on_disjoint_specs() {
    let cat: Arc<dyn ExternalCatalog> = Arc::new(empty_catalog());
    cat.create_database(sales_db(), false).unwrap();
    cat.create_table("sales", table_t(), false).unwrap();
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let cat = Arc::clone(&cat);
            thread::spawn(move || {
                let p = Partition::new(spec("y", &format!("{}", 2000 + i)), StorageFormat::empty());
                cat.create_partitions("sales", "t", vec![p], false)
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }
    assert_eq!(cat.list_partitions("sales", "t").unwrap().len(), 16);
}

#[test]
fn current_database_never_names_a_dropped_database() {
    let cat = Arc::new(empty_catalog());
    for round in 0..50 {
        cat.create_database(sales_db(), false).unwrap();
        let setter = {
            let cat = Arc::clone(&cat);
            thread::spawn(move || {
                let _ = cat.set_current_database("sales");
            })
        };
        let dropper = {
            let cat = Arc::clone(&cat);
            thread::spawn(move || cat.drop_database("sales", false, false))
        };
        setter.join().unwrap();
        dropper.join().unwrap().unwrap();
        if let Some(current) = cat.current_database() {
            assert!(cat.database_exists(&current), "round {}: current database '{}' is gone", round, current);
        }
    }
}

#[test]
fn precondition_helpers_report_the_missing_level() {
    let cat = empty_catalog();
    assert!(require_db_exists(&cat, "sales").unwrap_err().is_not_found());
    cat.create_database(sales_db(), false).unwrap();
    require_db_exists(&cat, "sales").unwrap();

    let err = require_table_exists(&cat, "sales", "t").unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { kind: metacat::ObjectKind::Table, .. }), "{:?}", err);
    let err = require_table_exists(&cat, "ghost", "t").unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { kind: metacat::ObjectKind::Database, .. }), "{:?}", err);
    cat.create_table("sales", table_t(), false).unwrap();
    require_table_exists(&cat, "sales", "t").unwrap();

    let dyn_cat: &dyn ExternalCatalog = &cat;
    let err = require_function_exists(dyn_cat, "sales", "f").unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { kind: metacat::ObjectKind::Function, .. }), "{:?}", err);
}

use super::*;
use crate::catalog::in_memory::InMemoryCatalog;
use crate::catalog::types::{Database, Properties, StorageFormat, TableType};
use crate::ident::TableIdentifier;

fn events(db: &str) -> Table {
    Table::builder(TableIdentifier::with_database("events", db), TableType::External, StorageFormat::empty())
        .schema(vec![Column::new("p", "string"), Column::new("a", "int"), Column::new("b", "double").with_nullable(false)])
        .partition_column_names(["p"])
        .build()
        .unwrap()
}

fn names(cols: &[OutputColumn]) -> Vec<&str> { cols.iter().map(|c| c.name.as_str()).collect() }

#[test]
fn partition_columns_move_to_the_tail() {
    let rel = CatalogRelation::new("d1", events("d1"), None).unwrap();
    assert_eq!(names(rel.output()), vec!["a", "b", "p"]);
    assert_eq!(names(rel.data_output()), vec!["a", "b"]);
    assert_eq!(names(rel.partition_output()), vec!["p"]);
    assert_eq!(rel.output()[0].data_type, Some(DataType::Integer));
}

#[test]
fn every_output_column_is_nullable() {
    let rel = CatalogRelation::new("d1", events("d1"), None).unwrap();
    assert!(rel.output().iter().all(|c| c.nullable));
}

#[test]
fn database_mismatch_fails() {
    let err = CatalogRelation::new("d1", events("d2"), None).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDefinition { .. }));

    let unbound = events("d1").with_identifier(TableIdentifier::new("events"));
    assert!(CatalogRelation::new("d1", unbound, None).is_err());
}

#[test]
fn qualifier_is_alias_or_table_name() {
    let plain = CatalogRelation::new("d1", events("d1"), None).unwrap();
    assert!(plain.output().iter().all(|c| c.qualifier == "events"));
    let aliased = CatalogRelation::new("d1", events("d1"), Some("e".into())).unwrap();
    assert!(aliased.output().iter().all(|c| c.qualifier == "e"));
    assert_eq!(plain.with_alias("x").output()[2].qualifier, "x");
}

#[test]
fn new_instance_is_equal_but_distinct() {
    let rel = CatalogRelation::new("d1", events("d1"), None).unwrap();
    let a = rel.new_instance();
    let b = rel.new_instance();
    assert_eq!(a, b);
    assert_eq!(a, rel);
    assert!(!a.same_instance(&b));
    assert!(!a.same_instance(&rel));
    assert!(rel.clone().same_instance(&rel));
    assert!(rel.with_alias("z").same_instance(&rel));
}

#[test]
fn untyped_columns_pass_through_and_bad_types_fail() {
    let view = Table::builder(TableIdentifier::with_database("v", "d1"), TableType::VirtualView, StorageFormat::empty())
        .schema(vec![Column::untyped("x")])
        .view_text("SELECT 1 AS x")
        .build()
        .unwrap();
    let rel = CatalogRelation::new("d1", view, None).unwrap();
    assert_eq!(rel.output()[0].data_type, None);

    let broken = Table::builder(TableIdentifier::with_database("t", "d1"), TableType::Managed, StorageFormat::empty())
        .schema(vec![Column::new("x", "notatype")])
        .build()
        .unwrap();
    assert!(CatalogRelation::new("d1", broken, None).is_err());
}

#[test]
fn lookup_resolves_through_catalog() {
    let cat = InMemoryCatalog::default();
    cat.create_database(Database::new("d1", "", "/tmp/d1", Properties::new()), false).unwrap();
    cat.create_table("d1", events("d1"), false).unwrap();
    let rel = CatalogRelation::lookup(&cat, "d1", "events", None).unwrap();
    assert_eq!(names(rel.output()), vec!["a", "b", "p"]);
    assert!(CatalogRelation::lookup(&cat, "d1", "missing", None).unwrap_err().is_not_found());
}

#[test]
fn absurdly_nested_column_type_is_rejected() {
    let deep = format!("{}int{}", "array<".repeat(200_000), ">".repeat(200_000));
    let t = Table::builder(TableIdentifier::with_database("t", "d1"), TableType::Managed, StorageFormat::empty())
        .schema(vec![Column::new("x", deep)])
        .build()
        .unwrap();
    let err = CatalogRelation::new("d1", t, None).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDefinition { .. }));
}

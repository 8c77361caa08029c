use super::*;

#[test]
fn primitive_aliases() {
    assert_eq!(DataType::parse("INT").unwrap(), DataType::Integer);
    assert_eq!(DataType::parse("integer").unwrap(), DataType::Integer);
    assert_eq!(DataType::parse("long").unwrap(), DataType::Long);
    assert_eq!(DataType::parse(" bigint ").unwrap(), DataType::Long);
    assert_eq!(DataType::parse("tinyint").unwrap(), DataType::Byte);
    assert_eq!(DataType::parse("varchar(20)").unwrap(), DataType::String);
    assert_eq!(DataType::parse("real").unwrap(), DataType::Float);
}

#[test]
fn decimal_defaults_and_bounds() {
    assert_eq!(DataType::parse("decimal").unwrap(), DataType::Decimal { precision: 10, scale: 0 });
    assert_eq!(DataType::parse("decimal(5)").unwrap(), DataType::Decimal { precision: 5, scale: 0 });
    assert_eq!(DataType::parse("DECIMAL( 12 , 3 )").unwrap(), DataType::Decimal { precision: 12, scale: 3 });
    assert!(DataType::parse("decimal(39,0)").is_err());
    assert!(DataType::parse("decimal(4,5)").is_err());
    assert!(DataType::parse("decimal(0)").is_err());
}

#[test]
fn nested_types() {
    let dt = DataType::parse("map<string, array<struct<a:int, `b c`:decimal(4,2)>>>").unwrap();
    let expected = DataType::Map(
        Box::new(DataType::String),
        Box::new(DataType::Array(Box::new(DataType::Struct(vec![
            StructField { name: "a".into(), data_type: DataType::Integer, nullable: true },
            StructField { name: "b c".into(), data_type: DataType::Decimal { precision: 4, scale: 2 }, nullable: true },
        ])))),
    );
    assert_eq!(dt, expected);
    assert!(!dt.is_primitive());
}

#[test]
fn simple_string_is_canonical() {
    assert_eq!(DataType::parse("Array<Long>").unwrap().simple_string(), "array<bigint>");
    assert_eq!(DataType::parse("struct<x:short,y:map<int,string>>").unwrap().to_string(), "struct<x:smallint,y:map<int,string>>");
    assert_eq!(DataType::parse("struct<>").unwrap().simple_string(), "struct<>");
}

#[test]
fn rejects_malformed_descriptors() {
    for bad in ["", "uuid", "array<int", "map<int>", "int int", "varchar", "struct<a int>"] {
        let err = DataType::parse(bad).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDefinition { .. }), "{} -> {:?}", bad, err);
    }
}

fn nested_arrays(levels: usize) -> String {
    format!("{}int{}", "array<".repeat(levels), ">".repeat(levels))
}

#[test]
fn nesting_depth_is_bounded() {
    let ok = DataType::parse(&nested_arrays(MAX_TYPE_NESTING - 1)).unwrap();
    assert!(matches!(ok, DataType::Array(_)));

    let err = DataType::parse(&nested_arrays(MAX_TYPE_NESTING)).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDefinition { .. }), "{:?}", err);

    let err = DataType::parse(&nested_arrays(200_000)).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDefinition { .. }));

    let deep_struct = format!("{}int{}", "struct<a:".repeat(200_000), ">".repeat(200_000));
    assert!(DataType::parse(&deep_struct).is_err());
}

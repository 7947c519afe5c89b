use tabula::datatype::TypeTag;
use tabula::fieldspec::FieldSpecParser;
use tabula::registry::TypeRegistry;

#[test]
fn built_in_names() {
    let registry = TypeRegistry::new();
    assert_eq!(registry.len(), 11);
    let expected = [
        ("varchar", TypeTag::Text),
        ("int32", TypeTag::Int32),
        ("int64", TypeTag::Int64),
        ("float32", TypeTag::Float32),
        ("float64", TypeTag::Float64),
        ("decimal", TypeTag::Decimal),
        ("boolean", TypeTag::Boolean),
        ("varbinary", TypeTag::VarBinary),
        ("guid", TypeTag::Guid),
        ("datetime", TypeTag::DateTime),
        ("timespan", TypeTag::TimeSpan),
    ];
    for (name, tag) in expected {
        assert_eq!(registry.resolve(name), tag, "resolving {name}");
        assert_eq!(registry.canonical_name(tag), Some(name));
    }
    assert_eq!(registry.canonical_name(TypeTag::Any), None);
}

#[test]
fn lookups_ignore_case() {
    let registry = TypeRegistry::new();
    assert_eq!(registry.resolve("VarChar"), TypeTag::Text);
    assert_eq!(registry.resolve("INT32"), TypeTag::Int32);
    assert!(registry.contains("GUID"));
}

#[test]
fn unknown_names_resolve_to_a_default() {
    let registry = TypeRegistry::new();
    assert!(!registry.contains("blob"));
    assert_eq!(registry.resolve("blob"), TypeTag::Any);
    assert_eq!(registry.resolve(""), TypeTag::Any);
    assert_eq!(registry.name_to_tag("blob", TypeTag::VarBinary), TypeTag::VarBinary);
    assert_eq!(registry.name_to_tag("int64", TypeTag::VarBinary), TypeTag::Int64);

    let texty = TypeRegistry::new().with_default_tag(TypeTag::Text);
    assert_eq!(texty.default_tag(), TypeTag::Text);
    assert_eq!(texty.resolve("blob"), TypeTag::Text);
}

#[test]
fn first_alias_is_canonical() {
    let registry = TypeRegistry::from_pairs([
        ("num", TypeTag::Int32),
        ("number", TypeTag::Int32),
        ("Label", TypeTag::Text),
    ]);
    assert_eq!(registry.resolve("number"), TypeTag::Int32);
    assert_eq!(registry.resolve("NUM"), TypeTag::Int32);
    assert_eq!(registry.canonical_name(TypeTag::Int32), Some("num"));
    assert_eq!(registry.canonical_name(TypeTag::Text), Some("Label"));
    assert_eq!(registry.resolve("int32"), TypeTag::Any, "no built-ins");
}

#[test]
fn re_registered_name_points_at_the_later_tag() {
    let registry = TypeRegistry::from_pairs([("n", TypeTag::Int32), ("N", TypeTag::Int64)]);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.resolve("n"), TypeTag::Int64);
    assert_eq!(registry.canonical_name(TypeTag::Int32), Some("n"));
    assert_eq!(registry.canonical_name(TypeTag::Int64), Some("N"));
}

#[test]
fn parser_uses_its_registry() {
    let registry = TypeRegistry::from_pairs([("number", TypeTag::Int64)]);
    let fields = FieldSpecParser::with_registry(registry).parse_all("a:number,b:int32");
    assert_eq!(fields[0].tag(), TypeTag::Int64);
    assert_eq!(fields[1].tag(), TypeTag::Any);
}

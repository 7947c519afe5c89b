use config::{Config, File, FileFormat};
use tabula::TabulaError;
use tabula::datatype::TypeTag;
use tabula::fieldspec::{Delimiters, FieldDescriptor, FieldSpecParser};

fn parse(spec: &str) -> Vec<FieldDescriptor> {
    FieldSpecParser::new().parse_all(spec)
}

fn names(spec: &str) -> Vec<String> {
    parse(spec).iter().map(|f| f.name().to_string()).collect()
}

#[test]
fn typed_untyped_and_optioned_fields() {
    let fields = parse("id:int32,name,age:int32(required)");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], FieldDescriptor::new("id", "int32", TypeTag::Int32, ""));
    assert_eq!(fields[1], FieldDescriptor::new("name", "", TypeTag::Any, ""));
    assert_eq!(fields[2], FieldDescriptor::new("age", "int32", TypeTag::Int32, "required"));
}

#[test]
fn empty_spec_has_no_fields() {
    assert!(parse("").is_empty());
}

#[test]
fn consecutive_delimiters_leave_an_empty_field() {
    assert_eq!(names("a,,b"), vec!["a", "", "b"]);
    assert_eq!(parse("a,,b")[1].tag(), TypeTag::Any);
}

#[test]
fn dangling_type_delimiter_gives_empty_type_name() {
    let fields = parse("x:");
    assert_eq!(fields, vec![FieldDescriptor::new("x", "", TypeTag::Any, "")]);
}

#[test]
fn trailing_delimiter_adds_no_phantom_field() {
    assert_eq!(names("a,"), vec!["a"]);
    assert_eq!(names("a,,"), vec!["a", ""]);
    assert_eq!(names(","), vec![""]);
    assert_eq!(names(",,"), vec!["", ""]);
    assert_eq!(names("a:int32(x),"), vec!["a"]);
}

#[test]
fn names_and_types_are_trimmed_but_options_are_not() {
    let fields = parse(" id : int32 ( not null ) , name ");
    assert_eq!(fields[0].name(), "id");
    assert_eq!(fields[0].type_name(), "int32");
    assert_eq!(fields[0].tag(), TypeTag::Int32);
    assert_eq!(fields[0].option(), " not null ");
    assert_eq!(fields[1].name(), "name");
}

#[test]
fn text_after_option_close_is_discarded() {
    let fields = parse("a:int32(key)junk,b");
    assert_eq!(fields[0], FieldDescriptor::new("a", "int32", TypeTag::Int32, "key"));
    assert_eq!(fields[1].name(), "b");
}

#[test]
fn option_may_contain_field_delimiters() {
    let fields = parse("a:varchar(ignorecase, required),b");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].option(), "ignorecase, required");
}

#[test]
fn unterminated_option_is_dropped() {
    let fields = parse("a:int32(req");
    assert_eq!(fields, vec![FieldDescriptor::new("a", "int32", TypeTag::Int32, "")]);
}

#[test]
fn type_names_resolve_case_insensitively() {
    let fields = parse("a:INT64,b:mystery");
    assert_eq!(fields[0].type_name(), "INT64");
    assert_eq!(fields[0].tag(), TypeTag::Int64);
    assert_eq!(fields[1].type_name(), "mystery");
    assert_eq!(fields[1].tag(), TypeTag::Any);
}

#[test]
fn duplicate_names_are_kept() {
    assert_eq!(names("a,a:int32"), vec!["a", "a"]);
}

#[test]
fn parse_field_reports_bytes_consumed() {
    let parser = FieldSpecParser::new();
    let spec = "id:int32,name";
    let (first, consumed) = parser.parse_field(spec, 0).expect("first field");
    assert_eq!(first.name(), "id");
    assert_eq!(consumed, 9);
    let (second, consumed) = parser.parse_field(spec, 9).expect("second field");
    assert_eq!(second.name(), "name");
    assert_eq!(consumed, 4);
    assert!(parser.parse_field(spec, 13).is_none());
    assert!(parser.parse_field(spec, 100).is_none());
}

#[test]
fn parsed_spec_can_be_iterated_again_and_interleaved() {
    let parser = FieldSpecParser::new();
    let parsed = parser.parse("a:int32,b,c:guid");
    let first: Vec<_> = parsed.iter().collect();
    let second: Vec<_> = parsed.iter().collect();
    assert_eq!(first, second);
    assert_eq!(first[2].0, "c");
    assert_eq!(first[2].1.tag(), TypeTag::Guid);

    let mut left = parsed.iter();
    let mut right = parsed.iter();
    assert_eq!(left.next().map(|(n, _)| n), Some("a".to_string()));
    assert_eq!(left.next().map(|(n, _)| n), Some("b".to_string()));
    assert_eq!(right.next().map(|(n, _)| n), Some("a".to_string()));
    assert_eq!(left.next().map(|(n, _)| n), Some("c".to_string()));
    assert!(left.next().is_none());
    assert!(left.next().is_none());
}

#[test]
fn multi_character_delimiters() {
    let delimiters = Delimiters::new("||", "::", "<<", ">>").expect("delimiters");
    let parser = FieldSpecParser::new().with_delimiters(delimiters);
    let fields = parser.parse_all("id::int32<<key>>||a|b||name::varchar");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], FieldDescriptor::new("id", "int32", TypeTag::Int32, "key"));
    assert_eq!(fields[1].name(), "a|b");
    assert_eq!(fields[2].tag(), TypeTag::Text);
}

#[test]
fn invalid_delimiters_are_rejected() {
    assert!(matches!(
        Delimiters::new("", ":", "(", ")"),
        Err(TabulaError::InvalidDelimiter(_))
    ));
    assert!(matches!(
        Delimiters::new(",", ",", "(", ")"),
        Err(TabulaError::InvalidDelimiter(_))
    ));
}

fn delimiters_from_toml(text: &str) -> Result<Delimiters, config::ConfigError> {
    Config::builder()
        .add_source(File::from_str(text, FileFormat::Toml))
        .build()?
        .try_deserialize()
}

#[test]
fn deserialized_delimiters_are_validated() {
    let err = delimiters_from_toml("field = \"\"").expect_err("empty field delimiter");
    assert!(err.to_string().contains("delimiter is empty"), "{err}");
    assert!(delimiters_from_toml("type = \",\"").is_err());

    let delimiters = delimiters_from_toml("field = \";\"\noption_close = \"]\"").expect("delimiters");
    assert_eq!(delimiters.type_name(), ":");
    let parser = FieldSpecParser::new().with_delimiters(delimiters);
    let fields = parser.parse_all("a:int32(key];b;c");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0].option(), "key");
}

#[test]
fn non_ascii_names() {
    assert_eq!(names("名前:varchar,年齢:int32"), vec!["名前", "年齢"]);
}

#[test]
fn render_writes_a_spec_that_parses_back() {
    let parser = FieldSpecParser::new();
    let spec = "id:int32,name,tag:(ignorecase),age:int32(required)";
    let fields = parser.parse_all(spec);
    assert_eq!(parser.render(&fields), spec);
    assert_eq!(fields[3].to_string(), "age:int32(required)");
}

#[test]
fn one_parsed_spec_enumerated_on_several_threads() {
    let parser = FieldSpecParser::new();
    let parsed = parser.parse("id:int32,name:varchar(ignorecase),,born:datetime");
    let expected: Vec<_> = parsed.iter().collect();

    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || parsed.iter().collect::<Vec<_>>()))
            .collect();
        for worker in workers {
            assert_eq!(worker.join().expect("worker"), expected);
        }
    });
    assert_eq!(expected.len(), 4);
    assert_eq!(expected[2].0, "");
}

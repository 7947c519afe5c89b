use std::fs;
use std::path::PathBuf;

use serial_test::serial;

use tabula::TabulaError;
use tabula::datatype::TypeTag;
use tabula::fieldspec::{Delimiters, FieldSpecParser};
use tabula::settings::Settings;

#[test]
fn empty_settings_are_the_defaults() {
    let settings = Settings::from_toml("").expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.delimiters, Delimiters::default());
    assert_eq!(settings.default_type, TypeTag::Any);
}

#[test]
fn delimiters_and_default_type_from_toml() {
    let settings = Settings::from_toml(
        r#"
default_type = "varchar"

[delimiters]
field = ";"
type = "="
"#,
    )
    .expect("settings");
    assert_eq!(settings.default_type, TypeTag::Text);
    assert_eq!(settings.delimiters.field(), ";");
    assert_eq!(settings.delimiters.type_name(), "=");
    assert_eq!(settings.delimiters.option_open(), "(", "unset keys keep defaults");

    let parser = FieldSpecParser::from_settings(&settings);
    let fields = parser.parse_all("a=int32(key);b;c=blob");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0].tag(), TypeTag::Int32);
    assert_eq!(fields[0].option(), "key");
    assert_eq!(fields[1].tag(), TypeTag::Text);
    assert_eq!(fields[2].tag(), TypeTag::Text);
}

#[test]
fn invalid_delimiters_are_rejected() {
    let err = Settings::from_toml("[delimiters]\nfield = \"\"\n").expect_err("empty delimiter");
    assert!(matches!(err, TabulaError::Config(ref message) if message.contains("delimiter is empty")));

    let err = Settings::from_toml("[delimiters]\nfield = \":\"\n").expect_err("clashing delimiters");
    assert!(matches!(err, TabulaError::Config(ref message) if message.contains("must differ")));
}

#[test]
fn unknown_default_type_is_a_config_error() {
    let err = Settings::from_toml("default_type = \"blob\"").expect_err("bad type");
    assert!(matches!(err, TabulaError::Config(_)));
}

#[test]
#[serial]
fn load_reads_a_settings_file() {
    let path = settings_file("file", "default_type = \"int64\"\n[delimiters]\nfield = \"|\"\n");
    let loaded = Settings::load(Some(&path));
    fs::remove_file(&path).expect("cleanup");
    let settings = loaded.expect("settings");
    assert_eq!(settings.default_type, TypeTag::Int64);
    assert_eq!(settings.delimiters.field(), "|");
}

fn settings_file(name: &str, text: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tabula-{name}-{}.toml", std::process::id()));
    fs::write(&path, text).expect("write");
    path
}

#[test]
#[serial]
fn environment_overrides_the_settings_file() {
    let path = settings_file("env", "default_type = \"int64\"\n[delimiters]\nfield = \"|\"\n");
    // SAFETY: every test touching the environment runs serially
    unsafe {
        std::env::set_var("TABULA_DELIMITERS__FIELD", ";");
        std::env::set_var("TABULA_DEFAULT_TYPE", "boolean");
    }
    let from_file = Settings::load(Some(&path));
    let from_env_only = Settings::load(None);
    unsafe {
        std::env::remove_var("TABULA_DELIMITERS__FIELD");
        std::env::remove_var("TABULA_DEFAULT_TYPE");
    }
    fs::remove_file(&path).expect("cleanup");

    let settings = from_file.expect("settings");
    assert_eq!(settings.delimiters.field(), ";");
    assert_eq!(settings.default_type, TypeTag::Boolean);

    let settings = from_env_only.expect("settings");
    assert_eq!(settings.delimiters.field(), ";");
    assert_eq!(settings.delimiters.type_name(), ":");
    let fields = FieldSpecParser::from_settings(&settings).parse_all("a:int32;b");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[1].tag(), TypeTag::Boolean);
}

#[test]
#[serial]
fn invalid_delimiter_from_the_environment_is_rejected() {
    // SAFETY: every test touching the environment runs serially
    unsafe {
        std::env::set_var("TABULA_DELIMITERS__TYPE", ",");
    }
    let loaded = Settings::load(None);
    unsafe {
        std::env::remove_var("TABULA_DELIMITERS__TYPE");
    }
    assert!(matches!(loaded, Err(TabulaError::Config(_))));
}

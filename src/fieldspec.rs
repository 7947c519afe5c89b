//! Parser for the field schema spec mini-language.
//!
//! A spec is a delimited list of fields, each written as
//! `name[:type[(option)]]`, for example `"id:int32,name,age:int32(required)"`.
//! Delimiters are matched as literal substrings, so they may be longer than
//! one character.
//!
//! Parsing is lenient and never fails: a missing type or option defaults to
//! empty text, an unknown type name resolves to the registry's default tag,
//! and an option that is never closed is dropped.

use std::fmt;
use std::iter::FusedIterator;

use serde::Deserialize;
use tracing::trace;

use crate::datatype::TypeTag;
use crate::error::{Result, TabulaError};
use crate::registry::TypeRegistry;
use crate::settings::Settings;

pub const FIELD_DELIMITER: &str = ",";
pub const TYPE_DELIMITER: &str = ":";
pub const OPTION_OPEN: &str = "(";
pub const OPTION_CLOSE: &str = ")";

/// The four delimiters of the spec language. Always valid: construction and
/// deserialization both go through [`Delimiters::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawDelimiters")]
pub struct Delimiters {
    field: String,
    type_name: String,
    option_open: String,
    option_close: String,
}

// delimiters as written in a settings file, before validation
#[derive(Deserialize)]
#[serde(default)]
struct RawDelimiters {
    field: String,
    #[serde(rename = "type")]
    type_name: String,
    option_open: String,
    option_close: String,
}

impl Default for RawDelimiters {
    fn default() -> Self {
        Self {
            field: FIELD_DELIMITER.to_string(),
            type_name: TYPE_DELIMITER.to_string(),
            option_open: OPTION_OPEN.to_string(),
            option_close: OPTION_CLOSE.to_string(),
        }
    }
}

impl TryFrom<RawDelimiters> for Delimiters {
    type Error = TabulaError;
    fn try_from(raw: RawDelimiters) -> Result<Self> {
        Self::new(raw.field, raw.type_name, raw.option_open, raw.option_close)
    }
}

impl Delimiters {
    pub fn new(
        field: impl Into<String>,
        type_name: impl Into<String>,
        option_open: impl Into<String>,
        option_close: impl Into<String>,
    ) -> Result<Self> {
        let delimiters = Self {
            field: field.into(),
            type_name: type_name.into(),
            option_open: option_open.into(),
            option_close: option_close.into(),
        };
        delimiters.validate()?;
        Ok(delimiters)
    }
    /// Every delimiter must be non-empty, and the three delimiters that can
    /// open a new scanning phase must differ from each other.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("field", &self.field),
            ("type", &self.type_name),
            ("option_open", &self.option_open),
            ("option_close", &self.option_close),
        ];
        if let Some((which, _)) = all.iter().find(|(_, d)| d.is_empty()) {
            return Err(TabulaError::InvalidDelimiter(format!("{which} delimiter is empty")));
        }
        if self.field == self.type_name
            || self.field == self.option_open
            || self.type_name == self.option_open
        {
            return Err(TabulaError::InvalidDelimiter(format!(
                "field {:?}, type {:?} and option {:?} delimiters must differ",
                self.field, self.type_name, self.option_open
            )));
        }
        Ok(())
    }
    pub fn field(&self) -> &str {
        &self.field
    }
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn option_open(&self) -> &str {
        &self.option_open
    }
    pub fn option_close(&self) -> &str {
        &self.option_close
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: FIELD_DELIMITER.to_string(),
            type_name: TYPE_DELIMITER.to_string(),
            option_open: OPTION_OPEN.to_string(),
            option_close: OPTION_CLOSE.to_string(),
        }
    }
}

/// One parsed field: its name, the type name as written, the tag that name
/// resolved to, and the raw option text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    type_name: String,
    tag: TypeTag,
    option: String,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        tag: TypeTag,
        option: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            tag,
            option: option.into(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
    pub fn tag(&self) -> TypeTag {
        self.tag
    }
    pub fn option(&self) -> &str {
        &self.option
    }
    fn write_with(&self, out: &mut impl fmt::Write, delimiters: &Delimiters) -> fmt::Result {
        out.write_str(&self.name)?;
        // an option without a type still needs the type delimiter,
        // otherwise it would be read back as part of the name
        if !self.type_name.is_empty() || !self.option.is_empty() {
            out.write_str(&delimiters.type_name)?;
            out.write_str(&self.type_name)?;
        }
        if !self.option.is_empty() {
            out.write_str(&delimiters.option_open)?;
            out.write_str(&self.option)?;
            out.write_str(&delimiters.option_close)?;
        }
        Ok(())
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_with(f, &Delimiters::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Name,
    Type,
    Option,
    Trailing,
}

#[derive(Debug, Clone, Default)]
pub struct FieldSpecParser {
    registry: TypeRegistry,
    delimiters: Delimiters,
}

impl FieldSpecParser {
    /// A parser with the built-in type names and the default delimiters.
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            registry,
            delimiters: Delimiters::default(),
        }
    }
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_registry(TypeRegistry::new().with_default_tag(settings.default_type))
            .with_delimiters(settings.delimiters.clone())
    }
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Parse the field starting at byte offset `start`.
    ///
    /// Returns the descriptor and the number of bytes consumed, including a
    /// trailing field delimiter. `None` means no field was produced because
    /// the input is exhausted (or `start` is not a character boundary).
    pub fn parse_field(&self, spec: &str, start: usize) -> Option<(FieldDescriptor, usize)> {
        let mut buffer = String::new();
        self.scan_field(spec, start, &mut buffer)
    }

    /// Lazily parse a whole spec. Every iteration over the result starts
    /// from the beginning of `spec` with its own scratch buffer.
    pub fn parse<'p, 's>(&'p self, spec: &'s str) -> ParsedFieldSpec<'p, 's> {
        ParsedFieldSpec { parser: self, spec }
    }

    pub fn parse_all(&self, spec: &str) -> Vec<FieldDescriptor> {
        self.parse(spec).iter().map(|(_, descriptor)| descriptor).collect()
    }

    /// Write descriptors back out as a spec string using this parser's delimiters.
    pub fn render<'a>(&self, fields: impl IntoIterator<Item = &'a FieldDescriptor>) -> String {
        let mut out = String::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push_str(&self.delimiters.field);
            }
            // writing into a String cannot fail
            let _ = field.write_with(&mut out, &self.delimiters);
        }
        out
    }

    fn scan_field(
        &self,
        spec: &str,
        start: usize,
        buffer: &mut String,
    ) -> Option<(FieldDescriptor, usize)> {
        buffer.clear();
        let rest = spec.get(start..)?;
        if rest.is_empty() {
            return None;
        }
        let field_delimiter = self.delimiters.field.as_str();
        let type_delimiter = self.delimiters.type_name.as_str();
        let option_open = self.delimiters.option_open.as_str();
        let option_close = self.delimiters.option_close.as_str();

        let mut name: Option<String> = None;
        let mut type_name: Option<String> = None;
        let mut option: Option<String> = None;
        let mut phase = Phase::Name;
        let mut end_of_field = false;
        let mut consumed = 0;

        while !end_of_field {
            let tail = &rest[consumed..];
            consumed += match phase {
                Phase::Name if tail.starts_with(field_delimiter) => {
                    name = Some(take(buffer));
                    end_of_field = true;
                    field_delimiter.len()
                }
                Phase::Name if tail.starts_with(type_delimiter) => {
                    name = Some(take(buffer));
                    phase = Phase::Type;
                    type_delimiter.len()
                }
                Phase::Type if tail.starts_with(field_delimiter) => {
                    type_name = Some(take(buffer));
                    end_of_field = true;
                    field_delimiter.len()
                }
                Phase::Type if tail.starts_with(option_open) => {
                    type_name = Some(take(buffer));
                    phase = Phase::Option;
                    option_open.len()
                }
                Phase::Option if tail.starts_with(option_close) => {
                    option = Some(take(buffer));
                    phase = Phase::Trailing;
                    option_close.len()
                }
                Phase::Trailing if tail.starts_with(field_delimiter) => {
                    end_of_field = true;
                    field_delimiter.len()
                }
                Phase::Trailing => next_char_len(tail),
                Phase::Name | Phase::Type | Phase::Option => {
                    let len = next_char_len(tail);
                    buffer.push_str(&tail[..len]);
                    len
                }
            };
            if consumed >= rest.len() {
                // end of input closes whatever is open, without a phantom delimiter
                if name.is_none() {
                    name = Some(take(buffer));
                } else if type_name.is_none() {
                    type_name = Some(take(buffer));
                }
                end_of_field = true;
            }
        }

        let name = name.unwrap_or_default().trim().to_string();
        let type_name = type_name.unwrap_or_default().trim().to_string();
        let option = option.unwrap_or_default();
        let tag = self.registry.resolve(&type_name);
        trace!(field = %name, type_name = %type_name, %tag, consumed, "parsed field");
        Some((
            FieldDescriptor {
                name,
                type_name,
                tag,
                option,
            },
            consumed,
        ))
    }
}

fn take(buffer: &mut String) -> String {
    buffer.drain(..).collect()
}

fn next_char_len(tail: &str) -> usize {
    tail.chars().next().map_or(1, char::len_utf8)
}

/// A spec string bound to a parser, ready to be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub struct ParsedFieldSpec<'p, 's> {
    parser: &'p FieldSpecParser,
    spec: &'s str,
}

impl<'p, 's> ParsedFieldSpec<'p, 's> {
    pub fn iter(&self) -> Fields<'p, 's> {
        Fields {
            parser: self.parser,
            spec: self.spec,
            position: 0,
            buffer: String::new(),
        }
    }
}

impl<'p, 's> IntoIterator for ParsedFieldSpec<'p, 's> {
    type Item = (String, FieldDescriptor);
    type IntoIter = Fields<'p, 's>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'p, 's> IntoIterator for &ParsedFieldSpec<'p, 's> {
    type Item = (String, FieldDescriptor);
    type IntoIter = Fields<'p, 's>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Yields `(name, descriptor)` pairs in spec order.
#[derive(Debug)]
pub struct Fields<'p, 's> {
    parser: &'p FieldSpecParser,
    spec: &'s str,
    position: usize,
    buffer: String,
}

impl Iterator for Fields<'_, '_> {
    type Item = (String, FieldDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        let (descriptor, consumed) =
            self.parser.scan_field(self.spec, self.position, &mut self.buffer)?;
        self.position += consumed;
        Some((descriptor.name.clone(), descriptor))
    }
}

impl FusedIterator for Fields<'_, '_> {}

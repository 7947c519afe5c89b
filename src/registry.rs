//! Mapping between data type names and [`TypeTag`]s.
//!
//! Forward lookups (name to tag) are case-insensitive and total: a name the
//! registry does not know resolves to a default tag instead of failing.
//! Several names may point at one tag; the first name registered for a tag
//! becomes its canonical name and later aliases never replace it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::comparer::NameHasher;
use crate::datatype::TypeTag;

// Deliberately minimal. Alternate spellings ("string", "text", "bytes", ...)
// belong in a custom registry so that they never surprise existing specs.
const BUILT_IN_TYPES: [(&str, TypeTag); 11] = [
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

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    tags: HashMap<String, TypeTag, NameHasher>,
    canonical: HashMap<TypeTag, String, NameHasher>,
    default_tag: TypeTag,
}

impl TypeRegistry {
    /// A registry knowing the eleven built-in type names.
    pub fn new() -> Self {
        Self::from_pairs(BUILT_IN_TYPES)
    }
    /// A registry knowing exactly the given names, applied in order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeTag)>,
        S: Into<String>,
    {
        let mut registry = Self {
            tags: HashMap::default(),
            canonical: HashMap::default(),
            default_tag: TypeTag::default(),
        };
        for (name, tag) in pairs {
            registry.register(name.into(), tag);
        }
        registry
    }
    /// Replace the tag that unknown names resolve to.
    pub fn with_default_tag(mut self, tag: TypeTag) -> Self {
        self.default_tag = tag;
        self
    }
    fn register(&mut self, name: String, tag: TypeTag) {
        self.tags.insert(fold(&name), tag);
        // the first name seen for a tag is its canonical name,
        // after this all other names for the tag are aliases
        if let Entry::Vacant(e) = self.canonical.entry(tag) {
            e.insert(name);
        }
    }
    pub fn default_tag(&self) -> TypeTag {
        self.default_tag
    }
    /// Look up a type name, falling back to `default` when it is unknown.
    pub fn name_to_tag(&self, name: &str, default: TypeTag) -> TypeTag {
        self.tags.get(&fold(name)).copied().unwrap_or(default)
    }
    /// Look up a type name, falling back to the registry's default tag.
    pub fn resolve(&self, name: &str) -> TypeTag {
        self.name_to_tag(name, self.default_tag)
    }
    pub fn canonical_name(&self, tag: TypeTag) -> Option<&str> {
        self.canonical.get(&tag).map(String::as_str)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(&fold(name))
    }
    pub fn len(&self) -> usize {
        self.tags.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

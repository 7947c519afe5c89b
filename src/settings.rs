//! Parser configuration loaded through the `config` crate.
//!
//! Sources are layered: an optional settings file (any format `config`
//! understands, chosen by extension) and then `TABULA_`-prefixed environment
//! variables, where `__` separates nested keys:
//!
//! ```text
//! TABULA_DEFAULT_TYPE=varchar
//! TABULA_DELIMITERS__FIELD=;
//! ```

use std::path::Path;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

use crate::datatype::TypeTag;
use crate::error::Result;
use crate::fieldspec::Delimiters;

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "TABULA";

/// Separator between the prefix and the key.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested keys in environment variables.
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub delimiters: Delimiters,
    /// Tag given to fields whose type name is missing or unknown.
    pub default_type: TypeTag,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_PREFIX_SEPARATOR)
            .separator(ENV_SEPARATOR);
        Self::finish(builder.add_source(environment))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Self::finish(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        // invalid delimiters are rejected while deserializing
        let settings: Settings = builder.build()?.try_deserialize()?;
        debug!(
            field = settings.delimiters.field(),
            default_type = %settings.default_type,
            "loaded settings"
        );
        Ok(settings)
    }
}

//! Layered settings: built-in defaults, then an optional settings file, then
//! environment variables such as `PROSOPON__LINKER__MODE=final`.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::link::LinkMode;

pub const ENV_PREFIX: &str = "PROSOPON";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub atomizer: AtomizerSettings,
    pub linker: LinkerSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomizerSettings {
    /// Earlier separators take precedence over later ones.
    pub separators: Vec<String>,
    pub exceptions: Vec<String>,
    pub discard: Vec<String>,
}
impl Default for AtomizerSettings {
    fn default() -> Self {
        Self {
            separators: [", ", ",", ";", " en ", " ende ", " & "]
                .into_iter()
                .map(String::from)
                .collect(),
            exceptions: Vec::new(),
            discard: ["en", "ende", "&"].into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerSettings {
    pub mode: LinkMode,
    /// Prefix of identifiers that count as already linked.
    pub namespace: String,
}
impl Default for LinkerSettings {
    fn default() -> Self {
        Self {
            mode: LinkMode::Provisional,
            namespace: "https://data.globalise.huygens.knaw.nl/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, overridden by `RUST_LOG` when that is set.
    pub filter: String,
}
impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// The format of `path` is taken from its extension.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
    pub fn from_toml_str(toml: &str) -> Result<Settings> {
        let settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

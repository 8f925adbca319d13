//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [limits]
//! min_length = 3
//! max_length = 2000
//!
//! [[field]]
//! name = "amount"
//! kind = "numeric"
//!
//! [[field]]
//! name = "user.region"
//! kind = "text"
//! ```
//!
//! A field's namespace defaults to the one its name implies. When no
//! `[[field]]` tables are given the standard catalog is used.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    catalog::{CatalogError, FieldCatalog, FieldDef, FieldKind, Namespace},
    engine::RuleEngine,
    validator::ValidationLimits,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid field catalog: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub namespace: Option<Namespace>,
}

impl From<FieldEntry> for FieldDef {
    fn from(entry: FieldEntry) -> Self {
        let namespace = entry
            .namespace
            .unwrap_or_else(|| Namespace::of(&entry.name));
        FieldDef {
            name: entry.name,
            kind: entry.kind,
            namespace,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub limits: ValidationLimits,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldEntry>,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Builds the catalog, running the startup consistency check.
    pub fn catalog(&self) -> Result<FieldCatalog, ConfigError> {
        if self.fields.is_empty() {
            return Ok(FieldCatalog::standard());
        }
        FieldCatalog::new(self.fields.iter().cloned().map(FieldDef::from)).map_err(|e| {
            warn!(error = %e, "field catalog rejected");
            ConfigError::Catalog(e)
        })
    }

    pub fn build_engine(&self) -> Result<RuleEngine, ConfigError> {
        let catalog = self.catalog()?;
        info!(fields = catalog.len(), "rule engine initialised");
        Ok(RuleEngine::new(Arc::new(catalog)).with_limits(self.limits))
    }
}

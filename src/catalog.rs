//! Registry of the fields a rule may reference.
//!
//! A catalog is an explicit, immutable value. The validator and evaluator
//! receive one at construction, so several catalogs can coexist.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix that routes a field to the user record.
pub const USER_PREFIX: &str = "user.";

/// Value kind of a field; decides which operators are legal on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// All six comparison operators
    Numeric,
    /// Only `=` and `!=`
    Text,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Numeric => f.write_str("numeric"),
            FieldKind::Text => f.write_str("text"),
        }
    }
}

/// Which record a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Transaction,
    User,
}

impl Namespace {
    /// Namespace implied by a field name.
    pub fn of(name: &str) -> Self {
        if name.starts_with(USER_PREFIX) {
            Namespace::User
        } else {
            Namespace::Transaction
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Transaction => f.write_str("transaction"),
            Namespace::User => f.write_str("user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub namespace: Namespace,
}

impl FieldDef {
    /// Field whose namespace follows from its name.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let namespace = Namespace::of(&name);
        FieldDef {
            name,
            kind,
            namespace,
        }
    }
}

/// Schema mismatch found while building a catalog. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("field '{name}' is declared both {first} and {second}")]
    ConflictingKind {
        name: String,
        first: FieldKind,
        second: FieldKind,
    },

    #[error("field '{name}' is declared in the {declared} namespace but its name implies {implied}")]
    NamespaceMismatch {
        name: String,
        declared: Namespace,
        implied: Namespace,
    },

    #[error("field with an empty name")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: BTreeMap<String, FieldDef>,
}

impl FieldCatalog {
    /// Builds a catalog, rejecting inconsistent declarations. Exact duplicates
    /// are collapsed.
    pub fn new(defs: impl IntoIterator<Item = FieldDef>) -> Result<Self, CatalogError> {
        let mut fields: BTreeMap<String, FieldDef> = BTreeMap::new();

        for def in defs {
            if def.name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }

            let implied = Namespace::of(&def.name);
            if def.namespace != implied {
                return Err(CatalogError::NamespaceMismatch {
                    name: def.name,
                    declared: def.namespace,
                    implied,
                });
            }

            if let Some(existing) = fields.get(&def.name) {
                if existing.kind != def.kind {
                    return Err(CatalogError::ConflictingKind {
                        name: def.name,
                        first: existing.kind,
                        second: def.kind,
                    });
                }
                continue;
            }

            fields.insert(def.name.clone(), def);
        }

        Ok(FieldCatalog { fields })
    }

    /// The compiled-in catalog of transaction and user fields.
    pub fn standard() -> Self {
        use FieldKind::{Numeric, Text};

        let fields = [
            ("amount", Numeric),
            ("currency", Text),
            ("merchantId", Text),
            ("merchantCategoryCode", Text),
            ("ipAddress", Text),
            ("deviceId", Text),
            ("channel", Text),
            ("location.country", Text),
            ("location.city", Text),
            ("location.latitude", Numeric),
            ("location.longitude", Numeric),
            ("user.age", Numeric),
            ("user.region", Text),
        ]
        .into_iter()
        .map(|(name, kind)| (name.to_string(), FieldDef::new(name, kind)))
        .collect();

        FieldCatalog { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All fields, sorted by name.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

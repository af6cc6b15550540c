//! API catalogue: the ordered list of call-site signatures to detect.
//!
//! Catalogue order is significant. It fixes category grouping in console
//! reports and row order in CSV exports.

mod builtin;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ScanError};

/// Capability class an API signature belongs to.
///
/// Serialized in snake_case; any spelling accepted by
/// [`ApiCategory::from_str_lenient`] deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiCategory {
    FileSystem,
    Network,
    Rendering,
    UserInteraction,
}

impl ApiCategory {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "file_system" | "filesystem" | "fs" => Some(Self::FileSystem),
            "network" | "net" => Some(Self::Network),
            "rendering" | "render" => Some(Self::Rendering),
            "user_interaction" | "ui" => Some(Self::UserInteraction),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ApiCategory {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Self::from_str_lenient(&name).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown category '{}' (file_system, network, rendering, user_interaction)",
                name
            ))
        })
    }
}

impl std::fmt::Display for ApiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileSystem => write!(f, "File System"),
            Self::Network => write!(f, "Network"),
            Self::Rendering => write!(f, "Rendering"),
            Self::UserInteraction => write!(f, "User Interaction"),
        }
    }
}

/// A literal call-site idiom and the category it is reported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSignature {
    pub signature: String,
    pub category: ApiCategory,
}

/// Which built-in catalogue to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogueSet {
    /// All four categories; used for single-archive scans.
    Full,
    /// Network, rendering and user-interaction subset; used for sampling runs.
    Batch,
}

impl CatalogueSet {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" | "interactive" => Some(Self::Full),
            "batch" | "sample" => Some(Self::Batch),
            _ => None,
        }
    }
}

impl std::fmt::Display for CatalogueSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// On-disk catalogue layout: a list of `[[api]]` tables.
#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(default)]
    api: Vec<ApiSignature>,
}

/// Ordered, duplicate-free set of API signatures.
#[derive(Debug, Clone)]
pub struct Catalogue {
    entries: Vec<ApiSignature>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Build a catalogue, rejecting empty or repeated signatures.
    ///
    /// A repeated signature would be counted twice per occurrence; an empty
    /// one would match at every position.
    pub fn from_entries(entries: Vec<ApiSignature>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.signature.is_empty() {
                return Err(ScanError::Catalogue(format!("entry {} has an empty signature", i + 1)));
            }
            if index.insert(entry.signature.clone(), i).is_some() {
                return Err(ScanError::Catalogue(format!(
                    "duplicate signature '{}'",
                    entry.signature
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// One of the built-in signature sets.
    pub fn builtin(set: CatalogueSet) -> Self {
        let table = match set {
            CatalogueSet::Full => builtin::FULL,
            CatalogueSet::Batch => builtin::BATCH,
        };
        let entries = table
            .iter()
            .map(|&(signature, category)| ApiSignature {
                signature: signature.to_string(),
                category,
            })
            .collect::<Vec<_>>();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.signature.clone(), i))
            .collect();
        Self { entries, index }
    }

    /// Load a catalogue from a TOML file of `[[api]]` entries.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse catalogue TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let file: CatalogueFile = toml::from_str(content)?;
        if file.api.is_empty() {
            return Err(ScanError::Catalogue("catalogue defines no [[api]] entries".into()));
        }
        Self::from_entries(file.api)
    }

    pub fn lookup_category(&self, signature: &str) -> Option<ApiCategory> {
        self.index
            .get(signature)
            .map(|&i| self.entries[i].category)
    }

    /// All signatures in catalogue order.
    pub fn all_signatures(&self) -> &[ApiSignature] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ApiSignature> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a ApiSignature;
    type IntoIter = std::slice::Iter<'a, ApiSignature>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

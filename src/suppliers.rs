//! Suppliers
//!
//! Fixed lookup table of supplier rating and delivery metadata, used to enrich
//! raw search results. Unknown suppliers get the directory's fallback profile.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a supplier directory.
#[derive(Debug, Error)]
pub enum SupplierError {
    /// IO error reading the supplier file
    #[error("Failed to read supplier file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse supplier YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Rating and delivery metadata for one supplier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupplierProfile {
    /// Average customer rating out of five.
    pub rating: Decimal,

    /// Human-readable delivery estimate.
    pub delivery: String,
}

impl SupplierProfile {
    /// Creates a new supplier profile.
    pub fn new(rating: Decimal, delivery: impl Into<String>) -> Self {
        Self {
            rating,
            delivery: delivery.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SupplierFile {
    suppliers: FxHashMap<String, SupplierProfile>,

    #[serde(default)]
    default: Option<SupplierProfile>,
}

/// Supplier lookup table keyed case-insensitively by supplier name.
#[derive(Debug, Clone)]
pub struct SupplierDirectory {
    profiles: FxHashMap<String, SupplierProfile>,
    fallback: SupplierProfile,
}

impl SupplierDirectory {
    /// Creates an empty directory where every supplier gets `fallback`.
    pub fn new(fallback: SupplierProfile) -> Self {
        Self {
            profiles: FxHashMap::default(),
            fallback,
        }
    }

    /// Adds or replaces a supplier profile.
    #[must_use]
    pub fn with_supplier(mut self, name: &str, profile: SupplierProfile) -> Self {
        self.profiles.insert(normalise(name), profile);
        self
    }

    /// Parses a directory from YAML.
    ///
    /// Suppliers listed in the document extend the built-in table; a `default`
    /// entry replaces the fallback profile.
    ///
    /// # Errors
    ///
    /// Returns a [`SupplierError::Yaml`] if the document is malformed.
    pub fn from_yaml_str(contents: &str) -> Result<Self, SupplierError> {
        let file: SupplierFile = serde_norway::from_str(contents)?;
        let mut directory = Self::default();

        if let Some(fallback) = file.default {
            directory.fallback = fallback;
        }

        for (name, profile) in file.suppliers {
            directory.profiles.insert(normalise(&name), profile);
        }

        Ok(directory)
    }

    /// Loads a directory from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SupplierError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Returns the profile for `supplier`, or the fallback profile if it is unknown.
    pub fn lookup(&self, supplier: &str) -> &SupplierProfile {
        self.profiles
            .get(&normalise(supplier))
            .unwrap_or(&self.fallback)
    }

    /// Returns the fallback profile for unknown suppliers.
    pub fn fallback(&self) -> &SupplierProfile {
        &self.fallback
    }

    /// Number of known suppliers.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the directory has no known suppliers.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for SupplierDirectory {
    fn default() -> Self {
        Self::new(SupplierProfile::new(Decimal::new(40, 1), "3-5 working days"))
            .with_supplier("Screwfix", SupplierProfile::new(Decimal::new(46, 1), "Next day"))
            .with_supplier("Toolstation", SupplierProfile::new(Decimal::new(45, 1), "Next day"))
            .with_supplier("CEF", SupplierProfile::new(Decimal::new(47, 1), "Next day"))
            .with_supplier("TLC Direct", SupplierProfile::new(Decimal::new(48, 1), "1-2 working days"))
            .with_supplier("Edmundson", SupplierProfile::new(Decimal::new(46, 1), "Next day"))
            .with_supplier("ToolStop", SupplierProfile::new(Decimal::new(45, 1), "1-2 working days"))
            .with_supplier("Amazon", SupplierProfile::new(Decimal::new(42, 1), "1-2 days"))
            .with_supplier("B&Q", SupplierProfile::new(Decimal::new(41, 1), "2-3 working days"))
            .with_supplier("Wickes", SupplierProfile::new(Decimal::new(40, 1), "2-4 working days"))
    }
}

fn normalise(name: &str) -> String {
    name.trim().to_lowercase()
}

//! Seed records for loading reference data into a store
//!
//! One record per creature, relations referenced by name. Categories and
//! traits are created on first sight and reused afterwards.

use super::NewCreature;
use serde::{Deserialize, Serialize};

/// Metric entry inside a seed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedMetric {
    pub name: String,
    pub base_value: i32,
    #[serde(default)]
    pub effort: i32,
}

/// A creature plus the names of its relations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub creature: NewCreature,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<SeedMetric>,
}

impl SeedRecord {
    pub fn new(creature: NewCreature) -> Self {
        Self {
            creature,
            categories: Vec::new(),
            traits: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_traits<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, base_value: i32, effort: i32) -> Self {
        self.metrics.push(SeedMetric {
            name: name.into(),
            base_value,
            effort,
        });
        self
    }
}

/// Parse a JSON array of seed records
pub fn parse_seed_file(json: &str) -> crate::Result<Vec<SeedRecord>> {
    Ok(serde_json::from_str(json)?)
}

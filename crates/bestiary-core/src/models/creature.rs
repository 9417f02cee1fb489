//! Creature entity and its relations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag-like entity shared by many creatures (unique name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Ability-like entity shared by many creatures (unique name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureTrait {
    pub id: i64,
    pub name: String,
}

/// Named numeric measurement owned by exactly one creature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: i64,
    pub name: String,
    pub base_value: i32,
    pub effort: i32,
    pub creature_id: i64,
}

/// Primary reference entity
///
/// Relation vectors are only populated for the relations the query asked
/// for; an unloaded relation and an empty one look the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub id: i64,
    pub name: String,
    pub height: i32,
    pub weight: i32,
    pub base_experience: i32,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub traits: Vec<CreatureTrait>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Creature {
    /// Check whether this creature carries a category with the exact name
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }
}

/// Fields for creating a creature; the id is chosen by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCreature {
    pub id: i64,
    pub name: String,
    pub height: i32,
    pub weight: i32,
    pub base_experience: i32,
    pub is_default: bool,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreaturePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub weight: Option<i32>,
    #[serde(default)]
    pub base_experience: Option<i32>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl CreaturePatch {
    /// Patch that only renames
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.height.is_none()
            && self.weight.is_none()
            && self.base_experience.is_none()
            && self.is_default.is_none()
    }
}

//! Creature store boundary
//!
//! `CreatureStore` is the narrow interface the service facade talks to.
//! `SqliteStore` implements it on top of rusqlite; tests substitute stubs.

mod sqlite;

pub use sqlite::{ImportReport, SqliteStore};

use crate::models::{
    Category, Creature, CreaturePatch, CreatureTrait, Metric, NewCreature, Page, PageRequest,
};
use crate::Result;
use async_trait::async_trait;

/// Read and write access to creature reference data
///
/// Errors from the backing store propagate unmodified; nothing here retries.
#[async_trait]
pub trait CreatureStore: Send + Sync {
    /// Load a creature with categories, traits and metrics.
    ///
    /// Returns `None` when no row matches.
    async fn get_by_id(&self, id: i64) -> Result<Option<Creature>>;

    /// Creatures linked to the category with exactly this name, with
    /// categories and traits loaded. Unknown names yield an empty list.
    async fn get_by_category(&self, name: &str) -> Result<Vec<Creature>>;

    /// One page of creatures ordered by id, all relations loaded.
    ///
    /// `total` counts every row matching the filter, before paging.
    async fn get_paginated(&self, request: &PageRequest) -> Result<Page<Creature>>;

    /// Insert a creature and return it as stored
    async fn create(&self, fields: NewCreature) -> Result<Creature>;

    /// Apply a partial update. Unknown ids are a silent no-op.
    async fn update(&self, id: i64, patch: CreaturePatch) -> Result<()>;

    /// Hard delete; true iff a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn list_traits(&self) -> Result<Vec<CreatureTrait>>;

    /// Metrics owned by a creature, by foreign key
    async fn metrics_for(&self, creature_id: i64) -> Result<Vec<Metric>>;
}

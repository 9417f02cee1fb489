//! Service facade over the creature store
//!
//! Listing reads go through the shared `ResultCache`; lookups by id or
//! category and every mutation go straight to the store.

use crate::cache::{Memoized, ResultCache};
use crate::config::CacheConfig;
use crate::models::{
    Category, Creature, CreaturePatch, CreatureTrait, Metric, NewCreature, Page, PageRequest,
};
use crate::store::CreatureStore;
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Entry point for callers (CLI, tests, future transports)
pub struct CreatureService {
    store: Arc<dyn CreatureStore>,
    cache: ResultCache,
    paginated: Memoized<PageRequest, Page<Creature>>,
    categories: Memoized<(), Vec<Category>>,
    traits: Memoized<(), Vec<CreatureTrait>>,
}

impl CreatureService {
    /// Wire the cached reads with TTLs from `config`
    pub fn new(store: Arc<dyn CreatureStore>, cache: ResultCache, config: &CacheConfig) -> Self {
        let paginated = {
            let store = store.clone();
            cache.memoize("paginated", config.list_ttl(), move |request: PageRequest| {
                let store = store.clone();
                async move { store.get_paginated(&request).await }
            })
        };

        let categories = {
            let store = store.clone();
            cache.memoize("categories", config.reference_ttl(), move |()| {
                let store = store.clone();
                async move { store.list_categories().await }
            })
        };

        let traits = {
            let store = store.clone();
            cache.memoize("traits", config.reference_ttl(), move |()| {
                let store = store.clone();
                async move { store.list_traits().await }
            })
        };

        Self {
            store,
            cache,
            paginated,
            categories,
            traits,
        }
    }

    /// Service with default TTLs and a cache built from `CacheConfig::default()`
    pub fn with_defaults(store: Arc<dyn CreatureStore>) -> Self {
        let config = CacheConfig::default();
        Self::new(store, ResultCache::from_config(&config), &config)
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    // ===================
    // Reads
    // ===================

    /// Uncached
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Creature>> {
        self.store.get_by_id(id).await
    }

    /// Uncached
    pub async fn get_by_category(&self, name: &str) -> Result<Vec<Creature>> {
        self.store.get_by_category(name).await
    }

    /// Cached per normalized request (limit, offset, category)
    pub async fn paginated(&self, request: PageRequest) -> Result<Page<Creature>> {
        self.paginated.call(request.normalized()).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.categories.call(()).await
    }

    pub async fn traits(&self) -> Result<Vec<CreatureTrait>> {
        self.traits.call(()).await
    }

    /// Uncached
    pub async fn metrics_for(&self, creature_id: i64) -> Result<Vec<Metric>> {
        self.store.metrics_for(creature_id).await
    }

    // ===================
    // Mutations
    // ===================
    // Cached listings are not invalidated here; they may lag by one TTL.

    pub async fn create(&self, fields: NewCreature) -> Result<Creature> {
        let creature = self.store.create(fields).await?;
        debug!(id = creature.id, name = %creature.name, "Creature created");
        Ok(creature)
    }

    /// Apply `patch` and return the creature as now stored, or `None` if
    /// the id does not exist
    pub async fn update(&self, id: i64, patch: CreaturePatch) -> Result<Option<Creature>> {
        self.store.update(id, patch).await?;
        self.store.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let removed = self.store.delete(id).await?;
        debug!(id, removed, "Creature delete");
        Ok(removed)
    }
}

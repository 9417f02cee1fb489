//! Integration tests for cached reads through `CreatureService`

use async_trait::async_trait;
use bestiary_core::config::CacheConfig;
use bestiary_core::models::{
    Category, Creature, CreaturePatch, CreatureTrait, Metric, NewCreature, Page, PageRequest,
    SeedRecord,
};
use bestiary_core::{CreatureService, CreatureStore, Result, ResultCache, SqliteStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Delegates to a real store and counts calls per operation
struct CountingStore {
    inner: SqliteStore,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl CountingStore {
    fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn bump(&self, op: &'static str) {
        *self.calls.lock().entry(op).or_default() += 1;
    }

    fn calls(&self, op: &str) -> usize {
        self.calls.lock().get(op).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CreatureStore for CountingStore {
    async fn get_by_id(&self, id: i64) -> Result<Option<Creature>> {
        self.bump("get_by_id");
        self.inner.get_by_id(id).await
    }

    async fn get_by_category(&self, name: &str) -> Result<Vec<Creature>> {
        self.bump("get_by_category");
        self.inner.get_by_category(name).await
    }

    async fn get_paginated(&self, request: &PageRequest) -> Result<Page<Creature>> {
        self.bump("get_paginated");
        self.inner.get_paginated(request).await
    }

    async fn create(&self, fields: NewCreature) -> Result<Creature> {
        self.bump("create");
        self.inner.create(fields).await
    }

    async fn update(&self, id: i64, patch: CreaturePatch) -> Result<()> {
        self.bump("update");
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        self.bump("delete");
        self.inner.delete(id).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.bump("list_categories");
        self.inner.list_categories().await
    }

    async fn list_traits(&self) -> Result<Vec<CreatureTrait>> {
        self.bump("list_traits");
        self.inner.list_traits().await
    }

    async fn metrics_for(&self, creature_id: i64) -> Result<Vec<Metric>> {
        self.bump("metrics_for");
        self.inner.metrics_for(creature_id).await
    }
}

fn seeded_store() -> Arc<CountingStore> {
    let store = SqliteStore::open_in_memory().unwrap();
    let names = ["bulbasaur", "ivysaur", "venusaur", "charmander", "charmeleon"];
    let records: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let id = i as i64 + 1;
            let category = if id > 3 { "fire" } else { "grass" };
            SeedRecord::new(NewCreature {
                id,
                name: name.to_string(),
                height: 10,
                weight: 100,
                base_experience: 60,
                is_default: true,
            })
            .with_categories([category])
            .with_traits(["run-away"])
            .with_metric("hp", 40 + id as i32, 0)
        })
        .collect();
    assert_eq!(store.import_all(&records).loaded, 5);

    Arc::new(CountingStore::new(store))
}

fn service_with_ttls(store: Arc<CountingStore>, list_ttl: Duration) -> CreatureService {
    let config = CacheConfig {
        list_ttl_secs: list_ttl.as_secs(),
        ..CacheConfig::default()
    };
    CreatureService::new(store, ResultCache::from_config(&config), &config)
}

#[tokio::test]
async fn test_repeat_listing_hits_store_once() {
    let store = seeded_store();
    let service = CreatureService::with_defaults(store.clone());

    let first = service.paginated(PageRequest::new(2, 0)).await.unwrap();
    let second = service.paginated(PageRequest::new(2, 0)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total, 5);
    assert_eq!(store.calls("get_paginated"), 1);
}

#[tokio::test]
async fn test_different_arguments_never_collide() {
    let store = seeded_store();
    let service = CreatureService::with_defaults(store.clone());

    let a = service.paginated(PageRequest::new(2, 0)).await.unwrap();
    let b = service.paginated(PageRequest::new(2, 2)).await.unwrap();
    let c = service.paginated(PageRequest::new(0, 2)).await.unwrap();
    let fire = service
        .paginated(PageRequest::new(2, 0).with_category("fire"))
        .await
        .unwrap();

    assert_eq!(store.calls("get_paginated"), 4);
    assert_ne!(a.items, b.items);
    assert!(c.is_empty());
    assert_eq!(fire.total, 2);
}

#[tokio::test]
async fn test_expired_listing_goes_back_to_store() {
    let store = seeded_store();
    let config = CacheConfig::default();
    let cache = ResultCache::from_config(&config);
    let service = CreatureService::new(store.clone(), cache.clone(), &config);

    // Route one listing through a short-lived memoized wrapper on the same cache
    let short = {
        let store = store.clone();
        cache.memoize("short_paginated", Duration::from_millis(50), move |req: PageRequest| {
            let store = store.clone();
            async move { store.get_paginated(&req).await }
        })
    };

    short.call(PageRequest::new(2, 0)).await.unwrap();
    short.call(PageRequest::new(2, 0)).await.unwrap();
    assert_eq!(store.calls("get_paginated"), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;

    short.call(PageRequest::new(2, 0)).await.unwrap();
    assert_eq!(store.calls("get_paginated"), 2);

    // The facade's own entry is independent of the short-lived one
    service.paginated(PageRequest::new(2, 0)).await.unwrap();
    assert_eq!(store.calls("get_paginated"), 3);
}

#[tokio::test]
async fn test_zero_ttl_never_serves_from_cache() {
    let store = seeded_store();
    let service = service_with_ttls(store.clone(), Duration::ZERO);

    service.paginated(PageRequest::new(2, 0)).await.unwrap();
    service.paginated(PageRequest::new(2, 0)).await.unwrap();

    assert_eq!(store.calls("get_paginated"), 2);
}

#[tokio::test]
async fn test_reference_lists_cached_lookups_not() {
    let store = seeded_store();
    let service = CreatureService::with_defaults(store.clone());

    for _ in 0..3 {
        service.categories().await.unwrap();
        service.traits().await.unwrap();
        service.get_by_id(1).await.unwrap();
        service.get_by_category("fire").await.unwrap();
        service.metrics_for(1).await.unwrap();
    }

    assert_eq!(store.calls("list_categories"), 1);
    assert_eq!(store.calls("list_traits"), 1);
    assert_eq!(store.calls("get_by_id"), 3);
    assert_eq!(store.calls("get_by_category"), 3);
    assert_eq!(store.calls("metrics_for"), 3);

    let stats = service.cache().stats().await;
    assert_eq!(stats.total_hits(), 4);
    assert_eq!(stats.total_misses(), 2);
}

#[tokio::test]
async fn test_mutations_pass_through() {
    let store = seeded_store();
    let service = CreatureService::with_defaults(store.clone());

    let created = service
        .create(NewCreature {
            id: 6,
            name: "charizard".into(),
            height: 17,
            weight: 905,
            base_experience: 240,
            is_default: true,
        })
        .await
        .unwrap();
    assert_eq!(created.id, 6);

    let renamed = service
        .update(6, CreaturePatch::rename("lizardon"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "lizardon");
    assert_eq!(renamed.weight, 905);

    assert!(service.delete(6).await.unwrap());
    assert!(service.get_by_id(6).await.unwrap().is_none());
    assert!(!service.delete(6).await.unwrap());

    assert_eq!(store.calls("create"), 1);
    assert_eq!(store.calls("update"), 1);
    assert_eq!(store.calls("delete"), 2);
}

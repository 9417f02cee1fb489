//! Integration tests for the SQLite store through the public API

use bestiary_core::models::{CreaturePatch, NewCreature, PageRequest, SeedRecord};
use bestiary_core::{CreatureStore, SqliteStore, StoreError};

fn creature(id: i64, name: &str) -> NewCreature {
    NewCreature {
        id,
        name: name.to_string(),
        height: 10 + id as i32,
        weight: 100 + id as i32,
        base_experience: 50 + id as i32,
        is_default: true,
    }
}

/// Five creatures; ids 4 and 5 are fire, 1 is grass and poison
fn seeded_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    let records = vec![
        SeedRecord::new(creature(1, "bulbasaur"))
            .with_categories(["grass", "poison"])
            .with_traits(["overgrow"])
            .with_metric("hp", 45, 0)
            .with_metric("attack", 49, 0),
        SeedRecord::new(creature(2, "ivysaur")).with_categories(["grass"]),
        SeedRecord::new(creature(3, "venusaur")).with_categories(["grass"]),
        SeedRecord::new(creature(4, "charmander"))
            .with_categories(["fire"])
            .with_traits(["blaze"]),
        SeedRecord::new(creature(5, "charmeleon"))
            .with_categories(["fire"])
            .with_traits(["blaze"]),
    ];

    let report = store.import_all(&records);
    assert_eq!(report.loaded, 5);
    assert_eq!(report.failed, 0);
    store
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let store = SqliteStore::open_in_memory().unwrap();
    let fields = creature(25, "pikachu");

    store.create(fields.clone()).await.unwrap();
    let loaded = store.get_by_id(25).await.unwrap().unwrap();

    assert_eq!(loaded.name, fields.name);
    assert_eq!(loaded.height, fields.height);
    assert_eq!(loaded.weight, fields.weight);
    assert_eq!(loaded.base_experience, fields.base_experience);
    assert_eq!(loaded.is_default, fields.is_default);
    assert!(loaded.categories.is_empty());
    assert!(loaded.traits.is_empty());
    assert!(loaded.metrics.is_empty());
}

#[tokio::test]
async fn test_get_missing_id_is_none() {
    let store = seeded_store();
    assert!(store.get_by_id(999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_by_id_loads_all_relations() {
    let store = seeded_store();

    let bulbasaur = store.get_by_id(1).await.unwrap().unwrap();

    let categories: Vec<_> = bulbasaur.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(categories, ["grass", "poison"]);
    assert_eq!(bulbasaur.traits.len(), 1);
    assert_eq!(bulbasaur.metrics.len(), 2);
    assert!(bulbasaur.metrics.iter().all(|m| m.creature_id == 1));
}

#[tokio::test]
async fn test_paginated_first_and_last_page() {
    let store = seeded_store();

    let first = store.get_paginated(&PageRequest::new(2, 0)).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first.total, 5);
    let ids: Vec<_> = first.items.iter().map(|c| c.id).collect();
    assert_eq!(ids, [1, 2]);

    let last = store.get_paginated(&PageRequest::new(2, 4)).await.unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last.total, 5);
    assert_eq!(last.items[0].id, 5);
}

#[tokio::test]
async fn test_paginated_past_end_is_empty_with_total() {
    let store = seeded_store();

    let page = store.get_paginated(&PageRequest::new(10, 50)).await.unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_paginated_defaults() {
    let store = seeded_store();

    let page = store.get_paginated(&PageRequest::default()).await.unwrap();

    assert_eq!(page.len(), 5);
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_category_filter_restricts_items_and_total() {
    let store = seeded_store();

    let page = store
        .get_paginated(&PageRequest::new(1, 0).with_category("fire"))
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.len(), 1);
    assert!(page.items.iter().all(|c| c.has_category("fire")));

    let unknown = store
        .get_paginated(&PageRequest::new(10, 0).with_category("Fire"))
        .await
        .unwrap();
    assert_eq!(unknown.total, 0);
}

#[tokio::test]
async fn test_filtered_page_loads_every_relation() {
    let store = seeded_store();

    let page = store
        .get_paginated(&PageRequest::new(10, 0).with_category("poison"))
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.len(), 1);
    let bulbasaur = &page.items[0];
    assert_eq!(bulbasaur.id, 1);
    let categories: Vec<_> = bulbasaur.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(categories, ["grass", "poison"]);
    assert_eq!(bulbasaur.traits.len(), 1);
    assert_eq!(bulbasaur.traits[0].name, "overgrow");
    assert_eq!(bulbasaur.metrics.len(), 2);
}

#[tokio::test]
async fn test_unfiltered_page_loads_every_relation() {
    let store = seeded_store();

    let page = store.get_paginated(&PageRequest::new(1, 0)).await.unwrap();

    let bulbasaur = &page.items[0];
    assert_eq!(bulbasaur.categories.len(), 2);
    assert_eq!(bulbasaur.traits.len(), 1);
    assert_eq!(bulbasaur.metrics.len(), 2);
}

#[tokio::test]
async fn test_empty_category_filter_lists_everything() {
    let store = seeded_store();

    let page = store
        .get_paginated(&PageRequest::new(20, 0).with_category(""))
        .await
        .unwrap();

    assert_eq!(page.len(), 5);
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_zero_limit_is_empty_page_with_total() {
    let store = seeded_store();

    let page = store.get_paginated(&PageRequest::new(0, 0)).await.unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_get_by_category_keeps_full_category_list() {
    let store = seeded_store();

    let poison = store.get_by_category("poison").await.unwrap();

    assert_eq!(poison.len(), 1);
    assert_eq!(poison[0].categories.len(), 2);
    assert!(poison[0].metrics.is_empty());
    assert!(store.get_by_category("dragon").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_then_get_is_none() {
    let store = seeded_store();

    assert!(store.delete(3).await.unwrap());
    assert!(store.get_by_id(3).await.unwrap().is_none());
    assert!(!store.delete(3).await.unwrap());
    assert!(!store.delete(999).await.unwrap());
}

#[tokio::test]
async fn test_update_name_only() {
    let store = seeded_store();
    let before = store.get_by_id(4).await.unwrap().unwrap();

    store
        .update(4, CreaturePatch::rename("hitokage"))
        .await
        .unwrap();
    let after = store.get_by_id(4).await.unwrap().unwrap();

    assert_eq!(after.name, "hitokage");
    assert_eq!(after.height, before.height);
    assert_eq!(after.weight, before.weight);
    assert_eq!(after.base_experience, before.base_experience);
    assert_eq!(after.is_default, before.is_default);
    assert_eq!(after.categories, before.categories);
    assert!(after.updated_at >= before.updated_at);
}

#[tokio::test]
async fn test_update_missing_id_is_noop() {
    let store = seeded_store();
    store
        .update(999, CreaturePatch::rename("ghost"))
        .await
        .unwrap();
    assert!(store.get_by_id(999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reference_listings() {
    let store = seeded_store();

    let categories: Vec<_> = store
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(categories.len(), 3);
    assert!(categories.contains(&"fire".to_string()));

    assert_eq!(store.list_traits().await.unwrap().len(), 2);
    assert_eq!(store.metrics_for(1).await.unwrap().len(), 2);
    assert!(store.metrics_for(4).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_create_is_constraint_violation() {
    let store = seeded_store();

    let err = store.create(creature(1, "again")).await.unwrap_err();

    assert!(matches!(err, StoreError::ConstraintViolation { .. }));
}

//! SQLite-backed creature store
//!
//! Schema:
//! - creatures: caller-supplied id, attributes, RFC 3339 timestamps
//! - categories / traits: generated id, unique name
//! - creature_categories / creature_traits: link tables, cascade on delete
//! - metrics: generated id, non-null foreign key to creatures
//!
//! Referential integrity lives in the schema (`PRAGMA foreign_keys = ON`),
//! not in this code. A single connection is shared behind a mutex.

use super::CreatureStore;
use crate::config::DatabaseConfig;
use crate::models::{
    Category, Creature, CreaturePatch, CreatureTrait, Metric, NewCreature, Page, PageRequest,
    SeedRecord,
};
use crate::query::{CreatureQuery, Relations, Statement};
use crate::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS creatures (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        height INTEGER NOT NULL,
        weight INTEGER NOT NULL,
        base_experience INTEGER NOT NULL,
        is_default INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS traits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS creature_categories (
        creature_id INTEGER NOT NULL REFERENCES creatures(id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        PRIMARY KEY (creature_id, category_id)
    );

    CREATE TABLE IF NOT EXISTS creature_traits (
        creature_id INTEGER NOT NULL REFERENCES creatures(id) ON DELETE CASCADE,
        trait_id INTEGER NOT NULL REFERENCES traits(id) ON DELETE CASCADE,
        PRIMARY KEY (creature_id, trait_id)
    );

    CREATE TABLE IF NOT EXISTS metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        base_value INTEGER NOT NULL,
        effort INTEGER NOT NULL DEFAULT 0,
        creature_id INTEGER NOT NULL REFERENCES creatures(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_creature_categories_category
        ON creature_categories(category_id);
    CREATE INDEX IF NOT EXISTS idx_creature_traits_trait ON creature_traits(trait_id);
    CREATE INDEX IF NOT EXISTS idx_metrics_creature ON metrics(creature_id);
"#;

/// Outcome of a bulk seed import
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub loaded: usize,
    pub failed: usize,
    /// `(creature id, error message)` for each failed record
    pub errors: Vec<(i64, String)>,
}

/// SQLite creature store (thread-safe)
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::unavailable(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        info!(path = %path.display(), "Opened creature store");
        Self::init(conn)
    }

    /// Private in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory creature store");
        Self::init(conn)
    }

    /// Open the database named by configuration (`:memory:` allowed)
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if config.is_in_memory() {
            Self::open_in_memory()
        } else {
            Self::open(&config.path)
        }
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn fetch_creatures(conn: &Connection, stmt: &Statement) -> Result<Vec<Creature>> {
        let mut prepared = conn.prepare(&stmt.sql)?;
        let rows = prepared.query_map(params_from_iter(stmt.params.iter()), creature_from_row)?;
        let creatures = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(creatures)
    }

    fn fetch_count(conn: &Connection, stmt: &Statement) -> Result<u64> {
        let count: i64 =
            conn.query_row(&stmt.sql, params_from_iter(stmt.params.iter()), |row| {
                row.get(0)
            })?;
        Ok(count.max(0) as u64)
    }

    fn load_creature(conn: &Connection, id: i64, relations: Relations) -> Result<Option<Creature>> {
        let stmt = CreatureQuery::new()
            .with_relations(relations)
            .by_id(id)
            .select();
        let mut prepared = conn.prepare(&stmt.sql)?;
        let creature = prepared
            .query_row(params_from_iter(stmt.params.iter()), creature_from_row)
            .optional()?;
        Ok(creature)
    }

    // ===================
    // Seeding
    // ===================

    /// Get or create a category by unique name, returning its id
    pub fn upsert_category(&self, name: &str) -> Result<i64> {
        let conn = self.conn.lock();
        upsert_named(&conn, "categories", name)
    }

    /// Get or create a trait by unique name, returning its id
    pub fn upsert_trait(&self, name: &str) -> Result<i64> {
        let conn = self.conn.lock();
        upsert_named(&conn, "traits", name)
    }

    /// Link a creature to a category; linking twice is a no-op
    pub fn attach_category(&self, creature_id: i64, category_id: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO creature_categories (creature_id, category_id) VALUES (?, ?)",
            params![creature_id, category_id],
        )?;
        Ok(())
    }

    /// Link a creature to a trait; linking twice is a no-op
    pub fn attach_trait(&self, creature_id: i64, trait_id: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO creature_traits (creature_id, trait_id) VALUES (?, ?)",
            params![creature_id, trait_id],
        )?;
        Ok(())
    }

    /// Add a metric to a creature, returning the generated metric id
    pub fn add_metric(
        &self,
        creature_id: i64,
        name: &str,
        base_value: i32,
        effort: i32,
    ) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO metrics (name, base_value, effort, creature_id) VALUES (?, ?, ?, ?)",
            params![name, base_value, effort, creature_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Merge one seed record in a single transaction.
    ///
    /// The creature row is upserted by id, categories and traits are
    /// created on first sight, and metrics replace same-named metrics of
    /// that creature. Blank relation names are skipped.
    pub fn import(&self, record: &SeedRecord) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let creature = &record.creature;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            r#"
            INSERT INTO creatures
                (id, name, height, weight, base_experience, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                height = excluded.height,
                weight = excluded.weight,
                base_experience = excluded.base_experience,
                is_default = excluded.is_default,
                updated_at = excluded.updated_at
            "#,
            params![
                creature.id,
                creature.name,
                creature.height,
                creature.weight,
                creature.base_experience,
                creature.is_default,
                now,
                now,
            ],
        )?;

        for name in &record.categories {
            if name.trim().is_empty() {
                warn!(creature_id = creature.id, "Skipping blank category name");
                continue;
            }
            let category_id = upsert_named(&tx, "categories", name)?;
            tx.execute(
                "INSERT OR IGNORE INTO creature_categories (creature_id, category_id) VALUES (?, ?)",
                params![creature.id, category_id],
            )?;
        }

        for name in &record.traits {
            if name.trim().is_empty() {
                warn!(creature_id = creature.id, "Skipping blank trait name");
                continue;
            }
            let trait_id = upsert_named(&tx, "traits", name)?;
            tx.execute(
                "INSERT OR IGNORE INTO creature_traits (creature_id, trait_id) VALUES (?, ?)",
                params![creature.id, trait_id],
            )?;
        }

        for metric in &record.metrics {
            if metric.name.trim().is_empty() {
                warn!(creature_id = creature.id, "Skipping metric without a name");
                continue;
            }
            tx.execute(
                "DELETE FROM metrics WHERE creature_id = ? AND name = ?",
                params![creature.id, metric.name],
            )?;
            tx.execute(
                "INSERT INTO metrics (name, base_value, effort, creature_id) VALUES (?, ?, ?, ?)",
                params![metric.name, metric.base_value, metric.effort, creature.id],
            )?;
        }

        tx.commit()?;
        debug!(creature_id = creature.id, "Seed record imported");
        Ok(())
    }

    /// Import many records; failures are logged and counted, not fatal
    pub fn import_all(&self, records: &[SeedRecord]) -> ImportReport {
        let mut report = ImportReport::default();

        for record in records {
            match self.import(record) {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    warn!(creature_id = record.creature.id, error = %e, "Failed to import seed record");
                    report.failed += 1;
                    report.errors.push((record.creature.id, e.to_string()));
                }
            }
        }

        info!(
            loaded = report.loaded,
            failed = report.failed,
            "Seed import complete"
        );
        report
    }
}

#[async_trait]
impl CreatureStore for SqliteStore {
    async fn get_by_id(&self, id: i64) -> Result<Option<Creature>> {
        let conn = self.conn.lock();
        Self::load_creature(&conn, id, Relations::ALL)
    }

    async fn get_by_category(&self, name: &str) -> Result<Vec<Creature>> {
        let stmt = CreatureQuery::new()
            .with_relations(Relations::TAGS)
            .in_category(name)
            .select();

        let conn = self.conn.lock();
        let creatures = Self::fetch_creatures(&conn, &stmt)?;
        debug!(category = name, count = creatures.len(), "Creatures by category");
        Ok(creatures)
    }

    async fn get_paginated(&self, request: &PageRequest) -> Result<Page<Creature>> {
        let mut query = CreatureQuery::new().with_relations(Relations::ALL);
        if let Some(category) = request.category_filter() {
            query = query.in_category(category);
        }
        let query = query.paginate(request.limit(), request.offset());

        let conn = self.conn.lock();
        let total = Self::fetch_count(&conn, &query.count())?;
        let items = Self::fetch_creatures(&conn, &query.select())?;

        debug!(
            limit = request.limit(),
            offset = request.offset(),
            category = ?request.category,
            returned = items.len(),
            total,
            "Paginated creatures"
        );
        Ok(Page { items, total })
    }

    async fn create(&self, fields: NewCreature) -> Result<Creature> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO creatures
                (id, name, height, weight, base_experience, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                fields.id,
                fields.name,
                fields.height,
                fields.weight,
                fields.base_experience,
                fields.is_default,
                now,
                now,
            ],
        )?;

        debug!(id = fields.id, "Creature created");
        Self::load_creature(&conn, fields.id, Relations::ALL)?.ok_or_else(|| {
            StoreError::query(format!("Creature {} vanished after insert", fields.id))
        })
    }

    async fn update(&self, id: i64, patch: CreaturePatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut assignments = Vec::new();
        let mut values = Vec::new();

        if let Some(name) = patch.name {
            assignments.push("name = ?");
            values.push(Value::Text(name));
        }
        if let Some(height) = patch.height {
            assignments.push("height = ?");
            values.push(Value::Integer(i64::from(height)));
        }
        if let Some(weight) = patch.weight {
            assignments.push("weight = ?");
            values.push(Value::Integer(i64::from(weight)));
        }
        if let Some(base_experience) = patch.base_experience {
            assignments.push("base_experience = ?");
            values.push(Value::Integer(i64::from(base_experience)));
        }
        if let Some(is_default) = patch.is_default {
            assignments.push("is_default = ?");
            values.push(Value::Integer(i64::from(is_default)));
        }
        assignments.push("updated_at = ?");
        values.push(Value::Text(Utc::now().to_rfc3339()));
        values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE creatures SET {} WHERE id = ?",
            assignments.join(", ")
        );

        let conn = self.conn.lock();
        let affected = conn.execute(&sql, params_from_iter(values.iter()))?;
        debug!(id, affected, "Creature updated");
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM creatures WHERE id = ?", params![id])?;
        debug!(id, affected, "Creature deleted");
        Ok(affected > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn list_traits(&self) -> Result<Vec<CreatureTrait>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM traits ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(CreatureTrait {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn metrics_for(&self, creature_id: i64) -> Result<Vec<Metric>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, base_value, effort, creature_id FROM metrics \
             WHERE creature_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![creature_id], |row| {
            Ok(Metric {
                id: row.get(0)?,
                name: row.get(1)?,
                base_value: row.get(2)?,
                effort: row.get(3)?,
                creature_id: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Insert-if-absent on a `(id, name UNIQUE)` table and return the id
fn upsert_named(conn: &Connection, table: &str, name: &str) -> Result<i64> {
    conn.execute(
        &format!("INSERT INTO {} (name) VALUES (?) ON CONFLICT(name) DO NOTHING", table),
        params![name],
    )?;
    let id = conn.query_row(
        &format!("SELECT id FROM {} WHERE name = ?", table),
        params![name],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn creature_from_row(row: &Row<'_>) -> rusqlite::Result<Creature> {
    Ok(Creature {
        id: row.get(0)?,
        name: row.get(1)?,
        height: row.get(2)?,
        weight: row.get(3)?,
        base_experience: row.get(4)?,
        is_default: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
        categories: json_column(row, 8)?,
        traits: json_column(row, 9)?,
        metrics: json_column(row, 10)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a relation column; NULL means the relation was not requested
fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<T>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(Vec::new()),
    }
}

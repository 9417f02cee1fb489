//! bestiary-core - Core library for bestiary
//!
//! Provides models, the SQLite-backed store, the query composer, the result
//! cache and the service facade for creature reference data.

pub mod cache;
pub mod config;
pub mod error;
pub mod etl;
pub mod models;
pub mod query;
pub mod service;
pub mod store;

pub use cache::{CacheStats, ResultCache};
pub use config::BestiaryConfig;
pub use error::{Result, StoreError};
pub use etl::{EtlClient, EtlOutcome, EtlRange};
pub use service::CreatureService;
pub use store::{CreatureStore, ImportReport, SqliteStore};

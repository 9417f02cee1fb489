//! Data models for bestiary

pub mod creature;
pub mod page;
pub mod seed;

pub use creature::{Category, Creature, CreaturePatch, CreatureTrait, Metric, NewCreature};
pub use page::{Page, PageRequest, DEFAULT_LIMIT};
pub use seed::{parse_seed_file, SeedMetric, SeedRecord};

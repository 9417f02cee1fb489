//! Query composer for creature reads
//!
//! Builds parameterized SQL for the creature store. Each requested relation
//! is loaded through a correlated `json_group_array` subquery, which keeps
//! left-join semantics (a creature with no related rows still comes back)
//! and fetches a whole page with its relations in one statement.
//!
//! Column layout of every select produced here:
//! `0..=7` creature columns, `8` categories JSON, `9` traits JSON,
//! `10` metrics JSON (NULL when the relation was not requested).

use rusqlite::types::Value;

/// Relations to eager-load alongside the creature row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relations {
    pub categories: bool,
    pub traits: bool,
    pub metrics: bool,
}

impl Relations {
    pub const ALL: Relations = Relations {
        categories: true,
        traits: true,
        metrics: true,
    };

    /// Categories and traits only
    pub const TAGS: Relations = Relations {
        categories: true,
        traits: true,
        metrics: false,
    };
}

/// A composed SQL statement and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

const CREATURE_COLUMNS: &str = "c.id, c.name, c.height, c.weight, c.base_experience, \
     c.is_default, c.created_at, c.updated_at";

const CATEGORIES_JSON: &str = "(SELECT json_group_array(json_object('id', r.id, 'name', r.name)) \
     FROM (SELECT cat.id AS id, cat.name AS name FROM creature_categories cc \
     JOIN categories cat ON cat.id = cc.category_id \
     WHERE cc.creature_id = c.id ORDER BY cat.id) AS r)";

const TRAITS_JSON: &str = "(SELECT json_group_array(json_object('id', r.id, 'name', r.name)) \
     FROM (SELECT t.id AS id, t.name AS name FROM creature_traits ct \
     JOIN traits t ON t.id = ct.trait_id \
     WHERE ct.creature_id = c.id ORDER BY t.id) AS r)";

const METRICS_JSON: &str = "(SELECT json_group_array(json_object(\
     'id', r.id, 'name', r.name, 'base_value', r.base_value, \
     'effort', r.effort, 'creature_id', r.creature_id)) \
     FROM (SELECT m.id AS id, m.name AS name, m.base_value AS base_value, \
     m.effort AS effort, m.creature_id AS creature_id FROM metrics m \
     WHERE m.creature_id = c.id ORDER BY m.id) AS r)";

const CATEGORY_FILTER: &str = "EXISTS (SELECT 1 FROM creature_categories fc \
     JOIN categories fcat ON fcat.id = fc.category_id \
     WHERE fc.creature_id = c.id AND fcat.name = ?)";

/// Builder for creature selects and their matching counts
#[derive(Debug, Clone, Default)]
pub struct CreatureQuery {
    relations: Relations,
    id: Option<i64>,
    category: Option<String>,
    page: Option<(u32, u32)>,
}

impl CreatureQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relations(mut self, relations: Relations) -> Self {
        self.relations = relations;
        self
    }

    pub fn by_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Restrict to creatures linked to a category with exactly this name
    pub fn in_category(mut self, name: impl Into<String>) -> Self {
        self.category = Some(name.into());
        self
    }

    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.page = Some((limit, offset));
        self
    }

    /// Build the row select, ordered by id ascending
    pub fn select(&self) -> Statement {
        let relation = |loaded: bool, subquery: &str, alias: &str| {
            if loaded {
                format!("{} AS {}", subquery, alias)
            } else {
                format!("NULL AS {}", alias)
            }
        };

        let mut sql = format!(
            "SELECT {}, {}, {}, {} FROM creatures c",
            CREATURE_COLUMNS,
            relation(self.relations.categories, CATEGORIES_JSON, "categories_json"),
            relation(self.relations.traits, TRAITS_JSON, "traits_json"),
            relation(self.relations.metrics, METRICS_JSON, "metrics_json"),
        );
        let mut params = Vec::new();

        self.push_filters(&mut sql, &mut params);
        sql.push_str(" ORDER BY c.id ASC");

        if let Some((limit, offset)) = self.page {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(i64::from(limit)));
            params.push(Value::Integer(i64::from(offset)));
        }

        Statement { sql, params }
    }

    /// Build the count of rows matching the filters, ignoring pagination
    pub fn count(&self) -> Statement {
        let mut sql = String::from("SELECT COUNT(*) FROM creatures c");
        let mut params = Vec::new();
        self.push_filters(&mut sql, &mut params);
        Statement { sql, params }
    }

    fn push_filters(&self, sql: &mut String, params: &mut Vec<Value>) {
        let mut clauses: Vec<&str> = Vec::new();

        if let Some(id) = self.id {
            clauses.push("c.id = ?");
            params.push(Value::Integer(id));
        }
        if let Some(ref name) = self.category {
            clauses.push(CATEGORY_FILTER);
            params.push(Value::Text(name.clone()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
    }
}

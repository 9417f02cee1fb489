//! Output formatting for CLI commands
//!
//! Every formatter renders either a comfy-table (human) or pretty JSON.

use bestiary_core::models::{Category, Creature, CreatureTrait, Metric, Page};
use bestiary_core::{CacheStats, EtlOutcome, ImportReport};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde::Serialize;

/// Rendering options shared by all formatters
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputStyle {
    pub json: bool,
    pub no_color: bool,
}

// ============================================================================
// Formatters
// ============================================================================

/// Format a page of creatures with a position footer
pub fn format_creature_page(page: &Page<Creature>, offset: u32, style: OutputStyle) -> String {
    if style.json {
        return to_json(page);
    }

    if page.is_empty() {
        return format!("No creatures found ({} total).", page.total);
    }

    let first = u64::from(offset) + 1;
    let last = u64::from(offset) + page.len() as u64;
    format!(
        "{}\nShowing {}-{} of {}",
        creature_table(&page.items, style.no_color),
        first,
        last,
        page.total
    )
}

/// Format a plain list of creatures
pub fn format_creature_list(creatures: &[Creature], style: OutputStyle) -> String {
    if style.json {
        return to_json(creatures);
    }

    if creatures.is_empty() {
        return "No creatures found.".to_string();
    }

    creature_table(creatures, style.no_color)
}

/// Format one creature with all loaded relations
pub fn format_creature_info(creature: &Creature, style: OutputStyle) -> String {
    if style.json {
        return to_json(creature);
    }

    let mut lines = vec![];
    lines.push(format!("ID:               {}", creature.id));
    lines.push(format!("Name:             {}", creature.name));
    lines.push(format!("Height:           {}", creature.height));
    lines.push(format!("Weight:           {}", creature.weight));
    lines.push(format!("Base experience:  {}", creature.base_experience));
    lines.push(format!("Default form:     {}", creature.is_default));
    lines.push(format!(
        "Categories:       {}",
        join_or_dash(creature.categories.iter().map(|c| c.name.as_str()))
    ));
    lines.push(format!(
        "Traits:           {}",
        join_or_dash(creature.traits.iter().map(|t| t.name.as_str()))
    ));
    lines.push(format!("Created:          {}", creature.created_at.to_rfc3339()));
    lines.push(format!("Updated:          {}", creature.updated_at.to_rfc3339()));

    if !creature.metrics.is_empty() {
        lines.push(String::new());
        lines.push(metric_table(&creature.metrics, style.no_color));
    }

    lines.join("\n")
}

pub fn format_categories(categories: &[Category], style: OutputStyle) -> String {
    if style.json {
        return to_json(categories);
    }
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    named_table(
        categories.iter().map(|c| (c.id, c.name.as_str())),
        "Category",
        style.no_color,
    )
}

pub fn format_traits(traits: &[CreatureTrait], style: OutputStyle) -> String {
    if style.json {
        return to_json(traits);
    }
    if traits.is_empty() {
        return "No traits found.".to_string();
    }

    named_table(
        traits.iter().map(|t| (t.id, t.name.as_str())),
        "Trait",
        style.no_color,
    )
}

pub fn format_metrics(metrics: &[Metric], style: OutputStyle) -> String {
    if style.json {
        return to_json(metrics);
    }
    if metrics.is_empty() {
        return "No metrics found.".to_string();
    }

    metric_table(metrics, style.no_color)
}

pub fn format_import_report(report: &ImportReport) -> String {
    let mut lines = vec![format!(
        "Imported {} record(s), {} failed",
        report.loaded, report.failed
    )];
    for (id, error) in &report.errors {
        lines.push(format!("  - creature {}: {}", id, error));
    }
    lines.join("\n")
}

pub fn format_etl_outcome(outcome: &EtlOutcome, style: OutputStyle) -> String {
    if style.json {
        return to_json(outcome);
    }

    let mut line = outcome.message.clone();
    if let Some(error) = &outcome.error {
        line.push_str(&format!(": {}", error));
    }
    line
}

/// One line of cache counters, printed at debug verbosity
pub fn format_cache_stats(stats: &CacheStats) -> String {
    let ops = stats
        .operations
        .iter()
        .map(|(name, s)| format!("{}={}/{}", name, s.hits, s.hits + s.misses))
        .collect::<Vec<_>>()
        .join(" ");
    format!("cache: {} entries, hits {}", stats.entries, ops)
}

// ============================================================================
// Tables
// ============================================================================

fn header(table: &mut Table, columns: &[&str], no_color: bool) {
    if no_color {
        table.set_header(columns.to_vec());
    } else {
        table.set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
}

fn creature_table(creatures: &[Creature], no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(
        &mut table,
        &["ID", "Name", "Height", "Weight", "Base XP", "Categories", "Traits"],
        no_color,
    );

    for creature in creatures {
        let categories = join_or_dash(creature.categories.iter().map(|c| c.name.as_str()));
        let traits = join_or_dash(creature.traits.iter().map(|t| t.name.as_str()));
        table.add_row(Row::from(vec![
            creature.id.to_string(),
            truncate(&creature.name, 24),
            creature.height.to_string(),
            creature.weight.to_string(),
            creature.base_experience.to_string(),
            truncate(&categories, 30),
            truncate(&traits, 30),
        ]));
    }

    table.to_string()
}

fn metric_table(metrics: &[Metric], no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(&mut table, &["Metric", "Base", "Effort"], no_color);

    for metric in metrics {
        table.add_row(Row::from(vec![
            metric.name.clone(),
            metric.base_value.to_string(),
            metric.effort.to_string(),
        ]));
    }

    table.to_string()
}

fn named_table<'a>(
    rows: impl Iterator<Item = (i64, &'a str)>,
    label: &str,
    no_color: bool,
) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(&mut table, &["ID", label], no_color);

    for (id, name) in rows {
        table.add_row(Row::from(vec![id.to_string(), name.to_string()]));
    }

    table.to_string()
}

// ============================================================================
// Utilities
// ============================================================================

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

fn join_or_dash<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn charmander() -> Creature {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        Creature {
            id: 4,
            name: "charmander".to_string(),
            height: 6,
            weight: 85,
            base_experience: 62,
            is_default: true,
            created_at: ts,
            updated_at: ts,
            categories: vec![Category {
                id: 1,
                name: "fire".to_string(),
            }],
            traits: vec![
                CreatureTrait {
                    id: 1,
                    name: "blaze".to_string(),
                },
                CreatureTrait {
                    id: 2,
                    name: "solar-power".to_string(),
                },
            ],
            metrics: vec![Metric {
                id: 1,
                name: "hp".to_string(),
                base_value: 39,
                effort: 0,
                creature_id: 4,
            }],
        }
    }

    const PLAIN: OutputStyle = OutputStyle {
        json: false,
        no_color: true,
    };

    const JSON: OutputStyle = OutputStyle {
        json: true,
        no_color: true,
    };

    #[test]
    fn test_page_table_has_footer() {
        let page = Page {
            items: vec![charmander()],
            total: 5,
        };

        let output = format_creature_page(&page, 3, PLAIN);

        assert!(output.contains("charmander"));
        assert!(output.contains("blaze, solar-power"));
        assert!(output.ends_with("Showing 4-4 of 5"));
    }

    #[test]
    fn test_empty_page_reports_total() {
        let page: Page<Creature> = Page {
            items: vec![],
            total: 5,
        };
        assert_eq!(
            format_creature_page(&page, 10, PLAIN),
            "No creatures found (5 total)."
        );
    }

    #[test]
    fn test_page_json_round_trips() {
        let page = Page {
            items: vec![charmander()],
            total: 1,
        };

        let output = format_creature_page(&page, 0, JSON);
        let parsed: Page<Creature> = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed, page);
    }

    #[test]
    fn test_creature_info_lists_relations() {
        let output = format_creature_info(&charmander(), PLAIN);

        assert!(output.contains("Name:             charmander"));
        assert!(output.contains("Categories:       fire"));
        assert!(output.contains("hp"));
    }

    #[test]
    fn test_creature_info_without_relations_uses_dash() {
        let mut creature = charmander();
        creature.categories.clear();
        creature.traits.clear();
        creature.metrics.clear();

        let output = format_creature_info(&creature, PLAIN);

        assert!(output.contains("Categories:       -"));
        assert!(output.contains("Traits:           -"));
        assert!(!output.contains("Metric"));
    }

    #[test]
    fn test_import_report_lists_failures() {
        let report = ImportReport {
            loaded: 2,
            failed: 1,
            errors: vec![(3, "Constraint violation: NOT NULL".to_string())],
        };

        let output = format_import_report(&report);

        assert!(output.starts_with("Imported 2 record(s), 1 failed"));
        assert!(output.contains("creature 3"));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("pikachu", 10), "pikachu");
        assert_eq!(truncate("ニドラン♀ニドラン♂", 5), "ニドラン…");
    }
}

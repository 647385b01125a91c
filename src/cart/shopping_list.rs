//! Shopping-list aggregation: merges the ingredient lines of every recipe
//! in a user's cart into per-ingredient totals and renders the plain-text
//! report served as `products.txt`.
//!
//! The transform is pure: identical input rows and timestamp produce a
//! byte-identical report. Grouping is keyed on (name, measurement unit),
//! so the same ingredient listed in different units stays separate.

use std::collections::BTreeMap;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// One raw ingredient line from a cart recipe, before aggregation.
#[derive(Debug, Clone)]
pub struct IngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Aggregated total for one (name, unit) group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientTotal {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Groups rows by (name, unit) and sums amounts. Output is sorted by
/// ingredient name, unit as tie-break (byte order).
pub fn aggregate(rows: impl IntoIterator<Item = IngredientRow>) -> Vec<IngredientTotal> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| IngredientTotal {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Renders the downloadable report. Recipe names are de-duplicated and
/// sorted here as well, so the output never depends on fetch order.
pub fn render(
    totals: &[IngredientTotal],
    recipe_names: &[String],
    at: OffsetDateTime,
) -> String {
    let timestamp = at
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());

    let mut names: Vec<&str> = recipe_names.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.dedup();

    let mut lines = Vec::with_capacity(totals.len() + names.len() + 4);
    lines.push(timestamp);
    lines.push("Shopping list:".to_string());
    for (index, item) in totals.iter().enumerate() {
        lines.push(format!(
            "{}. {} - {} ({}).",
            index + 1,
            item.name,
            item.total,
            item.measurement_unit
        ));
    }
    lines.push(String::new());
    lines.push("Recipes:".to_string());
    for name in names {
        lines.push(name.to_string());
    }
    lines.join("\n")
}

/// The full cart-to-report pipeline.
pub fn build_report(
    rows: impl IntoIterator<Item = IngredientRow>,
    recipe_names: &[String],
    at: OffsetDateTime,
) -> String {
    render(&aggregate(rows), recipe_names, at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn row(name: &str, unit: &str, amount: i32) -> IngredientRow {
        IngredientRow {
            name: name.into(),
            measurement_unit: unit.into(),
            amount,
        }
    }

    #[test]
    fn merges_same_ingredient_across_recipes() {
        // Recipe A: Flour 200g, Sugar 100g; Recipe B: Flour 300g, Egg 2pcs
        let rows = vec![
            row("Flour", "g", 200),
            row("Sugar", "g", 100),
            row("Flour", "g", 300),
            row("Egg", "pcs", 2),
        ];
        let totals = aggregate(rows);
        assert_eq!(
            totals,
            vec![
                IngredientTotal {
                    name: "Egg".into(),
                    measurement_unit: "pcs".into(),
                    total: 2
                },
                IngredientTotal {
                    name: "Flour".into(),
                    measurement_unit: "g".into(),
                    total: 500
                },
                IngredientTotal {
                    name: "Sugar".into(),
                    measurement_unit: "g".into(),
                    total: 100
                },
            ]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let rows = vec![row("Milk", "ml", 200), row("Milk", "g", 50)];
        let totals = aggregate(rows);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].measurement_unit, "g");
        assert_eq!(totals[1].measurement_unit, "ml");
    }

    #[test]
    fn no_duplicate_keys_and_sums_are_exact() {
        let rows = vec![
            row("Salt", "g", 1),
            row("Salt", "g", 2),
            row("Salt", "g", 3),
        ];
        let totals = aggregate(rows);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total, 6);
    }

    #[test]
    fn report_layout_matches_expected() {
        let rows = vec![
            row("Flour", "g", 200),
            row("Sugar", "g", 100),
            row("Flour", "g", 300),
            row("Egg", "pcs", 2),
        ];
        let names = vec!["Recipe B".to_string(), "Recipe A".to_string()];
        let report = build_report(rows, &names, datetime!(2024-03-01 12:00:00 UTC));
        assert_eq!(
            report,
            "2024-03-01 12:00:00\n\
             Shopping list:\n\
             1. Egg - 2 (pcs).\n\
             2. Flour - 500 (g).\n\
             3. Sugar - 100 (g).\n\
             \n\
             Recipes:\n\
             Recipe A\n\
             Recipe B"
        );
    }

    #[test]
    fn recipe_names_are_deduplicated_and_sorted() {
        let names = vec![
            "Borscht".to_string(),
            "Apple pie".to_string(),
            "Borscht".to_string(),
        ];
        let report = render(&[], &names, datetime!(2024-03-01 12:00:00 UTC));
        let tail: Vec<&str> = report.lines().skip_while(|l| *l != "Recipes:").collect();
        assert_eq!(tail, vec!["Recipes:", "Apple pie", "Borscht"]);
    }

    #[test]
    fn empty_cart_still_produces_header_and_sections() {
        let report = render(&[], &[], datetime!(2024-03-01 12:00:00 UTC));
        assert_eq!(report, "2024-03-01 12:00:00\nShopping list:\n\nRecipes:");
    }

    #[test]
    fn report_is_deterministic() {
        let make = || {
            build_report(
                vec![row("Flour", "g", 200), row("Egg", "pcs", 3)],
                &["Pancakes".to_string()],
                datetime!(2024-03-01 12:00:00 UTC),
            )
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn totals_do_not_overflow_i32() {
        let rows = vec![row("Water", "ml", i32::MAX), row("Water", "ml", i32::MAX)];
        let totals = aggregate(rows);
        assert_eq!(totals[0].total, 2 * i64::from(i32::MAX));
    }
}

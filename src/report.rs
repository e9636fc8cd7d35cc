//! Plain-text rendering of lookup results for the CLI

use std::fmt::Write;

use crate::domain::{NormalizedProduct, NutrientKey};
use crate::pipeline::processing::scoring::{Driver, ScoreResult};
use crate::storage::HistoryEntry;

pub fn render(product: &NormalizedProduct, result: &ScoreResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "--- Normalized Product ---");
    let _ = writeln!(out, "Name: {}", product.name);

    let ingredients: Vec<&str> = product.sorted_ingredients().iter().map(|t| t.as_str()).collect();
    if ingredients.is_empty() {
        let _ = writeln!(out, "Ingredients: (none recognized)");
    } else {
        let _ = writeln!(out, "Ingredients: {}", ingredients.join(", "));
    }

    let _ = writeln!(out, "Nutrients (per 100g):");
    for key in NutrientKey::ALL {
        match product.nutrient(key) {
            Some(value) => {
                let _ = writeln!(out, "  {:<15} {}", key.as_str(), value);
            }
            None => {
                let _ = writeln!(out, "  {:<15} unknown", key.as_str());
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "--- Health Score ---");
    let _ = writeln!(out, "Score: {} | Band: {}", result.score, result.band);

    if result.drivers.is_empty() {
        let _ = writeln!(out, "Drivers: none triggered");
    } else {
        let _ = writeln!(out, "Drivers:");
        for driver in &result.drivers {
            let _ = writeln!(out, "  {}", render_driver(driver));
        }
    }

    out
}

pub fn render_driver(driver: &Driver) -> String {
    let mut line = format!("{:+} {}", driver.impact, driver.rule);
    match (&driver.value, &driver.threshold) {
        (Some(value), Some(threshold)) => {
            let _ = write!(line, " ({} vs {})", value, threshold);
        }
        (Some(value), None) => {
            let _ = write!(line, " ({})", value);
        }
        (None, Some(threshold)) => {
            let _ = write!(line, " ({})", threshold);
        }
        (None, None) => {}
    }
    line
}

/// Warning shown when acquisition failed and the product was scored as absent
pub fn render_failure(error: &str) -> String {
    format!("⚠️  Lookup failed: {}", error)
}

/// One line per entry, numbered from 1
pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history yet.\n".to_string();
    }

    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {} '{}' -> {} ({}) {}",
            i + 1,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.input_kind,
            entry.query,
            entry.score,
            entry.band,
            entry.normalized.name,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngredientTag;
    use crate::pipeline::processing::scoring::score;

    #[test]
    fn test_render_lists_unknown_nutrients_and_drivers() {
        let mut product = NormalizedProduct::unknown();
        product.nutrients.insert(NutrientKey::EnergyKcal, 500.0);
        product.ingredients.insert(IngredientTag::PalmOil);
        let result = score(&product);

        let text = render(&product, &result);
        assert!(text.contains("Name: Unknown"));
        assert!(text.contains("Ingredients: palm oil"));
        assert!(text.contains("energy_kcal     500"));
        assert!(text.contains("salt_g          unknown"));
        assert!(text.contains("Score: 85 | Band: Green"));
        assert!(text.contains("-10 High Energy (500 vs >400 kcal/100g)"));
        assert!(text.contains("-5 Contains Palm Oil"));
    }

    #[test]
    fn test_render_driver_with_bonus() {
        let driver = Driver {
            rule: "Low Fat".to_string(),
            value: Some(1.5),
            threshold: Some("<3g/100g".to_string()),
            impact: 2,
        };
        assert_eq!(render_driver(&driver), "+2 Low Fat (1.5 vs <3g/100g)");
    }

    #[test]
    fn test_render_failure() {
        let line = render_failure("HTTP request failed: timed out");
        assert_eq!(line, "⚠️  Lookup failed: HTTP request failed: timed out");
        assert!(!line.ends_with('\n'));
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&[]), "No history yet.\n");
    }
}

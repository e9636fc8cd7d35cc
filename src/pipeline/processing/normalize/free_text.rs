use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{NutrientKey, Nutrients};

/// One independently anchored search over label text. The first capture
/// group holds the number.
pub struct FieldPattern {
    pub key: NutrientKey,
    pub pattern: &'static str,
}

/// Patterns are applied to lowercased text.
pub const FIELD_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        key: NutrientKey::EnergyKcal,
        pattern: r"(\d+)\s*(?:kcal|cal)",
    },
    FieldPattern {
        key: NutrientKey::FatG,
        pattern: r"(\d+\.?\d*)\s*g\s*fat",
    },
    FieldPattern {
        key: NutrientKey::SugarsG,
        pattern: r"(\d+\.?\d*)\s*g\s*sugars?",
    },
];

static COMPILED_PATTERNS: Lazy<Vec<(NutrientKey, Regex)>> = Lazy::new(|| {
    FIELD_PATTERNS
        .iter()
        .map(|field| {
            let regex = Regex::new(field.pattern).expect("built-in nutrient pattern is valid");
            (field.key, regex)
        })
        .collect()
});

/// Run a single pattern against already-lowercased text.
///
/// Only the first match counts. A capture that does not parse leaves the
/// field unknown.
fn extract_first(regex: &Regex, lowered: &str) -> Option<f64> {
    regex
        .captures(lowered)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Extract a single nutrient from label text
pub fn extract_nutrient(text: &str, key: NutrientKey) -> Option<f64> {
    let lowered = text.to_lowercase();
    COMPILED_PATTERNS
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, regex)| extract_first(regex, &lowered))
}

/// Extract every nutrient that has a pattern. Fields with no match are absent.
pub fn extract_nutrients(text: &str) -> Nutrients {
    let lowered = text.to_lowercase();
    COMPILED_PATTERNS
        .iter()
        .filter_map(|(key, regex)| extract_first(regex, &lowered).map(|v| (*key, v)))
        .collect()
}

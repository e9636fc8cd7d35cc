use std::collections::BTreeMap;

use crate::domain::{NutrientKey, Nutrients};

/// Source nutriment key to canonical key. Source values are already per 100g.
pub const NUTRIENT_KEY_RENAMES: &[(&str, NutrientKey)] = &[
    ("energy-kcal_100g", NutrientKey::EnergyKcal),
    ("fat_100g", NutrientKey::FatG),
    ("saturated-fat_100g", NutrientKey::SaturatesG),
    ("carbohydrates_100g", NutrientKey::CarbohydrateG),
    ("sugars_100g", NutrientKey::SugarsG),
    ("fiber_100g", NutrientKey::FiberG),
    ("salt_100g", NutrientKey::SaltG),
];

/// Copy known source nutriments onto canonical keys, value for value.
///
/// Missing source keys stay missing. Negative or non-finite values are not
/// valid per-100g quantities and are dropped.
pub fn rename_nutrients(source: &BTreeMap<String, f64>) -> Nutrients {
    NUTRIENT_KEY_RENAMES
        .iter()
        .filter_map(|(source_key, key)| {
            source
                .get(*source_key)
                .copied()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| (*key, v))
        })
        .collect()
}

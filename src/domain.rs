use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Name used whenever a product name cannot be derived from the input
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown";

/// Canonical ingredient identifiers. Raw declaration text never appears in a
/// normalized product, only these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IngredientTag {
    #[serde(rename = "sugar")]
    Sugar,
    #[serde(rename = "salt")]
    Salt,
    #[serde(rename = "palm oil")]
    PalmOil,
    #[serde(rename = "cocoa")]
    Cocoa,
}

impl IngredientTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientTag::Sugar => "sugar",
            IngredientTag::Salt => "salt",
            IngredientTag::PalmOil => "palm oil",
            IngredientTag::Cocoa => "cocoa",
        }
    }
}

impl fmt::Display for IngredientTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical per-100g nutrient keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientKey {
    EnergyKcal,
    FatG,
    SaturatesG,
    CarbohydrateG,
    SugarsG,
    FiberG,
    SaltG,
}

impl NutrientKey {
    /// All keys in canonical order
    pub const ALL: [NutrientKey; 7] = [
        NutrientKey::EnergyKcal,
        NutrientKey::FatG,
        NutrientKey::SaturatesG,
        NutrientKey::CarbohydrateG,
        NutrientKey::SugarsG,
        NutrientKey::FiberG,
        NutrientKey::SaltG,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientKey::EnergyKcal => "energy_kcal",
            NutrientKey::FatG => "fat_g",
            NutrientKey::SaturatesG => "saturates_g",
            NutrientKey::CarbohydrateG => "carbohydrate_g",
            NutrientKey::SugarsG => "sugars_g",
            NutrientKey::FiberG => "fiber_g",
            NutrientKey::SaltG => "salt_g",
        }
    }
}

impl fmt::Display for NutrientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-100g nutrient values. A key that is not present is unknown, which is
/// different from a recorded zero.
pub type Nutrients = BTreeMap<NutrientKey, f64>;

/// The canonical product shape produced by normalization and consumed by scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub name: String,
    pub ingredients: HashSet<IngredientTag>,
    pub nutrients: Nutrients,
}

impl NormalizedProduct {
    /// A product with no derivable data
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_PRODUCT_NAME.to_string(),
            ingredients: HashSet::new(),
            nutrients: Nutrients::new(),
        }
    }

    pub fn nutrient(&self, key: NutrientKey) -> Option<f64> {
        self.nutrients.get(&key).copied()
    }

    pub fn has_ingredient(&self, tag: IngredientTag) -> bool {
        self.ingredients.contains(&tag)
    }

    /// Ingredient tags in a stable order, for display
    pub fn sorted_ingredients(&self) -> Vec<IngredientTag> {
        let mut tags: Vec<IngredientTag> = self.ingredients.iter().copied().collect();
        tags.sort();
        tags
    }
}

impl Default for NormalizedProduct {
    fn default() -> Self {
        Self::unknown()
    }
}

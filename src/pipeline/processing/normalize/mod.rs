//! Normalization of raw product data into the canonical `NormalizedProduct`.
//!
//! Structured database records and unstructured label text arrive in very
//! different shapes; both end up with the same name/ingredients/nutrients
//! layout here. Normalization never fails: anything unusable degrades to
//! the unknown name, an empty tag set, or absent nutrients.

pub mod free_text;
pub mod ingredients;
pub mod nutrients;

use tracing::debug;

use crate::domain::{NormalizedProduct, UNKNOWN_PRODUCT_NAME};
use crate::types::{RawProductRecord, StructuredRecord};

pub use free_text::{extract_nutrient, extract_nutrients};
pub use ingredients::match_ingredient_tags;
pub use nutrients::rename_nutrients;

/// Convert any raw record into its canonical form
pub fn normalize(raw: &RawProductRecord) -> NormalizedProduct {
    let product = match raw {
        RawProductRecord::Structured(record) => normalize_structured(record),
        RawProductRecord::FreeText(text) => normalize_free_text(text),
        RawProductRecord::Absent => NormalizedProduct::unknown(),
    };

    debug!(
        name = %product.name,
        ingredients = product.ingredients.len(),
        nutrients = product.nutrients.len(),
        "Normalized product"
    );
    product
}

/// Normalize a structured database record
pub fn normalize_structured(record: &StructuredRecord) -> NormalizedProduct {
    let name = record
        .product_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(UNKNOWN_PRODUCT_NAME)
        .to_string();

    NormalizedProduct {
        name,
        ingredients: match_ingredient_tags(&record.ingredients_text),
        nutrients: rename_nutrients(&record.nutriments),
    }
}

/// Normalize label text. Free text carries no product name.
pub fn normalize_free_text(text: &str) -> NormalizedProduct {
    NormalizedProduct {
        name: UNKNOWN_PRODUCT_NAME.to_string(),
        ingredients: match_ingredient_tags(text),
        nutrients: extract_nutrients(text),
    }
}

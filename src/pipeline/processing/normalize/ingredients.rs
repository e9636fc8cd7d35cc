use std::collections::HashSet;

use crate::domain::IngredientTag;

/// A canonical tag and the substrings that indicate it
pub struct IngredientSynonyms {
    pub tag: IngredientTag,
    pub synonyms: &'static [&'static str],
}

/// Curated synonym table. Matching is a case-insensitive substring test.
pub const INGREDIENT_VOCABULARY: &[IngredientSynonyms] = &[
    IngredientSynonyms {
        tag: IngredientTag::Sugar,
        synonyms: &["sugar", "sucrose", "glucose syrup", "fructose"],
    },
    IngredientSynonyms {
        tag: IngredientTag::Salt,
        synonyms: &["salt", "sodium chloride", "NaCl"],
    },
    IngredientSynonyms {
        tag: IngredientTag::PalmOil,
        synonyms: &["palm oil", "palmolein"],
    },
    IngredientSynonyms {
        tag: IngredientTag::Cocoa,
        synonyms: &["cocoa", "cocoa solids", "cocoa butter"],
    },
];

/// Map free ingredient text onto canonical tags.
///
/// Substring semantics are kept as-is: a synonym inside an unrelated word
/// still matches ("unsalted" yields `salt`).
pub fn match_ingredient_tags(text: &str) -> HashSet<IngredientTag> {
    let lowered = text.to_lowercase();

    INGREDIENT_VOCABULARY
        .iter()
        .filter(|entry| {
            entry
                .synonyms
                .iter()
                .any(|synonym| lowered.contains(&synonym.to_lowercase()))
        })
        .map(|entry| entry.tag)
        .collect()
}

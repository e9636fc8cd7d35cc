use crate::domain::{IngredientTag, NormalizedProduct, NutrientKey};

/// What a rule looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleCondition {
    /// Nutrient present and strictly greater than the limit
    Above(NutrientKey, f64),
    /// Nutrient present and strictly less than the limit
    Below(NutrientKey, f64),
    /// Ingredient tag present
    Contains(IngredientTag),
    /// Ingredient tag present while the nutrient is unknown
    ContainsWithoutData(IngredientTag, NutrientKey),
}

/// Outcome of testing one rule against a product
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleMatch {
    NotTriggered,
    /// Triggered, with the observed nutrient value for nutrient rules
    Triggered(Option<f64>),
}

impl RuleCondition {
    pub fn evaluate(&self, product: &NormalizedProduct) -> RuleMatch {
        match *self {
            RuleCondition::Above(key, limit) => match product.nutrient(key) {
                Some(value) if value > limit => RuleMatch::Triggered(Some(value)),
                _ => RuleMatch::NotTriggered,
            },
            RuleCondition::Below(key, limit) => match product.nutrient(key) {
                Some(value) if value < limit => RuleMatch::Triggered(Some(value)),
                _ => RuleMatch::NotTriggered,
            },
            RuleCondition::Contains(tag) => {
                if product.has_ingredient(tag) {
                    RuleMatch::Triggered(None)
                } else {
                    RuleMatch::NotTriggered
                }
            }
            RuleCondition::ContainsWithoutData(tag, key) => {
                if product.has_ingredient(tag) && product.nutrient(key).is_none() {
                    RuleMatch::Triggered(None)
                } else {
                    RuleMatch::NotTriggered
                }
            }
        }
    }
}

/// A single additive scoring rule
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRule {
    pub name: &'static str,
    pub condition: RuleCondition,
    pub threshold: Option<&'static str>,
    pub impact: i32,
    /// Skipped when the named rule already fired for this product
    pub unless_fired: Option<&'static str>,
}

pub const HIGH_ENERGY: &str = "High Energy";
pub const VERY_LOW_ENERGY: &str = "Very Low Energy";
pub const HIGH_FAT: &str = "High Fat";
pub const LOW_FAT: &str = "Low Fat";
pub const HIGH_SATURATED_FAT: &str = "High Saturated Fat";
pub const HIGH_SUGARS: &str = "High Sugars";
pub const HIGH_SALT: &str = "High Salt";
pub const CONTAINS_PALM_OIL: &str = "Contains Palm Oil";
pub const CONTAINS_SUGAR_NO_DATA: &str = "Contains Sugar (no sugar data)";

/// Rules in evaluation order. Fat limits follow the UK traffic-light
/// per-100g thresholds.
pub const DEFAULT_RULES: &[ScoringRule] = &[
    ScoringRule {
        name: HIGH_ENERGY,
        condition: RuleCondition::Above(NutrientKey::EnergyKcal, 400.0),
        threshold: Some(">400 kcal/100g"),
        impact: -10,
        unless_fired: None,
    },
    ScoringRule {
        name: VERY_LOW_ENERGY,
        condition: RuleCondition::Below(NutrientKey::EnergyKcal, 50.0),
        threshold: Some("<50 kcal/100g"),
        impact: -2,
        unless_fired: Some(HIGH_ENERGY),
    },
    ScoringRule {
        name: HIGH_FAT,
        condition: RuleCondition::Above(NutrientKey::FatG, 17.5),
        threshold: Some(">17.5g/100g"),
        impact: -15,
        unless_fired: None,
    },
    ScoringRule {
        name: LOW_FAT,
        condition: RuleCondition::Below(NutrientKey::FatG, 3.0),
        threshold: Some("<3g/100g"),
        impact: 2,
        unless_fired: Some(HIGH_FAT),
    },
    ScoringRule {
        name: HIGH_SATURATED_FAT,
        condition: RuleCondition::Above(NutrientKey::SaturatesG, 5.0),
        threshold: Some(">5g/100g"),
        impact: -10,
        unless_fired: None,
    },
    ScoringRule {
        name: HIGH_SUGARS,
        condition: RuleCondition::Above(NutrientKey::SugarsG, 22.5),
        threshold: Some(">22.5g/100g"),
        impact: -10,
        unless_fired: None,
    },
    ScoringRule {
        name: HIGH_SALT,
        condition: RuleCondition::Above(NutrientKey::SaltG, 1.5),
        threshold: Some(">1.5g/100g"),
        impact: -10,
        unless_fired: None,
    },
    ScoringRule {
        name: CONTAINS_PALM_OIL,
        condition: RuleCondition::Contains(IngredientTag::PalmOil),
        threshold: None,
        impact: -5,
        unless_fired: None,
    },
    ScoringRule {
        name: CONTAINS_SUGAR_NO_DATA,
        condition: RuleCondition::ContainsWithoutData(IngredientTag::Sugar, NutrientKey::SugarsG),
        threshold: None,
        impact: -3,
        unless_fired: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> &'static ScoringRule {
        DEFAULT_RULES.iter().find(|r| r.name == name).unwrap()
    }

    fn product_with(key: NutrientKey, value: f64) -> NormalizedProduct {
        let mut product = NormalizedProduct::unknown();
        product.nutrients.insert(key, value);
        product
    }

    #[test]
    fn test_rule_order_and_impacts() {
        let summary: Vec<(&str, i32)> = DEFAULT_RULES.iter().map(|r| (r.name, r.impact)).collect();
        assert_eq!(
            summary,
            vec![
                ("High Energy", -10),
                ("Very Low Energy", -2),
                ("High Fat", -15),
                ("Low Fat", 2),
                ("High Saturated Fat", -10),
                ("High Sugars", -10),
                ("High Salt", -10),
                ("Contains Palm Oil", -5),
                ("Contains Sugar (no sugar data)", -3),
            ]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        let high_energy = rule(HIGH_ENERGY);
        assert_eq!(
            high_energy.condition.evaluate(&product_with(NutrientKey::EnergyKcal, 400.0)),
            RuleMatch::NotTriggered
        );
        assert_eq!(
            high_energy.condition.evaluate(&product_with(NutrientKey::EnergyKcal, 400.5)),
            RuleMatch::Triggered(Some(400.5))
        );

        let low_fat = rule(LOW_FAT);
        assert_eq!(
            low_fat.condition.evaluate(&product_with(NutrientKey::FatG, 3.0)),
            RuleMatch::NotTriggered
        );
        assert_eq!(
            low_fat.condition.evaluate(&product_with(NutrientKey::FatG, 0.0)),
            RuleMatch::Triggered(Some(0.0))
        );
    }

    #[test]
    fn test_absent_nutrient_never_triggers() {
        let empty = NormalizedProduct::unknown();
        for r in DEFAULT_RULES {
            assert_eq!(r.condition.evaluate(&empty), RuleMatch::NotTriggered, "{}", r.name);
        }
    }

    #[test]
    fn test_sugar_without_data_depends_on_sugars_field() {
        let sugar_rule = rule(CONTAINS_SUGAR_NO_DATA);

        let mut product = NormalizedProduct::unknown();
        product.ingredients.insert(IngredientTag::Sugar);
        assert_eq!(sugar_rule.condition.evaluate(&product), RuleMatch::Triggered(None));

        product.nutrients.insert(NutrientKey::SugarsG, 0.0);
        assert_eq!(sugar_rule.condition.evaluate(&product), RuleMatch::NotTriggered);
    }

    #[test]
    fn test_exclusive_rules_reference_existing_rules() {
        for r in DEFAULT_RULES {
            if let Some(other) = r.unless_fired {
                assert!(DEFAULT_RULES.iter().any(|o| o.name == other));
            }
        }
    }
}

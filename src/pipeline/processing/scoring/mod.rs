//! Rule-based health scoring of normalized products.
//!
//! Scoring starts from a base of 100 and applies each rule in table order.
//! Every fired rule is reported as a `Driver` so the final number can be
//! explained line by line. The result is clamped to 0..=100 and banded.

pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::domain::NormalizedProduct;
pub use rules::{RuleCondition, RuleMatch, ScoringRule, DEFAULT_RULES};

pub const BASE_SCORE: i32 = 100;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Qualitative classification of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Green,
    Yellow,
    Red,
}

impl Band {
    pub fn from_score(score: u8) -> Self {
        if score >= 75 {
            Band::Green
        } else if score >= 50 {
            Band::Yellow
        } else {
            Band::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Green => "Green",
            Band::Yellow => "Yellow",
            Band::Red => "Red",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired rule, surfaced to explain the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
    pub impact: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub band: Band,
    /// Fired rules in evaluation order
    pub drivers: Vec<Driver>,
}

/// An ordered set of scoring rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ScoringRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ScoringRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    /// Apply every rule in order and build the result
    pub fn score(&self, product: &NormalizedProduct) -> ScoreResult {
        let mut total = BASE_SCORE;
        let mut drivers: Vec<Driver> = Vec::new();

        for rule in &self.rules {
            if let Some(blocker) = rule.unless_fired {
                if drivers.iter().any(|d| d.rule == blocker) {
                    continue;
                }
            }

            if let RuleMatch::Triggered(value) = rule.condition.evaluate(product) {
                total += rule.impact;
                drivers.push(Driver {
                    rule: rule.name.to_string(),
                    value,
                    threshold: rule.threshold.map(|t| t.to_string()),
                    impact: rule.impact,
                });
            }
        }

        // Clamped into 0..=100 so the cast cannot truncate
        let score = total.clamp(MIN_SCORE, MAX_SCORE) as u8;
        let band = Band::from_score(score);

        debug!(raw_total = total, score, band = %band, drivers = drivers.len(), "Scored product");

        ScoreResult { score, band, drivers }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

/// Score a product with the default rule table
pub fn score(product: &NormalizedProduct) -> ScoreResult {
    RuleSet::default().score(product)
}

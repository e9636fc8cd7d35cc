pub mod apis;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;

pub use domain::{IngredientTag, NormalizedProduct, NutrientKey};
pub use pipeline::processing::normalize::normalize;
pub use pipeline::processing::scoring::{score, Band, Driver, ScoreResult};
pub use pipeline::{Evaluation, LookupOutcome, Pipeline};
pub use types::{RawProductRecord, StructuredRecord};

// Pipeline processing: normalization and scoring

pub mod normalize;
pub mod scoring;

pub use normalize::normalize;
pub use scoring::score;

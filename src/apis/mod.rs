// Acquisition collaborators: product database and label OCR
pub mod ocr;
pub mod open_food_facts;

pub use ocr::{LabelTextFile, TesseractOcr};
pub use open_food_facts::OpenFoodFactsClient;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A product record as supplied by the food database, before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub product_name: Option<String>,
    #[serde(default)]
    pub ingredients_text: String,
    /// Source nutrient keys (`energy-kcal_100g`, `fat_100g`, ...) to values
    #[serde(default)]
    pub nutriments: BTreeMap<String, f64>,
}

impl StructuredRecord {
    /// Build a record from an Open Food Facts `product` object.
    ///
    /// Nutriment values may arrive as numbers or numeric strings; anything
    /// else is dropped and stays unknown.
    pub fn from_off_product(product: &Value) -> Self {
        let product_name = product
            .get("product_name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let ingredients_text = product
            .get("ingredients_text")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let nutriments = product
            .get("nutriments")
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(key, value)| numeric_value(value).map(|n| (key.clone(), n)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            product_name,
            ingredients_text,
            nutriments,
        }
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Raw product data handed to the normalizer. Exactly one shape per lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RawProductRecord {
    /// Structured database record
    Structured(StructuredRecord),
    /// Unstructured label text, usually OCR output
    FreeText(String),
    /// Nothing was found
    Absent,
}

/// How the user asked for a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Barcode,
    Name,
    ImageUrl,
    ImageLocal,
    LabelText,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Barcode => "barcode",
            InputKind::Name => "name",
            InputKind::ImageUrl => "image_url",
            InputKind::ImageLocal => "image_local",
            InputKind::LabelText => "label_text",
        }
    }

    /// Label used when logging the user action
    pub fn action_label(&self) -> &'static str {
        match self {
            InputKind::Barcode => "Barcode Input",
            InputKind::Name => "Product Name Input",
            InputKind::ImageUrl => "OCR Image URL Input",
            InputKind::ImageLocal => "OCR Local Image Input",
            InputKind::LabelText => "Label Text Input",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user lookup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    Barcode(String),
    Name(String),
    ImageUrl(String),
    ImagePath(String),
    /// Path to already-extracted label text, `-` for stdin
    LabelText(String),
}

impl LookupRequest {
    pub fn kind(&self) -> InputKind {
        match self {
            LookupRequest::Barcode(_) => InputKind::Barcode,
            LookupRequest::Name(_) => InputKind::Name,
            LookupRequest::ImageUrl(_) => InputKind::ImageUrl,
            LookupRequest::ImagePath(_) => InputKind::ImageLocal,
            LookupRequest::LabelText(_) => InputKind::LabelText,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            LookupRequest::Barcode(q)
            | LookupRequest::Name(q)
            | LookupRequest::ImageUrl(q)
            | LookupRequest::ImagePath(q)
            | LookupRequest::LabelText(q) => q,
        }
    }
}

/// Trait that every acquisition collaborator implements
#[async_trait::async_trait]
pub trait ProductSource: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// Whether this source can serve the given request
    fn handles(&self, kind: InputKind) -> bool;

    /// Fetch raw records for the request. An empty vector means nothing was found.
    async fn fetch(&self, request: &LookupRequest) -> Result<Vec<RawProductRecord>>;
}

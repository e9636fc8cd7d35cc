use crate::config::OpenFoodFactsConfig;
use crate::constants::{
    OPEN_FOOD_FACTS_PRODUCT_PATH, OPEN_FOOD_FACTS_SEARCH_PATH, OPEN_FOOD_FACTS_SOURCE,
};
use crate::error::{LookupError, Result};
use crate::metrics::LookupMetrics;
use crate::types::{InputKind, LookupRequest, ProductSource, RawProductRecord, StructuredRecord};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Client for the Open Food Facts product database
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
    page_size: usize,
}

impl OpenFoodFactsClient {
    pub fn new(config: &OpenFoodFactsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    pub fn product_url(&self, barcode: &str) -> String {
        format!("{}{}/{}.json", self.base_url, OPEN_FOOD_FACTS_PRODUCT_PATH, barcode)
    }

    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, OPEN_FOOD_FACTS_SEARCH_PATH)
    }

    /// Look up a single product by barcode. Unknown barcodes yield `Absent`.
    #[instrument(skip(self))]
    pub async fn lookup_barcode(&self, barcode: &str) -> Result<RawProductRecord> {
        let barcode = validate_barcode(barcode)?;
        let _timing = LookupMetrics::time_source(OPEN_FOOD_FACTS_SOURCE);

        let url = self.product_url(barcode);
        debug!("Fetching product from {}", url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            warn!("Barcode lookup returned HTTP {}", response.status().as_u16());
            return Ok(RawProductRecord::Absent);
        }

        let body: Value = response.json().await?;
        let record = parse_product_response(&body);
        if matches!(record, RawProductRecord::Absent) {
            info!("No product found for barcode {}", barcode);
        }
        Ok(record)
    }

    /// Search products by name, returning every hit on the first page
    #[instrument(skip(self))]
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<RawProductRecord>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LookupError::Api {
                message: "Product name must not be empty".to_string(),
            });
        }
        let _timing = LookupMetrics::time_source(OPEN_FOOD_FACTS_SOURCE);

        let page_size = self.page_size.to_string();
        let params = [
            ("search_terms", name),
            ("search_simple", "1"),
            ("action", "process"),
            ("json", "1"),
            ("page_size", page_size.as_str()),
        ];

        let response = self.client.get(self.search_url()).query(&params).send().await?;
        if !response.status().is_success() {
            warn!("Product search returned HTTP {}", response.status().as_u16());
            return Ok(Vec::new());
        }

        let body: Value = response.json().await?;
        let records = parse_search_response(&body);
        info!("Search for '{}' returned {} products", name, records.len());
        Ok(records)
    }
}

/// Barcodes are EAN/UPC digit strings; anything else would end up in the URL path
fn validate_barcode(barcode: &str) -> Result<&str> {
    let barcode = barcode.trim();
    if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err(LookupError::Api {
            message: format!("Invalid barcode '{}': expected digits only", barcode),
        });
    }
    Ok(barcode)
}

/// Interpret a `/api/v0/product/{barcode}.json` body
pub fn parse_product_response(body: &Value) -> RawProductRecord {
    let found = body.get("status").and_then(|s| s.as_i64()) == Some(1);
    match body.get("product") {
        Some(product) if found && product.is_object() => {
            RawProductRecord::Structured(StructuredRecord::from_off_product(product))
        }
        _ => RawProductRecord::Absent,
    }
}

/// Interpret a `/cgi/search.pl` body
pub fn parse_search_response(body: &Value) -> Vec<RawProductRecord> {
    body.get("products")
        .and_then(|p| p.as_array())
        .map(|products| {
            products
                .iter()
                .filter(|p| p.is_object())
                .map(|p| RawProductRecord::Structured(StructuredRecord::from_off_product(p)))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ProductSource for OpenFoodFactsClient {
    fn source_name(&self) -> &'static str {
        OPEN_FOOD_FACTS_SOURCE
    }

    fn handles(&self, kind: InputKind) -> bool {
        matches!(kind, InputKind::Barcode | InputKind::Name)
    }

    async fn fetch(&self, request: &LookupRequest) -> Result<Vec<RawProductRecord>> {
        match request {
            LookupRequest::Barcode(barcode) => match self.lookup_barcode(barcode).await? {
                RawProductRecord::Absent => Ok(Vec::new()),
                record => Ok(vec![record]),
            },
            LookupRequest::Name(name) => self.search_by_name(name).await,
            other => Err(LookupError::Api {
                message: format!("{} cannot serve {} requests", OPEN_FOOD_FACTS_SOURCE, other.kind()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> OpenFoodFactsClient {
        let config = OpenFoodFactsConfig {
            base_url: "https://example.test/".to_string(),
            ..Default::default()
        };
        OpenFoodFactsClient::new(&config).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.product_url("3017620429484"),
            "https://example.test/api/v0/product/3017620429484.json"
        );
        assert_eq!(client.search_url(), "https://example.test/cgi/search.pl");
    }

    #[test]
    fn test_parse_found_product() {
        let body = json!({
            "status": 1,
            "product": {
                "product_name": "Nutella",
                "ingredients_text": "Sugar, palm oil",
                "nutriments": { "fat_100g": 30.9 }
            }
        });

        match parse_product_response(&body) {
            RawProductRecord::Structured(record) => {
                assert_eq!(record.product_name.as_deref(), Some("Nutella"));
                assert_eq!(record.nutriments.get("fat_100g"), Some(&30.9));
            }
            other => panic!("expected structured record, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_product_is_absent() {
        let body = json!({ "status": 0, "status_verbose": "product not found" });
        assert_eq!(parse_product_response(&body), RawProductRecord::Absent);
    }

    #[test]
    fn test_parse_search_results() {
        let body = json!({
            "count": 2,
            "products": [
                { "product_name": "Coca-Cola", "nutriments": { "sugars_100g": 10.6 } },
                { "product_name": "Coca-Cola Zero" },
                "garbage"
            ]
        });

        let records = parse_search_response(&body);
        assert_eq!(records.len(), 2);
        assert!(parse_search_response(&json!({})).is_empty());
    }

    #[test]
    fn test_barcode_validation() {
        assert_eq!(validate_barcode(" 3017620429484 ").unwrap(), "3017620429484");
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("12/../34").is_err());
    }

    #[test]
    fn test_handles_database_requests_only() {
        let client = client();
        assert!(client.handles(InputKind::Barcode));
        assert!(client.handles(InputKind::Name));
        assert!(!client.handles(InputKind::ImageUrl));
    }
}

//! Catalog entities and search filter types

use serde::{Deserialize, Serialize};

/// Product category, fixed set shared with the catalog and vector index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clothing,
    Electronics,
    Home,
    Sports,
}

impl Category {
    /// All categories, in the order filter extraction checks them
    pub const ALL: [Category; 4] = [
        Category::Clothing,
        Category::Electronics,
        Category::Home,
        Category::Sports,
    ];

    /// Stable lowercase name used in vector payloads and API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clothing => "clothing",
            Category::Electronics => "electronics",
            Category::Home => "home",
            Category::Sports => "sports",
        }
    }

    /// Parse the lowercase name; anything else is None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "clothing" => Some(Category::Clothing),
            "electronics" => Some(Category::Electronics),
            "home" => Some(Category::Home),
            "sports" => Some(Category::Sports),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable catalog entity. Owned by the catalog; the core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier, opaque string
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    /// Non-negative price in the store currency
    pub price: f64,
    /// Image reference (path or URL)
    pub image: String,
}

/// Structured constraint narrowing a product search.
///
/// Constructed per-request from free text or image features, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_min_price(mut self, min_price: f64) -> Self {
        self.min_price = Some(min_price);
        self
    }

    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    /// True when no constraint is set
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.min_price.is_none() && self.max_price.is_none()
    }

    /// Check a product against every set constraint (inclusive bounds)
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

/// One vector-search hit: the narrow product projection plus a similarity
/// score. Adapter-specific payload shapes never leak past this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub product: Product,
    /// Similarity score as reported by the vector index
    pub score: f32,
}

impl RetrievedDocument {
    pub fn new(product: Product, score: f32) -> Self {
        Self { product, score }
    }

    pub fn product_id(&self) -> &str {
        &self.product.id
    }
}

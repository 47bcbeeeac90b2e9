//! Static product catalog
//!
//! Read-only product set loaded once at process start, either from the
//! built-in seed data or from a JSON file. Exposes the narrow
//! [`CatalogProvider`] contract; `text_search` doubles as the last-resort
//! retrieval fallback.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use shop_agent_core::{CatalogProvider, Category, Product};

mod seed;

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(String),

    #[error("Failed to parse catalog file: {0}")]
    Parse(String),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

impl From<CatalogError> for shop_agent_core::Error {
    fn from(err: CatalogError) -> Self {
        shop_agent_core::Error::Config(err.to_string())
    }
}

/// In-memory product catalog
pub struct Catalog {
    products: Vec<Product>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from a product list; ids must be unique
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(products.len());
        for (idx, product) in products.iter().enumerate() {
            if product.price < 0.0 {
                return Err(CatalogError::Invalid(format!(
                    "product {} has negative price",
                    product.id
                )));
            }
            if by_id.insert(product.id.clone(), idx).is_some() {
                return Err(CatalogError::Invalid(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
        }
        Ok(Self { products, by_id })
    }

    /// Built-in seed catalog
    pub fn builtin() -> Self {
        // Seed data is statically known to be valid
        Self::new(seed::products()).expect("builtin catalog is valid")
    }

    /// Load from a JSON file (array of products)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Io(e.to_string()))?;
        let products: Vec<Product> =
            serde_json::from_str(&content).map_err(|e| CatalogError::Parse(e.to_string()))?;

        tracing::info!(count = products.len(), "Loaded catalog from file");
        Self::new(products)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products in a category
    pub fn by_category(&self, category: Category) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }
}

impl CatalogProvider for Catalog {
    fn list_all(&self) -> Vec<Product> {
        self.products.clone()
    }

    fn get_by_id(&self, id: &str) -> Option<Product> {
        self.by_id.get(id).map(|&idx| self.products[idx].clone())
    }

    fn text_search(&self, query: &str) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
                    || p.category.as_str().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

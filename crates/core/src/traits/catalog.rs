//! Catalog provider trait

use crate::product::Product;

/// Static, read-only product catalog loaded once at process start.
///
/// `text_search` is the last-resort fallback when vector retrieval is
/// unavailable: case-insensitive substring match over name, description
/// and category.
pub trait CatalogProvider: Send + Sync {
    /// All products
    fn list_all(&self) -> Vec<Product>;

    /// Look up a product by id
    fn get_by_id(&self, id: &str) -> Option<Product>;

    /// Case-insensitive substring search over name/description/category
    fn text_search(&self, query: &str) -> Vec<Product>;
}

//! Image analysis types
//!
//! Derived from one uploaded image, request-scoped, never persisted.

use serde::{Deserialize, Serialize};

use crate::product::Category;

/// Features extracted from a product image. All fields optional; the
/// analyzer fills in what it can see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Dominant colors, most prominent first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    /// Specific product type (shirt, laptop, lamp, yoga mat)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl ImageFeatures {
    /// Number of populated features, used to decide whether the derived
    /// search query is specific enough
    pub fn count(&self) -> usize {
        let mut n = 0;
        if self.category.is_some() {
            n += 1;
        }
        if !self.colors.is_empty() {
            n += 1;
        }
        if self.item_type.is_some() {
            n += 1;
        }
        if self.style.is_some() {
            n += 1;
        }
        if self.brand.is_some() {
            n += 1;
        }
        if self.material.is_some() {
            n += 1;
        }
        n
    }
}

/// Result of analyzing one uploaded image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    /// Free-text description suitable for search
    pub description: String,
    pub features: ImageFeatures,
    /// Confidence in the analysis itself (0.0 - 1.0)
    pub confidence: f32,
    /// Separate confidence that the depicted item plausibly exists in the
    /// catalog's category/type vocabulary (0.0 - 1.0)
    pub catalog_confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        let mut features = ImageFeatures::default();
        assert_eq!(features.count(), 0);

        features.category = Some(Category::Clothing);
        features.colors = vec!["red".to_string()];
        features.item_type = Some("shirt".to_string());
        assert_eq!(features.count(), 3);
    }
}

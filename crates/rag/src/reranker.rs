//! Feature-based re-ranker
//!
//! Deterministic additive scoring of retrieved products against features
//! extracted from an image. Category outweighs color and type, which
//! outweigh style, material and brand. The sort is stable: candidates with
//! equal scores keep their retrieval order. Not a learned model; every
//! score is explainable from the synonym tables.

use std::sync::Arc;

use shop_agent_config::FeatureVocabulary;
use shop_agent_core::{ImageFeatures, Product};

const CATEGORY_WEIGHT: f32 = 4.0;
const COLOR_WEIGHT: f32 = 3.0;
const TYPE_WEIGHT: f32 = 3.0;
const BRAND_WEIGHT: f32 = 2.0;
const STYLE_WEIGHT: f32 = 1.0;
const MATERIAL_WEIGHT: f32 = 1.0;

/// A product with its re-rank score
#[derive(Debug, Clone)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: f32,
}

/// Deterministic feature re-ranker
pub struct FeatureReranker {
    vocabulary: Arc<FeatureVocabulary>,
}

impl FeatureReranker {
    pub fn new(vocabulary: Arc<FeatureVocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Score one product against the extracted features
    pub fn score(&self, product: &Product, features: &ImageFeatures) -> f32 {
        let name = product.name.to_lowercase();
        let description = product.description.to_lowercase();
        let text_matches = |term: &str| name.contains(term) || description.contains(term);

        let mut score = 0.0;

        if features.category == Some(product.category) {
            score += CATEGORY_WEIGHT;
        }

        for color in &features.colors {
            if self
                .vocabulary
                .color_terms(color)
                .into_iter()
                .any(|t| text_matches(t))
            {
                score += COLOR_WEIGHT;
            }
        }

        if let Some(ref item_type) = features.item_type {
            if self
                .vocabulary
                .type_terms(item_type)
                .into_iter()
                .any(|t| text_matches(t))
            {
                score += TYPE_WEIGHT;
            }
        }

        if let Some(ref brand) = features.brand {
            if text_matches(&brand.to_lowercase()) {
                score += BRAND_WEIGHT;
            }
        }

        if let Some(ref style) = features.style {
            if description.contains(style.as_str()) {
                score += STYLE_WEIGHT;
            }
        }

        if let Some(ref material) = features.material {
            if description.contains(material.as_str()) {
                score += MATERIAL_WEIGHT;
            }
        }

        score
    }

    /// Re-rank products by descending score; ties keep input order
    pub fn rerank(&self, products: Vec<Product>, features: &ImageFeatures) -> Vec<ScoredProduct> {
        let mut scored: Vec<ScoredProduct> = products
            .into_iter()
            .map(|product| {
                let score = self.score(&product, features);
                ScoredProduct { product, score }
            })
            .collect();

        // Stable: equal scores preserve retrieval order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_agent_core::Category;

    fn reranker() -> FeatureReranker {
        FeatureReranker::new(Arc::new(FeatureVocabulary::default()))
    }

    fn product(id: &str, name: &str, description: &str, category: Category) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category,
            price: 10.0,
            image: String::new(),
        }
    }

    fn features() -> ImageFeatures {
        ImageFeatures {
            category: Some(Category::Clothing),
            colors: vec!["black".to_string()],
            item_type: Some("shoes".to_string()),
            style: None,
            brand: None,
            material: None,
        }
    }

    #[test]
    fn test_category_outweighs_single_color() {
        let r = reranker();
        let category_only = product("1", "Gym Bag", "spacious bag", Category::Clothing);
        let color_only = product("2", "Black Lamp", "black desk lamp", Category::Home);

        assert!(r.score(&category_only, &features()) > r.score(&color_only, &features()));
    }

    #[test]
    fn test_full_match_scores_highest() {
        let r = reranker();
        let full = product(
            "1",
            "Running Shoes - Black",
            "black running sneakers",
            Category::Clothing,
        );
        // category 4 + color 3 + type 3
        assert_eq!(r.score(&full, &features()), 10.0);
    }

    #[test]
    fn test_rerank_sorts_descending() {
        let r = reranker();
        let products = vec![
            product("1", "Table Lamp", "lamp", Category::Home),
            product("2", "Black Sneakers", "black footwear", Category::Clothing),
        ];
        let ranked = r.rerank(products, &features());
        assert_eq!(ranked[0].product.id, "2");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_rerank_is_stable_on_ties() {
        let r = reranker();
        // Neither matches anything: both score 0, input order kept
        let products = vec![
            product("first", "Mug", "ceramic mug", Category::Home),
            product("second", "Vase", "glass vase", Category::Home),
        ];
        let ranked = r.rerank(products, &ImageFeatures::default());
        assert_eq!(ranked[0].product.id, "first");
        assert_eq!(ranked[1].product.id, "second");
        assert_eq!(ranked[0].score, ranked[1].score);
    }
}

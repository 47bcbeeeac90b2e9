//! Image search pipeline
//!
//! analyze → derive query and filter → retrieve (grounded or direct) →
//! re-rank on extracted features → decide between direct-match and
//! "you might also like" presentation.

use std::sync::Arc;

use shop_agent_core::{
    ImageAnalysis, ProductFilter, Result, Retriever,
};
use shop_agent_rag::{FeatureReranker, RagPipeline, ScoredProduct};

use crate::analyzer::{build_search_query, similar_product_suggestions, ImageAnalyzer};

/// Image search configuration
#[derive(Debug, Clone)]
pub struct ImageSearchConfig {
    /// Catalog-membership confidence gating direct-match presentation
    pub catalog_confidence_threshold: f32,
    /// Minimum re-rank score on the top hit for a direct match
    pub min_top_rerank_score: f32,
    /// Results requested from the retriever on the direct path
    pub top_k: usize,
}

impl Default for ImageSearchConfig {
    fn default() -> Self {
        use shop_agent_config::constants::{rag, vision};
        Self {
            catalog_confidence_threshold: vision::CATALOG_CONFIDENCE_THRESHOLD,
            min_top_rerank_score: vision::MIN_TOP_RERANK_SCORE,
            top_k: rag::TOP_K,
        }
    }
}

impl From<&shop_agent_config::VisionSettings> for ImageSearchConfig {
    fn from(settings: &shop_agent_config::VisionSettings) -> Self {
        Self {
            catalog_confidence_threshold: settings.catalog_confidence_threshold,
            min_top_rerank_score: settings.min_top_rerank_score,
            ..Default::default()
        }
    }
}

/// Result of one image search
#[derive(Debug, Clone)]
pub struct ImageSearchResult {
    pub analysis: ImageAnalysis,
    pub search_query: String,
    /// Re-ranked products, best match first
    pub products: Vec<ScoredProduct>,
    pub response: Option<String>,
    /// Whether the depicted item plausibly exists in the catalog
    pub is_in_catalog: bool,
    /// Populated only when the item is probably not in the catalog
    pub suggestions: Vec<String>,
}

/// Image-to-query search orchestration
pub struct ImageSearchPipeline {
    analyzer: ImageAnalyzer,
    rag: Arc<RagPipeline>,
    retriever: Arc<dyn Retriever>,
    reranker: FeatureReranker,
    config: ImageSearchConfig,
}

impl ImageSearchPipeline {
    pub fn new(
        analyzer: ImageAnalyzer,
        rag: Arc<RagPipeline>,
        retriever: Arc<dyn Retriever>,
        reranker: FeatureReranker,
        config: ImageSearchConfig,
    ) -> Self {
        Self {
            analyzer,
            rag,
            retriever,
            reranker,
            config,
        }
    }

    /// Search the catalog for products resembling the uploaded image
    pub async fn search(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
        use_rag: bool,
    ) -> Result<ImageSearchResult> {
        let analysis = self.analyzer.analyze(image_bytes, mime_type).await?;
        let search_query = build_search_query(&analysis);

        let mut filter = ProductFilter::new();
        if let Some(category) = analysis.features.category {
            filter = filter.with_category(category);
        }

        tracing::info!(
            query = %search_query,
            category = ?analysis.features.category,
            confidence = analysis.confidence,
            "Image analyzed, searching catalog"
        );

        let (products, mut response) = if use_rag {
            let answer = self.rag.answer(&search_query, &[], &filter).await?;
            let response = image_search_response(&analysis, &answer.text);
            (answer.products, Some(response))
        } else {
            let documents = self
                .retriever
                .retrieve(&search_query, &filter, self.config.top_k)
                .await?;
            (documents.into_iter().map(|d| d.product).collect(), None)
        };

        let ranked = self.reranker.rerank(products, &analysis.features);

        let top_score = ranked.first().map(|p| p.score).unwrap_or(0.0);
        let is_in_catalog = analysis.catalog_confidence
            > self.config.catalog_confidence_threshold
            && !ranked.is_empty()
            && top_score > self.config.min_top_rerank_score;

        let suggestions = if is_in_catalog {
            Vec::new()
        } else {
            similar_product_suggestions(&analysis)
        };

        if !is_in_catalog && response.is_some() {
            response = Some(not_in_catalog_response(&analysis, &ranked, &suggestions));
        }

        Ok(ImageSearchResult {
            analysis,
            search_query,
            products: ranked,
            response,
            is_in_catalog,
            suggestions,
        })
    }
}

/// Feature summary used by both response builders
fn feature_phrase(analysis: &ImageAnalysis) -> Vec<String> {
    let features = &analysis.features;
    let mut parts = Vec::new();

    if !features.colors.is_empty() {
        parts.push(format!("{} colored", features.colors.join("/")));
    }
    if let Some(ref item_type) = features.item_type {
        parts.push(item_type.clone());
    }
    if let Some(ref style) = features.style {
        parts.push(format!("{style} style"));
    }

    parts
}

/// Response when the item appears to be in the catalog
fn image_search_response(analysis: &ImageAnalysis, rag_response: &str) -> String {
    let parts = feature_phrase(analysis);
    let intro = if parts.is_empty() {
        "I've analyzed your image and found some matching products.".to_string()
    } else {
        format!(
            "I found products similar to the {} item in your image.",
            parts.join(" ")
        )
    };

    if rag_response.is_empty() {
        intro
    } else {
        format!("{intro} {rag_response}")
    }
}

/// Response when the item is probably not stocked
fn not_in_catalog_response(
    analysis: &ImageAnalysis,
    products: &[ScoredProduct],
    suggestions: &[String],
) -> String {
    let parts = feature_phrase(analysis);
    let mut response = if parts.is_empty() {
        "I've analyzed your image".to_string()
    } else {
        format!("I can see this is a {} item", parts.join(" "))
    };

    if !products.is_empty() {
        response.push_str(
            ", but I don't have an exact match in our catalog. Here are some similar items you might like:",
        );
    } else {
        response.push_str(", but I couldn't find similar items in our current catalog.");
        if !suggestions.is_empty() {
            response.push_str(&format!(
                " You might want to browse our {} sections.",
                suggestions.join(" or ")
            ));
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_agent_core::{Category, ImageFeatures, Product};

    fn analysis(catalog_confidence: f32) -> ImageAnalysis {
        ImageAnalysis {
            description: "black headphones".to_string(),
            features: ImageFeatures {
                category: Some(Category::Electronics),
                colors: vec!["black".to_string()],
                item_type: Some("headphones".to_string()),
                style: None,
                brand: None,
                material: None,
            },
            confidence: 0.9,
            catalog_confidence,
        }
    }

    fn scored(id: &str, score: f32) -> ScoredProduct {
        ScoredProduct {
            product: Product {
                id: id.to_string(),
                name: format!("Product {id}"),
                description: String::new(),
                category: Category::Electronics,
                price: 10.0,
                image: String::new(),
            },
            score,
        }
    }

    #[test]
    fn test_image_search_response_mentions_features() {
        let response = image_search_response(&analysis(0.9), "Take a look at these.");
        assert!(response.contains("black colored headphones"));
        assert!(response.contains("Take a look at these."));
    }

    #[test]
    fn test_not_in_catalog_with_near_misses() {
        let response = not_in_catalog_response(&analysis(0.3), &[scored("1", 1.0)], &[]);
        assert!(response.contains("don't have an exact match"));
    }

    #[test]
    fn test_not_in_catalog_with_nothing_found() {
        let suggestions = vec!["Other electronics items".to_string()];
        let response = not_in_catalog_response(&analysis(0.3), &[], &suggestions);
        assert!(response.contains("couldn't find similar items"));
        assert!(response.contains("Other electronics items"));
    }
}

//! Image analyzer
//!
//! Two-stage analysis: a structured-JSON extraction first, then a coarse
//! multiple-choice category classification with keyword feature recovery
//! when the structured output is missing, malformed or unconvincing. The
//! more confident result wins. A separate catalog-membership confidence
//! estimates whether the depicted item plausibly exists in the catalog's
//! category/type vocabulary.

use std::sync::Arc;

use serde::Deserialize;

use shop_agent_config::FeatureVocabulary;
use shop_agent_core::{Category, ImageAnalysis, ImageFeatures, VisionModel};

use crate::VisionError;

const STRUCTURED_PROMPT: &str = r#"Analyze this product image and respond with ONLY a valid JSON object in this exact format:
{
  "category": "clothing|electronics|home|sports|unknown",
  "type": "specific product type (e.g., shirt, laptop, lamp, yoga mat)",
  "colors": ["primary color", "secondary color if any"],
  "style": "style description if applicable",
  "material": "material if visible",
  "brand": "brand name if visible",
  "confidence": 0.85,
  "description": "Brief description for search purposes"
}

Examples:
- Red t-shirt: {"category":"clothing","type":"shirt","colors":["red"],"confidence":0.9,"description":"red cotton t-shirt"}
- iPhone: {"category":"electronics","type":"smartphone","colors":["black"],"confidence":0.95,"description":"black smartphone mobile phone"}

Be precise with categories. Use "unknown" only if truly unclear."#;

const MULTIPLE_CHOICE_PROMPT: &str = r#"Look at this product image and answer: Which category best describes this item?

A) CLOTHING (shirts, pants, shoes, jackets, hats, etc.)
B) ELECTRONICS (phones, laptops, headphones, speakers, etc.)
C) HOME (lamps, furniture, kitchenware, decor, etc.)
D) SPORTS (equipment, gear, fitness items, etc.)
E) UNKNOWN (if none of the above fit well)

Respond with just the letter and category name, then describe the item briefly.
Example: "A) CLOTHING - This is a blue denim jacket with metal buttons""#;

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Below this the structured result is challenged by the fallback
    pub structured_confidence_threshold: f32,
    /// Fixed confidence assigned to the multiple-choice path
    pub fallback_confidence: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        use shop_agent_config::constants::vision;
        Self {
            structured_confidence_threshold: vision::STRUCTURED_CONFIDENCE_THRESHOLD,
            fallback_confidence: vision::FALLBACK_CONFIDENCE,
        }
    }
}

/// Structured response shape expected from the vision model
#[derive(Debug, Deserialize)]
struct StructuredAnalysis {
    category: String,
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    confidence: f32,
    description: String,
}

/// Two-stage product image analyzer
pub struct ImageAnalyzer {
    model: Arc<dyn VisionModel>,
    vocabulary: Arc<FeatureVocabulary>,
    config: AnalyzerConfig,
}

impl ImageAnalyzer {
    pub fn new(
        model: Arc<dyn VisionModel>,
        vocabulary: Arc<FeatureVocabulary>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            model,
            vocabulary,
            config,
        }
    }

    /// Analyze one image.
    ///
    /// Fails with a parse error only when both the structured and the
    /// multiple-choice attempts come back unusable.
    pub async fn analyze(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> std::result::Result<ImageAnalysis, VisionError> {
        let mut best = self.try_structured(image_bytes, mime_type).await;

        let challenge = match best {
            Some((_, confidence, _)) => confidence < self.config.structured_confidence_threshold,
            None => true,
        };

        if challenge {
            tracing::debug!("Structured analysis weak or failed, trying multiple choice");
            if let Some(fallback) = self.try_multiple_choice(image_bytes, mime_type).await {
                best = match best {
                    Some(existing) if existing.1 >= fallback.1 => Some(existing),
                    _ => Some(fallback),
                };
            }
        }

        let (features, confidence, description) = best.ok_or_else(|| {
            VisionError::Parse("Both structured and fallback analysis failed".to_string())
        })?;

        let catalog_confidence = self.catalog_confidence(&features);

        Ok(ImageAnalysis {
            description,
            features,
            confidence,
            catalog_confidence,
        })
    }

    /// Structured JSON attempt. None on any API or parse failure.
    async fn try_structured(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> Option<(ImageFeatures, f32, String)> {
        let content = match self
            .model
            .describe(image_bytes, mime_type, STRUCTURED_PROMPT)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "Structured analysis call failed");
                return None;
            },
        };

        let parsed = match parse_structured(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "Structured analysis output unparseable");
                return None;
            },
        };

        let features = ImageFeatures {
            category: Category::parse(&parsed.category),
            colors: parsed.colors,
            item_type: Some(parsed.item_type).filter(|t| !t.is_empty() && t != "unknown"),
            style: parsed.style.filter(|s| !s.is_empty()),
            material: parsed.material.filter(|m| !m.is_empty()),
            brand: parsed.brand.filter(|b| !b.is_empty()),
        };

        Some((features, parsed.confidence.clamp(0.0, 1.0), parsed.description))
    }

    /// Multiple-choice fallback: category letter plus a free-text
    /// description mined for features via the synonym tables.
    async fn try_multiple_choice(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> Option<(ImageFeatures, f32, String)> {
        let content = match self
            .model
            .describe(image_bytes, mime_type, MULTIPLE_CHOICE_PROMPT)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "Multiple-choice analysis call failed");
                return None;
            },
        };

        let (category, description) = parse_multiple_choice(&content)?;
        let mut features = self.extract_features(&description);

        // The chosen letter wins over anything inferred from the text
        if category.is_some() {
            features.category = category;
        }

        Some((features, self.config.fallback_confidence, description))
    }

    /// Mine features from a free-text description using the vocabulary
    fn extract_features(&self, description: &str) -> ImageFeatures {
        let lower = description.to_lowercase();

        let mut features = ImageFeatures {
            colors: self.vocabulary.match_colors(&lower),
            style: self.vocabulary.match_style(&lower),
            material: self.vocabulary.match_material(&lower),
            ..Default::default()
        };

        if let Some((category, item_type)) = self.vocabulary.match_type(&lower) {
            features.category = Some(category);
            features.item_type = Some(item_type);
        }

        features
    }

    /// Confidence that this item exists in the catalog's vocabulary.
    ///
    /// Base 0.3, plus 0.3 for a recognized category, 0.25 for a stocked
    /// type, 0.1 for any color, and 0.025 each for style and material,
    /// capped at 1.0.
    pub fn catalog_confidence(&self, features: &ImageFeatures) -> f32 {
        let mut score: f32 = 0.3;

        if features.category.is_some() {
            score += 0.3;
        }
        if let Some(ref item_type) = features.item_type {
            if self.vocabulary.is_catalog_type(item_type) {
                score += 0.25;
            }
        }
        if !features.colors.is_empty() {
            score += 0.1;
        }
        if features.style.is_some() {
            score += 0.025;
        }
        if features.material.is_some() {
            score += 0.025;
        }

        score.min(1.0)
    }
}

/// Pull the first JSON object out of the model output and validate the
/// required fields
fn parse_structured(content: &str) -> std::result::Result<StructuredAnalysis, VisionError> {
    let start = content
        .find('{')
        .ok_or_else(|| VisionError::Parse("No JSON object in response".to_string()))?;
    let end = content
        .rfind('}')
        .ok_or_else(|| VisionError::Parse("Unterminated JSON object".to_string()))?;
    if end < start {
        return Err(VisionError::Parse("Malformed JSON object".to_string()));
    }

    let parsed: StructuredAnalysis = serde_json::from_str(&content[start..=end])
        .map_err(|e| VisionError::Parse(e.to_string()))?;

    if parsed.category.is_empty() || parsed.item_type.is_empty() || parsed.description.is_empty() {
        return Err(VisionError::Parse(
            "Missing required fields in structured response".to_string(),
        ));
    }

    Ok(parsed)
}

/// Parse "A) CLOTHING - description" style answers. Returns the category
/// (None for the UNKNOWN letter) and the trailing description.
fn parse_multiple_choice(content: &str) -> Option<(Option<Category>, String)> {
    let trimmed = content.trim();
    let letter_pos = trimmed.find(|c: char| ('A'..='E').contains(&c))?;
    let letter = trimmed[letter_pos..].chars().next()?;
    if !trimmed[letter_pos..].starts_with(&format!("{letter})")) {
        return None;
    }

    let category = match letter {
        'A' => Some(Category::Clothing),
        'B' => Some(Category::Electronics),
        'C' => Some(Category::Home),
        'D' => Some(Category::Sports),
        _ => None,
    };

    // Description follows the "X) CATEGORY -" prefix
    let rest = &trimmed[letter_pos..];
    let description = rest
        .split_once('-')
        .map(|(_, d)| d.trim().to_string())
        .unwrap_or_else(|| rest.to_string());

    if description.is_empty() {
        return None;
    }

    Some((category, description))
}

/// Build a short search query from extracted features: dominant color,
/// specific type (or category), style, material, in priority order. When
/// fewer than two features exist, a truncated prefix of the description
/// stands in.
pub fn build_search_query(analysis: &ImageAnalysis) -> String {
    let features = &analysis.features;
    let mut parts: Vec<String> = Vec::new();

    if let Some(color) = features.colors.first() {
        parts.push(color.clone());
    }

    if let Some(ref item_type) = features.item_type {
        parts.push(item_type.clone());
    } else if let Some(category) = features.category {
        parts.push(category.as_str().to_string());
    }

    if let Some(ref style) = features.style {
        parts.push(style.clone());
    }

    if let Some(ref material) = features.material {
        parts.push(format!("made of {material}"));
    }

    if parts.len() < 2 {
        let first_sentence = analysis
            .description
            .split('.')
            .next()
            .unwrap_or("")
            .to_lowercase();
        return first_sentence.chars().take(100).collect::<String>().trim().to_string();
    }

    parts.join(" ")
}

/// Up to three "you might also like" suggestions for items the catalog
/// probably does not stock
pub fn similar_product_suggestions(analysis: &ImageAnalysis) -> Vec<String> {
    use shop_agent_config::constants::vision::MAX_SUGGESTIONS;

    let features = &analysis.features;
    let mut suggestions = Vec::new();

    if let Some(category) = features.category {
        suggestions.push(format!("Other {category} items"));
    }
    if let Some(color) = features.colors.first() {
        suggestions.push(format!("{color} products"));
    }
    if let Some(ref item_type) = features.item_type {
        suggestions.push(format!("Similar {item_type} products"));
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shop_agent_core::Result;

    /// Vision model returning canned responses per instruction prompt
    struct CannedVision {
        structured: Option<&'static str>,
        multiple_choice: Option<&'static str>,
    }

    #[async_trait]
    impl VisionModel for CannedVision {
        async fn describe(
            &self,
            _image_bytes: &[u8],
            _mime_type: &str,
            instruction: &str,
        ) -> Result<String> {
            let canned = if instruction.contains("JSON object") {
                self.structured
            } else {
                self.multiple_choice
            };
            canned
                .map(|s| s.to_string())
                .ok_or_else(|| shop_agent_core::Error::Vision("no canned response".to_string()))
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn analyzer(model: CannedVision) -> ImageAnalyzer {
        ImageAnalyzer::new(
            Arc::new(model),
            Arc::new(FeatureVocabulary::default()),
            AnalyzerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_structured_analysis_preferred() {
        let analyzer = analyzer(CannedVision {
            structured: Some(
                r#"{"category":"clothing","type":"shirt","colors":["red"],"confidence":0.9,"description":"red cotton t-shirt"}"#,
            ),
            multiple_choice: None,
        });

        let analysis = analyzer.analyze(b"img", "image/jpeg").await.unwrap();
        assert_eq!(analysis.features.category, Some(Category::Clothing));
        assert_eq!(analysis.features.item_type.as_deref(), Some("shirt"));
        assert_eq!(analysis.confidence, 0.9);
        assert!(analysis.catalog_confidence > 0.6);
    }

    #[tokio::test]
    async fn test_fallback_on_malformed_structured_output() {
        let analyzer = analyzer(CannedVision {
            structured: Some("I cannot produce JSON, sorry"),
            multiple_choice: Some("A) CLOTHING - This is a blue jacket with metal buttons"),
        });

        let analysis = analyzer.analyze(b"img", "image/jpeg").await.unwrap();
        assert_eq!(analysis.features.category, Some(Category::Clothing));
        assert_eq!(analysis.features.item_type.as_deref(), Some("jacket"));
        assert!(analysis.features.colors.contains(&"blue".to_string()));
        assert_eq!(analysis.confidence, 0.75);
    }

    #[tokio::test]
    async fn test_both_attempts_failing_is_parse_error() {
        let analyzer = analyzer(CannedVision {
            structured: Some("nope"),
            multiple_choice: Some("no letter here"),
        });

        let result = analyzer.analyze(b"img", "image/jpeg").await;
        assert!(matches!(result, Err(VisionError::Parse(_))));
    }

    #[test]
    fn test_parse_structured_rejects_missing_fields() {
        assert!(parse_structured(r#"{"category":"clothing","confidence":0.9}"#).is_err());
        assert!(parse_structured("no braces").is_err());
    }

    #[test]
    fn test_parse_structured_tolerates_surrounding_prose() {
        let content = r#"Here you go: {"category":"home","type":"lamp","colors":[],"confidence":0.8,"description":"a lamp"} hope that helps"#;
        let parsed = parse_structured(content).unwrap();
        assert_eq!(parsed.item_type, "lamp");
    }

    #[test]
    fn test_parse_multiple_choice_unknown_letter() {
        let (category, description) =
            parse_multiple_choice("E) UNKNOWN - Some odd contraption").unwrap();
        assert!(category.is_none());
        assert_eq!(description, "Some odd contraption");
    }

    #[test]
    fn test_build_search_query_priority_order() {
        let analysis = ImageAnalysis {
            description: "A red cotton shirt.".to_string(),
            features: ImageFeatures {
                category: Some(Category::Clothing),
                colors: vec!["red".to_string(), "white".to_string()],
                item_type: Some("shirt".to_string()),
                style: Some("casual".to_string()),
                brand: None,
                material: Some("cotton".to_string()),
            },
            confidence: 0.9,
            catalog_confidence: 0.9,
        };

        assert_eq!(build_search_query(&analysis), "red shirt casual made of cotton");
    }

    #[test]
    fn test_build_search_query_falls_back_to_description() {
        let analysis = ImageAnalysis {
            description: "An unidentifiable object on a table. It is strange.".to_string(),
            features: ImageFeatures::default(),
            confidence: 0.5,
            catalog_confidence: 0.3,
        };

        assert_eq!(
            build_search_query(&analysis),
            "an unidentifiable object on a table"
        );
    }

    #[test]
    fn test_suggestions_capped_at_three() {
        let analysis = ImageAnalysis {
            description: String::new(),
            features: ImageFeatures {
                category: Some(Category::Sports),
                colors: vec!["green".to_string()],
                item_type: Some("mat".to_string()),
                style: None,
                brand: None,
                material: None,
            },
            confidence: 0.9,
            catalog_confidence: 0.9,
        };

        let suggestions = similar_product_suggestions(&analysis);
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], "Other sports items");
    }
}

//! Keyword and synonym tables
//!
//! Intent detection, filter extraction, image feature extraction and
//! re-ranking all match against these tables. They ship with compiled-in
//! defaults and can be replaced wholesale from a YAML file, so detection
//! behavior is tunable without code changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use shop_agent_core::Category;

use crate::ConfigError;

/// A canonical term with its accepted synonyms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl SynonymEntry {
    fn new(name: &str, synonyms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True if the canonical name or any synonym occurs in `text`
    /// (`text` must already be lowercased)
    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.name.as_str()) || self.synonyms.iter().any(|s| text.contains(s.as_str()))
    }
}

/// Category with the phrases that select it during filter extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: Category,
    pub phrases: Vec<String>,
}

/// Both vocabulary tables in one loadable file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub search: SearchVocabulary,
    #[serde(default)]
    pub features: FeatureVocabulary,
}

impl VocabularyConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Tables driving the intent router
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchVocabulary {
    /// Phrases whose presence marks a message as a product search
    pub search_keywords: Vec<String>,
    /// Backreference phrases; when one matches, the message is answered
    /// from session memory instead of re-searching (takes precedence over
    /// search keywords)
    pub history_patterns: Vec<String>,
    /// Category selection phrases, checked in order; first match wins
    pub categories: Vec<CategoryEntry>,
}

impl Default for SearchVocabulary {
    fn default() -> Self {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            search_keywords: to_vec(&[
                "find",
                "search",
                "looking for",
                "need",
                "want",
                "show me",
                "recommend",
                "laptop",
                "phone",
                "headphones",
                "shirt",
                "jeans",
                "shoes",
                "jacket",
                "coffee",
                "kitchen",
                "home",
                "sports",
                "fitness",
                "gift",
                "budget",
                "cheap",
                "expensive",
                "premium",
                "electronics",
                "clothing",
                "workout",
            ]),
            history_patterns: to_vec(&[
                "what was",
                "what were",
                "you recommended",
                "you showed",
                "you mentioned",
                "you suggested",
                "earlier",
                "before",
                "those ones",
                "that one",
                "the first one",
                "the second one",
                "the last one",
                "the ones you",
                "price of the",
                "how much was",
                "how much were",
            ]),
            categories: vec![
                CategoryEntry {
                    category: Category::Clothing,
                    phrases: to_vec(&["clothing", "clothes"]),
                },
                CategoryEntry {
                    category: Category::Electronics,
                    phrases: to_vec(&["electronics", "tech"]),
                },
                CategoryEntry {
                    category: Category::Home,
                    phrases: to_vec(&["home", "house"]),
                },
                CategoryEntry {
                    category: Category::Sports,
                    phrases: to_vec(&["sports", "fitness"]),
                },
            ],
        }
    }
}

impl SearchVocabulary {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// First category whose phrase occurs in `text` (lowercased input)
    pub fn match_category(&self, text: &str) -> Option<Category> {
        self.categories
            .iter()
            .find(|entry| entry.phrases.iter().any(|p| text.contains(p.as_str())))
            .map(|entry| entry.category)
    }

    pub fn has_search_keyword(&self, text: &str) -> bool {
        self.search_keywords.iter().any(|k| text.contains(k.as_str()))
    }

    pub fn has_history_reference(&self, text: &str) -> bool {
        self.history_patterns.iter().any(|p| text.contains(p.as_str()))
    }
}

/// Tables driving image feature extraction and the feature re-ranker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVocabulary {
    /// Color synonym table, canonical color first
    pub colors: Vec<SynonymEntry>,
    /// Product type synonyms grouped by category
    pub types: Vec<TypeEntry>,
    pub styles: Vec<SynonymEntry>,
    pub materials: Vec<String>,
    /// Product types the catalog actually stocks; drives the
    /// catalog-membership confidence
    pub catalog_types: Vec<String>,
}

/// Product type with the category it implies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeEntry {
    pub category: Category,
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl TypeEntry {
    fn new(category: Category, name: &str, synonyms: &[&str]) -> Self {
        Self {
            category,
            name: name.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.name.as_str()) || self.synonyms.iter().any(|s| text.contains(s.as_str()))
    }
}

impl Default for FeatureVocabulary {
    fn default() -> Self {
        use Category::*;

        Self {
            colors: vec![
                SynonymEntry::new("red", &["crimson", "scarlet", "burgundy", "maroon", "cherry"]),
                SynonymEntry::new("blue", &["navy", "azure", "cobalt", "royal blue", "sky blue"]),
                SynonymEntry::new("green", &["emerald", "forest", "olive", "lime", "mint"]),
                SynonymEntry::new("black", &["dark", "ebony", "charcoal", "jet black"]),
                SynonymEntry::new("white", &["cream", "ivory", "pearl", "snow white", "off-white"]),
                SynonymEntry::new("gray", &["grey", "silver", "slate", "ash", "gunmetal"]),
                SynonymEntry::new("brown", &["tan", "beige", "khaki", "chocolate", "coffee"]),
                SynonymEntry::new("yellow", &["golden", "amber", "lemon", "mustard"]),
                SynonymEntry::new("orange", &["copper", "rust", "coral"]),
                SynonymEntry::new("purple", &["violet", "lavender", "plum", "magenta"]),
                SynonymEntry::new("pink", &["rose", "salmon", "blush", "fuchsia"]),
            ],
            types: vec![
                TypeEntry::new(Clothing, "shirt", &["tee", "t-shirt", "top", "blouse", "tshirt"]),
                TypeEntry::new(Clothing, "pants", &["trousers", "slacks", "chinos", "joggers"]),
                TypeEntry::new(Clothing, "jeans", &["denim"]),
                TypeEntry::new(
                    Clothing,
                    "shoes",
                    &["sneakers", "boots", "sandals", "loafers", "footwear"],
                ),
                TypeEntry::new(
                    Clothing,
                    "jacket",
                    &["blazer", "coat", "hoodie", "cardigan", "sweater"],
                ),
                TypeEntry::new(Clothing, "hat", &["cap", "beanie"]),
                TypeEntry::new(
                    Electronics,
                    "smartphone",
                    &["phone", "mobile", "iphone", "android"],
                ),
                TypeEntry::new(Electronics, "laptop", &["notebook", "computer", "macbook"]),
                TypeEntry::new(Electronics, "tablet", &["ipad"]),
                TypeEntry::new(
                    Electronics,
                    "headphones",
                    &["earbuds", "earphones", "headset"],
                ),
                TypeEntry::new(Electronics, "speaker", &["bluetooth speaker", "sound system"]),
                TypeEntry::new(Electronics, "smartwatch", &["watch", "timepiece"]),
                TypeEntry::new(Electronics, "mouse", &["computer mouse", "gaming mouse"]),
                TypeEntry::new(Home, "lamp", &["light", "lighting"]),
                TypeEntry::new(Home, "pillow", &["cushion"]),
                TypeEntry::new(Home, "blanket", &["throw", "comforter"]),
                TypeEntry::new(Home, "clock", &[]),
                TypeEntry::new(Home, "pot", &["planter", "vase"]),
                TypeEntry::new(Sports, "mat", &["yoga mat", "exercise mat"]),
                TypeEntry::new(Sports, "bottle", &["water bottle", "drink bottle"]),
                TypeEntry::new(Sports, "bag", &["gym bag", "sports bag", "duffel"]),
                TypeEntry::new(Sports, "weights", &["dumbbells", "barbells"]),
            ],
            styles: vec![
                SynonymEntry::new("modern", &["contemporary", "sleek", "minimalist"]),
                SynonymEntry::new("classic", &["traditional", "timeless"]),
                SynonymEntry::new("vintage", &["retro", "old-fashioned"]),
                SynonymEntry::new("casual", &["everyday", "relaxed"]),
                SynonymEntry::new("formal", &["dress", "business", "professional"]),
                SynonymEntry::new("sporty", &["athletic", "active", "performance"]),
            ],
            materials: [
                "cotton",
                "leather",
                "plastic",
                "metal",
                "wood",
                "fabric",
                "wool",
                "synthetic",
                "ceramic",
                "glass",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            catalog_types: [
                "shirt",
                "jeans",
                "shoes",
                "jacket",
                "hoodie",
                "pants",
                "hat",
                "headphones",
                "smartphone",
                "laptop",
                "speaker",
                "smartwatch",
                "tablet",
                "mouse",
                "lamp",
                "pillow",
                "blanket",
                "clock",
                "pot",
                "knife",
                "mat",
                "weights",
                "bottle",
                "bag",
                "ball",
                "racket",
                "helmet",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FeatureVocabulary {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// All canonical colors whose synonym sets occur in `text` (lowercased)
    pub fn match_colors(&self, text: &str) -> Vec<String> {
        self.colors
            .iter()
            .filter(|entry| entry.matches(text))
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// First product type occurring in `text`, with its implied category
    pub fn match_type(&self, text: &str) -> Option<(Category, String)> {
        self.types
            .iter()
            .find(|entry| entry.matches(text))
            .map(|entry| (entry.category, entry.name.clone()))
    }

    pub fn match_style(&self, text: &str) -> Option<String> {
        self.styles
            .iter()
            .find(|entry| entry.matches(text))
            .map(|entry| entry.name.clone())
    }

    pub fn match_material(&self, text: &str) -> Option<String> {
        self.materials
            .iter()
            .find(|m| text.contains(m.as_str()))
            .cloned()
    }

    /// Synonyms for a canonical color, including the color itself
    pub fn color_terms<'a>(&'a self, color: &'a str) -> Vec<&'a str> {
        match self.colors.iter().find(|e| e.name == color) {
            Some(entry) => std::iter::once(entry.name.as_str())
                .chain(entry.synonyms.iter().map(|s| s.as_str()))
                .collect(),
            None => vec![color],
        }
    }

    /// Synonyms for a product type, including the type itself
    pub fn type_terms<'a>(&'a self, item_type: &'a str) -> Vec<&'a str> {
        match self.types.iter().find(|e| e.name == item_type) {
            Some(entry) => std::iter::once(entry.name.as_str())
                .chain(entry.synonyms.iter().map(|s| s.as_str()))
                .collect(),
            None => vec![item_type],
        }
    }

    pub fn is_catalog_type(&self, item_type: &str) -> bool {
        self.catalog_types.iter().any(|t| t == item_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_first_match_wins() {
        let vocab = SearchVocabulary::default();
        // "clothing" is checked before "sports"
        assert_eq!(
            vocab.match_category("clothes for sports"),
            Some(Category::Clothing)
        );
        assert_eq!(vocab.match_category("fitness gear"), Some(Category::Sports));
        assert_eq!(vocab.match_category("something nice"), None);
    }

    #[test]
    fn test_history_reference_detection() {
        let vocab = SearchVocabulary::default();
        assert!(vocab.has_history_reference("what was the price of the first one"));
        assert!(vocab.has_history_reference("the ones you recommended"));
        assert!(!vocab.has_history_reference("show me laptops"));
    }

    #[test]
    fn test_color_synonyms() {
        let vocab = FeatureVocabulary::default();
        let colors = vocab.match_colors("a navy jacket with charcoal lining");
        assert!(colors.contains(&"blue".to_string()));
        assert!(colors.contains(&"black".to_string()));
    }

    #[test]
    fn test_type_implies_category() {
        let vocab = FeatureVocabulary::default();
        let (category, item_type) = vocab.match_type("a pair of sneakers").unwrap();
        assert_eq!(category, Category::Clothing);
        assert_eq!(item_type, "shoes");
    }

    #[test]
    fn test_catalog_types() {
        let vocab = FeatureVocabulary::default();
        assert!(vocab.is_catalog_type("laptop"));
        assert!(!vocab.is_catalog_type("surfboard"));
    }
}

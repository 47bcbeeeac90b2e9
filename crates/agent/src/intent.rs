//! Intent routing and filter extraction
//!
//! Pure functions of the message text, driven by the vocabulary tables.
//! A history-reference phrase always wins over a search keyword: the
//! system answers those from session memory instead of re-searching.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use shop_agent_config::SearchVocabulary;
use shop_agent_core::ProductFilter;

/// Upper price bound: "under $50", "below 50", "less than $50"
static MAX_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:under|below|less\s*than)\s*\$?(\d+)").unwrap());

/// Lower price bound: "over $20", "above 20", "more than $20"
static MIN_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:over|above|more\s*than)\s*\$?(\d+)").unwrap());

/// Per-message routing decisions
pub struct IntentRouter {
    vocabulary: Arc<SearchVocabulary>,
}

impl IntentRouter {
    pub fn new(vocabulary: Arc<SearchVocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Whether this message needs a product search.
    ///
    /// True when a search keyword occurs, unless a history-reference
    /// phrase also matches - backreferences are answered from memory.
    pub fn should_search(&self, message: &str) -> bool {
        let lower = message.to_lowercase();

        if self.vocabulary.has_history_reference(&lower) {
            return false;
        }

        self.vocabulary.has_search_keyword(&lower)
    }

    /// Extract a structured filter from free text.
    ///
    /// Category synonyms are checked in table order, first match wins.
    /// The two price bounds are extracted independently and may both be
    /// set ("over $20 but under $80").
    pub fn extract_filters(&self, message: &str) -> ProductFilter {
        let lower = message.to_lowercase();
        let mut filter = ProductFilter::new();

        filter.category = self.vocabulary.match_category(&lower);

        if let Some(captures) = MAX_PRICE.captures(&lower) {
            if let Ok(value) = captures[1].parse::<f64>() {
                filter.max_price = Some(value);
            }
        }

        if let Some(captures) = MIN_PRICE.captures(&lower) {
            if let Ok(value) = captures[1].parse::<f64>() {
                filter.min_price = Some(value);
            }
        }

        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_agent_core::Category;

    fn router() -> IntentRouter {
        IntentRouter::new(Arc::new(SearchVocabulary::default()))
    }

    #[test]
    fn test_search_keywords_trigger_search() {
        let r = router();
        assert!(r.should_search("Show me laptops"));
        assert!(r.should_search("I'm looking for a gift"));
        assert!(r.should_search("need new running shoes"));
        assert!(!r.should_search("hello there"));
    }

    #[test]
    fn test_history_reference_wins_over_search_keyword() {
        let r = router();
        // "headphones" and "recommend" are search keywords, but the
        // backreference takes precedence
        assert!(!r.should_search("what was the price of the headphones you recommended"));
        assert!(!r.should_search("how much was the first one"));
        assert!(!r.should_search("show me the ones you mentioned earlier"));
    }

    #[test]
    fn test_extract_category_first_match() {
        let r = router();
        let filter = r.extract_filters("show me clothing under $30");
        assert_eq!(filter.category, Some(Category::Clothing));
        assert_eq!(filter.max_price, Some(30.0));
        assert_eq!(filter.min_price, None);
    }

    #[test]
    fn test_extract_both_price_bounds() {
        let r = router();
        let filter = r.extract_filters("electronics over $20 but under $80");
        assert_eq!(filter.category, Some(Category::Electronics));
        assert_eq!(filter.min_price, Some(20.0));
        assert_eq!(filter.max_price, Some(80.0));
    }

    #[test]
    fn test_both_bounds_even_when_inverted() {
        let r = router();
        // Additive, not exclusive: both populate even when N > M makes
        // the range odd
        let filter = r.extract_filters("under $100 and over $10");
        assert_eq!(filter.max_price, Some(100.0));
        assert_eq!(filter.min_price, Some(10.0));
    }

    #[test]
    fn test_price_patterns_tolerate_spacing() {
        let r = router();
        assert_eq!(
            r.extract_filters("less than $50").max_price,
            Some(50.0)
        );
        assert_eq!(r.extract_filters("below 25").max_price, Some(25.0));
        assert_eq!(r.extract_filters("more than 200").min_price, Some(200.0));
    }

    #[test]
    fn test_no_filters() {
        let r = router();
        assert!(r.extract_filters("something nice for my desk").is_empty());
    }
}

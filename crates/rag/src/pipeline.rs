//! RAG answer pipeline
//!
//! Reformulate → retrieve → dedup → grounded generation → citation
//! extraction. The call fails atomically: any retriever or model error
//! propagates and no partial answer is returned.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use shop_agent_core::{
    ChatTurn, GenerateRequest, LanguageModel, Message, Product, ProductFilter, Result,
    RetrievedDocument, Retriever, TurnRole,
};

use crate::reformulate::QueryReformulator;

/// Grounding prompt. The model may only cite products present in the
/// injected context, must use the exact `[product_id: X]` token for each
/// mention, and must not produce markup.
const GROUNDING_PROMPT: &str = "You are a helpful AI shopping assistant for an e-commerce website.
Use the following product information to answer questions and make recommendations.
IMPORTANT: Only recommend products that are actually shown in the context below.
When mentioning a product, include its EXACT id from the context in this format: [product_id: X].
Do NOT make up product IDs - only use the actual IDs from the products shown below.

Product Context:
{context}

Guidelines:
- Only recommend products that appear in the context above
- Use the EXACT product id, name, and price from the context
- If products are found, describe why they match the user's needs
- Include product names, prices, and key features in your recommendations
- You can recommend multiple products if relevant
- If no products match, apologize and suggest alternatives
- Keep responses concise and engaging
- Write plain conversational text without markdown or other markup
- NEVER invent product IDs - only use the ones provided in the context";

static PRODUCT_ID_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[product_id:\s*([A-Za-z0-9_-]+)\]").unwrap());

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct RagPipelineConfig {
    /// Results requested from the retriever
    pub top_k: usize,
    /// Maximum products surfaced after dedup
    pub display_limit: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RagPipelineConfig {
    fn default() -> Self {
        use shop_agent_config::constants::{llm, rag};
        Self {
            top_k: rag::TOP_K,
            display_limit: rag::DISPLAY_LIMIT,
            max_tokens: llm::MAX_TOKENS,
            temperature: llm::TEMPERATURE,
        }
    }
}

/// Result of one grounded answer
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// Answer text, citation tags included
    pub text: String,
    /// Ids of the surfaced products, retrieval order
    pub product_ids: Vec<String>,
    /// Full product details for the surfaced products
    pub products: Vec<Product>,
}

/// Retrieval-augmented answer pipeline
pub struct RagPipeline {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn LanguageModel>,
    reformulator: QueryReformulator,
    config: RagPipelineConfig,
}

impl RagPipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn LanguageModel>,
        reformulator: QueryReformulator,
        config: RagPipelineConfig,
    ) -> Self {
        Self {
            retriever,
            model,
            reformulator,
            config,
        }
    }

    /// Produce a grounded answer for the query.
    ///
    /// History is used only to reformulate the query; the grounding
    /// context is always and only the current retrieval.
    pub async fn answer(
        &self,
        query: &str,
        history: &[ChatTurn],
        filter: &ProductFilter,
    ) -> Result<RagAnswer> {
        let standalone = self.reformulator.reformulate(history, query).await;

        let documents = self
            .retriever
            .retrieve(&standalone, filter, self.config.top_k)
            .await?;

        let documents = dedup_documents(documents, self.config.display_limit);

        let request = self.build_request(&standalone, history, &documents);
        let response = self.model.generate(request).await?;

        let cited = extract_product_ids(&response.text);
        let retrieved_ids: HashSet<&str> =
            documents.iter().map(|d| d.product_id()).collect();
        let invented: Vec<&String> = cited
            .iter()
            .filter(|id| !retrieved_ids.contains(id.as_str()))
            .collect();
        if !invented.is_empty() {
            tracing::warn!(?invented, "Model cited ids outside the retrieved set");
        }

        // The deduplicated retrieval list is authoritative for the
        // surfaced products; citations never add ids beyond it.
        let products: Vec<Product> = documents.into_iter().map(|d| d.product).collect();
        let product_ids = products.iter().map(|p| p.id.clone()).collect();

        Ok(RagAnswer {
            text: response.text,
            product_ids,
            products,
        })
    }

    fn build_request(
        &self,
        query: &str,
        history: &[ChatTurn],
        documents: &[RetrievedDocument],
    ) -> GenerateRequest {
        let context = format_context(documents);
        let system = GROUNDING_PROMPT.replace("{context}", &context);

        let mut request = GenerateRequest::new(system);
        for turn in history {
            let message = match turn.role {
                TurnRole::User => Message::user(turn.content.clone()),
                TurnRole::Assistant => Message::assistant(turn.content.clone()),
            };
            request = request.with_message(message);
        }

        request
            .with_user_message(query)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
    }
}

/// De-duplicate by product id, preserving first-seen order, capped to
/// `limit`
fn dedup_documents(documents: Vec<RetrievedDocument>, limit: usize) -> Vec<RetrievedDocument> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|doc| seen.insert(doc.product.id.clone()))
        .take(limit)
        .collect()
}

/// Render retrieved documents as grounding context
fn format_context(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return "(no matching products)".to_string();
    }

    documents
        .iter()
        .map(|doc| {
            let p = &doc.product;
            format!(
                "id: {}\nname: {}\nprice: ${}\ncategory: {}\ndescription: {}",
                p.id, p.name, p.price, p.category, p.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Extract `[product_id: X]` citation tokens from generated text
pub fn extract_product_ids(text: &str) -> Vec<String> {
    PRODUCT_ID_TAG
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_agent_core::Category;

    fn doc(id: &str, score: f32) -> RetrievedDocument {
        RetrievedDocument::new(
            Product {
                id: id.to_string(),
                name: format!("Product {id}"),
                description: String::new(),
                category: Category::Electronics,
                price: 10.0,
                image: String::new(),
            },
            score,
        )
    }

    #[test]
    fn test_extract_product_ids() {
        let text = "Try this [product_id: 9] or maybe [Product_ID: 12].";
        assert_eq!(extract_product_ids(text), vec!["9", "12"]);
        assert!(extract_product_ids("no tags here").is_empty());
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let docs = vec![doc("1", 0.9), doc("2", 0.8), doc("1", 0.7), doc("3", 0.6)];
        let deduped = dedup_documents(docs, 4);
        let ids: Vec<&str> = deduped.iter().map(|d| d.product_id()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_dedup_respects_display_cap() {
        let docs = (0..10).map(|i| doc(&i.to_string(), 0.5)).collect();
        let deduped = dedup_documents(docs, 4);
        assert_eq!(deduped.len(), 4);
    }

    #[test]
    fn test_format_context_contains_exact_ids() {
        let context = format_context(&[doc("42", 0.9)]);
        assert!(context.contains("id: 42"));
        assert!(context.contains("Product 42"));
    }
}

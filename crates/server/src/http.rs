//! HTTP endpoints
//!
//! REST API for the shopping assistant. Input validation lives here so
//! bad requests never reach the core.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use shop_agent_config::constants::limits;
use shop_agent_core::{ImageAnalysis, Product, ProductFilter};
use shop_agent_rag::ScoredProduct;

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    // Multipart bodies carry the image plus field overhead
    let body_limit = server.max_image_bytes + 64 * 1024;

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/search/products", post(search_products))
        .route("/api/search/image", post(search_image))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin, skipping");
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatApiResponse {
    response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<Vec<Product>>,
    session_id: String,
    /// Model currently serving requests
    model: String,
}

/// POST /api/chat
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatApiResponse>, ServerError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ServerError::Validation(
            "Message is required and must not be empty".to_string(),
        ));
    }
    let max_len = state.settings.server.max_message_len;
    if message.len() > max_len {
        return Err(ServerError::Validation(format!(
            "Message too long (max {max_len} characters)"
        )));
    }

    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("session_{}", uuid::Uuid::new_v4()));

    let result = state.agent.process_message(&session_id, message).await?;

    Ok(Json(ChatApiResponse {
        response: result.response,
        products: non_empty(result.products),
        session_id: result.session_id,
        model: state.hierarchy.current(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductSearchRequest {
    query: String,
    #[serde(default)]
    filters: Option<ApiFilter>,
    #[serde(default = "default_true")]
    use_rag: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFilter {
    category: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

impl ApiFilter {
    fn into_product_filter(self) -> ProductFilter {
        ProductFilter {
            category: self
                .category
                .as_deref()
                .and_then(shop_agent_core::Category::parse),
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductSearchResponse {
    products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    query: String,
}

/// POST /api/search/products
async fn search_products(
    State(state): State<AppState>,
    Json(request): Json<ProductSearchRequest>,
) -> Result<Json<ProductSearchResponse>, ServerError> {
    let query = request.query.trim().to_string();
    if query.is_empty() {
        return Err(ServerError::Validation("Query is required".to_string()));
    }

    let filter = request
        .filters
        .unwrap_or_default()
        .into_product_filter();

    if request.use_rag {
        let answer = state.rag.answer(&query, &[], &filter).await?;
        Ok(Json(ProductSearchResponse {
            products: answer.products,
            response: Some(answer.text),
            query,
        }))
    } else {
        let documents = state.retriever.retrieve(&query, &filter, 0).await?;
        Ok(Json(ProductSearchResponse {
            products: documents.into_iter().map(|d| d.product).collect(),
            response: None,
            query,
        }))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductHit {
    #[serde(flatten)]
    product: Product,
    relevance_score: f32,
}

impl From<ScoredProduct> for ProductHit {
    fn from(scored: ScoredProduct) -> Self {
        Self {
            product: scored.product,
            relevance_score: scored.score,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSearchResponse {
    success: bool,
    image_analysis: ImageAnalysis,
    search_query: String,
    products: Vec<ProductHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    confidence: f32,
    catalog_confidence: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<String>,
    is_in_catalog: bool,
}

/// POST /api/search/image (multipart: image, useRAG)
async fn search_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageSearchResponse>, ServerError> {
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut use_rag = true;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("image") => {
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::Validation(format!("Failed to read image: {e}")))?;
                image = Some((bytes.to_vec(), mime));
            },
            Some("useRAG") => {
                let value = field.text().await.unwrap_or_default();
                use_rag = value.trim() != "false";
            },
            _ => {},
        }
    }

    let (bytes, mime) = image
        .ok_or_else(|| ServerError::Validation("An image file is required".to_string()))?;

    if !limits::ALLOWED_IMAGE_MIME.contains(&mime.as_str()) {
        return Err(ServerError::Validation(
            "Please upload a JPEG, PNG, or WebP image".to_string(),
        ));
    }
    let max_bytes = state.settings.server.max_image_bytes;
    if bytes.len() > max_bytes {
        return Err(ServerError::Validation(format!(
            "Image must be less than {} MB",
            max_bytes / (1024 * 1024)
        )));
    }

    let result = state.image_search.search(&bytes, &mime, use_rag).await?;

    Ok(Json(ImageSearchResponse {
        success: true,
        confidence: result.analysis.confidence,
        catalog_confidence: result.analysis.catalog_confidence,
        image_analysis: result.analysis,
        search_query: result.search_query,
        products: result.products.into_iter().map(ProductHit::from).collect(),
        response: result.response,
        suggestions: result.suggestions,
        is_in_catalog: result.is_in_catalog,
    }))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.memory.count(),
        "model": state.hierarchy.current(),
    }))
}

fn non_empty(products: Vec<Product>) -> Option<Vec<Product>> {
    if products.is_empty() {
        None
    } else {
        Some(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_filter_conversion() {
        let filter = ApiFilter {
            category: Some("clothing".to_string()),
            min_price: None,
            max_price: Some(30.0),
        }
        .into_product_filter();

        assert_eq!(filter.category, Some(shop_agent_core::Category::Clothing));
        assert_eq!(filter.max_price, Some(30.0));

        let filter = ApiFilter {
            category: Some("vehicles".to_string()),
            ..Default::default()
        }
        .into_product_filter();
        assert!(filter.category.is_none());
    }

    #[test]
    fn test_chat_request_accepts_camel_case() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","sessionId":"s1"}"#).unwrap();
        assert_eq!(request.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_products_omitted_when_empty() {
        let response = ChatApiResponse {
            response: "hello".to_string(),
            products: non_empty(Vec::new()),
            session_id: "s1".to_string(),
            model: "primary".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("products"));
    }
}

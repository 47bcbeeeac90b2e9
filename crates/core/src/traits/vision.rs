//! Vision model trait

use async_trait::async_trait;

use crate::error::Result;

/// Image description interface for the image-to-query bridge.
///
/// Called up to twice per request: once with the structured-JSON
/// instruction, once with the multiple-choice fallback instruction.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Describe an image following the given instruction prompt
    async fn describe(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<String>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

// ABOUTME: Recommendation client wrapping image upload and the single completion call per turn
// ABOUTME: Turns raw model output into Structured, Fallback, or Error results without ever failing the turn

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vitrine_ai::{inline_data_url, CompletionService};
use vitrine_core::{ImageAttachment, ImageRef};

use crate::collaborators::ImageStore;
use crate::error::{DiscoveryError, Result};
use crate::prompt::PromptRequest;
use crate::reply::{parse_reply, ModelReply};

/// An image that has reached durable storage and is ready to be sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Durable reference recorded on the user turn
    pub reference: ImageRef,
    /// Inline encoding the model can read even when the durable URL is private
    pub inline_url: String,
}

/// Outcome of one completion round-trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationResult {
    Structured(ModelReply),
    /// The reply did not satisfy the schema; `message` holds the raw text
    Fallback(ModelReply),
    Error { message: String },
}

impl RecommendationResult {
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendationResult::Structured(_) => "structured",
            RecommendationResult::Fallback(_) => "fallback",
            RecommendationResult::Error { .. } => "error",
        }
    }
}

pub struct RecommendationClient {
    completion: Arc<dyn CompletionService>,
    images: Arc<dyn ImageStore>,
}

impl RecommendationClient {
    pub fn new(completion: Arc<dyn CompletionService>, images: Arc<dyn ImageStore>) -> Self {
        Self { completion, images }
    }

    pub fn has_credentials(&self) -> bool {
        self.completion.has_credentials()
    }

    /// Upload a staged image to durable storage and encode it for the model
    pub async fn upload_attachment(&self, attachment: &ImageAttachment) -> Result<UploadedImage> {
        info!(
            "Uploading image attachment ({} bytes, {})",
            attachment.len(),
            attachment.content_type()
        );

        let reference = self
            .images
            .upload(attachment.bytes(), attachment.content_type())
            .await
            .map_err(|e| {
                error!("Image upload failed: {}", e);
                DiscoveryError::Upload(e.to_string())
            })?;

        Ok(UploadedImage {
            reference,
            inline_url: inline_data_url(attachment.bytes(), attachment.content_type()),
        })
    }

    /// Issue the completion call and classify the reply. Never retries.
    pub async fn complete(
        &self,
        request: &PromptRequest,
        cancel: &CancellationToken,
    ) -> RecommendationResult {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Recommendation request cancelled");
                return RecommendationResult::Error {
                    message: "The request was cancelled".to_string(),
                };
            }
            response = self.completion.complete(&request.messages) => response,
        };

        let raw = match response {
            Ok(response) => response.data,
            Err(e) => {
                error!("Recommendation request failed: {}", e);
                return RecommendationResult::Error {
                    message: e.to_string(),
                };
            }
        };

        match parse_reply(&raw) {
            Some(reply) => {
                info!(
                    "Model reply parsed: {} recommendations",
                    reply.recommendations.len()
                );
                RecommendationResult::Structured(reply)
            }
            None => {
                warn!(
                    "Model reply did not match the schema, using raw text ({} chars)",
                    raw.chars().count()
                );
                RecommendationResult::Fallback(ModelReply::fallback(raw))
            }
        }
    }
}

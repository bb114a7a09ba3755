// ABOUTME: Builds the grounded completion request for one discovery turn
// ABOUTME: System instruction with output schema, catalog excerpt, preferences, history window, current turn

use serde::Serialize;
use tracing::debug;
use vitrine_ai::CompletionMessage;
use vitrine_core::{ChatMessage, MessageRole, Preferences, Product};

use crate::client::UploadedImage;

/// Text sent alongside an image when the user typed nothing
pub const IMAGE_ONLY_PROMPT: &str = "Find products in the catalog that match this image.";

const SYSTEM_INSTRUCTION: &str = r#"You are a shopping assistant embedded in an online store. You help customers discover products from the store's catalog, explain why each product fits their needs, and suggest useful follow-up questions.

Rules:
- Recommend ONLY products whose "id" appears in the CATALOG below. Never invent ids.
- Recommend at most 5 products, each with a matchScore of at least 70.
- Respond in the same language as the catalog and the customer.
- Respond with JSON ONLY, no prose and no markdown, in exactly this shape:
{ "message": string, "recommendations": [{"productId": string, "reason": string, "matchScore": 0-100}], "reasoning": string, "suggestions": [string, string, string] }
- "message" is the conversational reply shown to the customer.
- "reasoning" briefly explains how you chose the recommendations.
- "suggestions" are exactly three short follow-up queries the customer might ask next.
- If nothing in the catalog fits, return an empty "recommendations" array and say so in "message"."#;

/// Minimal product projection sent to the model
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExcerptItem<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    brand: Option<&'a str>,
    category: &'a str,
    price: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sales_count: Option<u64>,
}

impl<'a> From<&'a Product> for ExcerptItem<'a> {
    fn from(p: &'a Product) -> Self {
        Self {
            id: &p.id,
            name: &p.name,
            brand: p.brand.as_deref(),
            category: &p.category,
            price: p.price,
            rating: p.rating,
            sales_count: p.sales_count,
        }
    }
}

/// Everything the builder needs for one turn
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub utterance: &'a str,
    pub image: Option<&'a UploadedImage>,
    pub catalog_excerpt: &'a [Product],
    pub history: &'a [ChatMessage],
    pub preferences: &'a Preferences,
}

/// A ready-to-send completion request
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub messages: Vec<CompletionMessage>,
}

impl PromptRequest {
    pub fn image_count(&self) -> usize {
        self.messages.iter().map(|m| m.content.image_count()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    excerpt_size: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CATALOG_EXCERPT_SIZE)
    }
}

impl PromptBuilder {
    pub fn new(excerpt_size: usize) -> Self {
        Self { excerpt_size }
    }

    /// The fixed role and output-schema instruction
    pub fn system_instruction() -> &'static str {
        SYSTEM_INSTRUCTION
    }

    pub fn build(&self, input: PromptInput<'_>) -> PromptRequest {
        let mut messages = Vec::with_capacity(input.history.len() + 2);
        messages.push(CompletionMessage::system(self.render_context(
            input.catalog_excerpt,
            input.preferences,
        )));

        for turn in input.history {
            messages.push(match turn.role {
                MessageRole::User => CompletionMessage::user(turn.content.clone()),
                MessageRole::Assistant => CompletionMessage::assistant(turn.content.clone()),
            });
        }

        let text = if input.utterance.trim().is_empty() && input.image.is_some() {
            IMAGE_ONLY_PROMPT.to_string()
        } else {
            input.utterance.to_string()
        };

        messages.push(match input.image {
            Some(image) => CompletionMessage::user_with_image(text, image.inline_url.clone()),
            None => CompletionMessage::user(text),
        });

        debug!(
            "Built prompt: {} messages, {} history turns, image={}",
            messages.len(),
            input.history.len(),
            input.image.is_some()
        );

        PromptRequest { messages }
    }

    fn render_context(&self, excerpt: &[Product], preferences: &Preferences) -> String {
        let items: Vec<ExcerptItem<'_>> = excerpt
            .iter()
            .take(self.excerpt_size)
            .map(ExcerptItem::from)
            .collect();
        // Serializing plain structs of strings and numbers cannot fail
        let catalog = serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string());

        let preferences = if preferences.is_empty() {
            "none".to_string()
        } else {
            serde_json::to_string(preferences).unwrap_or_else(|_| "none".to_string())
        };

        format!(
            "{}\n\nCATALOG:\n{}\n\nCUSTOMER PREFERENCES:\n{}",
            SYSTEM_INSTRUCTION, catalog, preferences
        )
    }
}

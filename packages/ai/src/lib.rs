// ABOUTME: Completion endpoint integration for Vitrine
// ABOUTME: OpenAI-style chat completion client, wire types, and inline image encoding

pub mod image;
pub mod service;
pub mod types;

// Re-export service types
pub use service::{
    AIResponse, AIServiceError, AIServiceResult, CompletionClient, CompletionConfig,
    CompletionService,
};

// Re-export wire types
pub use types::{
    CompletionMessage, CompletionRole, ContentPart, ImageDetail, ImageUrl, MessageContent, Usage,
};

pub use image::inline_data_url;

// ABOUTME: Core types, constants, and utilities for Vitrine
// ABOUTME: Foundational package providing the shared data model across all Vitrine packages

pub mod constants;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{
    CatalogFilter, CatalogSort, ChatMessage, Feedback, ImageRef, MessageFlag, MessageRole,
    Preferences, Product, ProductStatus, RecommendationCandidate, ResolvedRecommendation,
    SearchContext,
};

// Re-export constants
pub use constants::{
    default_suggestions, ALLOWED_IMAGE_TYPES, DEFAULT_MAX_IMAGE_BYTES, MAX_MATCH_SCORE,
    MIN_QUERY_LENGTH,
};

// Re-export utilities
pub use utils::{generate_message_id, truncate};

// Re-export validation
pub use validation::{validate_image, validate_utterance, ImageAttachment, ValidationError};

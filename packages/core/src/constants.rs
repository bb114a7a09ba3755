// ABOUTME: Shared constants for catalog search, image staging, and suggestion chips
// ABOUTME: Values every Vitrine package agrees on

/// Trimmed queries shorter than this do not filter the catalog
pub const MIN_QUERY_LENGTH: usize = 2;

/// Upper bound of a model-asserted match score
pub const MAX_MATCH_SCORE: i64 = 100;

/// Default upload limit for a staged image (5 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Content types accepted for image attachments
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Suggestion chips offered when the model gives none (or its reply could not be parsed)
pub fn default_suggestions() -> Vec<String> {
    vec![
        "Show me your best sellers".to_string(),
        "What fits a tighter budget?".to_string(),
        "Compare the top rated options".to_string(),
    ]
}

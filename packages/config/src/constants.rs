// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Vitrine

// Completion Endpoint
pub const VITRINE_COMPLETION_URL: &str = "VITRINE_COMPLETION_URL";
pub const VITRINE_COMPLETION_API_KEY: &str = "VITRINE_COMPLETION_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY"; // Fallback
pub const VITRINE_COMPLETION_MODEL: &str = "VITRINE_COMPLETION_MODEL";
pub const VITRINE_COMPLETION_MAX_TOKENS: &str = "VITRINE_COMPLETION_MAX_TOKENS";
pub const VITRINE_COMPLETION_TEMPERATURE: &str = "VITRINE_COMPLETION_TEMPERATURE";
pub const VITRINE_COMPLETION_TIMEOUT_SECS: &str = "VITRINE_COMPLETION_TIMEOUT_SECS";
pub const VITRINE_COMPLETION_CONNECT_TIMEOUT_SECS: &str =
    "VITRINE_COMPLETION_CONNECT_TIMEOUT_SECS";

// Prompt Grounding
pub const VITRINE_CATALOG_EXCERPT_SIZE: &str = "VITRINE_CATALOG_EXCERPT_SIZE";
pub const VITRINE_HISTORY_WINDOW: &str = "VITRINE_HISTORY_WINDOW";

// Recommendation Resolution
pub const VITRINE_RESOLVER_MAX_RESULTS: &str = "VITRINE_RESOLVER_MAX_RESULTS";
pub const VITRINE_RESOLVER_MIN_SCORE: &str = "VITRINE_RESOLVER_MIN_SCORE";

// Display
pub const VITRINE_FILTER_DEBOUNCE_MS: &str = "VITRINE_FILTER_DEBOUNCE_MS";

// Image Attachments
pub const VITRINE_MAX_IMAGE_BYTES: &str = "VITRINE_MAX_IMAGE_BYTES";

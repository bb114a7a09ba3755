// ABOUTME: Error types for the discovery package
// ABOUTME: Pre-flight failures that block a send, plus catalog and cart boundary errors

use thiserror::Error;
use vitrine_core::ValidationError;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("No completion API key configured")]
    MissingCredential,

    #[error("A recommendation request is already in progress")]
    Busy,

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Catalog unavailable: {0}")]
    Catalog(String),

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Cart error: {0}")]
    Cart(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("No suggestion at position {0}")]
    SuggestionNotFound(usize),

    #[error("No tokio runtime available: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

// ABOUTME: Vitrine discovery library - conversational product recommendations grounded in the catalog
// ABOUTME: Catalog and conversation stores, prompt building, model reply validation, resolution, and display

pub mod catalog;
pub mod client;
pub mod collaborators;
pub mod config;
pub mod conversation;
pub mod display;
pub mod error;
pub mod prompt;
pub mod reply;
pub mod resolver;
pub mod session;

pub use catalog::CatalogStore;
pub use client::{RecommendationClient, RecommendationResult, UploadedImage};
pub use collaborators::{CartService, CatalogSource, ImageStore};
pub use config::DiscoveryConfig;
pub use conversation::ConversationStore;
pub use display::{DisplayCoordinator, FilterDebouncer, VisibleProducts};
pub use error::{DiscoveryError, Result};
pub use prompt::{PromptBuilder, PromptInput, PromptRequest};
pub use reply::{parse_reply, ModelRecommendation, ModelReply};
pub use resolver::{RecommendationResolver, ResolverPolicy};
pub use session::{DiscoveryServices, DiscoverySession, ReplyKind, SendOutcome};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{DiscoveryError, Result};
    pub use crate::session::{DiscoveryServices, DiscoverySession, ReplyKind, SendOutcome};
    pub use crate::display::VisibleProducts;
    pub use vitrine_core::{
        CatalogFilter, CatalogSort, ChatMessage, Feedback, MessageFlag, MessageRole, Preferences,
        Product, ResolvedRecommendation,
    };
}

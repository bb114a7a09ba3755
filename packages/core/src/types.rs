// ABOUTME: Domain data model for catalog products and discovery conversations
// ABOUTME: Products, chat messages, recommendation candidates, search provenance, and preferences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::generate_message_id;

/// Lifecycle status of a catalog item; only active items are ever shown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

/// A catalog item. Immutable within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in the minor currency unit
    pub price: u64,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub sales_count: Option<u64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: ProductStatus,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Case-insensitive substring match over name, brand, and description.
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        let hit = |field: &str| field.to_lowercase().contains(needle);
        hit(&self.name)
            || self.brand.as_deref().is_some_and(hit)
            || self.description.as_deref().is_some_and(hit)
    }
}

/// Sort order for the locally browsed catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    /// Sales count, highest first
    #[default]
    Popularity,
    PriceAsc,
    PriceDesc,
    RatingDesc,
}

/// Local (non-AI) browse parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogFilter {
    pub query: String,
    pub category: Option<String>,
    pub sort: CatalogSort,
}

impl CatalogFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sort(mut self, sort: CatalogSort) -> Self {
        self.sort = sort;
        self
    }
}

/// Durable reference to an uploaded image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Marks turns that must not be fed back to the model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageFlag {
    #[default]
    None,
    Error,
    System,
}

/// A model-asserted recommendation that survived catalog lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCandidate {
    pub product_id: String,
    /// Always within 0..=100
    pub match_score: u8,
    pub reason: String,
}

/// A recommendation candidate annotated with the catalog's current product data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedRecommendation {
    pub candidate: RecommendationCandidate,
    pub product: Product,
}

impl ResolvedRecommendation {
    pub fn match_score(&self) -> u8 {
        self.candidate.match_score
    }

    pub fn product_id(&self) -> &str {
        &self.product.id
    }
}

/// One turn of the discovery conversation. Never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub image_ref: Option<ImageRef>,
    pub products: Option<Vec<ResolvedRecommendation>>,
    pub reasoning: Option<String>,
    pub suggestions: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
    pub flags: MessageFlag,
}

impl ChatMessage {
    fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: generate_message_id(),
            role,
            content,
            image_ref: None,
            products: None,
            reasoning: None,
            suggestions: None,
            timestamp: Utc::now(),
            flags: MessageFlag::None,
        }
    }

    pub fn user(content: impl Into<String>, image_ref: Option<ImageRef>) -> Self {
        Self {
            image_ref,
            ..Self::new(MessageRole::User, content.into())
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into())
    }

    pub fn with_products(mut self, products: Vec<ResolvedRecommendation>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        let reasoning = reasoning.into();
        if !reasoning.is_empty() {
            self.reasoning = Some(reasoning);
        }
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }

    pub fn with_flag(mut self, flag: MessageFlag) -> Self {
        self.flags = flag;
        self
    }

    /// Whether this turn may appear in the model-facing history window
    pub fn is_promptable(&self) -> bool {
        self.flags == MessageFlag::None
    }

    pub fn product_count(&self) -> usize {
        self.products.as_ref().map_or(0, Vec::len)
    }
}

/// Provenance of the currently displayed AI result set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchContext {
    pub query: String,
    pub image_ref: Option<ImageRef>,
    pub produced_at: DateTime<Utc>,
}

impl SearchContext {
    pub fn new(query: impl Into<String>, image_ref: Option<ImageRef>) -> Self {
        Self {
            query: query.into(),
            image_ref,
            produced_at: Utc::now(),
        }
    }
}

/// User shopping preferences passed through to the prompt as-is
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Budget in the minor currency unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_brands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_categories: Vec<String>,
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self.budget.is_none()
            && self.preferred_brands.is_empty()
            && self.preferred_categories.is_empty()
    }
}

/// Feedback a user leaves on an assistant turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Helpful,
    NotHelpful,
}

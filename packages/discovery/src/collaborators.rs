// ABOUTME: Interfaces of the external collaborators the discovery engine calls
// ABOUTME: Catalog listing, durable image upload, and the cart add boundary

use async_trait::async_trait;
use vitrine_core::{ImageRef, Product};

/// Source of catalog items. Only the read path is used.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List every product whose status is active
    async fn list_active_products(&self) -> anyhow::Result<Vec<Product>>;
}

/// Durable storage for uploaded images
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, bytes: &[u8], content_type: &str) -> anyhow::Result<ImageRef>;
}

#[async_trait]
pub trait CartService: Send + Sync {
    async fn add(&self, product_id: &str, quantity: u32) -> anyhow::Result<()>;
}

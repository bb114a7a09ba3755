// ABOUTME: Common test utilities for discovery integration tests
// ABOUTME: Scripted completion service, in-memory collaborators, and session setup helpers

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use vitrine_ai::{AIResponse, AIServiceError, AIServiceResult, CompletionMessage, CompletionService};
use vitrine_core::{ImageRef, Product, ProductStatus};
use vitrine_discovery::{
    CartService, CatalogSource, DiscoveryConfig, DiscoveryServices, DiscoverySession, ImageStore,
};

/// Completion service that replays scripted replies and records every request
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<CompletionMessage>>>,
    calls: AtomicUsize,
    missing_credentials: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits for a `notify_one` on the returned handle before replying
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let completion = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (completion, gate)
    }

    pub fn without_credentials(self) -> Self {
        self.missing_credentials.store(true, Ordering::SeqCst);
        self
    }

    pub fn reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Vec<CompletionMessage> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }

    /// Yield until `n` calls have reached the service
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn has_credentials(&self) -> bool {
        !self.missing_credentials.load(Ordering::SeqCst)
    }

    async fn complete(&self, messages: &[CompletionMessage]) -> AIServiceResult<AIResponse<String>> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(AIResponse {
                data: text,
                usage: None,
            }),
            Some(Err(message)) => Err(AIServiceError::ApiError(message)),
            None => Err(AIServiceError::InvalidResponse),
        }
    }
}

pub struct StaticCatalog {
    products: Option<Vec<Product>>,
    pub calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Some(products),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            products: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_active_products(&self) -> anyhow::Result<Vec<Product>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.products
            .clone()
            .ok_or_else(|| anyhow::anyhow!("catalog service unreachable"))
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    pub fail: AtomicBool,
    pub uploads: Mutex<Vec<(usize, String)>>,
    started: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl MemoryImageStore {
    /// Every upload waits for a `notify_one` on the returned handle before storing
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let store = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (store, gate)
    }

    /// Yield until `n` uploads have started
    pub async fn wait_for_uploads(&self, n: usize) {
        while self.started.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, bytes: &[u8], content_type: &str) -> anyhow::Result<ImageRef> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("storage quota exceeded");
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((bytes.len(), content_type.to_string()));
        Ok(ImageRef::new(format!(
            "https://store.example.com/uploads/{}",
            uploads.len()
        )))
    }
}

#[derive(Default)]
pub struct RecordingCart {
    pub fail: AtomicBool,
    pub items: Mutex<Vec<(String, u32)>>,
}

#[async_trait]
impl CartService for RecordingCart {
    async fn add(&self, product_id: &str, quantity: u32) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("cart service rejected the request");
        }
        self.items
            .lock()
            .unwrap()
            .push((product_id.to_string(), quantity));
        Ok(())
    }
}

pub fn product(id: &str, name: &str, category: &str, price: u64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        brand: Some("Acme".to_string()),
        category: category.to_string(),
        description: None,
        price,
        rating: Some(4.5),
        sales_count: Some(10),
        images: vec![format!("https://cdn.example.com/{}.png", id)],
        status: ProductStatus::Active,
    }
}

pub fn dental_catalog() -> Vec<Product> {
    vec![
        product("p1", "ZirKast Block", "zirconia", 50_000),
        product("p2", "Implant Driver", "implants", 12_000),
        product("p3", "Bur Kit", "tools", 8_000),
    ]
}

/// Session under test plus handles to its collaborators
pub struct TestSession {
    pub session: Arc<DiscoverySession>,
    pub completion: Arc<ScriptedCompletion>,
    pub catalog: Arc<StaticCatalog>,
    pub images: Arc<MemoryImageStore>,
    pub cart: Arc<RecordingCart>,
}

pub fn setup_session(completion: ScriptedCompletion, catalog: StaticCatalog) -> TestSession {
    setup_session_with_images(completion, catalog, MemoryImageStore::default())
}

pub fn setup_session_with_images(
    completion: ScriptedCompletion,
    catalog: StaticCatalog,
    images: MemoryImageStore,
) -> TestSession {
    let completion = Arc::new(completion);
    let catalog = Arc::new(catalog);
    let images = Arc::new(images);
    let cart = Arc::new(RecordingCart::default());

    let services = DiscoveryServices {
        catalog_source: catalog.clone(),
        image_store: images.clone(),
        completion: completion.clone(),
        cart: cart.clone(),
    };

    TestSession {
        session: Arc::new(DiscoverySession::new(DiscoveryConfig::default(), services).unwrap()),
        completion,
        catalog,
        images,
        cart,
    }
}

/// Session with the dental catalog already loaded
pub async fn loaded_session(completion: ScriptedCompletion) -> TestSession {
    loaded_session_with_images(completion, MemoryImageStore::default()).await
}

pub async fn loaded_session_with_images(
    completion: ScriptedCompletion,
    images: MemoryImageStore,
) -> TestSession {
    let ctx = setup_session_with_images(completion, StaticCatalog::new(dental_catalog()), images);
    ctx.session.load_catalog().await.unwrap();
    ctx
}

pub fn services(completion: ScriptedCompletion) -> DiscoveryServices {
    DiscoveryServices {
        catalog_source: Arc::new(StaticCatalog::new(dental_catalog())),
        image_store: Arc::new(MemoryImageStore::default()),
        completion: Arc::new(completion),
        cart: Arc::new(RecordingCart::default()),
    }
}

pub fn structured_reply(recommendations: &[(&str, u8)]) -> String {
    let recommendations: Vec<serde_json::Value> = recommendations
        .iter()
        .map(|(id, score)| {
            serde_json::json!({ "productId": id, "reason": format!("{} matches", id), "matchScore": score })
        })
        .collect();
    serde_json::json!({
        "message": "Here are some options",
        "recommendations": recommendations,
        "reasoning": "matched on category",
        "suggestions": ["cheaper options", "best rated", "similar brands"]
    })
    .to_string()
}

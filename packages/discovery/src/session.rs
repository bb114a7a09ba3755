// ABOUTME: Discovery session orchestrating one storefront user's conversation with the recommender
// ABOUTME: Owns the stores, runs the send round-trip, and exposes local filtering and cart actions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vitrine_ai::CompletionService;
use vitrine_core::{
    default_suggestions, truncate, validate_image, validate_utterance, CatalogFilter, ChatMessage,
    Feedback, ImageAttachment, MessageFlag, Preferences, SearchContext,
};

use crate::catalog::CatalogStore;
use crate::client::{RecommendationClient, RecommendationResult};
use crate::collaborators::{CartService, CatalogSource, ImageStore};
use crate::config::DiscoveryConfig;
use crate::conversation::ConversationStore;
use crate::display::{DisplayCoordinator, FilterDebouncer, VisibleProducts};
use crate::error::{DiscoveryError, Result};
use crate::prompt::{PromptBuilder, PromptInput};
use crate::resolver::RecommendationResolver;

const ERROR_REPLY_PREFIX: &str = "Sorry, something went wrong while finding recommendations";
/// Upper bound on failure detail shown in an error turn; the full text goes to the log
pub const MAX_ERROR_DETAIL_CHARS: usize = 160;

/// External collaborators a session talks to
#[derive(Clone)]
pub struct DiscoveryServices {
    pub catalog_source: Arc<dyn CatalogSource>,
    pub image_store: Arc<dyn ImageStore>,
    pub completion: Arc<dyn CompletionService>,
    pub cart: Arc<dyn CartService>,
}

/// How a round-trip ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Structured,
    Fallback,
    Error,
    /// The conversation was reset while the request was outstanding; nothing was appended
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub kind: ReplyKind,
    /// The assistant turn that was appended, if any
    pub message: Option<ChatMessage>,
    /// Number of recommendations promoted to the visible list
    pub promoted: usize,
}

impl SendOutcome {
    fn discarded() -> Self {
        Self {
            kind: ReplyKind::Discarded,
            message: None,
            promoted: 0,
        }
    }
}

/// Held for the whole send, upload included. Released on drop.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct DiscoverySession {
    config: DiscoveryConfig,
    catalog: Arc<CatalogStore>,
    conversation: Mutex<ConversationStore>,
    display: Arc<Mutex<DisplayCoordinator>>,
    debouncer: FilterDebouncer,
    prompts: PromptBuilder,
    client: RecommendationClient,
    resolver: RecommendationResolver,
    staged_image: Mutex<Option<ImageAttachment>>,
    preferences: Mutex<Preferences>,
    in_flight: AtomicBool,
    active_request: Mutex<Option<CancellationToken>>,
    catalog_source: Arc<dyn CatalogSource>,
    cart: Arc<dyn CartService>,
}

impl DiscoverySession {
    /// Create a session. Fails with [`DiscoveryError::Runtime`] outside a tokio runtime.
    pub fn new(config: DiscoveryConfig, services: DiscoveryServices) -> Result<Self> {
        let catalog = Arc::new(CatalogStore::new());
        let display = Arc::new(Mutex::new(DisplayCoordinator::new()));
        let debouncer = FilterDebouncer::spawn(
            config.filter_debounce,
            Arc::clone(&catalog),
            Arc::clone(&display),
        )?;

        Ok(Self {
            conversation: Mutex::new(ConversationStore::new(config.welcome_message.clone())),
            prompts: PromptBuilder::new(config.catalog_excerpt_size),
            client: RecommendationClient::new(services.completion, services.image_store),
            resolver: RecommendationResolver::new(config.resolver),
            staged_image: Mutex::new(None),
            preferences: Mutex::new(Preferences::default()),
            in_flight: AtomicBool::new(false),
            active_request: Mutex::new(None),
            catalog_source: services.catalog_source,
            cart: services.cart,
            config,
            catalog,
            display,
            debouncer,
        })
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Load the catalog snapshot once. A failed load leaves an empty catalog and an error flag.
    pub async fn load_catalog(&self) -> Result<usize> {
        let result = self.catalog.load(self.catalog_source.as_ref()).await;
        self.display.lock().await.refresh_catalog_view(&self.catalog);
        result
    }

    /// Replace the catalog snapshot. A failed refresh keeps the previous snapshot.
    pub async fn refresh_catalog(&self) -> Result<usize> {
        let result = self.catalog.refresh(self.catalog_source.as_ref()).await;
        self.display.lock().await.refresh_catalog_view(&self.catalog);
        result
    }

    pub fn categories(&self) -> Vec<String> {
        self.catalog.categories()
    }

    /// Validate and stage an image for the next send, replacing any staged image
    pub async fn stage_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let attachment = validate_image(bytes, content_type, self.config.max_image_bytes)?;
        info!(
            "Staged image attachment ({} bytes, {})",
            attachment.len(),
            attachment.content_type()
        );
        *self.staged_image.lock().await = Some(attachment);
        Ok(())
    }

    pub async fn clear_staged_image(&self) {
        if self.staged_image.lock().await.take().is_some() {
            debug!("Cleared staged image attachment");
        }
    }

    pub async fn has_staged_image(&self) -> bool {
        self.staged_image.lock().await.is_some()
    }

    pub async fn set_preferences(&self, preferences: Preferences) {
        *self.preferences.lock().await = preferences;
    }

    pub async fn preferences(&self) -> Preferences {
        self.preferences.lock().await.clone()
    }

    /// Run one recommendation round-trip for `utterance` and any staged image
    pub async fn send(&self, utterance: &str) -> Result<SendOutcome> {
        self.send_with_cancel(utterance, CancellationToken::new())
            .await
    }

    /// Like [`send`](Self::send), but honours `cancel`. Cancelling during the image upload
    /// discards the send; cancelling during the completion call ends it with an error turn.
    pub async fn send_with_cancel(
        &self,
        utterance: &str,
        cancel: CancellationToken,
    ) -> Result<SendOutcome> {
        let staged = self.staged_image.lock().await.clone();
        let utterance = validate_utterance(utterance, staged.is_some())?;

        if !self.client.has_credentials() {
            warn!("Refusing to send: no completion credential configured");
            return Err(DiscoveryError::MissingCredential);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("Refusing to send: a recommendation request is already in progress");
            return Err(DiscoveryError::Busy);
        };

        // Registered before the upload so a reset can reach every stage of the round-trip
        let token = cancel.child_token();
        *self.active_request.lock().await = Some(token.clone());
        let epoch = self.conversation.lock().await.epoch();

        let outcome = self
            .round_trip(utterance, staged, epoch, &token)
            .await;
        self.active_request.lock().await.take();
        outcome
    }

    async fn round_trip(
        &self,
        utterance: String,
        staged: Option<ImageAttachment>,
        epoch: u64,
        token: &CancellationToken,
    ) -> Result<SendOutcome> {
        // Upload failure aborts before anything is recorded and keeps the staged image
        let uploaded = match &staged {
            Some(attachment) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Send cancelled during image upload; nothing recorded");
                    return Ok(SendOutcome::discarded());
                }
                uploaded = self.client.upload_attachment(attachment) => Some(uploaded?),
            },
            None => None,
        };
        if staged.is_some() {
            let mut current = self.staged_image.lock().await;
            if *current == staged {
                *current = None;
            }
        }
        let image_ref = uploaded.as_ref().map(|u| u.reference.clone());

        let history = {
            let mut conversation = self.conversation.lock().await;
            if conversation.epoch() != epoch {
                info!("Conversation was reset before the user turn was recorded; discarding send");
                return Ok(SendOutcome::discarded());
            }
            let history = conversation.history_window(self.config.history_window);
            conversation.append_user(utterance.clone(), image_ref.clone())?;
            history
        };

        let request = {
            let excerpt = self.catalog.excerpt(self.config.catalog_excerpt_size);
            let preferences = self.preferences.lock().await;
            self.prompts.build(PromptInput {
                utterance: &utterance,
                image: uploaded.as_ref(),
                catalog_excerpt: &excerpt,
                history: &history,
                preferences: &preferences,
            })
        };

        info!(
            "Sending recommendation request ({} messages, {} images)",
            request.messages.len(),
            request.image_count()
        );
        let result = self.client.complete(&request, token).await;

        let mut conversation = self.conversation.lock().await;
        if conversation.epoch() != epoch {
            info!("Discarding {} reply: conversation was reset", result.kind());
            return Ok(SendOutcome::discarded());
        }

        let outcome = match result {
            RecommendationResult::Structured(reply) => {
                let resolved = self.resolver.resolve(&reply.recommendations, &self.catalog.snapshot());
                let products = (!resolved.is_empty()).then(|| resolved.clone());
                let message = conversation
                    .append_assistant(
                        reply.message,
                        products,
                        Some(reply.reasoning),
                        Some(reply.suggestions),
                        MessageFlag::None,
                    )
                    .clone();
                drop(conversation);

                let promoted = resolved.len();
                self.display
                    .lock()
                    .await
                    .promote(SearchContext::new(utterance, image_ref), resolved);

                SendOutcome {
                    kind: ReplyKind::Structured,
                    message: Some(message),
                    promoted,
                }
            }
            RecommendationResult::Fallback(reply) => {
                let message = conversation
                    .append_assistant(
                        reply.message,
                        None,
                        None,
                        Some(reply.suggestions),
                        MessageFlag::None,
                    )
                    .clone();
                SendOutcome {
                    kind: ReplyKind::Fallback,
                    message: Some(message),
                    promoted: 0,
                }
            }
            RecommendationResult::Error { message } => {
                error!("Recommendation round-trip failed: {}", message);
                let message = conversation
                    .append_assistant(
                        format!(
                            "{}: {}",
                            ERROR_REPLY_PREFIX,
                            truncate(&message, MAX_ERROR_DETAIL_CHARS)
                        ),
                        None,
                        None,
                        Some(default_suggestions()),
                        MessageFlag::Error,
                    )
                    .clone();
                SendOutcome {
                    kind: ReplyKind::Error,
                    message: Some(message),
                    promoted: 0,
                }
            }
        };

        Ok(outcome)
    }

    /// Send the `index`-th suggestion chip of the latest assistant turn as the next query
    pub async fn send_suggestion(&self, index: usize) -> Result<SendOutcome> {
        let suggestion = {
            let conversation = self.conversation.lock().await;
            conversation
                .latest_assistant()
                .and_then(|m| m.suggestions.as_ref())
                .and_then(|s| s.get(index))
                .cloned()
        };
        let suggestion = suggestion.ok_or(DiscoveryError::SuggestionNotFound(index))?;
        debug!("Sending suggestion #{}: {}", index, suggestion);
        self.send(&suggestion).await
    }

    /// Queue a local filter change. Applied after the debounce interval; never touches the model.
    pub fn set_filter(&self, filter: CatalogFilter) {
        self.debouncer.submit(filter);
    }

    /// Apply a filter right away, bypassing the debounce
    pub async fn apply_filter_now(&self, filter: CatalogFilter) {
        self.display.lock().await.apply_filter(&self.catalog, filter);
    }

    pub async fn visible_products(&self) -> VisibleProducts {
        self.display.lock().await.visible()
    }

    pub async fn search_context(&self) -> Option<SearchContext> {
        self.display.lock().await.search_context().cloned()
    }

    /// "See all products": drop the AI result set and show the filtered catalog
    pub async fn clear_recommendations(&self) -> Option<SearchContext> {
        self.display.lock().await.clear_recommendations()
    }

    /// Start over: clear history, the active result set, and the staged image.
    /// An outstanding request is cancelled and its reply discarded.
    pub async fn reset(&self) {
        if let Some(token) = self.active_request.lock().await.take() {
            debug!("Cancelling outstanding recommendation request");
            token.cancel();
        }
        self.conversation.lock().await.reset();
        self.display.lock().await.clear_recommendations();
        self.staged_image.lock().await.take();
        info!("Discovery session reset");
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.lock().await.messages().to_vec()
    }

    /// Whether a round-trip (upload included) is outstanding
    pub async fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) || self.conversation.lock().await.is_busy()
    }

    pub async fn record_feedback(&self, message_id: &str, feedback: Feedback) -> Result<()> {
        self.conversation
            .lock()
            .await
            .record_feedback(message_id, feedback)
    }

    pub async fn feedback(&self, message_id: &str) -> Option<Feedback> {
        self.conversation.lock().await.feedback(message_id)
    }

    /// Hand a displayed product to the cart collaborator
    pub async fn add_to_cart(&self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(DiscoveryError::InvalidQuantity(quantity));
        }
        if self.catalog.get(product_id).is_none() {
            warn!("Refusing to add unknown product {} to cart", product_id);
            return Err(DiscoveryError::UnknownProduct(product_id.to_string()));
        }

        self.cart.add(product_id, quantity).await.map_err(|e| {
            error!("Failed to add {} to cart: {}", product_id, e);
            DiscoveryError::Cart(e.to_string())
        })?;
        info!("Added {} x{} to cart", product_id, quantity);
        Ok(())
    }
}

// ABOUTME: Decides which product list is visible: the filtered catalog or the active AI result set
// ABOUTME: Promotes resolved recommendations, clears them on request, and debounces local filter changes

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use vitrine_core::{CatalogFilter, Product, ResolvedRecommendation, SearchContext};

use crate::catalog::CatalogStore;
use crate::error::{DiscoveryError, Result};

/// The single list of products currently shown to the user
#[derive(Debug, Clone, PartialEq)]
pub enum VisibleProducts {
    Catalog(Vec<Product>),
    Recommendations {
        context: SearchContext,
        items: Vec<ResolvedRecommendation>,
    },
}

impl VisibleProducts {
    pub fn len(&self) -> usize {
        match self {
            VisibleProducts::Catalog(products) => products.len(),
            VisibleProducts::Recommendations { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_recommendations(&self) -> bool {
        matches!(self, VisibleProducts::Recommendations { .. })
    }

    pub fn product_ids(&self) -> Vec<&str> {
        match self {
            VisibleProducts::Catalog(products) => products.iter().map(|p| p.id.as_str()).collect(),
            VisibleProducts::Recommendations { items, .. } => {
                items.iter().map(|r| r.product_id()).collect()
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveRecommendations {
    context: SearchContext,
    items: Vec<ResolvedRecommendation>,
}

#[derive(Debug, Default)]
pub struct DisplayCoordinator {
    filter: CatalogFilter,
    catalog_view: Vec<Product>,
    active: Option<ActiveRecommendations>,
}

impl DisplayCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-filter the catalog view. The AI result set, if any, stays visible.
    pub fn apply_filter(&mut self, catalog: &CatalogStore, filter: CatalogFilter) {
        self.catalog_view = catalog.filter(&filter);
        debug!(
            "Catalog view refiltered: {} products (query: {:?}, category: {:?}, sort: {:?})",
            self.catalog_view.len(),
            filter.query,
            filter.category,
            filter.sort
        );
        self.filter = filter;
    }

    /// Recompute the catalog view with the current filter, e.g. after a catalog load
    pub fn refresh_catalog_view(&mut self, catalog: &CatalogStore) {
        let filter = self.filter.clone();
        self.apply_filter(catalog, filter);
    }

    /// Make a resolved result set the visible list. Empty sets are ignored.
    pub fn promote(&mut self, context: SearchContext, items: Vec<ResolvedRecommendation>) -> bool {
        if items.is_empty() {
            return false;
        }
        info!(
            "Showing {} recommendations for query {:?}",
            items.len(),
            context.query
        );
        self.active = Some(ActiveRecommendations { context, items });
        true
    }

    /// Drop the AI result set and fall back to the catalog view
    pub fn clear_recommendations(&mut self) -> Option<SearchContext> {
        let cleared = self.active.take().map(|active| active.context);
        if cleared.is_some() {
            info!("Cleared recommendations, showing filtered catalog");
        }
        cleared
    }

    pub fn visible(&self) -> VisibleProducts {
        match &self.active {
            Some(active) => VisibleProducts::Recommendations {
                context: active.context.clone(),
                items: active.items.clone(),
            },
            None => VisibleProducts::Catalog(self.catalog_view.clone()),
        }
    }

    pub fn is_showing_recommendations(&self) -> bool {
        self.active.is_some()
    }

    pub fn search_context(&self) -> Option<&SearchContext> {
        self.active.as_ref().map(|active| &active.context)
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn catalog_view(&self) -> &[Product] {
        &self.catalog_view
    }
}

/// Applies only the last filter of a burst, once input has been quiet for `delay`
pub struct FilterDebouncer {
    tx: mpsc::UnboundedSender<CatalogFilter>,
    handle: JoinHandle<()>,
}

impl FilterDebouncer {
    /// Spawn the debounce task on the current tokio runtime
    pub fn spawn(
        delay: Duration,
        catalog: Arc<CatalogStore>,
        display: Arc<Mutex<DisplayCoordinator>>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            error!("Cannot start filter debouncer: {}", e);
            DiscoveryError::Runtime(e.to_string())
        })?;
        let (tx, mut rx) = mpsc::unbounded_channel::<CatalogFilter>();

        let handle = runtime.spawn(async move {
            while let Some(mut pending) = rx.recv().await {
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(filter) => pending = filter,
                            None => break,
                        },
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                display.lock().await.apply_filter(&catalog, pending);
            }
            debug!("Filter debouncer stopped");
        });

        Ok(Self { tx, handle })
    }

    /// Queue a filter change. Never blocks.
    pub fn submit(&self, filter: CatalogFilter) {
        if self.tx.send(filter).is_err() {
            debug!("Filter debouncer is no longer running; dropping filter change");
        }
    }
}

impl Drop for FilterDebouncer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vitrine_core::{ProductStatus, RecommendationCandidate};

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            brand: None,
            category: "tools".to_string(),
            description: None,
            price: 1000,
            rating: None,
            sales_count: None,
            images: Vec::new(),
            status: ProductStatus::Active,
        }
    }

    fn catalog() -> Arc<CatalogStore> {
        Arc::new(CatalogStore::from_products(vec![
            product("p1", "ZirKast Block"),
            product("p2", "Implant Driver"),
        ]))
    }

    fn resolved(id: &str) -> ResolvedRecommendation {
        ResolvedRecommendation {
            candidate: RecommendationCandidate {
                product_id: id.to_string(),
                match_score: 90,
                reason: "fits".to_string(),
            },
            product: product(id, "ZirKast Block"),
        }
    }

    #[test]
    fn test_default_view_is_filtered_catalog() {
        let catalog = catalog();
        let mut display = DisplayCoordinator::new();
        display.refresh_catalog_view(&catalog);

        assert_eq!(display.visible().product_ids(), vec!["p1", "p2"]);

        display.apply_filter(&catalog, CatalogFilter::new("implant"));
        assert_eq!(display.visible().product_ids(), vec!["p2"]);
    }

    #[test]
    fn test_recommendations_survive_filter_changes_until_cleared() {
        let catalog = catalog();
        let mut display = DisplayCoordinator::new();
        display.refresh_catalog_view(&catalog);

        assert!(display.promote(SearchContext::new("zirconia", None), vec![resolved("p1")]));
        display.apply_filter(&catalog, CatalogFilter::new("implant"));

        let visible = display.visible();
        assert!(visible.is_recommendations());
        assert_eq!(visible.product_ids(), vec!["p1"]);
        assert_eq!(display.search_context().unwrap().query, "zirconia");

        let cleared = display.clear_recommendations().unwrap();
        assert_eq!(cleared.query, "zirconia");
        // The hidden catalog view kept tracking the filter
        assert_eq!(display.visible(), VisibleProducts::Catalog(vec![product("p2", "Implant Driver")]));
    }

    #[test]
    fn test_empty_result_set_is_not_promoted() {
        let mut display = DisplayCoordinator::new();
        assert!(!display.promote(SearchContext::new("q", None), Vec::new()));
        assert!(!display.is_showing_recommendations());
        assert!(display.clear_recommendations().is_none());
    }

    #[test]
    fn test_debouncer_outside_runtime_is_an_error() {
        let display = Arc::new(Mutex::new(DisplayCoordinator::new()));
        let result = FilterDebouncer::spawn(Duration::from_millis(300), catalog(), display);
        assert!(matches!(result, Err(DiscoveryError::Runtime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_applies_only_last_filter_after_quiet_period() {
        let catalog = catalog();
        let display = Arc::new(Mutex::new(DisplayCoordinator::new()));
        display.lock().await.refresh_catalog_view(&catalog);
        let debouncer =
            FilterDebouncer::spawn(Duration::from_millis(300), Arc::clone(&catalog), Arc::clone(&display))
                .unwrap();

        debouncer.submit(CatalogFilter::new("zi"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.submit(CatalogFilter::new("implant"));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Still inside the quiet period of the second change
        assert_eq!(display.lock().await.filter(), &CatalogFilter::default());

        tokio::time::sleep(Duration::from_millis(150)).await;
        let display = display.lock().await;
        assert_eq!(display.filter().query, "implant");
        assert_eq!(display.visible().product_ids(), vec!["p2"]);
    }
}

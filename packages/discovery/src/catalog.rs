// ABOUTME: In-memory catalog snapshot of active products
// ABOUTME: Loads once per session, answers local search, category, and sort queries without I/O

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, info, warn};
use vitrine_core::{CatalogFilter, CatalogSort, Product, MIN_QUERY_LENGTH};

use crate::collaborators::CatalogSource;
use crate::error::{DiscoveryError, Result};

struct Snapshot {
    products: Arc<[Product]>,
    index: HashMap<String, usize>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Snapshot {
    fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len());
        for (pos, product) in products.iter().enumerate() {
            index.entry(product.id.clone()).or_insert(pos);
        }
        Self {
            products: products.into(),
            index,
        }
    }
}

#[derive(Default)]
struct CatalogState {
    snapshot: Snapshot,
    loaded: bool,
    last_error: Option<String>,
}

/// Single source of truth for catalog items. The snapshot is replaced wholesale, never patched.
#[derive(Default)]
pub struct CatalogStore {
    // Lock is held only for field swaps and reads, never across an await
    state: RwLock<CatalogState>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store directly from a list of products (inactive ones are discarded)
    pub fn from_products(products: Vec<Product>) -> Self {
        let store = Self::new();
        store.install(products);
        store
    }

    /// Fetch active products unless a snapshot is already loaded
    pub async fn load(&self, source: &dyn CatalogSource) -> Result<usize> {
        if self.is_loaded() {
            return Ok(self.len());
        }
        self.fetch(source).await
    }

    /// Fetch active products and replace the snapshot regardless of current state
    pub async fn refresh(&self, source: &dyn CatalogSource) -> Result<usize> {
        self.fetch(source).await
    }

    async fn fetch(&self, source: &dyn CatalogSource) -> Result<usize> {
        info!("Loading active catalog products");

        match source.list_active_products().await {
            Ok(products) => Ok(self.install(products)),
            Err(e) => {
                error!("Failed to load catalog: {}", e);
                let mut state = self.write();
                // A failed refresh keeps the previous snapshot
                if !state.loaded {
                    state.snapshot = Snapshot::default();
                }
                state.last_error = Some(e.to_string());
                Err(DiscoveryError::Catalog(e.to_string()))
            }
        }
    }

    fn install(&self, products: Vec<Product>) -> usize {
        let total = products.len();
        let active: Vec<Product> = products.into_iter().filter(Product::is_active).collect();
        if active.len() < total {
            warn!(
                "Catalog source returned {} inactive products; discarding them",
                total - active.len()
            );
        }

        let count = active.len();
        let mut state = self.write();
        state.snapshot = Snapshot::new(active);
        state.loaded = true;
        state.last_error = None;
        info!("Catalog snapshot installed with {} products", count);
        count
    }

    /// Filter, search, and sort the snapshot. Pure, in-memory, and deterministic.
    pub fn filter(&self, filter: &CatalogFilter) -> Vec<Product> {
        let products = self.snapshot();

        let needle = filter.query.trim().to_lowercase();
        let text_filter = (needle.chars().count() >= MIN_QUERY_LENGTH).then_some(needle);
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut results: Vec<Product> = products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category.eq_ignore_ascii_case(c)))
            .filter(|p| text_filter.as_deref().map_or(true, |n| p.matches_text(n)))
            .cloned()
            .collect();

        sort_products(&mut results, filter.sort);
        results
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        let state = self.read();
        state
            .snapshot
            .index
            .get(id)
            .map(|&pos| state.snapshot.products[pos].clone())
    }

    /// Distinct categories, sorted, for the category picker
    pub fn categories(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The first `limit` products in snapshot order
    pub fn excerpt(&self, limit: usize) -> Vec<Product> {
        self.snapshot().iter().take(limit).cloned().collect()
    }

    /// Cheap handle to the current snapshot
    pub fn snapshot(&self) -> Arc<[Product]> {
        Arc::clone(&self.read().snapshot.products)
    }

    pub fn len(&self) -> usize {
        self.read().snapshot.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    pub fn has_error(&self) -> bool {
        self.read().last_error.is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sort_products(products: &mut [Product], sort: CatalogSort) {
    // All sorts are stable so ties keep snapshot order
    match sort {
        CatalogSort::Popularity => products.sort_by_key(|p| Reverse(p.sales_count.unwrap_or(0))),
        CatalogSort::PriceAsc => products.sort_by_key(|p| p.price),
        CatalogSort::PriceDesc => products.sort_by_key(|p| Reverse(p.price)),
        CatalogSort::RatingDesc => products.sort_by(|a, b| {
            let a = a.rating.unwrap_or(0.0);
            let b = b.rating.unwrap_or(0.0);
            b.total_cmp(&a)
        }),
    }
}

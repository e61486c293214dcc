//! Recently viewed products, persisted as a JSON array of product handles.

use futures::future::join_all;
use std::sync::Arc;

use atelier_core::api::{Product, ProductApi};
use atelier_core::bus::{Event, EventBus};
use atelier_core::config::RecentlyViewedConfig;
use atelier_core::error::CoreError;
use atelier_core::money::format_amount;
use atelier_core::storage::KeyValueStore;

use crate::host::RecentlyViewedHost;

pub const CAROUSEL_SCROLL_STEP_PX: i32 = 300;

const PRODUCTS_SEGMENT: &str = "/products/";

/// Handle of the product page at `path`, e.g. `/collections/spa/products/robe`.
pub fn product_handle_from_path(path: &str) -> Option<&str> {
    let (_, rest) = path.split_once(PRODUCTS_SEGMENT)?;
    let handle = rest.split('/').next().unwrap_or_default();
    (!handle.is_empty()).then_some(handle)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub handle: String,
    pub title: String,
    pub url: String,
    pub image: Option<String>,
    pub price: Option<String>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            url: if product.url.is_empty() {
                format!("{PRODUCTS_SEGMENT}{}", product.handle)
            } else {
                product.url.clone()
            },
            image: product.featured_image.clone(),
            price: product.price.filter(|cents| *cents > 0).map(format_amount),
        }
    }
}

pub struct RecentlyViewed {
    bus: EventBus,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    max_items: usize,
}

impl RecentlyViewed {
    pub fn new(bus: EventBus, store: Arc<dyn KeyValueStore>, cfg: &RecentlyViewedConfig) -> Self {
        Self {
            bus,
            store,
            storage_key: cfg.storage_key.clone(),
            max_items: cfg.max_items.max(1),
        }
    }

    /// Most recent first. Missing, unreadable or malformed data reads as empty.
    pub fn load(&self) -> Vec<String> {
        let raw = match self.store.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(key = %self.storage_key, error = %err, "reading recently viewed failed");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(key = %self.storage_key, error = %err, "discarding malformed recently viewed list");
            Vec::new()
        })
    }

    fn save(&self, handles: &[String]) {
        let result = serde_json::to_string(handles)
            .map_err(CoreError::from)
            .and_then(|raw| self.store.set(&self.storage_key, &raw));
        if let Err(err) = result {
            tracing::warn!(key = %self.storage_key, error = %err, "writing recently viewed failed");
        }
    }

    /// Move `handle` to the front, dropping the oldest entries past the bound.
    pub fn record_visit(&self, handle: &str) -> Vec<String> {
        let mut handles = self.load();
        handles.retain(|h| h != handle);
        handles.insert(0, handle.to_string());
        handles.truncate(self.max_items);
        self.save(&handles);
        tracing::debug!(handle, total = handles.len(), "recorded product view");
        handles
    }

    /// Record a visit when `path` is a product page.
    pub fn record_path(&self, path: &str) -> Option<Vec<String>> {
        product_handle_from_path(path).map(|handle| self.record_visit(handle))
    }

    /// Resolve every stored handle and hand the cards to the host.
    ///
    /// Handles that fail to resolve are skipped. The container is hidden
    /// when nothing is stored or nothing resolves. Returns the number of
    /// cards rendered.
    pub async fn render(&self, api: &dyn ProductApi, host: &dyn RecentlyViewedHost) -> usize {
        let handles = self.load();
        if handles.is_empty() {
            host.set_visible(false);
            return 0;
        }
        host.set_visible(true);

        let lookups = handles.iter().map(|handle| async move {
            match api.product(handle).await {
                Ok(product) => Some(product),
                Err(err) => {
                    tracing::debug!(handle = %handle, error = %err, "skipping unresolved product");
                    None
                }
            }
        });
        let products: Vec<Product> = join_all(lookups).await.into_iter().flatten().collect();

        if products.is_empty() {
            host.set_visible(false);
            return 0;
        }

        let cards: Vec<ProductCard> = products.iter().map(ProductCard::from).collect();
        host.render_products(&cards);
        self.bus.publish(Event::RecentlyViewedUpdate {
            handles: cards.iter().map(|card| card.handle.clone()).collect(),
        });
        cards.len()
    }

    pub fn scroll_prev(&self, host: &dyn RecentlyViewedHost) {
        host.scroll_carousel(-CAROUSEL_SCROLL_STEP_PX);
    }

    pub fn scroll_next(&self, host: &dyn RecentlyViewedHost) {
        host.scroll_carousel(CAROUSEL_SCROLL_STEP_PX);
    }
}

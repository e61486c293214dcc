//! Page-session context: owns the bus and wires every component to it.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

use atelier_core::api::{CartApi, HttpStorefrontClient, ProductApi};
use atelier_core::bus::{EditorSignal, EventBus, Subscription};
use atelier_core::config::StorefrontConfig;
use atelier_core::error::CoreResult;
use atelier_core::storage::{open_store, KeyValueStore, MemoryStore};

use crate::animations::{AnimatedElement, AnimationTrigger};
use crate::cart_drawer::CartDrawer;
use crate::editor::EditorBridge;
use crate::host::{AnimationHost, DrawerHost, RecentlyViewedHost};
use crate::recently_viewed::RecentlyViewed;

/// Custom DOM events other scripts dispatch at the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    CartRefresh,
    CartOpen,
    CartClose,
}

impl PageEvent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cart:refresh" => Some(PageEvent::CartRefresh),
            "cart:open" => Some(PageEvent::CartOpen),
            "cart:close" => Some(PageEvent::CartClose),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct StorefrontHosts {
    pub drawer: Arc<dyn DrawerHost>,
    pub recently_viewed: Arc<dyn RecentlyViewedHost>,
    pub animation: Arc<dyn AnimationHost>,
}

pub struct Storefront {
    config: StorefrontConfig,
    bus: EventBus,
    drawer: Arc<CartDrawer>,
    recently_viewed: RecentlyViewed,
    animations: AnimationTrigger,
    editor: EditorBridge,
    products: Arc<dyn ProductApi>,
    carousel: Arc<dyn RecentlyViewedHost>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    _subscriptions: Vec<Subscription>,
}

impl Storefront {
    /// Wire the components to `bus`.
    ///
    /// Inside a tokio runtime the drawer's refresh loop starts right away;
    /// otherwise call [`spawn_background`](Self::spawn_background) once one
    /// is running, or cart topics only queue refreshes.
    pub fn new(
        config: StorefrontConfig,
        bus: EventBus,
        cart_api: Arc<dyn CartApi>,
        product_api: Arc<dyn ProductApi>,
        store: Arc<dyn KeyValueStore>,
        hosts: StorefrontHosts,
    ) -> Self {
        let drawer = CartDrawer::new(bus.clone(), cart_api, hosts.drawer);
        let subscriptions = drawer.attach();
        let recently_viewed = RecentlyViewed::new(bus.clone(), store, &config.recently_viewed);
        let animations = AnimationTrigger::new(hosts.animation, &config.animation);
        let editor = EditorBridge::new(bus.clone());

        let storefront = Self {
            config,
            bus,
            drawer,
            recently_viewed,
            animations,
            editor,
            products: product_api,
            carousel: hosts.recently_viewed,
            refresh_task: Mutex::new(None),
            _subscriptions: subscriptions,
        };
        storefront.spawn_background();
        storefront
    }

    /// Start servicing queued drawer refreshes on the current runtime.
    /// Returns `false` when already running or outside a runtime.
    pub fn spawn_background(&self) -> bool {
        let mut task = self.refresh_task.lock();
        if task.is_some() {
            return false;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                *task = Some(runtime.spawn(self.drawer.clone().run()));
                true
            }
            Err(_) => {
                tracing::warn!("no tokio runtime; cart refresh requests stay queued");
                false
            }
        }
    }

    /// Build a storefront talking to the configured shop over HTTP.
    ///
    /// An unusable storage file degrades to in-memory storage.
    pub fn connect(config: StorefrontConfig, hosts: StorefrontHosts) -> CoreResult<Self> {
        config.validate()?;
        let client = Arc::new(HttpStorefrontClient::new(&config.shop)?);
        let store = open_store(&config.storage).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to in-memory storage");
            Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>
        });
        tracing::info!(shop = %config.shop.base_url, "storefront connected");
        Ok(Self::new(
            config,
            EventBus::new(),
            client.clone(),
            client,
            store,
            hosts,
        ))
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn drawer(&self) -> &Arc<CartDrawer> {
        &self.drawer
    }

    pub fn recently_viewed(&self) -> &RecentlyViewed {
        &self.recently_viewed
    }

    pub fn animations(&self) -> &AnimationTrigger {
        &self.animations
    }

    /// Document finished loading at `path`.
    pub async fn dom_ready(&self, path: &str, elements: Vec<AnimatedElement>) {
        self.animations.arm(elements);
        self.recently_viewed.record_path(path);
        self.render_recently_viewed().await;
        self.drawer.refresh().await;
    }

    pub async fn page_event(&self, event: PageEvent) {
        match event {
            PageEvent::CartRefresh => self.drawer.refresh().await,
            PageEvent::CartOpen => {
                self.drawer.open();
            }
            PageEvent::CartClose => {
                self.drawer.close();
            }
        }
    }

    /// Theme editor signal. `elements` are the animated elements of a
    /// freshly loaded section.
    pub async fn host_signal(&self, signal: EditorSignal, elements: Vec<AnimatedElement>) {
        self.editor.forward(signal);
        if signal == EditorSignal::SectionLoad {
            self.animations.arm(elements);
        }
        if self.config.design_mode
            && matches!(signal, EditorSignal::SectionLoad | EditorSignal::SectionSelect)
        {
            self.render_recently_viewed().await;
        }
    }

    pub async fn render_recently_viewed(&self) -> usize {
        self.recently_viewed
            .render(self.products.as_ref(), self.carousel.as_ref())
            .await
    }
}

impl Drop for Storefront {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.get_mut().take() {
            task.abort();
        }
    }
}

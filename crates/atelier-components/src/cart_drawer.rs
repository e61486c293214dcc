//! Slide-out cart drawer.
//!
//! The drawer is a two-state machine (closed/open) driven by host input and
//! by bus requests, plus a cart view kept in sync with the remote cart.
//! Network work is async; visibility changes are synchronous.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;

use atelier_core::api::{Cart, CartApi, CartItem, LineItemId};
use atelier_core::bus::{CartChange, Event, EventBus, HandlerResult, Subscription, Topic};
use atelier_core::error::{log_error, CoreResult};
use atelier_core::money::format_amount;

use crate::host::{DrawerHost, FocusTarget};

const DEFAULT_VARIANT_TITLE: &str = "Default Title";
const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawerInput {
    /// Cart icon clicked; `trigger` gets focus back on close.
    Toggle { trigger: Option<FocusTarget> },
    Open,
    Close,
    BackdropClick,
    /// Key name as reported by the host, e.g. `"Escape"`.
    KeyDown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartBadge {
    pub count: u32,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub id: LineItemId,
    pub title: String,
    pub url: String,
    pub price: String,
    /// `None` for single-variant products.
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub image: Option<String>,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            title: item.product_title.clone(),
            url: item.url.clone(),
            price: format_amount(item.price),
            variant_title: item
                .variant_title
                .clone()
                .filter(|title| !title.is_empty() && title != DEFAULT_VARIANT_TITLE),
            quantity: item.quantity,
            image: item.image.as_deref().map(compact_image_url),
        }
    }
}

/// Everything the host needs to redraw the drawer body and badges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub badge: CartBadge,
    /// Rendered next to the drawer title, e.g. `(3)`.
    pub item_count_label: String,
    pub subtotal: String,
    pub lines: Vec<CartLineView>,
}

impl CartView {
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            badge: CartBadge {
                count: cart.item_count,
                hidden: cart.item_count == 0,
            },
            item_count_label: format!("({})", cart.item_count),
            subtotal: format_amount(cart.total_price),
            lines: cart.items.iter().map(CartLineView::from).collect(),
        }
    }

    /// The host shows its "your bag is empty" block instead of lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// `robe.jpg?v=2` becomes `robe_compact.jpg?v=2`.
pub fn compact_image_url(url: &str) -> String {
    match url.rfind('.') {
        Some(dot) => format!("{}_compact{}", &url[..dot], &url[dot..]),
        None => url.to_string(),
    }
}

#[derive(Debug, Default)]
struct DrawerStatus {
    state: DrawerState,
    trigger: Option<FocusTarget>,
    cart: Option<Cart>,
}

pub struct CartDrawer {
    bus: EventBus,
    api: Arc<dyn CartApi>,
    host: Arc<dyn DrawerHost>,
    status: Mutex<DrawerStatus>,
    refresh_requested: AtomicBool,
    refresh_signal: Notify,
}

impl CartDrawer {
    pub fn new(bus: EventBus, api: Arc<dyn CartApi>, host: Arc<dyn DrawerHost>) -> Arc<Self> {
        Arc::new(Self {
            bus,
            api,
            host,
            status: Mutex::new(DrawerStatus::default()),
            refresh_requested: AtomicBool::new(false),
            refresh_signal: Notify::new(),
        })
    }

    /// Subscribe to the cart and drawer topics.
    ///
    /// Cart topics queue a refresh; drawer topics open or close the drawer
    /// without announcing the change again.
    pub fn attach(self: &Arc<Self>) -> Vec<Subscription> {
        let mut subs = Vec::with_capacity(5);
        for topic in [Topic::CART_UPDATE, Topic::CART_ADD, Topic::CART_REMOVE] {
            subs.push(self.bus.subscribe(
                topic,
                with_drawer(Arc::downgrade(self), |drawer| drawer.request_refresh()),
            ));
        }
        subs.push(self.bus.subscribe(
            Topic::CART_DRAWER_OPEN,
            with_drawer(Arc::downgrade(self), |drawer| {
                drawer.transition(DrawerState::Open, false);
            }),
        ));
        subs.push(self.bus.subscribe(
            Topic::CART_DRAWER_CLOSE,
            with_drawer(Arc::downgrade(self), |drawer| {
                drawer.transition(DrawerState::Closed, false);
            }),
        ));
        subs
    }

    pub fn state(&self) -> DrawerState {
        self.status.lock().state
    }

    /// Last cart successfully fetched.
    pub fn cart(&self) -> Option<Cart> {
        self.status.lock().cart.clone()
    }

    pub fn handle(&self, input: DrawerInput) {
        match input {
            DrawerInput::Toggle { trigger } => self.toggle(trigger),
            DrawerInput::Open => {
                self.open();
            }
            DrawerInput::Close | DrawerInput::BackdropClick => {
                self.close();
            }
            DrawerInput::KeyDown(key) => {
                if key == ESCAPE_KEY && self.state() == DrawerState::Open {
                    self.close();
                }
            }
        }
    }

    /// Returns `false` when the drawer was already open.
    pub fn open(&self) -> bool {
        self.transition(DrawerState::Open, true)
    }

    /// Returns `false` when the drawer was already closed.
    pub fn close(&self) -> bool {
        self.transition(DrawerState::Closed, true)
    }

    pub fn toggle(&self, trigger: Option<FocusTarget>) {
        let state = {
            let mut status = self.status.lock();
            if trigger.is_some() {
                status.trigger = trigger;
            }
            status.state
        };
        match state {
            DrawerState::Open => self.close(),
            DrawerState::Closed => self.open(),
        };
    }

    fn transition(&self, target: DrawerState, announce: bool) -> bool {
        let restore = {
            let mut status = self.status.lock();
            if status.state == target {
                return false;
            }
            status.state = target;
            match target {
                DrawerState::Open => None,
                DrawerState::Closed => status.trigger.take(),
            }
        };

        match target {
            DrawerState::Open => {
                self.host.set_drawer_open(true);
                self.host.set_scroll_locked(true);
                self.host.focus_first_in_drawer();
            }
            DrawerState::Closed => {
                self.host.set_drawer_open(false);
                self.host.set_scroll_locked(false);
                if let Some(trigger) = restore {
                    self.host.focus(&trigger);
                }
            }
        }
        tracing::debug!(state = ?target, announce, "cart drawer transition");

        if announce {
            self.bus.publish(match target {
                DrawerState::Open => Event::CartDrawerOpen,
                DrawerState::Closed => Event::CartDrawerClose,
            });
        }
        true
    }

    /// Ask for a refresh; repeated requests before it runs collapse into one.
    pub fn request_refresh(&self) {
        self.refresh_requested.store(true, Ordering::SeqCst);
        self.refresh_signal.notify_one();
    }

    /// Run a pending refresh, if any. Returns whether one ran.
    pub async fn refresh_if_requested(&self) -> bool {
        if !self.refresh_requested.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.refresh().await;
        true
    }

    /// Service refresh requests for as long as the page lives.
    pub async fn run(self: Arc<Self>) {
        loop {
            self.refresh_signal.notified().await;
            self.refresh_if_requested().await;
        }
    }

    /// Fetch the cart and redraw. On failure the previous view stays up.
    pub async fn refresh(&self) {
        if let Err(err) = self.try_refresh().await {
            log_error("fetching cart", &err);
        }
    }

    async fn try_refresh(&self) -> CoreResult<()> {
        let cart = self.api.get_cart().await?;
        let view = CartView::from_cart(&cart);
        self.status.lock().cart = Some(cart);
        self.host.render_cart(&view);
        self.host.update_badges(&view.badge);
        Ok(())
    }

    /// Set a line's quantity (0 removes it), redraw, and announce the change.
    /// Returns `false` if the cart API rejected the change.
    pub async fn change_quantity(&self, id: LineItemId, quantity: u32) -> bool {
        if let Err(err) = self.api.change_quantity(id, quantity).await {
            log_error("updating cart", &err);
            return false;
        }
        self.refresh().await;

        let change = CartChange::line(id, quantity);
        self.bus.publish(if quantity == 0 {
            Event::CartRemove(change)
        } else {
            Event::CartUpdate(change)
        });
        true
    }

    pub async fn increment(&self, id: LineItemId) -> bool {
        match self.current_quantity(id) {
            Some(quantity) => self.change_quantity(id, quantity.saturating_add(1)).await,
            None => false,
        }
    }

    /// Stops at 1; use [`remove`](Self::remove) to drop the line.
    pub async fn decrement(&self, id: LineItemId) -> bool {
        match self.current_quantity(id) {
            Some(quantity) if quantity > 1 => self.change_quantity(id, quantity - 1).await,
            _ => false,
        }
    }

    pub async fn remove(&self, id: LineItemId) -> bool {
        self.change_quantity(id, 0).await
    }

    fn current_quantity(&self, id: LineItemId) -> Option<u32> {
        let quantity = self
            .status
            .lock()
            .cart
            .as_ref()
            .and_then(|cart| cart.item(id))
            .map(|item| item.quantity);
        if quantity.is_none() {
            tracing::warn!(id, "cart line not in the rendered cart");
        }
        quantity
    }
}

fn with_drawer<F>(
    drawer: Weak<CartDrawer>,
    action: F,
) -> impl Fn(&Event) -> HandlerResult + Send + Sync + 'static
where
    F: Fn(&CartDrawer) + Send + Sync + 'static,
{
    move |_event| {
        if let Some(drawer) = drawer.upgrade() {
            action(&drawer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cart_of, line, DrawerCall, FakeCartApi, RecordingDrawerHost};
    use std::sync::atomic::AtomicUsize;

    struct Fixture {
        bus: EventBus,
        api: Arc<FakeCartApi>,
        host: Arc<RecordingDrawerHost>,
        drawer: Arc<CartDrawer>,
        _subs: Vec<Subscription>,
    }

    fn fixture(cart: Cart) -> Fixture {
        let bus = EventBus::new();
        let api = Arc::new(FakeCartApi::with_cart(cart));
        let host = Arc::new(RecordingDrawerHost::default());
        let drawer = CartDrawer::new(bus.clone(), api.clone(), host.clone());
        let subs = drawer.attach();
        Fixture {
            bus,
            api,
            host,
            drawer,
            _subs: subs,
        }
    }

    fn count_topic(bus: &EventBus, topic: Topic) -> Arc<AtomicUsize> {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        bus.subscribe(topic, move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        counter
    }

    #[test]
    fn test_compact_image_url() {
        assert_eq!(
            compact_image_url("https://cdn.test/robe.jpg"),
            "https://cdn.test/robe_compact.jpg"
        );
        assert_eq!(
            compact_image_url("https://cdn.test/robe.jpg?v=2"),
            "https://cdn.test/robe_compact.jpg?v=2"
        );
        assert_eq!(compact_image_url("no-extension"), "no-extension");
    }

    #[test]
    fn test_cart_view_from_cart() {
        let mut robe = line(1, "Linen Robe", 2, 4300);
        robe.variant_title = Some("Sage / M".to_string());
        let cart = cart_of(vec![robe, line(2, "Olive Soap", 1, 123456)]);

        let view = CartView::from_cart(&cart);
        assert_eq!(view.badge, CartBadge { count: 3, hidden: false });
        assert_eq!(view.item_count_label, "(3)");
        assert_eq!(view.subtotal, "1,320.56");
        assert_eq!(view.lines[0].variant_title.as_deref(), Some("Sage / M"));
        assert_eq!(view.lines[1].variant_title, None);
        assert_eq!(view.lines[1].price, "1,234.56");
        assert_eq!(
            view.lines[0].image.as_deref(),
            Some("https://cdn.test/1_compact.jpg")
        );
    }

    #[test]
    fn test_empty_cart_hides_badge() {
        let view = CartView::from_cart(&Cart::default());
        assert!(view.is_empty());
        assert!(view.badge.hidden);
        assert_eq!(view.subtotal, "0.00");
    }

    #[test]
    fn test_toggle_open_then_close_restores_focus() {
        let fx = fixture(Cart::default());
        let opened = count_topic(&fx.bus, Topic::CART_DRAWER_OPEN);
        let closed = count_topic(&fx.bus, Topic::CART_DRAWER_CLOSE);

        fx.drawer.handle(DrawerInput::Toggle {
            trigger: Some("cart-icon".into()),
        });
        assert_eq!(fx.drawer.state(), DrawerState::Open);
        assert_eq!(
            fx.host.take(),
            vec![
                DrawerCall::Open(true),
                DrawerCall::ScrollLocked(true),
                DrawerCall::FocusFirst,
            ]
        );

        fx.drawer.handle(DrawerInput::Toggle { trigger: None });
        assert_eq!(fx.drawer.state(), DrawerState::Closed);
        assert_eq!(
            fx.host.take(),
            vec![
                DrawerCall::Open(false),
                DrawerCall::ScrollLocked(false),
                DrawerCall::Focus(FocusTarget("cart-icon".to_string())),
            ]
        );

        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_open_and_close_are_idempotent() {
        let fx = fixture(Cart::default());
        let opened = count_topic(&fx.bus, Topic::CART_DRAWER_OPEN);

        assert!(fx.drawer.open());
        assert!(!fx.drawer.open());
        assert!(fx.drawer.close());
        assert!(!fx.drawer.close());
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_escape_only_closes_when_open() {
        let fx = fixture(Cart::default());

        fx.drawer.handle(DrawerInput::KeyDown("Escape".to_string()));
        assert!(fx.host.take().is_empty());

        fx.drawer.handle(DrawerInput::Open);
        fx.drawer.handle(DrawerInput::KeyDown("Enter".to_string()));
        assert_eq!(fx.drawer.state(), DrawerState::Open);

        fx.drawer.handle(DrawerInput::KeyDown("Escape".to_string()));
        assert_eq!(fx.drawer.state(), DrawerState::Closed);
    }

    #[test]
    fn test_backdrop_click_closes() {
        let fx = fixture(Cart::default());
        fx.drawer.open();
        fx.drawer.handle(DrawerInput::BackdropClick);
        assert_eq!(fx.drawer.state(), DrawerState::Closed);
    }

    #[test]
    fn test_bus_requests_drive_drawer_without_echo() {
        let fx = fixture(Cart::default());
        let opened = count_topic(&fx.bus, Topic::CART_DRAWER_OPEN);

        fx.bus.publish(Event::CartDrawerOpen);
        assert_eq!(fx.drawer.state(), DrawerState::Open);
        assert_eq!(opened.load(Ordering::SeqCst), 1);

        fx.bus.publish(Event::CartDrawerClose);
        assert_eq!(fx.drawer.state(), DrawerState::Closed);
    }

    #[tokio::test]
    async fn test_cart_topics_coalesce_into_one_refresh() {
        let fx = fixture(cart_of(vec![line(1, "Linen Robe", 1, 4300)]));

        fx.bus.publish(Event::CartAdd(CartChange::default()));
        fx.bus.publish(Event::CartUpdate(CartChange::item_count(1)));

        assert!(fx.drawer.refresh_if_requested().await);
        assert!(!fx.drawer.refresh_if_requested().await);
        assert_eq!(fx.api.reads.load(Ordering::SeqCst), 1);
        assert_eq!(fx.host.renders().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_renders_view_and_badges() {
        let fx = fixture(cart_of(vec![line(1, "Linen Robe", 2, 4300)]));

        fx.drawer.refresh().await;

        let calls = fx.host.take();
        assert!(matches!(&calls[0], DrawerCall::Render(view) if view.lines.len() == 1));
        assert_eq!(
            calls[1],
            DrawerCall::Badges(CartBadge { count: 2, hidden: false })
        );
        assert_eq!(fx.drawer.cart().map(|c| c.item_count), Some(2));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_view() {
        let fx = fixture(cart_of(vec![line(1, "Linen Robe", 2, 4300)]));
        fx.drawer.refresh().await;
        fx.host.take();

        fx.api.fail_reads.store(true, Ordering::SeqCst);
        fx.drawer.refresh().await;

        assert!(fx.host.take().is_empty());
        assert_eq!(fx.drawer.cart().map(|c| c.item_count), Some(2));
    }

    #[tokio::test]
    async fn test_change_quantity_publishes_update_or_remove() {
        let fx = fixture(cart_of(vec![
            line(1, "Linen Robe", 2, 4300),
            line(2, "Olive Soap", 1, 900),
        ]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        for topic in [Topic::CART_UPDATE, Topic::CART_REMOVE] {
            let seen = seen.clone();
            fx.bus.subscribe(topic, move |event| {
                seen.lock().push(event.clone());
                Ok(())
            });
        }

        assert!(fx.drawer.change_quantity(1, 3).await);
        assert!(fx.drawer.change_quantity(2, 0).await);

        assert_eq!(
            *seen.lock(),
            vec![
                Event::CartUpdate(CartChange::line(1, 3)),
                Event::CartRemove(CartChange::line(2, 0)),
            ]
        );
        let cart = fx.drawer.cart().unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count, 3);
    }

    #[tokio::test]
    async fn test_failed_change_publishes_nothing() {
        let fx = fixture(cart_of(vec![line(1, "Linen Robe", 2, 4300)]));
        let updates = count_topic(&fx.bus, Topic::CART_UPDATE);
        fx.api.fail_writes.store(true, Ordering::SeqCst);

        assert!(!fx.drawer.change_quantity(1, 5).await);
        assert_eq!(updates.load(Ordering::SeqCst), 0);
        assert_eq!(fx.api.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_increment_and_decrement_follow_rendered_cart() {
        let fx = fixture(cart_of(vec![line(1, "Linen Robe", 1, 4300)]));
        fx.drawer.refresh().await;

        assert!(!fx.drawer.decrement(1).await);
        assert!(fx.drawer.increment(1).await);
        assert!(fx.drawer.decrement(1).await);
        assert!(!fx.drawer.increment(99).await);
        assert!(fx.drawer.remove(1).await);

        assert_eq!(*fx.api.changes.lock(), vec![(1, 2), (1, 1), (1, 0)]);
        assert_eq!(fx.drawer.cart().map(|c| c.items.len()), Some(0));
    }

    #[tokio::test]
    async fn test_increment_saturates_at_max_quantity() {
        let fx = fixture(cart_of(vec![line(1, "Linen Robe", u32::MAX, 1)]));
        fx.drawer.refresh().await;

        assert!(fx.drawer.increment(1).await);
        assert_eq!(*fx.api.changes.lock(), vec![(1, u32::MAX)]);
    }

    #[tokio::test]
    async fn test_run_loop_services_requests() {
        let fx = fixture(cart_of(vec![line(1, "Linen Robe", 1, 4300)]));
        let task = tokio::spawn(fx.drawer.clone().run());

        fx.bus.publish(Event::CartUpdate(CartChange::item_count(1)));
        for _ in 0..50 {
            if fx.api.reads.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        task.abort();

        assert_eq!(fx.api.reads.load(Ordering::SeqCst), 1);
    }
}

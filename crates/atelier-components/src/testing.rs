//! In-memory fakes for the host ports and remote APIs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use atelier_core::api::{Cart, CartApi, CartItem, LineItemId, Product, ProductApi};
use atelier_core::error::{CoreError, CoreResult};

use crate::cart_drawer::{CartBadge, CartView};
use crate::host::{AnimationHost, DrawerHost, FocusTarget, RecentlyViewedHost};
use crate::recently_viewed::ProductCard;

pub(crate) fn line(id: LineItemId, title: &str, quantity: u32, price: u64) -> CartItem {
    CartItem {
        id,
        quantity,
        price,
        product_title: title.to_string(),
        variant_title: Some("Default Title".to_string()),
        url: format!("/products/{}", title.to_lowercase().replace(' ', "-")),
        image: Some(format!("https://cdn.test/{id}.jpg")),
    }
}

pub(crate) fn cart_of(items: Vec<CartItem>) -> Cart {
    let mut cart = Cart {
        items,
        ..Cart::default()
    };
    recount(&mut cart);
    cart
}

fn recount(cart: &mut Cart) {
    cart.item_count = cart.items.iter().map(|i| i.quantity).sum();
    cart.total_price = cart.items.iter().map(|i| i.price * u64::from(i.quantity)).sum();
}

fn server_error(path: &str) -> CoreError {
    CoreError::Http {
        status: 500,
        url: format!("https://shop.test/{path}"),
    }
}

#[derive(Default)]
pub(crate) struct FakeCartApi {
    cart: Mutex<Cart>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub reads: AtomicUsize,
    pub changes: Mutex<Vec<(LineItemId, u32)>>,
}

impl FakeCartApi {
    pub fn with_cart(cart: Cart) -> Self {
        Self {
            cart: Mutex::new(cart),
            ..Self::default()
        }
    }
}

#[async_trait]
impl CartApi for FakeCartApi {
    async fn get_cart(&self) -> CoreResult<Cart> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(server_error("cart.js"));
        }
        Ok(self.cart.lock().clone())
    }

    async fn change_quantity(&self, id: LineItemId, quantity: u32) -> CoreResult<Cart> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(server_error("cart/change.js"));
        }
        self.changes.lock().push((id, quantity));
        let mut cart = self.cart.lock();
        if quantity == 0 {
            cart.items.retain(|item| item.id != id);
        } else if let Some(item) = cart.items.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
        recount(&mut cart);
        Ok(cart.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeProductApi {
    products: HashMap<String, Product>,
    pub lookups: AtomicUsize,
}

impl FakeProductApi {
    pub fn with_products(handles: &[&str]) -> Self {
        let products = handles
            .iter()
            .map(|handle| {
                (
                    handle.to_string(),
                    Product {
                        handle: handle.to_string(),
                        title: handle.to_uppercase(),
                        url: format!("/products/{handle}"),
                        featured_image: Some(format!("https://cdn.test/{handle}.jpg")),
                        price: Some(2500),
                    },
                )
            })
            .collect();
        Self {
            products,
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProductApi for FakeProductApi {
    async fn product(&self, handle: &str) -> CoreResult<Product> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.products.get(handle).cloned().ok_or_else(|| CoreError::Http {
            status: 404,
            url: format!("https://shop.test/products/{handle}.js"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawerCall {
    Open(bool),
    ScrollLocked(bool),
    FocusFirst,
    Focus(FocusTarget),
    Render(CartView),
    Badges(CartBadge),
}

#[derive(Default)]
pub(crate) struct RecordingDrawerHost {
    pub calls: Mutex<Vec<DrawerCall>>,
}

impl RecordingDrawerHost {
    pub fn take(&self) -> Vec<DrawerCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn renders(&self) -> Vec<CartView> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                DrawerCall::Render(view) => Some(view.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DrawerHost for RecordingDrawerHost {
    fn set_drawer_open(&self, open: bool) {
        self.calls.lock().push(DrawerCall::Open(open));
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.calls.lock().push(DrawerCall::ScrollLocked(locked));
    }

    fn focus_first_in_drawer(&self) {
        self.calls.lock().push(DrawerCall::FocusFirst);
    }

    fn focus(&self, target: &FocusTarget) {
        self.calls.lock().push(DrawerCall::Focus(target.clone()));
    }

    fn render_cart(&self, view: &CartView) {
        self.calls.lock().push(DrawerCall::Render(view.clone()));
    }

    fn update_badges(&self, badge: &CartBadge) {
        self.calls.lock().push(DrawerCall::Badges(badge.clone()));
    }
}

#[derive(Default)]
pub(crate) struct RecordingCarouselHost {
    pub visible: Mutex<Vec<bool>>,
    pub rendered: Mutex<Vec<Vec<ProductCard>>>,
    pub scrolls: Mutex<Vec<i32>>,
}

impl RecordingCarouselHost {
    pub fn last_visible(&self) -> Option<bool> {
        self.visible.lock().last().copied()
    }
}

impl RecentlyViewedHost for RecordingCarouselHost {
    fn set_visible(&self, visible: bool) {
        self.visible.lock().push(visible);
    }

    fn render_products(&self, cards: &[ProductCard]) {
        self.rendered.lock().push(cards.to_vec());
    }

    fn scroll_carousel(&self, delta_px: i32) {
        self.scrolls.lock().push(delta_px);
    }
}

#[derive(Default)]
pub(crate) struct RecordingAnimationHost {
    pub applied: Mutex<Vec<(String, Vec<String>)>>,
}

impl AnimationHost for RecordingAnimationHost {
    fn apply_classes(&self, element_id: &str, classes: &[String]) {
        self.applied
            .lock()
            .push((element_id.to_string(), classes.to_vec()));
    }
}

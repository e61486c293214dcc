//! Ports implemented by the page host (browser shim, native shell, test fake).

use crate::cart_drawer::{CartBadge, CartView};
use crate::recently_viewed::ProductCard;

/// Element that receives focus back when the drawer closes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusTarget(pub String);

impl From<&str> for FocusTarget {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

pub trait DrawerHost: Send + Sync {
    /// Toggle the open class on the drawer and the page body.
    fn set_drawer_open(&self, open: bool);
    fn set_scroll_locked(&self, locked: bool);
    fn focus_first_in_drawer(&self);
    fn focus(&self, target: &FocusTarget);

    fn render_cart(&self, view: &CartView);
    /// Every cart count badge on the page, not just the drawer's.
    fn update_badges(&self, badge: &CartBadge);
}

pub trait RecentlyViewedHost: Send + Sync {
    fn set_visible(&self, visible: bool);
    fn render_products(&self, cards: &[ProductCard]);
    fn scroll_carousel(&self, delta_px: i32);
}

pub trait AnimationHost: Send + Sync {
    fn apply_classes(&self, element_id: &str, classes: &[String]);
}

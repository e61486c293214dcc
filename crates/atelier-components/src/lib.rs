pub mod animations;
pub mod cart_drawer;
pub mod editor;
pub mod host;
pub mod recently_viewed;
pub mod storefront;

#[cfg(test)]
pub(crate) mod testing;

pub use animations::{AnimatedElement, AnimationTrigger, VisibilityEntry};
pub use cart_drawer::{CartBadge, CartDrawer, CartLineView, CartView, DrawerInput, DrawerState};
pub use editor::EditorBridge;
pub use host::{AnimationHost, DrawerHost, FocusTarget, RecentlyViewedHost};
pub use recently_viewed::{product_handle_from_path, ProductCard, RecentlyViewed};
pub use storefront::{PageEvent, Storefront, StorefrontHosts};

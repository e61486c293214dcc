//! Topic vocabulary and typed event payloads.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

use crate::api::LineItemId;

/// Name of a bus channel. Any string is a valid topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(Cow<'static, str>);

impl Topic {
    pub const CART_UPDATE: Topic = Topic::from_static("cart:update");
    pub const CART_ADD: Topic = Topic::from_static("cart:add");
    pub const CART_REMOVE: Topic = Topic::from_static("cart:remove");
    pub const CART_DRAWER_OPEN: Topic = Topic::from_static("cart-drawer:open");
    pub const CART_DRAWER_CLOSE: Topic = Topic::from_static("cart-drawer:close");
    pub const PRODUCT_ADD_TO_CART: Topic = Topic::from_static("product:add-to-cart");
    pub const PRODUCT_VARIANT_CHANGE: Topic = Topic::from_static("product:variant-change");
    pub const QUICK_VIEW_OPEN: Topic = Topic::from_static("quick-view:open");
    pub const QUICK_VIEW_CLOSE: Topic = Topic::from_static("quick-view:close");
    pub const MODAL_OPEN: Topic = Topic::from_static("modal:open");
    pub const MODAL_CLOSE: Topic = Topic::from_static("modal:close");
    pub const HEADER_UPDATE: Topic = Topic::from_static("header:update");
    pub const AJAX_REQUEST_START: Topic = Topic::from_static("ajax:start");
    pub const AJAX_REQUEST_END: Topic = Topic::from_static("ajax:end");
    pub const RECENTLY_VIEWED_UPDATE: Topic = Topic::from_static("recently-viewed:update");
    pub const ANIMATION_COMPLETE: Topic = Topic::from_static("animation:complete");

    pub const SECTION_LOAD: Topic = Topic::from_static("shopify:section:load");
    pub const SECTION_UNLOAD: Topic = Topic::from_static("shopify:section:unload");
    pub const SECTION_SELECT: Topic = Topic::from_static("shopify:section:select");
    pub const SECTION_DESELECT: Topic = Topic::from_static("shopify:section:deselect");
    pub const BLOCK_SELECT: Topic = Topic::from_static("shopify:block:select");
    pub const BLOCK_DESELECT: Topic = Topic::from_static("shopify:block:deselect");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self(Cow::Owned(name.to_string()))
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&Topic> for Topic {
    fn from(topic: &Topic) -> Self {
        topic.clone()
    }
}

/// Payload of the cart topics. Producers fill in whatever they know.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartChange {
    pub item_id: Option<LineItemId>,
    pub quantity: Option<u32>,
    pub item_count: Option<u32>,
}

impl CartChange {
    pub fn line(item_id: LineItemId, quantity: u32) -> Self {
        Self {
            item_id: Some(item_id),
            quantity: Some(quantity),
            item_count: None,
        }
    }

    pub fn item_count(count: u32) -> Self {
        Self {
            item_count: Some(count),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAdded {
    pub handle: String,
    pub variant_id: Option<u64>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantChange {
    pub handle: String,
    pub variant_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AjaxRequest {
    pub url: String,
    /// Set on `ajax:end` only.
    pub ok: Option<bool>,
}

/// Theme editor lifecycle notifications forwarded from the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorSignal {
    SectionLoad,
    SectionUnload,
    SectionSelect,
    SectionDeselect,
    BlockSelect,
    BlockDeselect,
}

impl EditorSignal {
    pub fn topic(self) -> Topic {
        match self {
            EditorSignal::SectionLoad => Topic::SECTION_LOAD,
            EditorSignal::SectionUnload => Topic::SECTION_UNLOAD,
            EditorSignal::SectionSelect => Topic::SECTION_SELECT,
            EditorSignal::SectionDeselect => Topic::SECTION_DESELECT,
            EditorSignal::BlockSelect => Topic::BLOCK_SELECT,
            EditorSignal::BlockDeselect => Topic::BLOCK_DESELECT,
        }
    }
}

/// A bus message. The variant determines the topic it is delivered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    CartUpdate(CartChange),
    CartAdd(CartChange),
    CartRemove(CartChange),
    CartDrawerOpen,
    CartDrawerClose,
    ProductAddToCart(ProductAdded),
    ProductVariantChange(VariantChange),
    QuickViewOpen { handle: String },
    QuickViewClose,
    ModalOpen { id: Option<String> },
    ModalClose { id: Option<String> },
    HeaderUpdate,
    AjaxStart(AjaxRequest),
    AjaxEnd(AjaxRequest),
    RecentlyViewedUpdate { handles: Vec<String> },
    AnimationComplete { element_id: String, effect: String },
    Editor(EditorSignal),
    /// Anything outside the well-known vocabulary.
    Custom {
        topic: Topic,
        payload: Option<serde_json::Value>,
    },
}

impl Event {
    pub fn custom(topic: impl Into<Topic>, payload: Option<serde_json::Value>) -> Self {
        Event::Custom {
            topic: topic.into(),
            payload,
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Event::CartUpdate(_) => Topic::CART_UPDATE,
            Event::CartAdd(_) => Topic::CART_ADD,
            Event::CartRemove(_) => Topic::CART_REMOVE,
            Event::CartDrawerOpen => Topic::CART_DRAWER_OPEN,
            Event::CartDrawerClose => Topic::CART_DRAWER_CLOSE,
            Event::ProductAddToCart(_) => Topic::PRODUCT_ADD_TO_CART,
            Event::ProductVariantChange(_) => Topic::PRODUCT_VARIANT_CHANGE,
            Event::QuickViewOpen { .. } => Topic::QUICK_VIEW_OPEN,
            Event::QuickViewClose => Topic::QUICK_VIEW_CLOSE,
            Event::ModalOpen { .. } => Topic::MODAL_OPEN,
            Event::ModalClose { .. } => Topic::MODAL_CLOSE,
            Event::HeaderUpdate => Topic::HEADER_UPDATE,
            Event::AjaxStart(_) => Topic::AJAX_REQUEST_START,
            Event::AjaxEnd(_) => Topic::AJAX_REQUEST_END,
            Event::RecentlyViewedUpdate { .. } => Topic::RECENTLY_VIEWED_UPDATE,
            Event::AnimationComplete { .. } => Topic::ANIMATION_COMPLETE,
            Event::Editor(signal) => signal.topic(),
            Event::Custom { topic, .. } => topic.clone(),
        }
    }
}

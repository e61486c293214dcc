pub mod api;
pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod money;
pub mod storage;

pub use api::{Cart, CartApi, CartItem, HttpStorefrontClient, LineItemId, Product, ProductApi};
pub use bus::{
    CartChange, EditorSignal, Event, EventBus, FaultReporter, Subscription, SubscriberFault, Topic,
};
pub use config::{AnimationConfig, RecentlyViewedConfig, ShopConfig, StorageConfig, StorefrontConfig};
pub use error::{format_error_chain, log_error, CoreError, CoreResult};
pub use money::format_amount;
pub use storage::{open_store, JsonFileStore, KeyValueStore, MemoryStore};

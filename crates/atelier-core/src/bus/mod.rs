//! # Event Bus Module
//!
//! In-process publish/subscribe used by the storefront components to notify
//! each other without holding direct references.
//!
//! ## Overview
//!
//! - Topics are plain strings; the well-known vocabulary lives on [`Topic`]
//! - Every well-known topic carries a typed [`Event`] payload
//! - Subscribers run synchronously, in subscription order, on the publishing
//!   thread
//! - A failing subscriber (an `Err` or a panic) is reported through the
//!   injected [`FaultReporter`] and never stops the rest of the pass
//!
//! ## Usage
//!
//! ```rust
//! use atelier_core::bus::{CartChange, Event, EventBus, Topic};
//!
//! let bus = EventBus::new();
//! let sub = bus.subscribe(Topic::CART_UPDATE, |event| {
//!     if let Event::CartUpdate(change) = event {
//!         println!("cart now holds {:?} items", change.item_count);
//!     }
//!     Ok(())
//! });
//!
//! bus.publish(Event::CartUpdate(CartChange::item_count(3)));
//! sub.unsubscribe();
//! ```
//!
//! ## Re-entrancy
//!
//! `publish` snapshots the topic's subscribers before invoking any of them.
//! Subscribing, unsubscribing or clearing from inside a callback takes effect
//! from the next publish onwards; the pass in progress always runs against
//! the snapshot.

mod events;
mod fault;
mod registry;

pub use events::*;
pub use fault::*;
pub use registry::*;

//! # storefront-core: Pure Pricing & Checkout Rules
//!
//! Everything a storefront needs to compute what an order costs and
//! whether it may be placed, as pure functions with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Checkout Pipeline                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              checkout-api (axum, rate limiter, outbox)          │   │
//! │  │   POST /checkout ──► CheckoutService ──► NotificationDispatcher │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ storefront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │  │  pricing  │  │ validation│  │   money   │  │   │
//! │  │   │  reducer  │─►│  policy   │◄─│  steps    │  │  poisha   │  │   │
//! │  │   │ LineItem  │  │ A/B tiers │  │  1 .. 6   │  │  integer  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 storefront-db (SQLite repositories)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money in poisha (1/100 taka)
//! - [`types`] - Line items, delivery areas, orders, catalog records
//! - [`pricing`] - Pricing policies and the pricing engine
//! - [`cart`] - Cart state container
//! - [`validation`] - Checkout validation steps
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::pricing::PricingPolicy;
//! use storefront_core::types::{DeliveryArea, LineItem};
//! use storefront_core::Money;
//!
//! let policy = PricingPolicy::percentage_tiers();
//! let items = vec![LineItem::new("shirt", "Shirt", Money::from_taka(1000), 3)];
//!
//! let quote = policy.price(&items, Some(DeliveryArea::Outside));
//! assert_eq!(quote.discount, Money::from_taka(90)); // 3% for 3+ items
//! assert!(quote.free_delivery);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::Cart;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PricingPolicy, PricingResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typos like 1000 instead of 10 before they reach the order writer.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a cart line may carry, in taka.
///
/// `MAX_CART_ITEMS` lines of `MAX_ITEM_QUANTITY` at this price stay well
/// inside i64 poisha.
pub const MAX_UNIT_PRICE_TAKA: i64 = 10_000_000;

/// Default minimum address length in characters.
pub const DEFAULT_MIN_ADDRESS_LENGTH: usize = 10;

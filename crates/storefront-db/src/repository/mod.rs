//! # Repository Module
//!
//! Database repositories for the checkout pipeline.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Access From Checkout                      │
//! │                                                                         │
//! │  CheckoutService                                                       │
//! │       │                                                                 │
//! │       │  db.products().get("stylehunt", "p-1")                         │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get(&self, storefront_id, id)      ← with variants                │
//! │  ├── insert(&self, product)                                            │
//! │  ├── insert_variant(&self, variant)                                    │
//! │  └── decrement_stock(&self, id, size, color, qty)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BrandRepository`](brand::BrandRepository) - Storefront existence
//! - [`ProductRepository`](product::ProductRepository) - Catalog and stock
//! - [`CustomerRepository`](customer::CustomerRepository) - Find or create by phone
//! - [`OrderRepository`](order::OrderRepository) - Order placement and pending counts
//! - [`NotificationOutboxRepository`](notification::NotificationOutboxRepository) - Notification queue

pub mod brand;
pub mod customer;
pub mod notification;
pub mod order;
pub mod product;

//! # checkout-api
//!
//! HTTP checkout server for the storefronts listed in `storefronts.toml`.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/storefronts/{id}/checkout                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes ──► dto (taka → Money) ──► CheckoutService                     │
//! │                                       │                                 │
//! │                 ┌─────────────────────┼─────────────────────┐          │
//! │                 ▼                     ▼                     ▼          │
//! │          storefront-core        RateLimiter          storefront-db     │
//! │          (pricing, steps 1-6)   (ip, phone)          (order + outbox)  │
//! │                                                             │          │
//! │                                                             ▼          │
//! │                                            NotificationDispatcher      │
//! │                                            (background, Notifier)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod client_ip;
pub mod config;
pub mod dto;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ServerConfig, StorefrontConfig, StorefrontsConfig};
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;

//! Shared application state handed to every handler.

use std::sync::Arc;

use storefront_db::Database;

use crate::config::{StorefrontConfig, StorefrontsConfig};
use crate::error::{ApiError, ApiResult};
use crate::rate_limit::RateLimiter;
use crate::services::notification_service::DispatcherHandle;

/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Database,
    storefronts: StorefrontsConfig,
    limiter: Arc<RateLimiter>,
    notifications: DispatcherHandle,
}

impl AppState {
    pub fn new(
        db: Database,
        storefronts: StorefrontsConfig,
        limiter: Arc<RateLimiter>,
        notifications: DispatcherHandle,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                db,
                storefronts,
                limiter,
                notifications,
            }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn storefronts(&self) -> &StorefrontsConfig {
        &self.inner.storefronts
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    pub fn notifications(&self) -> &DispatcherHandle {
        &self.inner.notifications
    }

    /// Looks up a configured storefront.
    ///
    /// ## Errors
    /// `ApiError::StorefrontNotFound` for ids missing from the config file.
    pub fn storefront(&self, storefront_id: &str) -> ApiResult<&StorefrontConfig> {
        self.inner
            .storefronts
            .get(storefront_id)
            .ok_or_else(|| ApiError::StorefrontNotFound(storefront_id.to_string()))
    }
}

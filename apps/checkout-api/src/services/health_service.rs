//! Liveness and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use storefront_db::migrations::migration_status;

use crate::state::AppState;

/// Liveness: the process is up. Touches nothing else.
pub async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub status: &'static str,
    pub database: &'static str,
    /// `"applied/embedded"`, e.g. `"1/1"`.
    pub migrations: String,
    pub pending_notifications: i64,
    pub storefronts: usize,
}

/// Readiness: database reachable and migrated.
///
/// `503` when the ping fails or migrations are behind.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let db = state.db();
    let database_ok = db.health_check().await;

    let (embedded, applied) = match migration_status(db.pool()).await {
        Ok(counts) => counts,
        Err(e) => {
            warn!(error = %e, "Migration status unavailable");
            (0, 0)
        }
    };
    let migrated = embedded > 0 && applied >= embedded;

    let pending_notifications = if database_ok {
        db.notification_outbox().count_pending().await.unwrap_or(-1)
    } else {
        -1
    };

    let ready = database_ok && migrated;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(Readiness {
            status: if ready { "ready" } else { "not_ready" },
            database: if database_ok { "ok" } else { "unreachable" },
            migrations: format!("{applied}/{embedded}"),
            pending_notifications,
            storefronts: state.storefronts().storefronts.len(),
        }),
    )
}

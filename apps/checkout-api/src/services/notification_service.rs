//! # Notification Dispatcher
//!
//! Drains the notification outbox and sends order confirmations.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     NotificationDispatcher::run                         │
//! │                                                                         │
//! │   wake on: poll tick (NOTIFY_POLL_INTERVAL_SECS)                       │
//! │            nudge after each placed order                               │
//! │            shutdown                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   get_pending(NOTIFY_BATCH_SIZE)   entries under 10 attempts only      │
//! │       │                                                                 │
//! │       ├── unknown kind / bad JSON → mark_failed                        │
//! │       ├── order has no email      → mark_sent (nothing to deliver)     │
//! │       └── Notifier::send                                               │
//! │              ok  → mark_sent                                           │
//! │              err → mark_failed(error), warn once on the 10th       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failing notifier never affects checkout: the order row is already
//! committed when the dispatcher sees the entry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use storefront_core::{NotificationOutboxEntry, OrderPlaced, ORDER_PLACED};
use storefront_db::{Database, DbResult, MAX_DELIVERY_ATTEMPTS};

// =============================================================================
// Notifier
// =============================================================================

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Sends an order confirmation to a shopper.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &OrderPlaced) -> Result<(), NotifyError>;
}

/// Writes the confirmation through `tracing` instead of sending mail.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, n: &OrderPlaced) -> Result<(), NotifyError> {
        info!(
            order_id = %n.order_id,
            storefront_id = %n.storefront_id,
            to = n.email.as_deref().unwrap_or_default(),
            customer = %n.customer_name,
            total = %n.total,
            status = n.status.as_str(),
            items = n.items_count,
            "Order confirmation"
        );
        Ok(())
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Outcome counts of one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: usize,
    pub skipped_no_email: usize,
    pub failed: usize,
    /// Failures that used up the last attempt.
    pub given_up: usize,
}

/// Background task that delivers outbox entries.
pub struct NotificationDispatcher {
    db: Database,
    notifier: Arc<dyn Notifier>,
    batch_size: u32,
    poll_interval: Duration,
    nudge: Arc<Notify>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for waking and stopping the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    nudge: Arc<Notify>,
    shutdown_tx: mpsc::Sender<()>,
}

impl DispatcherHandle {
    /// Wakes the dispatcher now instead of at the next tick.
    pub fn nudge(&self) {
        self.nudge.notify_one();
    }

    /// Asks the dispatcher to stop after its current batch.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Notification dispatcher already stopped");
        }
    }
}

impl NotificationDispatcher {
    /// Creates a dispatcher and its handle. Spawn [`run`](Self::run) to start it.
    pub fn new(
        db: Database,
        notifier: Arc<dyn Notifier>,
        batch_size: u32,
        poll_interval: Duration,
    ) -> (Self, DispatcherHandle) {
        let nudge = Arc::new(Notify::new());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let dispatcher = NotificationDispatcher {
            db,
            notifier,
            batch_size,
            poll_interval,
            nudge: nudge.clone(),
            shutdown_rx,
        };

        (dispatcher, DispatcherHandle { nudge, shutdown_tx })
    }

    /// Runs the dispatch loop until shut down.
    pub async fn run(mut self) {
        info!(
            poll_secs = self.poll_interval.as_secs(),
            batch_size = self.batch_size,
            "Notification dispatcher starting"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => self.drain().await,
                _ = self.nudge.notified() => self.drain().await,
                _ = self.shutdown_rx.recv() => {
                    info!("Notification dispatcher shutting down");
                    break;
                }
            }
        }

        info!("Notification dispatcher stopped");
    }

    async fn drain(&self) {
        match self.process_batch().await {
            Ok(report) if report != BatchReport::default() => {
                debug!(?report, "Notification batch processed");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Failed to process notification batch"),
        }
    }

    /// Processes one batch of pending entries.
    pub async fn process_batch(&self) -> DbResult<BatchReport> {
        let outbox = self.db.notification_outbox();
        let entries = outbox.get_pending(self.batch_size).await?;
        let mut report = BatchReport::default();

        for entry in entries {
            let notification = match decode(&entry) {
                Ok(n) => n,
                Err(reason) => {
                    warn!(entry_id = %entry.id, %reason, "Undeliverable outbox entry");
                    self.fail(&entry, &reason, &mut report).await?;
                    continue;
                }
            };

            if notification.email.is_none() {
                debug!(order_id = %entry.order_id, "No email on order, nothing to send");
                outbox.mark_sent(&entry.id).await?;
                report.skipped_no_email += 1;
                continue;
            }

            match self.notifier.send(&notification).await {
                Ok(()) => {
                    outbox.mark_sent(&entry.id).await?;
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(order_id = %entry.order_id, error = %e, "Notification failed");
                    self.fail(&entry, &e.to_string(), &mut report).await?;
                }
            }
        }

        Ok(report)
    }

    async fn fail(
        &self,
        entry: &NotificationOutboxEntry,
        reason: &str,
        report: &mut BatchReport,
    ) -> DbResult<()> {
        self.db.notification_outbox().mark_failed(&entry.id, reason).await?;
        report.failed += 1;

        let attempts = entry.attempts + 1;
        if attempts >= MAX_DELIVERY_ATTEMPTS {
            warn!(
                entry_id = %entry.id,
                order_id = %entry.order_id,
                attempts,
                "Notification exceeded max attempts, giving up"
            );
            report.given_up += 1;
        }
        Ok(())
    }
}

fn decode(entry: &NotificationOutboxEntry) -> Result<OrderPlaced, String> {
    if entry.kind != ORDER_PLACED {
        return Err(format!("unknown notification kind '{}'", entry.kind));
    }
    serde_json::from_str(&entry.payload).map_err(|e| format!("invalid payload: {e}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::limits::{NOTIFY_ATTEMPTS, NOTIFY_RETRY_DELAY, NOTIFY_TIMEOUT};
use crate::model::ReservationView;

/// Outbound confirmation channel: email, SMS, webhook, whatever the host
/// application wires in. Implementations may fail; the engine never lets that
/// failure reach the customer who just booked.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_reservation_created(&self, view: &ReservationView) -> Result<(), NotifyError>;
}

#[derive(Debug)]
pub struct NotifyError(pub String);

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification failed: {}", self.0)
    }
}

impl std::error::Error for NotifyError {}

/// Default sink: records the confirmation in the log and nothing else.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_reservation_created(&self, view: &ReservationView) -> Result<(), NotifyError> {
        tracing::info!(
            id = %view.reservation.id,
            customer = %view.reservation.customer_name,
            date = %view.reservation.date,
            time = %view.reservation.start_time.format("%H:%M"),
            service = %view.service.name,
            "reservation confirmation"
        );
        Ok(())
    }
}

/// Detached best-effort delivery: bounded attempts with a per-attempt timeout,
/// then warn and drop. Never blocks or fails the caller.
pub fn dispatch_confirmation(notifier: Arc<dyn Notifier>, view: ReservationView) {
    tokio::spawn(async move {
        for attempt in 1..=NOTIFY_ATTEMPTS {
            match tokio::time::timeout(NOTIFY_TIMEOUT, notifier.notify_reservation_created(&view))
                .await
            {
                Ok(Ok(())) => return,
                Ok(Err(e)) => {
                    tracing::warn!(id = %view.reservation.id, attempt, "confirmation delivery failed: {e}");
                }
                Err(_) => {
                    tracing::warn!(id = %view.reservation.id, attempt, "confirmation delivery timed out");
                }
            }
            if attempt < NOTIFY_ATTEMPTS {
                tokio::time::sleep(NOTIFY_RETRY_DELAY).await;
            }
        }
        metrics::counter!(crate::observability::NOTIFY_FAILURES_TOTAL).increment(1);
    });
}

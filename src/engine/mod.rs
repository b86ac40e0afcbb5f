mod conflict;
mod error;
mod mutations;
mod queries;
#[cfg(test)]
mod tests;

pub use conflict::{find_conflict, overlaps, resolve_duration};
pub use error::ScheduleError;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::model::{Reservation, ReservationView, ServiceSummary};
use crate::notify::Notifier;
use crate::policy::CalendarPolicy;
use crate::store::ReservationStore;

/// The scheduling core. Orchestrates the calendar policy, catalog, clock,
/// store, and notifier to validate and create reservations, compute
/// availability, and move reservations through their lifecycle.
///
/// The engine holds no reservation state of its own; the store owns the
/// collection and its consistency; the engine's conflict pre-check is a
/// courtesy answer, not the enforcement point.
pub struct Engine {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ReservationStore>,
    policy: CalendarPolicy,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl Engine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn ReservationStore>,
        policy: CalendarPolicy,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            catalog,
            store,
            policy,
            clock,
            notifier,
        }
    }

    /// Embed the service summary for a read result; orphaned references
    /// degrade to a placeholder instead of failing the read.
    fn enrich(&self, reservation: Reservation) -> ReservationView {
        let service = self
            .catalog
            .get_service(&reservation.service_id)
            .map(ServiceSummary::from)
            .unwrap_or_else(ServiceSummary::missing);
        ReservationView { reservation, service }
    }
}

pub(super) fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(raw.to_string()))
}

pub(super) fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

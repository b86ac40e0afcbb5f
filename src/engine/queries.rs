use chrono::NaiveTime;

use crate::model::{ReservationStatus, ReservationView, minute_of_day};
use crate::store::StoreFilters;

use super::conflict::find_conflict;
use super::{Engine, ScheduleError, parse_date};

impl Engine {
    /// The bookable start times remaining on `date` for `service_id`, in
    /// policy order. Past times and times conflicting with the day's active
    /// reservations are excluded. A closed day is an empty answer, not an
    /// error. Read-only: calling this twice with no intervening writes
    /// returns identical results.
    pub async fn list_available_times(
        &self,
        date: &str,
        service_id: &str,
    ) -> Result<Vec<NaiveTime>, ScheduleError> {
        let service = self
            .catalog
            .get_active_service(service_id)
            .ok_or(ScheduleError::ServiceUnavailable)?;
        let duration = service
            .duration_min
            .filter(|d| *d > 0)
            .ok_or(ScheduleError::MissingDuration)?;

        let date = parse_date(date)?;

        let allowed = self.policy.allowed_start_times(date);
        if allowed.is_empty() {
            return Ok(Vec::new());
        }

        let existing = self.store.find_active_by_date(date).await;
        let now = self.clock.now();

        Ok(allowed
            .iter()
            .copied()
            .filter(|t| date.and_time(*t) >= now)
            .filter(|t| {
                find_conflict(self.catalog.as_ref(), &existing, minute_of_day(*t), duration)
                    .is_none()
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Option<ReservationView> {
        let reservation = self.store.find_by_id(id).await?;
        Some(self.enrich(reservation))
    }

    /// All reservations ordered by (date, start time), optionally filtered.
    /// An unparsable date filter is ignored rather than failing the listing.
    pub async fn list(
        &self,
        status: Option<ReservationStatus>,
        date: Option<&str>,
    ) -> Vec<ReservationView> {
        let date = date.and_then(|raw| parse_date(raw).ok());
        let reservations = self.store.find_all(StoreFilters { status, date }).await;
        reservations.into_iter().map(|r| self.enrich(r)).collect()
    }
}

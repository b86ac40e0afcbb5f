use crate::limits::{MAX_CUSTOMER_FIELD_LEN, MAX_NOTES_LEN};
use crate::model::{
    CreateReservation, NewReservation, ReservationStatus, ReservationView, minute_of_day,
};
use crate::notify;
use crate::observability::{
    RESERVATIONS_CREATED_TOTAL, SLOT_CONFLICTS_TOTAL, STATUS_UPDATES_TOTAL,
};
use crate::store::StoreError;

use super::conflict::find_conflict;
use super::{Engine, ScheduleError, parse_date, parse_time};

impl Engine {
    /// Validate and create a reservation. On success the new reservation is
    /// pending, priced at the service's current price, and a confirmation
    /// notification is dispatched best-effort in the background.
    pub async fn create(&self, req: CreateReservation) -> Result<ReservationView, ScheduleError> {
        if [&req.customer_name, &req.customer_email, &req.customer_phone]
            .iter()
            .any(|field| field.len() > MAX_CUSTOMER_FIELD_LEN)
        {
            return Err(ScheduleError::LimitExceeded("customer field too long"));
        }
        if req.notes.len() > MAX_NOTES_LEN {
            return Err(ScheduleError::LimitExceeded("notes too long"));
        }

        let service = self
            .catalog
            .get_active_service(&req.service_id)
            .ok_or(ScheduleError::ServiceUnavailable)?;

        let date = parse_date(&req.date)?;

        let allowed = self.policy.allowed_start_times(date);
        if allowed.is_empty() {
            return Err(ScheduleError::ClosedDay);
        }
        let time = parse_time(&req.time)
            .filter(|t| allowed.contains(t))
            .ok_or_else(|| ScheduleError::InvalidTimeSlot { allowed: allowed.to_vec() })?;

        let now = self.clock.now();
        if date.and_time(time) < now {
            return Err(ScheduleError::PastDate);
        }

        let duration = service
            .duration_min
            .filter(|d| *d > 0)
            .ok_or(ScheduleError::MissingDuration)?;

        // Courtesy pre-check for a fast answer; the store re-runs this under
        // its day lock, which is what actually prevents double-booking.
        let existing = self.store.find_active_by_date(date).await;
        if find_conflict(self.catalog.as_ref(), &existing, minute_of_day(time), duration).is_some()
        {
            metrics::counter!(SLOT_CONFLICTS_TOTAL).increment(1);
            return Err(ScheduleError::SlotConflict);
        }

        let new = NewReservation {
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            service_id: service.id.clone(),
            date,
            start_time: time,
            notes: req.notes,
            total_price: service.price,
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let reservation = self.store.append(new).await.map_err(store_error)?;
        metrics::counter!(RESERVATIONS_CREATED_TOTAL).increment(1);
        tracing::info!(
            id = %reservation.id,
            date = %reservation.date,
            time = %reservation.start_time.format("%H:%M"),
            service = %service.name,
            "reservation created"
        );

        let view = self.enrich(reservation);
        notify::dispatch_confirmation(self.notifier.clone(), view.clone());
        Ok(view)
    }

    /// Set a reservation's status. Any status may transition to any other;
    /// cancelled and completed reservations simply stop occupying their slot.
    pub async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> Result<ReservationView, ScheduleError> {
        let now = self.clock.now();
        match self.store.update_status(id, status, now).await {
            Ok(Some(reservation)) => {
                metrics::counter!(STATUS_UPDATES_TOTAL).increment(1);
                tracing::info!(id = %reservation.id, %status, "reservation status updated");
                Ok(self.enrich(reservation))
            }
            Ok(None) => Err(ScheduleError::NotFound(id.to_string())),
            Err(e) => Err(store_error(e)),
        }
    }
}

fn store_error(e: StoreError) -> ScheduleError {
    match e {
        StoreError::SlotTaken(winner) => {
            metrics::counter!(SLOT_CONFLICTS_TOTAL).increment(1);
            tracing::debug!("append lost the slot race to reservation {winner}");
            ScheduleError::SlotConflict
        }
        StoreError::DayFull => ScheduleError::LimitExceeded("too many reservations for one day"),
        StoreError::Io(detail) => {
            tracing::error!("reservation store failure: {detail}");
            ScheduleError::Internal(detail)
        }
    }
}

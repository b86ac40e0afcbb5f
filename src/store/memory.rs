use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::catalog::Catalog;
use crate::model::{NewReservation, Reservation, ReservationStatus};

use super::{DayMap, ReservationStore, StoreError, StoreFilters, check_append};

/// Volatile backend for tests and development. Same locking discipline as
/// the durable store, no file behind it.
pub struct MemoryStore {
    core: DayMap,
    catalog: Arc<dyn Catalog>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            core: DayMap::new(),
            catalog,
        }
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn find_active_by_date(&self, date: NaiveDate) -> Vec<Reservation> {
        self.core.active_by_date(date).await
    }

    async fn append(&self, new: NewReservation) -> Result<Reservation, StoreError> {
        let day = self.core.day(new.date);
        let mut book = day.write().await;

        check_append(&book, self.catalog.as_ref(), &new)?;

        let id = self.core.allocate_id();
        let reservation = new.into_reservation(id);
        self.core.register(reservation.id.clone(), reservation.date);
        book.insert(reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: &str) -> Option<Reservation> {
        self.core.find_by_id(id).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
        updated_at: NaiveDateTime,
    ) -> Result<Option<Reservation>, StoreError> {
        let Some(date) = self.core.locate(id) else {
            return Ok(None);
        };
        let Some(day) = self.core.try_day(date) else {
            return Ok(None);
        };
        let mut book = day.write().await;
        match book.get_mut(id) {
            Some(r) => {
                r.status = status;
                r.updated_at = updated_at;
                Ok(Some(r.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find_all(&self, filters: StoreFilters) -> Vec<Reservation> {
        self.core.collect(&filters).await
    }
}

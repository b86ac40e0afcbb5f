use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::model::{NewReservation, Reservation, ReservationStatus};
use crate::observability::{WAL_COMPACTIONS_TOTAL, WAL_FLUSH_DURATION_SECONDS};
use crate::wal::{LogEvent, Wal};

use super::{DayMap, ReservationStore, StoreError, StoreFilters, check_append};

/// WAL-backed reservation store: full state in memory, every mutation
/// durably logged before it is applied, state rebuilt by replay on open.
///
/// Lock order: WAL mutex before any day write lock. Writers and the
/// compactor both follow it.
pub struct DurableStore {
    core: DayMap,
    catalog: Arc<dyn Catalog>,
    wal: Mutex<Wal>,
    compact_threshold: u64,
}

fn log_event(wal: &mut Wal, event: &LogEvent) -> Result<(), StoreError> {
    let start = std::time::Instant::now();
    let result = wal.append(event);
    metrics::histogram!(WAL_FLUSH_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
    result.map_err(|e| StoreError::Io(e.to_string()))
}

impl DurableStore {
    /// Open (or create) the store at `path`, replaying any existing log.
    pub fn open(
        path: &Path,
        catalog: Arc<dyn Catalog>,
        compact_threshold: u64,
    ) -> io::Result<Self> {
        let events = Wal::replay(path)?;
        let wal = Wal::open(path)?;
        let replayed = events.len();

        let core = DayMap::new();
        for event in events {
            match event {
                LogEvent::Created(reservation) => core.insert_replayed(reservation),
                LogEvent::StatusChanged { id, status, updated_at } => {
                    core.apply_replayed_status(&id, status, updated_at);
                }
            }
        }
        core.seed_next_id();
        tracing::info!("reservation store opened: {replayed} events replayed from {}", path.display());

        Ok(Self {
            core,
            catalog,
            wal: Mutex::new(wal),
            compact_threshold,
        })
    }

    /// Rewrite the WAL to the minimal event set: one `Created` per
    /// reservation, carrying its current status. Holds the WAL lock
    /// throughout so no append lands between snapshot and swap.
    pub async fn compact(&self) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().await;
        let snapshot = self.core.collect(&StoreFilters::default()).await;
        let events: Vec<LogEvent> = snapshot.into_iter().map(LogEvent::Created).collect();

        Wal::write_compact_file(wal.path(), &events)
            .and_then(|()| wal.swap_compact_file())
            .map_err(|e| StoreError::Io(e.to_string()))?;

        metrics::counter!(WAL_COMPACTIONS_TOTAL).increment(1);
        tracing::info!("WAL compacted to {} events", events.len());
        Ok(())
    }

    async fn compact_if_due(&self, appends: u64) {
        if appends < self.compact_threshold {
            return;
        }
        if let Err(e) = self.compact().await {
            tracing::warn!("WAL compaction failed: {e}");
        }
    }
}

#[async_trait]
impl ReservationStore for DurableStore {
    async fn find_active_by_date(&self, date: NaiveDate) -> Vec<Reservation> {
        self.core.active_by_date(date).await
    }

    async fn append(&self, new: NewReservation) -> Result<Reservation, StoreError> {
        let appends;
        let reservation;
        {
            let mut wal = self.wal.lock().await;
            let day = self.core.day(new.date);
            let mut book = day.write().await;

            check_append(&book, self.catalog.as_ref(), &new)?;

            let id = self.core.allocate_id();
            reservation = new.into_reservation(id);
            log_event(&mut wal, &LogEvent::Created(reservation.clone()))?;
            self.core.register(reservation.id.clone(), reservation.date);
            book.insert(reservation.clone());
            appends = wal.appends_since_compact();
        }
        self.compact_if_due(appends).await;
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

        let appends;
        let updated;
        {
            let mut wal = self.wal.lock().await;
            let mut book = day.write().await;
            let Some(r) = book.get_mut(id) else {
                return Ok(None);
            };
            log_event(
                &mut wal,
                &LogEvent::StatusChanged { id: id.to_string(), status, updated_at },
            )?;
            r.status = status;
            r.updated_at = updated_at;
            updated = r.clone();
            appends = wal.appends_since_compact();
        }
        self.compact_if_due(appends).await;
        Ok(Some(updated))
    }

    async fn find_all(&self, filters: StoreFilters) -> Vec<Reservation> {
        self.core.collect(&filters).await
    }
}

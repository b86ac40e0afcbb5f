mod durable;
mod memory;

pub use durable::DurableStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::catalog::Catalog;
use crate::engine::{find_conflict, resolve_duration};
use crate::limits::MAX_RESERVATIONS_PER_DAY;
use crate::model::{NewReservation, Reservation, ReservationStatus};

#[derive(Debug, Clone, Default)]
pub struct StoreFilters {
    pub status: Option<ReservationStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug)]
pub enum StoreError {
    /// The candidate overlaps an active reservation (or starts at its exact
    /// minute). Carries the blocking reservation's id.
    SlotTaken(String),
    DayFull,
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::SlotTaken(id) => write!(f, "slot taken by reservation {id}"),
            StoreError::DayFull => write!(f, "day is fully booked"),
            StoreError::Io(e) => write!(f, "store I/O error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Everything the engine needs from the reservation collection.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Same-day reservations whose status still occupies calendar time.
    async fn find_active_by_date(&self, date: NaiveDate) -> Vec<Reservation>;

    /// Validate-and-insert. Implementations must serialize same-day writes
    /// and re-run the overlap check inside that critical section. This call,
    /// not the engine's pre-check, owns the no-double-booking invariant.
    async fn append(&self, new: NewReservation) -> Result<Reservation, StoreError>;

    async fn find_by_id(&self, id: &str) -> Option<Reservation>;

    /// Set status + updated_at. `Ok(None)` when the id is unknown.
    async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
        updated_at: NaiveDateTime,
    ) -> Result<Option<Reservation>, StoreError>;

    /// All reservations matching the filters, ordered by (date, start time).
    async fn find_all(&self, filters: StoreFilters) -> Vec<Reservation>;
}

// ── Shared in-memory core ────────────────────────────────────────

pub(crate) type SharedDayBook = Arc<RwLock<DayBook>>;

/// One calendar day's reservations, sorted by start time. The single shared
/// mutable resource: every same-day write goes through this lock.
#[derive(Debug, Default)]
pub(crate) struct DayBook {
    pub(crate) reservations: Vec<Reservation>,
}

impl DayBook {
    /// Insert maintaining sort order by start minute.
    pub(crate) fn insert(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.start_minute(), Reservation::start_minute)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn active(&self) -> Vec<Reservation> {
        self.reservations
            .iter()
            .filter(|r| r.status.is_active())
            .cloned()
            .collect()
    }
}

/// Day-keyed reservation state shared by both store backends: a map of
/// per-day locks plus an id → day index for point lookups.
pub(crate) struct DayMap {
    days: DashMap<NaiveDate, SharedDayBook>,
    index: DashMap<String, NaiveDate>,
    next_id: AtomicU64,
}

impl DayMap {
    pub(crate) fn new() -> Self {
        Self {
            days: DashMap::new(),
            index: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// The day's book, created on first touch.
    pub(crate) fn day(&self, date: NaiveDate) -> SharedDayBook {
        self.days.entry(date).or_default().value().clone()
    }

    pub(crate) fn try_day(&self, date: NaiveDate) -> Option<SharedDayBook> {
        self.days.get(&date).map(|e| e.value().clone())
    }

    pub(crate) fn locate(&self, id: &str) -> Option<NaiveDate> {
        self.index.get(id).map(|e| *e.value())
    }

    /// Next numeric identifier, stringified. Monotonic, so ids stay stable
    /// even though reservations are never deleted.
    pub(crate) fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    pub(crate) fn register(&self, id: String, date: NaiveDate) {
        self.index.insert(id, date);
    }

    /// Rebuild one reservation during replay. We're the sole owner, so
    /// try_write always succeeds instantly.
    pub(crate) fn insert_replayed(&self, reservation: Reservation) {
        let day = self.day(reservation.date);
        let mut book = day.try_write().expect("replay: uncontended write");
        self.index.insert(reservation.id.clone(), reservation.date);
        book.insert(reservation);
    }

    pub(crate) fn apply_replayed_status(
        &self,
        id: &str,
        status: ReservationStatus,
        updated_at: NaiveDateTime,
    ) {
        let Some(date) = self.locate(id) else { return };
        let Some(day) = self.try_day(date) else { return };
        let mut book = day.try_write().expect("replay: uncontended write");
        if let Some(r) = book.get_mut(id) {
            r.status = status;
            r.updated_at = updated_at;
        }
    }

    /// Continue the id sequence from max(existing)+1 after replay.
    pub(crate) fn seed_next_id(&self) {
        let max = self
            .index
            .iter()
            .map(|e| e.key().parse::<u64>().unwrap_or(0))
            .max()
            .unwrap_or(0);
        self.next_id.store(max + 1, Ordering::SeqCst);
    }

    pub(crate) async fn active_by_date(&self, date: NaiveDate) -> Vec<Reservation> {
        match self.try_day(date) {
            Some(day) => day.read().await.active(),
            None => Vec::new(),
        }
    }

    pub(crate) async fn find_by_id(&self, id: &str) -> Option<Reservation> {
        let date = self.locate(id)?;
        let day = self.try_day(date)?;
        let book = day.read().await;
        book.get(id).cloned()
    }

    pub(crate) async fn collect(&self, filters: &StoreFilters) -> Vec<Reservation> {
        let mut dates: Vec<NaiveDate> = match filters.date {
            Some(date) => vec![date],
            None => self.days.iter().map(|e| *e.key()).collect(),
        };
        dates.sort();

        let mut out = Vec::new();
        for date in dates {
            let Some(day) = self.try_day(date) else { continue };
            let book = day.read().await;
            out.extend(
                book.reservations
                    .iter()
                    .filter(|r| filters.status.is_none_or(|s| r.status == s))
                    .cloned(),
            );
        }
        out
    }
}

/// The append-time invariant check, run by every backend while holding the
/// day's write lock.
pub(crate) fn check_append(
    book: &DayBook,
    catalog: &dyn Catalog,
    new: &NewReservation,
) -> Result<(), StoreError> {
    let active = book.reservations.iter().filter(|r| r.status.is_active()).count();
    if active >= MAX_RESERVATIONS_PER_DAY {
        return Err(StoreError::DayFull);
    }
    let duration = resolve_duration(catalog, &new.service_id);
    if let Some(hit) = find_conflict(
        catalog,
        &book.reservations,
        crate::model::minute_of_day(new.start_time),
        duration,
    ) {
        return Err(StoreError::SlotTaken(hit.id.clone()));
    }
    Ok(())
}

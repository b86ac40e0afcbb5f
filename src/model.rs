use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes since midnight, the unit for all slot arithmetic.
pub type MinuteOfDay = u32;

pub fn minute_of_day(t: NaiveTime) -> MinuteOfDay {
    t.hour() * 60 + t.minute()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Product,
    Service,
}

/// A catalog entry. Products are sold as-is; services occupy calendar time
/// and must declare a duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub material_cost: f64,
    pub category: ServiceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub image: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Service {
    /// Only active service-category entries can be reserved.
    pub fn is_bookable(&self) -> bool {
        self.active && self.category == ServiceCategory::Service
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// Active reservations occupy calendar time; completed and cancelled
    /// ones free their slot.
    pub fn is_active(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A booked slot. `total_price` is captured from the service at creation and
/// never re-derived, so later price changes leave past reservations alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(default)]
    pub notes: String,
    pub total_price: f64,
    pub status: ReservationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Reservation {
    pub fn start_minute(&self) -> MinuteOfDay {
        minute_of_day(self.start_time)
    }
}

/// Payload for [`crate::engine::Engine::create`]. Date and time arrive as the
/// raw strings the boundary received; parsing them (and the resulting error
/// taxonomy) belongs to the engine.
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_id: String,
    pub date: String,
    pub time: String,
    pub notes: String,
}

/// A validated reservation as handed to the store: everything but the
/// store-assigned identifier.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: String,
    pub total_price: f64,
    pub status: ReservationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewReservation {
    pub fn into_reservation(self, id: String) -> Reservation {
        Reservation {
            id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            service_id: self.service_id,
            date: self.date,
            start_time: self.start_time,
            notes: self.notes,
            total_price: self.total_price,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ── Read-enrichment types ────────────────────────────────────────

/// Service fields embedded into read results. Not stored; rebuilt from the
/// catalog on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ServiceSummary {
    /// Placeholder for reservations whose service was deleted from the
    /// catalog. Reads degrade gracefully instead of failing.
    pub fn missing() -> Self {
        Self {
            id: None,
            name: "service not found".into(),
            duration_min: None,
            price: None,
        }
    }
}

impl From<Service> for ServiceSummary {
    fn from(s: Service) -> Self {
        Self {
            id: Some(s.id),
            name: s.name,
            duration_min: s.duration_min,
            price: Some(s.price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationView {
    pub reservation: Reservation,
    pub service: ServiceSummary,
}

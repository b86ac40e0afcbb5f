use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::catalog::{MemoryCatalog, NewService, ServicePatch};
use crate::clock::ManualClock;
use crate::model::{CreateReservation, ReservationStatus, ServiceCategory};
use crate::notify::LogNotifier;
use crate::policy::CalendarPolicy;
use crate::store::MemoryStore;

use super::{Engine, ScheduleError};

const TUESDAY: &str = "2025-03-04";
const SUNDAY: &str = "2025-03-02";
const MONDAY: &str = "2025-03-03";

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
}

fn service(name: &str, duration_min: Option<u32>, category: ServiceCategory, price: f64) -> NewService {
    NewService {
        name: name.into(),
        description: format!("{name} description"),
        price,
        material_cost: 0.0,
        category,
        duration_min,
        image: String::new(),
        active: true,
    }
}

/// Catalog ids, in insert order:
/// "1" Lash Extension (service, 90 min, 120.0)
/// "2" Makeup Kit (product)
/// "3" Retired Perm (service, deactivated)
/// "4" Quick Touch-Up (service, 15 min)
/// "5" Brow Tint (service, 15 min)
fn seeded_catalog() -> Arc<MemoryCatalog> {
    let now = at(2025, 3, 1, 8, 0);
    let catalog = MemoryCatalog::new();
    catalog
        .insert(service("Lash Extension", Some(90), ServiceCategory::Service, 120.0), now)
        .unwrap();
    catalog
        .insert(service("Makeup Kit", None, ServiceCategory::Product, 89.9), now)
        .unwrap();
    let retired = catalog
        .insert(service("Retired Perm", Some(60), ServiceCategory::Service, 80.0), now)
        .unwrap();
    catalog
        .update(&retired.id, ServicePatch { active: Some(false), ..Default::default() }, now)
        .unwrap();
    catalog
        .insert(service("Quick Touch-Up", Some(15), ServiceCategory::Service, 30.0), now)
        .unwrap();
    catalog
        .insert(service("Brow Tint", Some(15), ServiceCategory::Service, 35.0), now)
        .unwrap();
    Arc::new(catalog)
}

fn engine_with_policy(policy: CalendarPolicy) -> (Engine, Arc<MemoryCatalog>, Arc<ManualClock>) {
    let catalog = seeded_catalog();
    let clock = Arc::new(ManualClock::new(at(2025, 3, 1, 12, 0)));
    let store = Arc::new(MemoryStore::new(catalog.clone()));
    let engine = Engine::new(
        catalog.clone(),
        store,
        policy,
        clock.clone(),
        Arc::new(LogNotifier),
    );
    (engine, catalog, clock)
}

fn engine() -> (Engine, Arc<MemoryCatalog>, Arc<ManualClock>) {
    engine_with_policy(CalendarPolicy::default())
}

fn request(service_id: &str, date: &str, time: &str) -> CreateReservation {
    CreateReservation {
        customer_name: "Ana Silva".into(),
        customer_email: "ana@example.com".into(),
        customer_phone: "555-0100".into(),
        service_id: service_id.into(),
        date: date.into(),
        time: time.into(),
        notes: String::new(),
    }
}

// ── create ───────────────────────────────────────────────

#[tokio::test]
async fn create_on_closed_days_fails() {
    let (engine, _, _) = engine();
    for date in [SUNDAY, MONDAY] {
        let err = engine.create(request("1", date, "09:00")).await.unwrap_err();
        assert!(matches!(err, ScheduleError::ClosedDay), "{date}: {err}");
    }
}

#[tokio::test]
async fn create_rejects_unparsable_date() {
    let (engine, _, _) = engine();
    let err = engine.create(request("1", "04/03/2025", "09:00")).await.unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidDate(_)));
}

#[tokio::test]
async fn create_requires_bookable_service() {
    let (engine, _, _) = engine();
    for service_id in ["42", "2", "3"] {
        let err = engine.create(request(service_id, TUESDAY, "09:00")).await.unwrap_err();
        assert!(
            matches!(err, ScheduleError::ServiceUnavailable),
            "service {service_id}: {err}"
        );
    }
}

#[tokio::test]
async fn create_rejects_time_outside_the_table() {
    let (engine, _, _) = engine();
    let err = engine.create(request("1", TUESDAY, "10:00")).await.unwrap_err();
    let ScheduleError::InvalidTimeSlot { ref allowed } = err else {
        panic!("expected InvalidTimeSlot, got {err}");
    };
    assert_eq!(allowed, &[t(9, 0), t(13, 0), t(15, 30), t(18, 0)]);
    // The message enumerates the valid alternatives.
    assert!(err.to_string().contains("09:00, 13:00, 15:30, 18:00"));
}

#[tokio::test]
async fn create_rejects_past_instants() {
    let (engine, _, clock) = engine();
    clock.set(at(2025, 3, 4, 14, 0));

    let err = engine.create(request("1", TUESDAY, "13:00")).await.unwrap_err();
    assert!(matches!(err, ScheduleError::PastDate));

    // Later the same day is still bookable.
    engine.create(request("1", TUESDAY, "15:30")).await.unwrap();
}

#[tokio::test]
async fn create_captures_price_and_starts_pending() {
    let (engine, catalog, _) = engine();
    let view = engine.create(request("1", TUESDAY, "09:00")).await.unwrap();
    assert_eq!(view.reservation.total_price, 120.0);
    assert_eq!(view.reservation.status, ReservationStatus::Pending);
    assert_eq!(view.service.name, "Lash Extension");

    // A later price change does not rewrite history.
    catalog
        .update("1", ServicePatch { price: Some(150.0), ..Default::default() }, at(2025, 3, 2, 8, 0))
        .unwrap();
    let reread = engine.get_by_id(&view.reservation.id).await.unwrap();
    assert_eq!(reread.reservation.total_price, 120.0);
    assert_eq!(reread.service.price, Some(150.0));
}

#[tokio::test]
async fn lash_extension_scenario() {
    let (engine, _, _) = engine();

    // 90-minute service on a weekday: 09:00 and 13:00 coexist.
    engine.create(request("1", TUESDAY, "09:00")).await.unwrap();
    engine.create(request("1", TUESDAY, "13:00")).await.unwrap();

    // 10:00 is not in the weekday table: a slot error, not a conflict.
    let err = engine.create(request("1", TUESDAY, "10:00")).await.unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidTimeSlot { .. }));

    // Repeating a taken slot is a conflict.
    let err = engine.create(request("1", TUESDAY, "09:00")).await.unwrap_err();
    assert!(matches!(err, ScheduleError::SlotConflict));
}

#[tokio::test]
async fn overlap_and_half_open_boundary() {
    // A denser table exposes interval overlap beyond exact-start matches.
    let tuesday_slots = vec![t(9, 0), t(10, 0), t(10, 30), t(13, 0)];
    let policy = CalendarPolicy::new([
        Vec::new(),
        tuesday_slots,
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    ]);
    let (engine, _, _) = engine_with_policy(policy);

    engine.create(request("1", TUESDAY, "09:00")).await.unwrap(); // [09:00, 10:30)

    let err = engine.create(request("1", TUESDAY, "10:00")).await.unwrap_err();
    assert!(matches!(err, ScheduleError::SlotConflict));

    // Touching the previous end exactly does not conflict.
    engine.create(request("1", TUESDAY, "10:30")).await.unwrap();
}

#[tokio::test]
async fn create_bounds_freeform_fields() {
    let (engine, _, _) = engine();
    let mut req = request("1", TUESDAY, "09:00");
    req.notes = "x".repeat(5000);
    let err = engine.create(req).await.unwrap_err();
    assert!(matches!(err, ScheduleError::LimitExceeded(_)));

    let mut req = request("1", TUESDAY, "09:00");
    req.customer_name = "x".repeat(500);
    let err = engine.create(req).await.unwrap_err();
    assert!(matches!(err, ScheduleError::LimitExceeded(_)));
}

// ── availability ─────────────────────────────────────────

#[tokio::test]
async fn closed_day_availability_is_empty_not_an_error() {
    let (engine, _, _) = engine();
    assert!(engine.list_available_times(SUNDAY, "1").await.unwrap().is_empty());
    assert!(engine.list_available_times(MONDAY, "1").await.unwrap().is_empty());
}

#[tokio::test]
async fn availability_excludes_taken_and_past_in_policy_order() {
    let (engine, _, clock) = engine();
    clock.set(at(2025, 3, 4, 12, 0)); // 09:00 already gone

    engine.create(request("1", TUESDAY, "13:00")).await.unwrap();

    let times = engine.list_available_times(TUESDAY, "1").await.unwrap();
    assert_eq!(times, vec![t(15, 30), t(18, 0)]);

    // Idempotent with no intervening writes.
    let again = engine.list_available_times(TUESDAY, "1").await.unwrap();
    assert_eq!(again, times);
}

#[tokio::test]
async fn availability_accounts_for_service_duration() {
    // Saturday: 08:00, 10:30, 13:00, 15:30. A 90-minute booking at 13:00
    // occupies [13:00, 14:30) and leaves 15:30 untouched.
    let (engine, _, _) = engine();
    let saturday = "2025-03-08";
    engine.create(request("1", saturday, "13:00")).await.unwrap();

    let times = engine.list_available_times(saturday, "1").await.unwrap();
    assert_eq!(times, vec![t(8, 0), t(10, 30), t(15, 30)]);
}

#[tokio::test]
async fn availability_uses_fallback_duration_for_orphans() {
    let policy = CalendarPolicy::new([
        Vec::new(),
        vec![t(9, 0), t(9, 15), t(9, 30)],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    ]);
    let (engine, catalog, _) = engine_with_policy(policy);

    engine.create(request("4", TUESDAY, "09:00")).await.unwrap();
    catalog.remove("4").unwrap();

    // The orphaned reservation is assumed 30 minutes long: it blocks 09:15
    // even though its service claimed only 15.
    let times = engine.list_available_times(TUESDAY, "5").await.unwrap();
    assert_eq!(times, vec![t(9, 30)]);
}

#[tokio::test]
async fn availability_validates_service_and_date() {
    let (engine, _, _) = engine();
    let err = engine.list_available_times(TUESDAY, "2").await.unwrap_err();
    assert!(matches!(err, ScheduleError::ServiceUnavailable));

    let err = engine.list_available_times("soon", "1").await.unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidDate(_)));
}

// ── status + reads ───────────────────────────────────────

#[tokio::test]
async fn cancelling_frees_the_slot() {
    let (engine, _, _) = engine();
    let view = engine.create(request("1", TUESDAY, "09:00")).await.unwrap();
    engine
        .update_status(&view.reservation.id, ReservationStatus::Cancelled)
        .await
        .unwrap();

    engine.create(request("1", TUESDAY, "09:00")).await.unwrap();
}

#[tokio::test]
async fn any_status_transition_is_permitted() {
    let (engine, _, _) = engine();
    let id = engine
        .create(request("1", TUESDAY, "09:00"))
        .await
        .unwrap()
        .reservation
        .id;

    for status in [
        ReservationStatus::Completed,
        ReservationStatus::Pending,
        ReservationStatus::Cancelled,
        ReservationStatus::Confirmed,
    ] {
        let view = engine.update_status(&id, status).await.unwrap();
        assert_eq!(view.reservation.status, status);
    }
}

#[tokio::test]
async fn update_status_unknown_id_is_not_found() {
    let (engine, _, _) = engine();
    let err = engine
        .update_status("42", ReservationStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound(id) if id == "42"));
}

#[tokio::test]
async fn orphaned_service_reads_as_placeholder() {
    let (engine, catalog, _) = engine();
    let id = engine
        .create(request("1", TUESDAY, "09:00"))
        .await
        .unwrap()
        .reservation
        .id;
    catalog.remove("1").unwrap();

    let view = engine.get_by_id(&id).await.unwrap();
    assert_eq!(view.service.name, "service not found");
    assert_eq!(view.service.id, None);

    let listed = engine.list(None, None).await;
    assert_eq!(listed[0].service.name, "service not found");
}

#[tokio::test]
async fn list_filters_by_status_and_date() {
    let (engine, _, _) = engine();
    let a = engine.create(request("1", TUESDAY, "09:00")).await.unwrap();
    let b = engine.create(request("1", "2025-03-07", "09:00")).await.unwrap();
    engine
        .update_status(&b.reservation.id, ReservationStatus::Confirmed)
        .await
        .unwrap();

    let all = engine.list(None, None).await;
    assert_eq!(all.len(), 2);
    // Ordered by (date, start time).
    assert_eq!(all[0].reservation.id, a.reservation.id);

    let confirmed = engine.list(Some(ReservationStatus::Confirmed), None).await;
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].reservation.id, b.reservation.id);

    let tuesday = engine.list(None, Some(TUESDAY)).await;
    assert_eq!(tuesday.len(), 1);

    // A date filter that does not parse is ignored, not an error.
    let sloppy = engine.list(None, Some("next week")).await;
    assert_eq!(sloppy.len(), 2);
}

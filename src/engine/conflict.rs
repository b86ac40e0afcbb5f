use crate::catalog::Catalog;
use crate::limits::DEFAULT_DURATION_MIN;
use crate::model::{MinuteOfDay, Reservation};

/// Half-open interval overlap on minutes-since-midnight: `[s1, s1+d1)` and
/// `[s2, s2+d2)` conflict iff each starts before the other ends. Touching
/// endpoints do not conflict.
pub fn overlaps(s1: MinuteOfDay, d1: u32, s2: MinuteOfDay, d2: u32) -> bool {
    s1 < s2 + d2 && s2 < s1 + d1
}

/// Duration of the referenced service in minutes. Services that were deleted
/// or lost their duration fall back to [`DEFAULT_DURATION_MIN`] so their
/// reservations keep occupying calendar time.
pub fn resolve_duration(catalog: &dyn Catalog, service_id: &str) -> u32 {
    catalog
        .get_service(service_id)
        .and_then(|s| s.duration_min)
        .unwrap_or(DEFAULT_DURATION_MIN)
}

/// First active reservation blocking `[start, start+duration)`. An exact
/// start-time match always conflicts, even where duration data would say
/// otherwise: a zero or missing duration must not open a double booking.
pub fn find_conflict<'a>(
    catalog: &dyn Catalog,
    existing: &'a [Reservation],
    start: MinuteOfDay,
    duration: u32,
) -> Option<&'a Reservation> {
    existing.iter().filter(|r| r.status.is_active()).find(|r| {
        let other_start = r.start_minute();
        other_start == start
            || overlaps(start, duration, other_start, resolve_duration(catalog, &r.service_id))
    })
}

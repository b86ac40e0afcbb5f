//! Hard caps applied at the engine and store boundaries.

use std::time::Duration;

pub const MAX_CUSTOMER_FIELD_LEN: usize = 120;
pub const MAX_NOTES_LEN: usize = 500;
pub const MAX_SERVICE_NAME_LEN: usize = 120;
pub const MAX_RESERVATIONS_PER_DAY: usize = 64;

/// Shortest duration a bookable service may declare, in minutes.
pub const MIN_SERVICE_DURATION_MIN: u32 = 15;

/// Assumed duration for a reservation whose service no longer resolves.
/// Keeps stale rows occupying their slot instead of silently freeing it.
pub const DEFAULT_DURATION_MIN: u32 = 30;

pub const NOTIFY_ATTEMPTS: u32 = 3;
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);
pub const NOTIFY_RETRY_DELAY: Duration = Duration::from_millis(250);

use chrono::NaiveTime;

/// Caller-visible failures of scheduling operations. Everything here is a
/// bad-request-class outcome except `NotFound` and `Internal`.
#[derive(Debug)]
pub enum ScheduleError {
    /// Referenced service missing, inactive, or not bookable (wrong category).
    ServiceUnavailable,
    InvalidDate(String),
    /// The requested day has no operating hours (creation only;
    /// availability listings return empty instead).
    ClosedDay,
    /// Time not among the day's bookable start times. Carries the valid
    /// alternatives so the message can enumerate them.
    InvalidTimeSlot { allowed: Vec<NaiveTime> },
    PastDate,
    MissingDuration,
    /// Overlap with an existing active reservation, or exact-start collision.
    SlotConflict,
    NotFound(String),
    LimitExceeded(&'static str),
    /// Persistence or unexpected failure. The detail is logged; Display
    /// stays generic.
    Internal(String),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::ServiceUnavailable => write!(f, "service not found or unavailable"),
            ScheduleError::InvalidDate(raw) => write!(f, "invalid date: {raw}"),
            ScheduleError::ClosedDay => write!(f, "closed on the requested day"),
            ScheduleError::InvalidTimeSlot { allowed } => {
                let list = allowed
                    .iter()
                    .map(|t| t.format("%H:%M").to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "invalid time slot; available times: {list}")
            }
            ScheduleError::PastDate => write!(f, "cannot schedule in the past"),
            ScheduleError::MissingDuration => write!(f, "service has no configured duration"),
            ScheduleError::SlotConflict => {
                write!(f, "time slot is already taken or overlaps another reservation")
            }
            ScheduleError::NotFound(id) => write!(f, "reservation not found: {id}"),
            ScheduleError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ScheduleError::Internal(_) => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for ScheduleError {}

use std::io;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Bookable start times per weekday, Monday first. Business data, not derived
/// logic. Operators change hours by editing the table (or the JSON file it
/// loads from), never the conflict algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarPolicy {
    week: [Vec<NaiveTime>; 7],
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("literal time")
}

impl Default for CalendarPolicy {
    /// The studio's standing hours: closed Sunday and Monday, a short
    /// Saturday list, four weekday slots Tuesday through Friday.
    fn default() -> Self {
        let weekday = vec![t(9, 0), t(13, 0), t(15, 30), t(18, 0)];
        Self {
            week: [
                Vec::new(),                                  // Monday
                weekday.clone(),                             // Tuesday
                weekday.clone(),                             // Wednesday
                weekday.clone(),                             // Thursday
                weekday,                                     // Friday
                vec![t(8, 0), t(10, 30), t(13, 0), t(15, 30)], // Saturday
                Vec::new(),                                  // Sunday
            ],
        }
    }
}

impl CalendarPolicy {
    pub fn new(week: [Vec<NaiveTime>; 7]) -> Self {
        Self { week }
    }

    /// The ordered bookable start times for `date`, a pure function of its
    /// weekday. Closed days yield an empty slice; there is no error case.
    pub fn allowed_start_times(&self, date: NaiveDate) -> &[NaiveTime] {
        &self.week[date.weekday().num_days_from_monday() as usize]
    }

    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.allowed_start_times(date).is_empty()
    }

    /// Load the table from a JSON file so hours live outside the binary.
    pub fn load(path: &Path) -> io::Result<Self> {
        let data = std::fs::read(path)?;
        serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

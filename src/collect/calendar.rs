use super::dedupe_by_email;
use crate::core::IncomingEvent;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One mentoring calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    #[serde(default)]
    pub employee_email: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CalendarEntry {
    /// Whether the entry spans midnight at the start of `day`.
    pub fn covers(&self, day: NaiveDate) -> bool {
        let midnight = day.and_time(NaiveTime::MIN);
        self.start <= midnight && self.end >= midnight
    }
}

/// Mentoring events for every entry running on `day`, one per employee.
pub fn mentoring_events(entries: &[CalendarEntry], day: NaiveDate, activity: &str) -> Vec<IncomingEvent> {
    let events = entries
        .iter()
        .filter(|entry| entry.covers(day))
        .map(|entry| IncomingEvent {
            person_id: None,
            email: entry.employee_email.clone(),
            date: day,
            activity: activity.to_string(),
            paths: Default::default(),
        })
        .collect();

    dedupe_by_email(events)
}

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Start date, ISO-8601
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub organizer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub attendees: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u64>,
    #[serde(default)]
    pub attendee_ids: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl Event {
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.starts_at().map_or(false, |start| start >= now)
    }

    pub fn is_full(&self) -> bool {
        self.max_attendees.map_or(false, |max| self.attendees >= max)
    }

    /// Remaining places, or None when the event has no cap
    pub fn spots_remaining(&self) -> Option<u64> {
        self.max_attendees.map(|max| max.saturating_sub(self.attendees))
    }

    pub fn is_attending(&self, user_id: &str) -> bool {
        self.attendee_ids.iter().any(|id| id == user_id)
    }

    /// Case-insensitive match against title, description, location and organizer
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.title, &self.description, &self.location, &self.organizer]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Which events to show relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    #[default]
    All,
    Upcoming,
    Past,
}

impl Timeframe {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "upcoming" => Some(Self::Upcoming),
            "past" => Some(Self::Past),
            _ => None,
        }
    }

    pub fn includes(&self, event: &Event, now: DateTime<Utc>) -> bool {
        match self {
            Timeframe::All => true,
            Timeframe::Upcoming => event.is_upcoming(now),
            Timeframe::Past => event.starts_at().map_or(false, |start| start < now),
        }
    }

    /// Past events read newest first; everything else soonest first
    pub fn sort_order(&self) -> EventSortOrder {
        match self {
            Timeframe::Past => EventSortOrder::Descending,
            _ => EventSortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSortOrder {
    #[default]
    Ascending,
    Descending,
}

impl EventSortOrder {
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        match self {
            EventSortOrder::Ascending => a.starts_at().cmp(&b.starts_at()),
            EventSortOrder::Descending => b.starts_at().cmp(&a.starts_at()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn event_on(date: DateTime<Utc>) -> Event {
        serde_json::from_value(json!({
            "id": "event_1",
            "title": "Digital Art Workshop",
            "date": date.to_rfc3339(),
            "location": "Virtual Event - Zoom",
            "organizer": "Creative Arts Association",
            "attendees": 15,
            "maxAttendees": 50
        }))
        .unwrap()
    }

    #[test]
    fn test_timeframe_filters() {
        let now = Utc::now();
        let upcoming = event_on(now + Duration::days(7));
        let past = event_on(now - Duration::days(7));

        assert!(Timeframe::Upcoming.includes(&upcoming, now));
        assert!(!Timeframe::Upcoming.includes(&past, now));
        assert!(Timeframe::Past.includes(&past, now));
        assert!(Timeframe::All.includes(&past, now));
    }

    #[test]
    fn test_capacity() {
        let mut event = event_on(Utc::now());
        assert_eq!(event.spots_remaining(), Some(35));
        assert!(!event.is_full());

        event.attendees = 50;
        assert!(event.is_full());
        assert_eq!(event.spots_remaining(), Some(0));

        event.max_attendees = None;
        assert!(!event.is_full());
        assert_eq!(event.spots_remaining(), None);
    }

    #[test]
    fn test_search_covers_location_and_organizer() {
        let event = event_on(Utc::now());
        assert!(event.matches_search("zoom"));
        assert!(event.matches_search("creative arts"));
        assert!(!event.matches_search("exhibition"));
    }

    #[test]
    fn test_past_sorted_newest_first() {
        let now = Utc::now();
        let older = event_on(now - Duration::days(20));
        let newer = event_on(now - Duration::days(2));
        let order = Timeframe::Past.sort_order();
        assert_eq!(order.compare(&newer, &older), Ordering::Less);
    }
}

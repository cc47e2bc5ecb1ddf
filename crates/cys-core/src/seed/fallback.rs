//! Built-in datasets used when no seed document can be found.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use crate::record::{timestamp, Collection, Record};
use crate::resource::{ResourceType, EVENTS, PORTFOLIOS, USERS};

/// Password given to the demo accounts. Hashed before it is ever stored.
pub const DEMO_PASSWORD: &str = "password123";

/// Fixed sample data for the resource types the site ships with, or `None`
/// for anything else. Timestamps are relative to `now`.
pub fn fallback_collection(resource: &ResourceType, now: DateTime<Utc>) -> Option<Collection> {
    let values = match resource.as_str() {
        PORTFOLIOS => portfolios(now),
        EVENTS => events(now),
        USERS => users(now),
        _ => return None,
    };

    values
        .into_iter()
        .map(Record::try_from)
        .collect::<Result<Collection, _>>()
        .ok()
}

fn portfolios(now: DateTime<Utc>) -> Vec<Value> {
    let created = timestamp(now);
    vec![
        json!({
            "id": "portfolio_1",
            "userId": "user_1",
            "creator": "Demo User",
            "title": "Sample Artwork",
            "description": "This is a sample artwork for demonstration purposes.",
            "category": "Visual Art",
            "tags": ["Digital Art", "Illustration", "Sample"],
            "imageUrl": "https://picsum.photos/600/400?random=1",
            "createdAt": created,
            "likes": 15,
            "comments": [
                {
                    "userId": "user_2",
                    "username": "Sample User",
                    "content": "This looks great!",
                    "createdAt": created
                }
            ]
        }),
        json!({
            "id": "portfolio_2",
            "userId": "user_2",
            "creator": "Creative Creator",
            "title": "Music Composition",
            "description": "A sample music track for demonstration.",
            "category": "Music",
            "tags": ["Electronic", "Demo", "Sample"],
            "imageUrl": "https://picsum.photos/600/400?random=2",
            "audioUrl": "https://example.com/sample-audio.mp3",
            "createdAt": created,
            "likes": 8,
            "comments": []
        }),
        json!({
            "id": "portfolio_3",
            "userId": "user_3",
            "creator": "Writer Person",
            "title": "Short Story",
            "description": "A brief story for demonstration purposes.",
            "category": "Writing",
            "tags": ["Fiction", "Story", "Sample"],
            "imageUrl": "https://picsum.photos/600/400?random=3",
            "content": "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Cras non magna velit. Maecenas ac ultricies massa. Suspendisse potenti.",
            "createdAt": created,
            "likes": 12,
            "comments": []
        }),
    ]
}

fn events(now: DateTime<Utc>) -> Vec<Value> {
    let in_days = |days: i64| timestamp(now + Duration::days(days));
    vec![
        json!({
            "id": "event_1",
            "title": "Digital Art Workshop",
            "description": "Learn digital art techniques from professional artists.",
            "date": in_days(7),
            "endDate": timestamp(now + Duration::days(7) + Duration::hours(3)),
            "location": "Virtual Event - Zoom",
            "category": "Workshop",
            "tags": ["Digital Art", "Learning", "Virtual"],
            "organizer": "Creative Arts Association",
            "imageUrl": "https://picsum.photos/600/400?random=4",
            "attendees": 15,
            "maxAttendees": 50,
            "attendeeIds": [],
            "isFeatured": true
        }),
        json!({
            "id": "event_2",
            "title": "Youth Art Exhibition",
            "description": "Showcase featuring artwork from talented young creators.",
            "date": in_days(14),
            "endDate": in_days(21),
            "location": "Community Art Gallery, 123 Main St",
            "category": "Exhibition",
            "tags": ["Exhibition", "Art", "Youth"],
            "organizer": "Youth Art Foundation",
            "imageUrl": "https://picsum.photos/600/400?random=5",
            "attendees": 30,
            "maxAttendees": 100,
            "attendeeIds": [],
            "isFeatured": true
        }),
        json!({
            "id": "event_3",
            "title": "Open Mic Night",
            "description": "Share your music, poetry and stories with the community.",
            "date": in_days(-10),
            "endDate": timestamp(now - Duration::days(10) + Duration::hours(2)),
            "location": "The Corner Cafe",
            "category": "Performance",
            "tags": ["Music", "Poetry", "Performance"],
            "organizer": "Local Creatives Collective",
            "imageUrl": "https://picsum.photos/600/400?random=6",
            "attendees": 22,
            "maxAttendees": 40,
            "attendeeIds": [],
            "isFeatured": false
        }),
    ]
}

fn users(now: DateTime<Utc>) -> Vec<Value> {
    let created = timestamp(now);
    vec![
        json!({
            "id": "user_1",
            "name": "Demo User",
            "email": "demo@example.com",
            "password": DEMO_PASSWORD,
            "avatar": "https://i.pravatar.cc/150?img=1",
            "bio": "This is a sample user for demonstration purposes.",
            "createdAt": created,
            "role": "user",
            "skills": ["Digital Art", "Illustration", "Design"],
            "socialLinks": {"instagram": "demo_user", "website": "example.com"}
        }),
        json!({
            "id": "user_2",
            "name": "Creative Creator",
            "email": "creator@example.com",
            "password": DEMO_PASSWORD,
            "avatar": "https://i.pravatar.cc/150?img=2",
            "bio": "Music producer and digital artist.",
            "createdAt": created,
            "role": "user",
            "skills": ["Music Production", "Composition", "Digital Art"],
            "socialLinks": {"soundcloud": "creative_sounds", "instagram": "creative_creator"}
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, Portfolio};

    fn fallback(name: &str) -> Option<Collection> {
        fallback_collection(&ResourceType::from_path(name).unwrap(), Utc::now())
    }

    #[test]
    fn test_known_types_have_fallbacks() {
        assert_eq!(fallback("portfolios").unwrap().len(), 3);
        assert_eq!(fallback("events").unwrap().len(), 3);
        assert_eq!(fallback("users").unwrap().len(), 2);
        assert!(fallback("playlists").is_none());
    }

    #[test]
    fn test_fallback_records_fit_models() {
        for record in fallback("portfolios").unwrap() {
            record.to_model::<Portfolio>().unwrap();
        }
        for record in fallback("events").unwrap() {
            record.to_model::<Event>().unwrap();
        }
    }

    #[test]
    fn test_fallback_ids_unique() {
        let events = fallback("events").unwrap();
        let mut ids: Vec<_> = events.iter().filter_map(|r| r.id()).collect();
        ids.dedup();
        assert_eq!(ids.len(), events.len());
    }

    #[test]
    fn test_fallback_events_span_past_and_future() {
        let now = Utc::now();
        let events: Vec<Event> = fallback("events")
            .unwrap()
            .iter()
            .map(|r| r.to_model().unwrap())
            .collect();
        assert!(events.iter().any(|e| e.is_upcoming(now)));
        assert!(events.iter().any(|e| !e.is_upcoming(now)));
    }
}

//! Gallery and event operations built on the resource store.
//!
//! These are the behaviours the site pages layer over raw collections:
//! attending events, liking and publishing works, member profiles, and
//! filtering/sorting the gallery and the events calendar.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::Session;
use crate::error::{Result, StoreError};
use crate::models::{Event, EventSortOrder, Portfolio, PortfolioSort, Timeframe};
use crate::record::{Collection, Record};
use crate::resource::{ResourceType, EVENTS, PORTFOLIOS};
use crate::seed::SeedSource;
use crate::store::ResourceStore;

const ATTENDEE_IDS_FIELD: &str = "attendeeIds";
const ATTENDEES_FIELD: &str = "attendees";
const MAX_ATTENDEES_FIELD: &str = "maxAttendees";
const LIKED_BY_FIELD: &str = "likedBy";
const LIKES_FIELD: &str = "likes";

/// Image used when a work is published without one
pub const PLACEHOLDER_IMAGE: &str = "/public/images/placeholder.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attendance {
    Joined,
    Left,
}

/// A work's like status for the current user after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u64,
}

/// Totals shown on a member's profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub works: usize,
    pub likes: u64,
    pub comments: usize,
}

/// Toggle the signed-in user's attendance at an event.
///
/// Joining a full event fails with `EventFull`; leaving is always allowed.
/// `attendeeIds` and the `attendees` count change together. Only those
/// fields are read, so events missing other fields can still be attended.
pub async fn toggle_attendance<F: SeedSource>(
    store: &ResourceStore<F>,
    session: &Session,
    event_id: &str,
) -> Result<Attendance> {
    let user_id = signed_in_user(session)?;
    let resource = ResourceType::from_path(EVENTS)?;
    let now = Utc::now();

    let outcome = store
        .modify(&resource, |records| {
            let record = find_mut(records, EVENTS, event_id)?;
            let mut attendee_ids = string_list(record, ATTENDEE_IDS_FIELD);
            let attendees = count(record, ATTENDEES_FIELD).unwrap_or(0);

            let (outcome, attendees) = if attendee_ids.contains(&user_id) {
                attendee_ids.retain(|id| id != &user_id);
                (Attendance::Left, attendees.saturating_sub(1))
            } else {
                if count(record, MAX_ATTENDEES_FIELD).map_or(false, |max| attendees >= max) {
                    return Err(StoreError::EventFull(event_id.to_string()));
                }
                attendee_ids.push(user_id.clone());
                (Attendance::Joined, attendees + 1)
            };

            let partial = Record::new()
                .with(ATTENDEE_IDS_FIELD, json!(attendee_ids))
                .with(ATTENDEES_FIELD, attendees);
            record.merge(partial, now);
            Ok(outcome)
        })
        .await?;

    info!(event_id, user_id = %user_id, ?outcome, "Attendance changed");
    Ok(outcome)
}

/// Like or unlike a work for the signed-in user.
///
/// `likedBy` records who liked the work so a user counts once; `likes`
/// moves with it and never goes below zero.
pub async fn toggle_like<F: SeedSource>(
    store: &ResourceStore<F>,
    session: &Session,
    work_id: &str,
) -> Result<LikeState> {
    let user_id = signed_in_user(session)?;
    let resource = ResourceType::from_path(PORTFOLIOS)?;
    let now = Utc::now();

    let state = store
        .modify(&resource, |records| {
            let record = find_mut(records, PORTFOLIOS, work_id)?;
            let mut liked_by = string_list(record, LIKED_BY_FIELD);
            let likes = count(record, LIKES_FIELD).unwrap_or(0);

            let state = if liked_by.contains(&user_id) {
                liked_by.retain(|id| id != &user_id);
                LikeState {
                    liked: false,
                    likes: likes.saturating_sub(1),
                }
            } else {
                liked_by.push(user_id.clone());
                LikeState {
                    liked: true,
                    likes: likes + 1,
                }
            };

            let partial = Record::new()
                .with(LIKED_BY_FIELD, json!(liked_by))
                .with(LIKES_FIELD, state.likes);
            record.merge(partial, now);
            Ok(state)
        })
        .await?;

    info!(work_id, user_id = %user_id, liked = state.liked, likes = state.likes, "Like toggled");
    Ok(state)
}

/// A work as submitted from the upload form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

impl WorkDraft {
    /// Every missing field, reported together
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.title.trim().is_empty() {
            problems.push("Please enter a title for your work");
        }
        if self.description.trim().is_empty() {
            problems.push("Please enter a description for your work");
        }
        if self.category.trim().is_empty() {
            problems.push("Please select a category for your work");
        }
        if self.tags.iter().all(|tag| tag.trim().is_empty()) {
            problems.push("Please add at least one tag for your work");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(StoreError::InvalidInput(problems.join("; ")))
        }
    }
}

/// Validate a draft and add it to the gallery as the signed-in user's work.
pub async fn publish_work<F: SeedSource>(
    store: &ResourceStore<F>,
    session: &Session,
    draft: WorkDraft,
) -> Result<Record> {
    let user_id = signed_in_user(session)?;
    draft.validate()?;

    let mut tags: Vec<String> = Vec::new();
    for tag in draft.tags.iter().map(|tag| tag.trim()).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|seen| seen == tag) {
            tags.push(tag.to_string());
        }
    }

    let work = Record::new()
        .with("title", draft.title.trim())
        .with("description", draft.description.trim())
        .with("category", draft.category.trim())
        .with("tags", json!(tags))
        .with("userId", user_id)
        .with("creator", session.user().get_str("name").unwrap_or_default())
        .with(
            "imageUrl",
            draft.image_url.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        );

    let published = store.create_record(Some(session), PORTFOLIOS, work).await?;
    info!(work_id = ?published.id(), "Work published");
    Ok(published)
}

/// Works uploaded by `user_id`, in collection order
pub async fn user_portfolios<F: SeedSource>(
    store: &ResourceStore<F>,
    user_id: &str,
) -> Result<Vec<Portfolio>> {
    let records = store
        .find_records(PORTFOLIOS, |record| record.get_str("userId") == Some(user_id))
        .await?;
    to_models(&records)
}

pub async fn profile_stats<F: SeedSource>(
    store: &ResourceStore<F>,
    user_id: &str,
) -> Result<ProfileStats> {
    let works = user_portfolios(store, user_id).await?;
    Ok(ProfileStats {
        works: works.len(),
        likes: works.iter().map(|work| work.likes).sum(),
        comments: works.iter().map(|work| work.comments.len()).sum(),
    })
}

/// Gallery filter. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct PortfolioQuery {
    pub category: Option<String>,
    /// Matches works carrying any of these tags
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub sort: PortfolioSort,
}

impl PortfolioQuery {
    pub fn matches(&self, work: &Portfolio) -> bool {
        if let Some(category) = &self.category {
            if &work.category != category {
                return false;
            }
        }
        if !self.tags.is_empty() && !work.has_any_tag(&self.tags) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => work.matches_search(needle),
            _ => true,
        }
    }

    pub fn apply(&self, works: Vec<Portfolio>) -> Vec<Portfolio> {
        let mut matched: Vec<_> = works.into_iter().filter(|work| self.matches(work)).collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));
        matched
    }

    pub async fn run<F: SeedSource>(&self, store: &ResourceStore<F>) -> Result<Vec<Portfolio>> {
        let works = to_models(&store.fetch_collection(PORTFOLIOS).await?)?;
        Ok(self.apply(works))
    }
}

/// Events filter. Results are ordered by date as the timeframe dictates.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub category: Option<String>,
    pub timeframe: Timeframe,
    pub search: Option<String>,
}

impl EventQuery {
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        if let Some(category) = &self.category {
            if &event.category != category {
                return false;
            }
        }
        if !self.timeframe.includes(event, now) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => event.matches_search(needle),
            _ => true,
        }
    }

    pub fn apply(&self, events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
        let order: EventSortOrder = self.timeframe.sort_order();
        let mut matched: Vec<_> = events
            .into_iter()
            .filter(|event| self.matches(event, now))
            .collect();
        matched.sort_by(|a, b| order.compare(a, b));
        matched
    }

    pub async fn run<F: SeedSource>(&self, store: &ResourceStore<F>) -> Result<Vec<Event>> {
        let events = to_models(&store.fetch_collection(EVENTS).await?)?;
        Ok(self.apply(events, Utc::now()))
    }
}

fn signed_in_user(session: &Session) -> Result<String> {
    if !session.is_valid() {
        return Err(StoreError::AuthRequired);
    }
    session
        .user_id()
        .map(str::to_string)
        .ok_or(StoreError::AuthRequired)
}

fn find_mut<'a>(records: &'a mut Collection, resource: &str, id: &str) -> Result<&'a mut Record> {
    records
        .iter_mut()
        .find(|record| record.id() == Some(id))
        .ok_or_else(|| StoreError::not_found(resource, id))
}

/// String entries of an array field; missing or malformed reads as empty
fn string_list(record: &Record, field: &str) -> Vec<String> {
    record
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn count(record: &Record, field: &str) -> Option<u64> {
    record.get(field).and_then(Value::as_u64)
}

/// Convert records to a typed model, skipping ones that do not fit
fn to_models<T: serde::de::DeserializeOwned>(records: &Collection) -> Result<Vec<T>> {
    Ok(records
        .iter()
        .filter_map(|record| match record.to_model() {
            Ok(model) => Some(model),
            Err(e) => {
                debug!(id = ?record.id(), error = %e, "Skipping record that does not fit model");
                None
            }
        })
        .collect())
}

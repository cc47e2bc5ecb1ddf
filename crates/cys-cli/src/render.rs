//! Plain-text rendering for terminal output.

use chrono::{DateTime, Utc};
use cys_core::community::ProfileStats;
use cys_core::models::{Event, Portfolio, User};
use cys_core::utils::{format_date, format_optional, truncate_string};

/// Column width for titles in list output
const TITLE_WIDTH: usize = 32;

pub fn portfolio_line(work: &Portfolio) -> String {
    format!(
        "{:<18} {:<width$} {:<12} {:>5} likes  by {}",
        work.id,
        truncate_string(&work.title, TITLE_WIDTH),
        work.category,
        work.likes,
        if work.creator.is_empty() { "unknown" } else { &work.creator },
        width = TITLE_WIDTH,
    )
}

pub fn event_line(event: &Event, now: DateTime<Utc>) -> String {
    let capacity = match event.spots_remaining() {
        _ if !event.is_upcoming(now) => format!("{} attended", event.attendees),
        Some(0) => "full".to_string(),
        Some(left) => format!("{} spots left", left),
        None => format!("{} attending", event.attendees),
    };
    format!(
        "{:<12} {:<12} {:<width$} {:<28} {}",
        event.id,
        format_date(&event.date),
        truncate_string(&event.title, TITLE_WIDTH),
        truncate_string(&event.location, 28),
        capacity,
        width = TITLE_WIDTH,
    )
}

pub fn user_summary(user: &User) -> String {
    let mut lines = vec![format!("{} <{}> ({})", user.name, user.email, user.id)];
    if !user.bio.is_empty() {
        lines.push(user.bio.clone());
    }
    if !user.skills.is_empty() {
        lines.push(format!("Skills: {}", user.skills.join(", ")));
    }
    lines.push(format!(
        "Member since {}",
        format_date(&format_optional(&user.created_at, "unknown"))
    ));
    lines.join("\n")
}

pub fn profile_stats(stats: &ProfileStats) -> String {
    format!(
        "{} works, {} likes, {} comments",
        stats.works, stats.likes, stats.comments
    )
}

//! Typed views over stored records.
//!
//! Records are schemaless JSON objects; these structs give callers a typed
//! view of the three collections the site ships with:
//!
//! - `Portfolio`, `Comment`: works in the gallery
//! - `Event`: community events and attendance
//! - `User`: public profile fields (never the stored credential)

pub mod event;
pub mod portfolio;
pub mod user;

pub use event::{Event, EventSortOrder, Timeframe};
pub use portfolio::{Comment, Portfolio, PortfolioSort};
pub use user::User;

//! Seed data for cold caches.
//!
//! When a collection is not cached yet, the store tries a fixed list of
//! candidate locations for a bundled JSON document, and falls back to a
//! small built-in dataset for the resource types the site ships with.
//!
//! Candidate locations, in the order tried:
//! 1. `/public/data/<type>.json`
//! 2. `/data/<type>.json`
//! 3. `/<type>.json`
//! 4. `/src/data/<type>.json`

pub mod dir;
pub mod fallback;
pub mod http;

pub use dir::DirSeedSource;
pub use fallback::fallback_collection;
pub use http::HttpSeedSource;

use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::credentials;
use crate::record::{Collection, Record};
use crate::resource::{ResourceType, USERS};

/// Somewhere seed documents can be read from.
pub trait SeedSource: Send + Sync {
    /// Fetch the raw document at `location`.
    ///
    /// `Ok(None)` means nothing is there; errors are treated as a
    /// miss by the loader and the next candidate is tried.
    fn fetch_document(&self, location: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Seed source that never finds anything, leaving only the built-in fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeeds;

impl SeedSource for NoSeeds {
    async fn fetch_document(&self, _location: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Seed source chosen from configuration at startup
pub enum Seeds {
    Http(HttpSeedSource),
    Dir(DirSeedSource),
    None(NoSeeds),
}

impl SeedSource for Seeds {
    async fn fetch_document(&self, location: &str) -> Result<Option<String>> {
        match self {
            Seeds::Http(source) => source.fetch_document(location).await,
            Seeds::Dir(source) => source.fetch_document(location).await,
            Seeds::None(source) => source.fetch_document(location).await,
        }
    }
}

/// Where a seeded collection came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOrigin {
    Document(String),
    Fallback,
}

pub fn candidate_locations(resource: &ResourceType) -> [String; 4] {
    let name = resource.as_str();
    [
        format!("/public/data/{}.json", name),
        format!("/data/{}.json", name),
        format!("/{}.json", name),
        format!("/src/data/{}.json", name),
    ]
}

/// Try every candidate location in order and return the first document
/// that parses as a collection.
pub async fn load_document<S: SeedSource>(
    source: &S,
    resource: &ResourceType,
) -> Option<(String, Collection)> {
    for location in candidate_locations(resource) {
        let text = match source.fetch_document(&location).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(%resource, %location, "No seed document");
                continue;
            }
            Err(e) => {
                debug!(%resource, %location, error = %e, "Seed candidate failed");
                continue;
            }
        };

        match parse_collection(&text) {
            Ok(records) => return Some((location, records)),
            Err(e) => debug!(%resource, %location, error = %e, "Seed document unusable"),
        }
    }
    None
}

/// Resolve seed data for a cold collection: bundled document first, then
/// the built-in fallback. The result is prepared for persistence.
pub async fn seed_collection<S: SeedSource>(
    source: &S,
    resource: &ResourceType,
    now: DateTime<Utc>,
) -> crate::error::Result<Option<(SeedOrigin, Collection)>> {
    let (origin, records) = match load_document(source, resource).await {
        Some((location, records)) => (SeedOrigin::Document(location), records),
        None => match fallback_collection(resource, now) {
            Some(records) => (SeedOrigin::Fallback, records),
            None => return Ok(None),
        },
    };

    info!(%resource, origin = ?origin, count = records.len(), "Collection seeded");
    Ok(Some((origin, prepare_collection(resource, records)?)))
}

/// Parse a JSON array of objects into records.
pub fn parse_collection(text: &str) -> crate::error::Result<Collection> {
    let values: Vec<Value> = serde_json::from_str(text)?;
    values.into_iter().map(Record::try_from).collect()
}

/// Per-type cleanup applied before seed data is persisted.
pub fn prepare_collection(
    resource: &ResourceType,
    records: Collection,
) -> crate::error::Result<Collection> {
    records
        .into_iter()
        .map(|record| prepare_record(resource, record))
        .collect()
}

/// Cleanup for one record about to be stored.
///
/// User records may carry a plaintext `password` field; it is replaced by
/// a salted hash so plaintext never reaches the cache.
pub fn prepare_record(resource: &ResourceType, record: Record) -> crate::error::Result<Record> {
    if resource.as_str() == USERS {
        credentials::seal_plaintext_password(record)
    } else {
        Ok(record)
    }
}

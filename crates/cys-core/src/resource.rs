//! Resource naming: paths in, resource types and cache keys out.
//!
//! Callers address collections with path-like identifiers such as
//! `/public/data/portfolios.json`. The resource type is the last path
//! segment with its extension stripped, and every type is cached under
//! `cys_<type>`.

use std::fmt;

use crate::error::{Result, StoreError};

/// Prefix shared by every key the application writes
pub const KEY_PREFIX: &str = "cys_";

pub const PORTFOLIOS: &str = "portfolios";
pub const EVENTS: &str = "events";
pub const USERS: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceType(String);

impl ResourceType {
    /// Derive the resource type from a path-like identifier.
    pub fn from_path(path: &str) -> Result<Self> {
        let segment = path.rsplit('/').next().unwrap_or_default().trim();
        let name = match segment.rfind('.') {
            Some(0) | None => segment,
            Some(dot) => &segment[..dot],
        };
        if name.is_empty() {
            return Err(StoreError::InvalidResourcePath(path.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key the collection is persisted under
    pub fn cache_key(&self) -> String {
        format!("{}{}", KEY_PREFIX, self.0)
    }

    /// Prefix for ids generated in this collection, e.g. `portfolios_`
    pub fn id_prefix(&self) -> String {
        format!("{}_", self.0)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Schemaless records stored in resource collections.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A whole resource collection, in insertion order
pub type Collection = Vec<Record>;

/// A single JSON object in a collection.
///
/// Field types are not enforced here; the typed views in [`crate::models`]
/// deserialize from records when a caller wants them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// Returned by a successful delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub deleted: bool,
    pub id: String,
}

/// Current time in the `2024-01-01T12:00:00.000Z` form used for timestamps
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn created_at(&self) -> Option<&str> {
        self.0.get(CREATED_AT_FIELD).and_then(Value::as_str)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.0.get(UPDATED_AT_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Fill in `id` and `createdAt` when the caller did not supply them.
    ///
    /// A missing, null or empty value counts as not supplied. An `id` that
    /// is present but not a string is rejected, and a `createdAt` that is
    /// not a non-empty string is replaced.
    pub fn stamp_created(
        &mut self,
        id: impl FnOnce() -> String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match self.get(ID_FIELD) {
            None | Some(Value::Null) => {
                self.insert(ID_FIELD, id());
            }
            Some(Value::String(s)) if s.is_empty() => {
                self.insert(ID_FIELD, id());
            }
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(StoreError::InvalidRecord(format!(
                    "id must be a string, got {}",
                    value_kind(other)
                )))
            }
        }
        if self.created_at().map_or(true, str::is_empty) {
            self.insert(CREATED_AT_FIELD, timestamp(now));
        }
        Ok(())
    }

    /// Shallow merge of `partial` over this record.
    ///
    /// `id` and `createdAt` are immutable and skipped; `updatedAt` is
    /// always overwritten with `now`.
    pub fn merge(&mut self, partial: Record, now: DateTime<Utc>) {
        for (field, value) in partial.0 {
            if field == ID_FIELD || field == CREATED_AT_FIELD {
                continue;
            }
            self.0.insert(field, value);
        }
        self.insert(UPDATED_AT_FIELD, timestamp(now));
    }

    /// Deserialize into a typed model
    pub fn to_model<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }
}

impl TryFrom<Value> for Record {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(StoreError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                value_kind(&other)
            ))),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

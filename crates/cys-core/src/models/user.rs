use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Public view of a user record.
///
/// Has no `passwordHash` field, so serializing a `User` never carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

fn default_role() -> String {
    "user".to_string()
}

impl User {
    /// First letter of each word in the name, for avatar placeholders
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::cmp_ignore_case;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub creator: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Portfolio {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        wanted.iter().any(|tag| self.tags.contains(tag))
    }

    /// Case-insensitive match against title, description and creator
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.title, &self.description, &self.creator]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Sort orders offered by the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortfolioSort {
    #[default]
    Newest,
    Oldest,
    Popular,
    TitleAsc,
    TitleDesc,
}

impl PortfolioSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            "popular" => Some(Self::Popular),
            "az" => Some(Self::TitleAsc),
            "za" => Some(Self::TitleDesc),
            _ => None,
        }
    }

    pub fn compare(&self, a: &Portfolio, b: &Portfolio) -> Ordering {
        match self {
            // Undated works sort last when newest-first
            PortfolioSort::Newest => b.created().cmp(&a.created()),
            PortfolioSort::Oldest => a.created().cmp(&b.created()),
            PortfolioSort::Popular => b.likes.cmp(&a.likes),
            PortfolioSort::TitleAsc => cmp_ignore_case(&a.title, &b.title),
            PortfolioSort::TitleDesc => cmp_ignore_case(&b.title, &a.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn portfolio(value: serde_json::Value) -> Portfolio {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_minimal_upload() {
        let p = portfolio(json!({"id": "portfolios_1", "title": "X", "category": "Visual Art", "tags": ["a"]}));
        assert_eq!(p.likes, 0);
        assert!(p.comments.is_empty());
        assert_eq!(p.user_id, None);
    }

    #[test]
    fn test_matches_search_is_case_insensitive() {
        let p = portfolio(json!({"id": "p", "title": "Night Sky", "creator": "Demo User"}));
        assert!(p.matches_search("night"));
        assert!(p.matches_search("DEMO"));
        assert!(!p.matches_search("music"));
    }

    #[test]
    fn test_sort_popular_and_newest() {
        let a = portfolio(json!({"id": "a", "title": "A", "likes": 3, "createdAt": "2024-01-01T00:00:00.000Z"}));
        let b = portfolio(json!({"id": "b", "title": "b", "likes": 9, "createdAt": "2024-02-01T00:00:00.000Z"}));
        assert_eq!(PortfolioSort::Popular.compare(&a, &b), Ordering::Greater);
        assert_eq!(PortfolioSort::Newest.compare(&a, &b), Ordering::Greater);
        assert_eq!(PortfolioSort::Oldest.compare(&a, &b), Ordering::Less);
        assert_eq!(PortfolioSort::TitleAsc.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(PortfolioSort::parse("za"), Some(PortfolioSort::TitleDesc));
        assert_eq!(PortfolioSort::parse("Popular"), Some(PortfolioSort::Popular));
        assert_eq!(PortfolioSort::parse("random"), None);
    }
}

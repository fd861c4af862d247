//! Bookmark model - the rows the pipeline agents operate on

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation outcome for a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    Pending,
    Valid,
    Invalid,
}

impl Default for BookmarkStatus {
    fn default() -> Self {
        BookmarkStatus::Pending
    }
}

impl BookmarkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStatus::Pending => "pending",
            BookmarkStatus::Valid => "valid",
            BookmarkStatus::Invalid => "invalid",
        }
    }

    pub fn from_str(s: &str) -> Option<BookmarkStatus> {
        match s {
            "pending" => Some(BookmarkStatus::Pending),
            "valid" => Some(BookmarkStatus::Valid),
            "invalid" => Some(BookmarkStatus::Invalid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: BookmarkStatus,
    /// Feature-hashed vector, present once the embedding agent has run.
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(user_id: &str, url: &str, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            url: url.to_string(),
            title,
            domain: None,
            description: None,
            category: None,
            status: BookmarkStatus::Pending,
            embedding: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bookmark_defaults() {
        let bm = Bookmark::new("u1", "https://example.com/a", Some("A".to_string()));
        assert_eq!(bm.status, BookmarkStatus::Pending);
        assert!(bm.domain.is_none());
        assert!(bm.embedding.is_none());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            BookmarkStatus::Pending,
            BookmarkStatus::Valid,
            BookmarkStatus::Invalid,
        ] {
            assert_eq!(BookmarkStatus::from_str(status.as_str()), Some(status));
        }
    }
}

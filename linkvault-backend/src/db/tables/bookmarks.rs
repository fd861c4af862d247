//! Bookmark database operations used by the pipeline agents

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::{Bookmark, BookmarkStatus};

const BOOKMARK_COLUMNS: &str = "id, user_id, url, title, domain, description, category, status, embedding, created_at, updated_at";

impl Database {
    /// Insert a bookmark row produced by the import agent.
    pub fn insert_bookmark(&self, bookmark: &Bookmark) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO bookmarks (id, user_id, url, title, domain, description, category, status, embedding, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                &bookmark.id,
                &bookmark.user_id,
                &bookmark.url,
                &bookmark.title,
                &bookmark.domain,
                &bookmark.description,
                &bookmark.category,
                bookmark.status.as_str(),
                bookmark
                    .embedding
                    .as_ref()
                    .map(|e| serde_json::to_string(e).unwrap_or_else(|_| "[]".to_string())),
                bookmark.created_at.to_rfc3339(),
                bookmark.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a bookmark by id.
    pub fn get_bookmark(&self, id: &str) -> SqliteResult<Option<Bookmark>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bookmarks WHERE id = ?1",
            BOOKMARK_COLUMNS
        ))?;
        let bookmark = stmt.query_row([id], |row| Self::row_to_bookmark(row)).ok();
        Ok(bookmark)
    }

    /// Fetch bookmarks by id, preserving the requested order. Unknown ids
    /// are skipped rather than erroring, so agents tolerate stale context.
    pub fn get_bookmarks_by_ids(&self, ids: &[String]) -> SqliteResult<Vec<Bookmark>> {
        let mut bookmarks = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(bookmark) = self.get_bookmark(id)? {
                bookmarks.push(bookmark);
            }
        }
        Ok(bookmarks)
    }

    /// Record the validation agent's verdict on a bookmark.
    pub fn update_bookmark_status(&self, id: &str, status: BookmarkStatus) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE bookmarks SET status = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Write the enrichment agent's derived fields.
    pub fn update_bookmark_enrichment(
        &self,
        id: &str,
        title: Option<&str>,
        domain: &str,
        description: &str,
    ) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE bookmarks SET title = COALESCE(?1, title), domain = ?2, description = ?3, updated_at = ?4
             WHERE id = ?5",
            rusqlite::params![title, domain, description, Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Assign a category to a bookmark.
    pub fn update_bookmark_category(&self, id: &str, category: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE bookmarks SET category = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![category, Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Store the embedding vector, JSON-encoded.
    pub fn update_bookmark_embedding(&self, id: &str, embedding: &[f32]) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE bookmarks SET embedding = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![
                serde_json::to_string(embedding).unwrap_or_else(|_| "[]".to_string()),
                Utc::now().to_rfc3339(),
                id
            ],
        )?;
        Ok(())
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let status_str: String = row.get(7)?;
        let embedding_str: Option<String> = row.get(8)?;
        let created_at_str: String = row.get(9)?;
        let updated_at_str: String = row.get(10)?;

        Ok(Bookmark {
            id: row.get(0)?,
            user_id: row.get(1)?,
            url: row.get(2)?,
            title: row.get(3)?,
            domain: row.get(4)?,
            description: row.get(5)?,
            category: row.get(6)?,
            status: BookmarkStatus::from_str(&status_str).unwrap_or_default(),
            embedding: embedding_str.and_then(|s| serde_json::from_str(&s).ok()),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .unwrap()
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .unwrap()
                .with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::new(":memory:").unwrap()
    }

    #[test]
    fn test_insert_and_fetch_preserves_order() {
        let db = test_db();
        let a = Bookmark::new("u1", "https://example.com/a", Some("A".to_string()));
        let b = Bookmark::new("u1", "https://example.com/b", None);
        db.insert_bookmark(&a).unwrap();
        db.insert_bookmark(&b).unwrap();

        let fetched = db
            .get_bookmarks_by_ids(&[b.id.clone(), a.id.clone(), "missing".to_string()])
            .unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].id, b.id);
        assert_eq!(fetched[1].id, a.id);
    }

    #[test]
    fn test_update_paths_round_trip() {
        let db = test_db();
        let bm = Bookmark::new("u1", "https://example.com/post", None);
        db.insert_bookmark(&bm).unwrap();

        db.update_bookmark_status(&bm.id, BookmarkStatus::Valid).unwrap();
        db.update_bookmark_enrichment(&bm.id, Some("Post"), "example.com", "Saved from example.com")
            .unwrap();
        db.update_bookmark_category(&bm.id, "reference").unwrap();
        db.update_bookmark_embedding(&bm.id, &[0.5, 0.5]).unwrap();

        let loaded = db.get_bookmark(&bm.id).unwrap().unwrap();
        assert_eq!(loaded.status, BookmarkStatus::Valid);
        assert_eq!(loaded.title.as_deref(), Some("Post"));
        assert_eq!(loaded.domain.as_deref(), Some("example.com"));
        assert_eq!(loaded.category.as_deref(), Some("reference"));
        assert_eq!(loaded.embedding, Some(vec![0.5, 0.5]));
    }

    #[test]
    fn test_enrichment_keeps_existing_title() {
        let db = test_db();
        let bm = Bookmark::new("u1", "https://example.com/x", Some("Kept".to_string()));
        db.insert_bookmark(&bm).unwrap();

        db.update_bookmark_enrichment(&bm.id, None, "example.com", "desc")
            .unwrap();
        let loaded = db.get_bookmark(&bm.id).unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Kept"));
    }
}

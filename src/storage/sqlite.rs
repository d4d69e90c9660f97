//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{IndexRow, LemmaRecord, NewPage, PageRecord, SiteRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";

/// Adds to a lemma's frequency, creating the lemma if needed
const UPSERT_LEMMA_SQL: &str = "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, ?3)
     ON CONFLICT(site_id, lemma) DO UPDATE SET frequency = frequency + excluded.frequency
     RETURNING id";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database file and applies the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str, site_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params![site_id], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&row.get::<_, String>(3)?)
            .unwrap_or(SiteStatus::Failed),
        status_time: row.get(4)?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

/// Numbered placeholders for an IN list, starting at `?first_index`
fn placeholders(first_index: usize, count: usize) -> String {
    (first_index..first_index + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Storage for SqliteStorage {
    // ===== Sites =====

    fn save_site(&mut self, url: &str, name: &str, status: SiteStatus) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sites (url, name, status, status_time) VALUES (?1, ?2, ?3, ?4)",
            params![url, name, status.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        time: DateTime<Utc>,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), time.to_rfc3339(), error, site_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    fn touch_site(&mut self, site_id: i64, time: DateTime<Utc>) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE sites SET status_time = ?1 WHERE id = ?2",
            params![time.to_rfc3339(), site_id],
        )?;
        Ok(())
    }

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS),
                params![site_id],
                site_from_row,
            )
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;
        let rows = stmt.query_map([], site_from_row)?;

        let mut sites = Vec::new();
        for row in rows {
            sites.push(row?);
        }
        Ok(sites)
    }

    fn truncate_all(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "
            DELETE FROM postings;
            DELETE FROM lemmas;
            DELETE FROM pages;
            DELETE FROM sites;
        ",
        )?;
        tx.commit()?;
        Ok(())
    }

    fn fail_indexing_sites(&mut self, message: &str, time: DateTime<Utc>) -> StorageResult<usize> {
        let updated = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE status = ?4",
            params![
                SiteStatus::Failed.to_db_string(),
                time.to_rfc3339(),
                message,
                SiteStatus::Indexing.to_db_string()
            ],
        )?;
        Ok(updated)
    }

    // ===== Pages =====

    fn save_page(&mut self, page: &NewPage) -> StorageResult<Option<i64>> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            params![page.site_id, page.path, page.code, page.content],
        )?;

        if inserted == 0 {
            Ok(None)
        } else {
            Ok(Some(self.conn.last_insert_rowid()))
        }
    }

    fn find_page(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE site_id = ?1 AND path = ?2",
                    PAGE_COLUMNS
                ),
                params![site_id, path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or(StorageError::PageNotFound(page_id))
    }

    fn delete_page(&mut self, page_id: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM postings WHERE page_id = ?1", params![page_id])?;
        let deleted = tx.execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;
        if deleted == 0 {
            return Err(StorageError::PageNotFound(page_id));
        }
        tx.commit()?;
        Ok(())
    }

    fn count_pages(&self, site_id: Option<i64>) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM pages WHERE ?1 IS NULL OR site_id = ?1",
            site_id,
        )
    }

    fn pages_page(
        &self,
        site_id: i64,
        batch_size: usize,
        offset: usize,
    ) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE site_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
            PAGE_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![site_id, batch_size as i64, offset as i64],
            page_from_row,
        )?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row?);
        }
        Ok(pages)
    }

    // ===== Lemmas =====

    fn upsert_lemma(&mut self, site_id: i64, lemma: &str) -> StorageResult<i64> {
        let id = self
            .conn
            .query_row(UPSERT_LEMMA_SQL, params![site_id, lemma, 1], |row| row.get(0))?;
        Ok(id)
    }

    fn upsert_lemmas(&mut self, site_id: i64, lemmas: &[(String, u32)]) -> StorageResult<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(lemmas.len());
        {
            let mut stmt = tx.prepare(UPSERT_LEMMA_SQL)?;
            for (lemma, count) in lemmas {
                let id: i64 = stmt.query_row(params![site_id, lemma, count], |row| row.get(0))?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn increment_lemma_frequency(&mut self, site_id: i64, lemma: &str) -> StorageResult<bool> {
        let updated = self.conn.execute(
            "UPDATE lemmas SET frequency = frequency + 1 WHERE site_id = ?1 AND lemma = ?2",
            params![site_id, lemma],
        )?;
        Ok(updated > 0)
    }

    fn find_lemmas(&self, site_id: i64, lemmas: &[String]) -> StorageResult<Vec<LemmaRecord>> {
        if lemmas.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, site_id, lemma, frequency FROM lemmas WHERE site_id = ?1 AND lemma IN ({})",
            placeholders(2, lemmas.len())
        );
        let mut values = vec![Value::Integer(site_id)];
        values.extend(lemmas.iter().map(|l| Value::Text(l.clone())));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(LemmaRecord {
                id: row.get(0)?,
                site_id: row.get(1)?,
                lemma: row.get(2)?,
                frequency: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn decrement_lemma_frequencies(&mut self, lemma_ids: &[i64]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE lemmas SET frequency = MAX(frequency - 1, 0) WHERE id = ?1",
            )?;
            for id in lemma_ids {
                stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_unused_lemmas(&mut self, site_id: i64) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM postings WHERE lemma_id IN
             (SELECT id FROM lemmas WHERE site_id = ?1 AND frequency = 0)",
            params![site_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM lemmas WHERE site_id = ?1 AND frequency = 0",
            params![site_id],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    fn clear_site_index(&mut self, site_id: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM postings WHERE lemma_id IN (SELECT id FROM lemmas WHERE site_id = ?1)",
            params![site_id],
        )?;
        tx.execute(
            "DELETE FROM postings WHERE page_id IN (SELECT id FROM pages WHERE site_id = ?1)",
            params![site_id],
        )?;
        tx.execute("DELETE FROM lemmas WHERE site_id = ?1", params![site_id])?;
        tx.commit()?;
        Ok(())
    }

    fn count_lemmas(&self, site_id: Option<i64>) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM lemmas WHERE ?1 IS NULL OR site_id = ?1",
            site_id,
        )
    }

    fn lemma_document_frequency(&self, lemma: &str, site_id: Option<i64>) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(frequency), 0) FROM lemmas
             WHERE lemma = ?1 AND (?2 IS NULL OR site_id = ?2)",
            params![lemma, site_id],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    fn find_pages_matching_lemma(
        &self,
        lemma: &str,
        site_id: Option<i64>,
    ) -> StorageResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.page_id FROM postings p
             JOIN lemmas l ON l.id = p.lemma_id
             WHERE l.lemma = ?1 AND (?2 IS NULL OR l.site_id = ?2)
             ORDER BY p.page_id",
        )?;
        let rows = stmt.query_map(params![lemma, site_id], |row| row.get(0))?;

        let mut page_ids = Vec::new();
        for row in rows {
            page_ids.push(row?);
        }
        Ok(page_ids)
    }

    // ===== Postings =====

    fn lemmas_for_page(&self, page_id: i64) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT lemma_id FROM postings WHERE page_id = ?1 ORDER BY lemma_id")?;
        let rows = stmt.query_map(params![page_id], |row| row.get(0))?;

        let mut lemma_ids = Vec::new();
        for row in rows {
            lemma_ids.push(row?);
        }
        Ok(lemma_ids)
    }

    fn index_page_lemmas(
        &mut self,
        site_id: i64,
        page_id: i64,
        lemmas: &[(String, f32)],
    ) -> StorageResult<bool> {
        let tx = self.conn.transaction()?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM postings WHERE page_id = ?1",
            params![page_id],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(false);
        }

        {
            let mut upsert = tx.prepare(UPSERT_LEMMA_SQL)?;
            let mut posting =
                tx.prepare("INSERT INTO postings (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)")?;

            for (lemma, rank) in lemmas {
                let lemma_id: i64 = upsert.query_row(params![site_id, lemma, 1], |row| row.get(0))?;
                posting.execute(params![page_id, lemma_id, f64::from(*rank)])?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn save_index_rows(&mut self, rows: &[IndexRow]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO postings (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                inserted += stmt.execute(params![row.page_id, row.lemma_id, f64::from(row.rank)])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn delete_index_rows_for_page(&mut self, page_id: i64) -> StorageResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM postings WHERE page_id = ?1", params![page_id])?;
        Ok(deleted)
    }

    fn sum_rank_for_page_and_lemmas(&self, page_id: i64, lemmas: &[String]) -> StorageResult<f64> {
        if lemmas.is_empty() {
            return Ok(0.0);
        }

        let sql = format!(
            "SELECT COALESCE(SUM(p.rank), 0.0) FROM postings p
             JOIN lemmas l ON l.id = p.lemma_id
             WHERE p.page_id = ?1 AND l.lemma IN ({})",
            placeholders(2, lemmas.len())
        );
        let mut values = vec![Value::Integer(page_id)];
        values.extend(lemmas.iter().map(|l| Value::Text(l.clone())));

        let sum: f64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with_site() -> (SqliteStorage, i64) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site_id = storage
            .save_site("https://example.ru", "Example", SiteStatus::Indexing)
            .unwrap();
        (storage, site_id)
    }

    fn page(storage: &mut SqliteStorage, site_id: i64, path: &str) -> i64 {
        storage
            .save_page(&NewPage::new(site_id, path, 200, "<html></html>".to_string()))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");
        let mut storage = SqliteStorage::new(&path).unwrap();
        storage
            .save_site("https://example.ru", "Example", SiteStatus::Indexing)
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_site_lookup_and_status() {
        let (mut storage, site_id) = storage_with_site();

        let site = storage.find_site_by_url("https://example.ru").unwrap().unwrap();
        assert_eq!(site.id, site_id);
        assert_eq!(site.status, SiteStatus::Indexing);
        assert!(site.last_error.is_none());

        storage
            .update_site_status(site_id, SiteStatus::Failed, Utc::now(), Some("boom"))
            .unwrap();
        let site = storage.get_site(site_id).unwrap();
        assert_eq!(site.status, SiteStatus::Failed);
        assert_eq!(site.last_error.as_deref(), Some("boom"));

        assert!(storage.find_site_by_url("https://other.ru").unwrap().is_none());
        assert!(matches!(
            storage.get_site(999),
            Err(StorageError::SiteNotFound(999))
        ));
    }

    #[test]
    fn test_fail_indexing_sites_only_touches_active() {
        let (mut storage, first) = storage_with_site();
        let second = storage
            .save_site("https://second.ru", "Second", SiteStatus::Indexing)
            .unwrap();
        storage
            .update_site_status(second, SiteStatus::Indexed, Utc::now(), None)
            .unwrap();

        let updated = storage.fail_indexing_sites("stopped", Utc::now()).unwrap();
        assert_eq!(updated, 1);
        assert_eq!(storage.get_site(first).unwrap().status, SiteStatus::Failed);
        assert_eq!(storage.get_site(second).unwrap().status, SiteStatus::Indexed);
    }

    #[test]
    fn test_duplicate_page_is_ignored() {
        let (mut storage, site_id) = storage_with_site();

        let first = storage
            .save_page(&NewPage::new(site_id, "/a", 200, "x".to_string()))
            .unwrap();
        let second = storage
            .save_page(&NewPage::new(site_id, "/a", 200, "y".to_string()))
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(storage.count_pages(Some(site_id)).unwrap(), 1);
        assert_eq!(storage.find_page(site_id, "/a").unwrap().unwrap().content, "x");
    }

    #[test]
    fn test_upsert_lemma_increments() {
        let (mut storage, site_id) = storage_with_site();

        let id1 = storage.upsert_lemma(site_id, "кот").unwrap();
        let id2 = storage.upsert_lemma(site_id, "кот").unwrap();
        assert_eq!(id1, id2);

        let ids = storage
            .upsert_lemmas(site_id, &[("кот".to_string(), 3), ("окн".to_string(), 2)])
            .unwrap();
        assert_eq!(ids[0], id1);

        let lemmas = storage
            .find_lemmas(site_id, &["кот".to_string(), "окн".to_string()])
            .unwrap();
        let freq = |text: &str| lemmas.iter().find(|l| l.lemma == text).unwrap().frequency;
        assert_eq!(freq("кот"), 5);
        assert_eq!(freq("окн"), 2);

        assert!(storage.increment_lemma_frequency(site_id, "окн").unwrap());
        assert!(!storage.increment_lemma_frequency(site_id, "пес").unwrap());
    }

    #[test]
    fn test_index_page_lemmas_once() {
        let (mut storage, site_id) = storage_with_site();
        let page_id = page(&mut storage, site_id, "/");
        let lemmas = vec![("кот".to_string(), 2.0), ("окн".to_string(), 1.0)];

        assert!(storage.index_page_lemmas(site_id, page_id, &lemmas).unwrap());
        assert!(!storage.index_page_lemmas(site_id, page_id, &lemmas).unwrap());

        assert_eq!(storage.lemma_document_frequency("кот", Some(site_id)).unwrap(), 1);
        assert_eq!(storage.lemmas_for_page(page_id).unwrap().len(), 2);
        assert_eq!(
            storage
                .sum_rank_for_page_and_lemmas(page_id, &["кот".to_string(), "окн".to_string()])
                .unwrap(),
            3.0
        );
    }

    #[test]
    fn test_find_pages_matching_lemma_scoped_by_site() {
        let (mut storage, first) = storage_with_site();
        let second = storage
            .save_site("https://second.ru", "Second", SiteStatus::Indexing)
            .unwrap();
        let p1 = page(&mut storage, first, "/");
        let p2 = page(&mut storage, second, "/");

        let lemmas = vec![("кот".to_string(), 1.0)];
        storage.index_page_lemmas(first, p1, &lemmas).unwrap();
        storage.index_page_lemmas(second, p2, &lemmas).unwrap();

        assert_eq!(storage.find_pages_matching_lemma("кот", None).unwrap(), vec![p1, p2]);
        assert_eq!(
            storage.find_pages_matching_lemma("кот", Some(second)).unwrap(),
            vec![p2]
        );
        assert_eq!(storage.lemma_document_frequency("кот", None).unwrap(), 2);
    }

    #[test]
    fn test_decrement_and_delete_unused() {
        let (mut storage, site_id) = storage_with_site();
        let p1 = page(&mut storage, site_id, "/one");
        let p2 = page(&mut storage, site_id, "/two");

        storage
            .index_page_lemmas(site_id, p1, &[("кот".to_string(), 1.0), ("пес".to_string(), 1.0)])
            .unwrap();
        storage
            .index_page_lemmas(site_id, p2, &[("кот".to_string(), 1.0)])
            .unwrap();

        let lemma_ids = storage.lemmas_for_page(p1).unwrap();
        storage.delete_index_rows_for_page(p1).unwrap();
        storage.decrement_lemma_frequencies(&lemma_ids).unwrap();
        assert_eq!(storage.delete_unused_lemmas(site_id).unwrap(), 1);
        storage.delete_page(p1).unwrap();

        assert_eq!(storage.count_lemmas(Some(site_id)).unwrap(), 1);
        assert_eq!(storage.lemma_document_frequency("кот", Some(site_id)).unwrap(), 1);
        assert!(matches!(storage.get_page(p1), Err(StorageError::PageNotFound(_))));
    }

    #[test]
    fn test_clear_site_index_keeps_pages() {
        let (mut storage, site_id) = storage_with_site();
        let p1 = page(&mut storage, site_id, "/");
        storage
            .index_page_lemmas(site_id, p1, &[("кот".to_string(), 1.0)])
            .unwrap();

        storage.clear_site_index(site_id).unwrap();

        assert_eq!(storage.count_lemmas(Some(site_id)).unwrap(), 0);
        assert!(storage.lemmas_for_page(p1).unwrap().is_empty());
        assert_eq!(storage.count_pages(Some(site_id)).unwrap(), 1);
    }

    #[test]
    fn test_pages_page_batches() {
        let (mut storage, site_id) = storage_with_site();
        for i in 0..5 {
            page(&mut storage, site_id, &format!("/p{}", i));
        }

        let first = storage.pages_page(site_id, 2, 0).unwrap();
        let last = storage.pages_page(site_id, 2, 4).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].path, "/p0");
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].path, "/p4");
    }

    #[test]
    fn test_truncate_all() {
        let (mut storage, site_id) = storage_with_site();
        let p1 = page(&mut storage, site_id, "/");
        storage
            .index_page_lemmas(site_id, p1, &[("кот".to_string(), 1.0)])
            .unwrap();

        storage.truncate_all().unwrap();

        assert!(storage.list_sites().unwrap().is_empty());
        assert_eq!(storage.count_pages(None).unwrap(), 0);
        assert_eq!(storage.count_lemmas(None).unwrap(), 0);
    }
}

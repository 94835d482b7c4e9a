//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait,
//! with FTS5 virtual tables for full-text search.

use crate::repos::RepositoryRecord;
use crate::storage::query::build_fts5_query;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{NewPage, PageRecord, RepositoryHit, RunRecord, RunStatus, SearchHit};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;

/// Columns searched by [`Storage::search`]
const PAGE_SEARCH_COLUMNS: &[&str] = &["title", "content"];

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and applies the schema
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open the file or create the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        let mut storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

/// True if the error is a UNIQUE/PRIMARY KEY violation
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl Storage for SqliteStorage {
    fn create_schema(&mut self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed)
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                            .unwrap_or(RunStatus::Failed),
                    })
                },
            )
            .optional()?;

        Ok(run)
    }

    // ===== Pages =====

    fn insert_page(&mut self, page: &NewPage) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO pages (url, title, content, source, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                page.url,
                page.title,
                page.content,
                page.source,
                page.crawled_at.to_rfc3339()
            ],
        );

        if let Err(e) = inserted {
            // Dropping the transaction rolls it back
            return Err(if is_constraint_violation(&e) {
                StorageError::DuplicateUrl(page.url.clone())
            } else {
                e.into()
            });
        }

        let page_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO pages_fts (url, title, content) VALUES (?1, ?2, ?3)",
            params![page.url, page.title, page.content],
        )?;
        tx.commit()?;

        Ok(page_id)
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                "SELECT id, url, title, content, source, crawled_at FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok(PageRecord {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        title: row.get(2)?,
                        content: row.get(3)?,
                        source: row.get(4)?,
                        crawled_at: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(page)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_pages_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM pages GROUP BY source ORDER BY source")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ===== Repositories =====

    fn insert_repository(&mut self, record: &RepositoryRecord) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO repositories (name, description, readme) VALUES (?1, ?2, ?3)",
            params![record.name, record.description, record.readme],
        )?;
        let repo_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO repositories_fts (name, description, readme) VALUES (?1, ?2, ?3)",
            params![record.name, record.description, record.readme],
        )?;
        tx.commit()?;

        Ok(repo_id)
    }

    fn count_repositories(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM repositories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Search =====

    fn search(&self, query: &str) -> StorageResult<Vec<SearchHit>> {
        let expr = match build_fts5_query(query, PAGE_SEARCH_COLUMNS) {
            Some(expr) => expr,
            None => return Ok(Vec::new()),
        };

        let mut stmt = self.conn.prepare(
            "SELECT url, title FROM pages_fts WHERE pages_fts MATCH ?1 ORDER BY rank",
        )?;

        let hits = stmt
            .query_map(params![expr], |row| {
                Ok(SearchHit {
                    url: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hits)
    }

    fn search_repositories(&self, query: &str) -> StorageResult<Vec<RepositoryHit>> {
        let expr = match build_fts5_query(query, &[]) {
            Some(expr) => expr,
            None => return Ok(Vec::new()),
        };

        let mut stmt = self.conn.prepare(
            "SELECT name, description FROM repositories_fts
             WHERE repositories_fts MATCH ?1 ORDER BY rank",
        )?;

        let hits = stmt
            .query_map(params![expr], |row| {
                Ok(RepositoryHit {
                    name: row.get(0)?,
                    description: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn page(url: &str, title: &str, content: &str) -> NewPage {
        NewPage {
            source: "main_website".to_string(),
            url: url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            crawled_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn repo(name: &str, readme: &str) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_string(),
            description: "Flare node implementation".to_string(),
            readme: readme.to_string(),
        }
    }

    fn index_rows(storage: &SqliteStorage) -> i64 {
        storage
            .conn
            .query_row("SELECT COUNT(*) FROM pages_fts", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_create_schema_twice() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.create_schema().unwrap();
        storage.create_schema().unwrap();
        assert_eq!(storage.count_pages().unwrap(), 0);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage
                .insert_page(&page("https://flare.network/", "Flare", "hello"))
                .unwrap();
        }

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_pages().unwrap(), 1);
    }

    #[test]
    fn test_insert_and_get_page() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = storage
            .insert_page(&page(
                "https://flare.network/about",
                "About Flare",
                "Flare is the blockchain for data",
            ))
            .unwrap();
        assert!(id > 0);

        let stored = storage
            .get_page_by_url("https://flare.network/about")
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "About Flare");
        assert_eq!(stored.source, "main_website");
        assert!(stored.crawled_at.starts_with("2024-05-01T12:00:00"));
        assert_eq!(index_rows(&storage), 1);
    }

    #[test]
    fn test_duplicate_url_rejected_without_index_row() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page("https://flare.network/", "Flare", "first"))
            .unwrap();

        let result = storage.insert_page(&page("https://flare.network/", "Flare", "second"));
        match result {
            Err(StorageError::DuplicateUrl(url)) => assert_eq!(url, "https://flare.network/"),
            other => panic!("expected DuplicateUrl, got {:?}", other),
        }

        assert_eq!(storage.count_pages().unwrap(), 1);
        assert_eq!(index_rows(&storage), 1);
        assert!(storage.search("second").unwrap().is_empty());
    }

    #[test]
    fn test_search_distinctive_token() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page(
                "https://docs.flare.network/tech/ftso",
                "FTSO",
                "The Flare Time Series Oracle xylophonequartz delivers prices",
            ))
            .unwrap();
        storage
            .insert_page(&page(
                "https://flare.network/",
                "Flare",
                "The blockchain for data",
            ))
            .unwrap();

        let hits = storage.search("xylophonequartz").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://docs.flare.network/tech/ftso");
        assert_eq!(hits[0].title, "FTSO");
    }

    #[test]
    fn test_search_phrase() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page(
                "https://dev.flare.network/a",
                "A",
                "state connector protocol",
            ))
            .unwrap();
        storage
            .insert_page(&page(
                "https://dev.flare.network/b",
                "B",
                "connector for state",
            ))
            .unwrap();

        let hits = storage.search("\"state connector\"").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://dev.flare.network/a");

        let both = storage.search("state connector").unwrap();
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_search_stemmed() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page(
                "https://docs.flare.network/infra/validation",
                "Validators",
                "Running validators on Flare",
            ))
            .unwrap();

        assert_eq!(storage.search("validator").unwrap().len(), 1);
        assert_eq!(storage.search("running").unwrap().len(), 1);
    }

    #[test]
    fn test_search_matches_title() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page("https://flare.network/x", "Wrapped tokens", "body"))
            .unwrap();
        assert_eq!(storage.search("wrapped").unwrap().len(), 1);
    }

    #[test]
    fn test_search_ignores_url_column() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page("https://flare.network/zebra", "Title", "body"))
            .unwrap();
        assert!(storage.search("zebra").unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_store() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.search("flare").unwrap().is_empty());
        assert!(storage.search("\"state connector\"").unwrap().is_empty());
        assert!(storage.search("").unwrap().is_empty());
        assert!(storage.search_repositories("flare").unwrap().is_empty());
    }

    #[test]
    fn test_search_with_punctuation_does_not_error() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page("https://flare.network/", "Flare", "go-flare node"))
            .unwrap();

        assert_eq!(storage.search("go-flare").unwrap().len(), 1);
        assert!(storage.search("AND OR NOT ( * :").unwrap().is_empty());
    }

    #[test]
    fn test_count_pages_by_source() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_page(&page("https://flare.network/", "Flare", "a"))
            .unwrap();
        let mut doc = page("https://docs.flare.network/", "Docs", "b");
        doc.source = "documentation".to_string();
        storage.insert_page(&doc).unwrap();

        assert_eq!(
            storage.count_pages_by_source().unwrap(),
            vec![
                ("documentation".to_string(), 1),
                ("main_website".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_insert_repository_appends() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_repository(&repo("go-flare", "Build with make"))
            .unwrap();
        storage
            .insert_repository(&repo("go-flare", "Build with make"))
            .unwrap();
        assert_eq!(storage.count_repositories().unwrap(), 2);
    }

    #[test]
    fn test_search_repositories() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_repository(&repo("go-flare", "avalanchego fork readme"))
            .unwrap();
        storage
            .insert_repository(&repo("flare-systems", "system clients"))
            .unwrap();

        let hits = storage.search_repositories("avalanchego").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "go-flare");
        assert_eq!(hits[0].description, "Flare node implementation");
    }

    #[test]
    fn test_run_lifecycle() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_latest_run().unwrap().is_none());

        let run_id = storage.create_run("abc123").unwrap();
        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());

        storage.complete_run(run_id).unwrap();
        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.config_hash, "abc123");
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.fail_run(42),
            Err(StorageError::RunNotFound(42))
        ));
    }
}

//! SQLite-backed signature database

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::shards::{parse_shard, Shard, ShardStore};
use crate::error::{DecodeError, Result};

/// Signature database kept in a single SQLite file.
///
/// Shards are not stored physically; a shard is the set of rows whose
/// selector starts with `0x<prefix>`.
#[derive(Debug, Clone)]
pub struct SqliteShardStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteShardStore {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened signature database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initialize database schema
    fn init(&self) -> Result<()> {
        self.lock().execute_batch(
            "
            -- Error signatures by selector, in database order
            CREATE TABLE IF NOT EXISTS signatures (
                selector    TEXT NOT NULL,
                position    INTEGER NOT NULL,
                signature   TEXT NOT NULL,
                created_at  INTEGER DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (selector, signature)
            );

            CREATE INDEX IF NOT EXISTS idx_signatures_selector ON signatures(selector, position);
            ",
        )?;
        Ok(())
    }

    /// Append a signature to a selector's list.
    ///
    /// Returns false when the signature was already present.
    pub fn save_signature(&self, selector: &str, signature: &str) -> Result<bool> {
        let conn = self.lock();
        Self::insert_row(&conn, &selector.to_lowercase(), signature)
    }

    fn insert_row(conn: &Connection, selector: &str, signature: &str) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO signatures(selector, position, signature)
             SELECT ?1, COALESCE(MAX(position) + 1, 0), ?2 FROM signatures WHERE selector = ?1",
            params![selector, signature],
        )?;
        Ok(changed > 0)
    }

    /// Get the signatures stored for a selector
    pub fn get_signatures(&self, selector: &str) -> Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT signature FROM signatures WHERE selector = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![selector.to_lowercase()], |row| row.get(0))?;
        let signatures = rows.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(signatures)
    }

    /// Get every selector -> signatures row under a prefix
    pub fn get_prefix(&self, prefix: &str) -> Result<Shard> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT selector, signature FROM signatures
             WHERE selector LIKE ?1 ORDER BY selector, position",
        )?;

        let pattern = format!("0x{}%", prefix.to_lowercase());
        let mut rows = stmt.query(params![pattern])?;
        let mut shard = Shard::new();
        while let Some(row) = rows.next()? {
            let selector: String = row.get(0)?;
            let signature: String = row.get(1)?;
            shard.entry(selector).or_default().push(signature);
        }
        Ok(shard)
    }

    /// Copy one parsed shard into the database, returning new rows
    pub fn import_shard(&self, shard: &Shard) -> Result<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut inserted = 0;

        let mut selectors: Vec<&String> = shard.keys().collect();
        selectors.sort();
        for selector in selectors {
            for signature in &shard[selector] {
                if Self::insert_row(&tx, &selector.to_lowercase(), signature)? {
                    inserted += 1;
                }
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Import every `<prefix>.json` shard file in a directory
    pub fn import_dir(&self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir).map_err(|e| DecodeError::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| DecodeError::io(dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut inserted = 0;
        for path in paths {
            let Some(prefix) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let contents = std::fs::read_to_string(&path).map_err(|e| DecodeError::io(&path, e))?;
            let shard = parse_shard(prefix, &contents)?;
            inserted += self.import_shard(&shard)?;
        }

        info!(inserted, dir = %dir.display(), "imported shard files");
        Ok(inserted)
    }

    /// (selectors, signatures) counts
    pub fn stats(&self) -> Result<(usize, usize)> {
        let conn = self.lock();
        let selectors: i64 =
            conn.query_row("SELECT COUNT(DISTINCT selector) FROM signatures", [], |row| row.get(0))?;
        let signatures: i64 = conn.query_row("SELECT COUNT(*) FROM signatures", [], |row| row.get(0))?;
        Ok((selectors as usize, signatures as usize))
    }
}

#[async_trait]
impl ShardStore for SqliteShardStore {
    async fn load_shard(&self, prefix: &str) -> Result<Shard> {
        let store = self.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || store.get_prefix(&prefix)).await?
    }
}

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::companion::{seed_roster, Companion};

/// Storage key the whole roster document lives under.
pub const ROSTER_STATE_KEY: &str = "companion_roster";

/// Durable owner of the companion collection.
///
/// The full roster is serialized as one JSON document under a fixed key and
/// rewritten in full on every change. No schema versioning, no migrations.
pub struct RosterStore {
    conn: Mutex<Connection>,
}

impl RosterStore {
    /// Create or open the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open roster database at {:?}", path.as_ref()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        store.ensure_seed_roster()?;
        Ok(store)
    }

    /// In-memory store, handy for tests and throwaway sessions.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory roster database")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        store.ensure_seed_roster()?;
        Ok(store)
    }

    /// Helper to lock the connection
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Roster database lock poisoned: {}", e))
    }

    fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )"#,
            [],
        )?;
        Ok(())
    }

    fn get_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let result = conn.query_row("SELECT value FROM app_state WHERE key = ?1", [key], |row| {
            row.get(0)
        });

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Write the seed roster on first open so record ids stay stable across
    /// loads. An existing document, parseable or not, is left alone.
    fn ensure_seed_roster(&self) -> Result<()> {
        if self.get_state(ROSTER_STATE_KEY)?.is_none() {
            self.save(&seed_roster())?;
        }
        Ok(())
    }

    /// Load the roster. Falls back to the built-in seed list only when no
    /// stored value exists at all; a stored-but-unparseable document is an
    /// error, not a reseed.
    pub fn load(&self) -> Result<Vec<Companion>> {
        match self.get_state(ROSTER_STATE_KEY)? {
            None => Ok(seed_roster()),
            Some(raw) => {
                serde_json::from_str(&raw).context("Failed to parse stored companion roster")
            }
        }
    }

    /// Rewrite the whole roster document.
    pub fn save(&self, roster: &[Companion]) -> Result<()> {
        let raw = serde_json::to_string(roster).context("Failed to serialize companion roster")?;
        self.set_state(ROSTER_STATE_KEY, &raw)
    }

    pub fn get(&self, id: &str) -> Result<Option<Companion>> {
        Ok(self.load()?.into_iter().find(|c| c.id == id))
    }

    /// Append a companion and persist.
    pub fn add(&self, companion: Companion) -> Result<()> {
        let mut roster = self.load()?;
        roster.push(companion);
        self.save(&roster)
    }

    /// Apply a mutation to one companion, rewrite the collection, and return
    /// the updated record.
    pub fn update<F>(&self, id: &str, mutate: F) -> Result<Companion>
    where
        F: FnOnce(&mut Companion),
    {
        let mut roster = self.load()?;
        let companion = roster
            .iter_mut()
            .find(|c| c.id == id)
            .with_context(|| format!("No companion with id '{}'", id))?;
        mutate(companion);
        let updated = companion.clone();
        self.save(&roster)?;
        Ok(updated)
    }
}

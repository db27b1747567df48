//! Storage layer for helpline
//!
//! All state lives in a single home directory:
//!
//! ```text
//! <home>/
//!   helpline.toml     # Optional configuration
//!   actor             # Persisted acting username
//!   db.json           # Snapshot of every table and sequence
//!   db.json.lock      # Lock file guarding the snapshot
//! ```
//!
//! Every write goes through [`Storage::transaction`]: take the lock, load the
//! snapshot, run the closure against an in-memory copy, check constraints,
//! then atomically replace the file. If the closure or the constraint check
//! fails, the copy is dropped and the file is untouched.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::config::CONFIG_FILENAME;
use crate::db::Database;
use crate::error::Result;
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Snapshot file name inside the home directory
pub const DB_FILENAME: &str = "db.json";

/// Fallback home when no platform data directory is available
pub const LOCAL_HOME_DIR: &str = ".helpline";

/// Resolve the home directory: explicit path, `HELPLINE_HOME`, the platform
/// data directory, then `./.helpline`.
pub fn resolve_home(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(raw) = std::env::var("HELPLINE_HOME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    ProjectDirs::from("org", "helpline", "helpline")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(LOCAL_HOME_DIR))
}

/// Storage manager for the helpline snapshot
#[derive(Debug, Clone)]
pub struct Storage {
    home: PathBuf,
    lock_timeout_ms: u64,
}

impl Storage {
    pub fn new(home: PathBuf) -> Self {
        Self {
            home,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn db_file(&self) -> PathBuf {
        self.home.join(DB_FILENAME)
    }

    pub fn lock_file(&self) -> PathBuf {
        PathBuf::from(format!("{}.lock", self.db_file().display()))
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join(CONFIG_FILENAME)
    }

    pub fn actor_file(&self) -> PathBuf {
        self.home.join("actor")
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create the home directory and an empty snapshot. Returns `true` if the
    /// snapshot was created by this call.
    pub fn init(&self) -> Result<bool> {
        fs::create_dir_all(&self.home)?;

        let _lock = FileLock::acquire(self.lock_file(), self.lock_timeout_ms)?;
        if self.db_file().exists() {
            return Ok(false);
        }
        self.persist(&Database::default())?;
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        self.db_file().exists()
    }

    // =========================================================================
    // Unit of work
    // =========================================================================

    /// Run `f` against a consistent snapshot.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T>,
    {
        let _lock = FileLock::acquire(self.lock_file(), self.lock_timeout_ms)?;
        let db = self.load()?;
        f(&db)
    }

    /// Run `f` as one atomic unit of work.
    ///
    /// Changes are persisted only if `f` returns `Ok` and the resulting
    /// snapshot passes [`Database::validate`].
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T>,
    {
        let _lock = FileLock::acquire(self.lock_file(), self.lock_timeout_ms)?;

        let mut db = self.load()?;
        let result = match f(&mut db) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(error = %err, "transaction rolled back");
                return Err(err);
            }
        };
        db.validate()?;
        self.persist(&db)?;

        Ok(result)
    }

    fn load(&self) -> Result<Database> {
        let path = self.db_file();
        if !path.exists() {
            return Ok(Database::default());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Database::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, db: &Database) -> Result<()> {
        let json = serde_json::to_string_pretty(db)?;
        lock::write_atomic(self.db_file(), json.as_bytes())
    }
}

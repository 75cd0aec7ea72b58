//! JSON file storage implementation
//!
//! Persists the two account records as pretty-printed JSON files in a
//! data directory: `users.json` (the directory) and `session.json` (the
//! current-session account, absent while logged out).

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::domain::{Account, DomainResult, Storage};

const DIRECTORY_RECORD: &str = "users.json";
const SESSION_RECORD: &str = "session.json";

/// File-backed storage for the account records
pub struct JsonFileStorage {
    data_dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Read a record, degrading missing or unreadable files to `None`.
    async fn read_record(&self, name: &str) -> Option<String> {
        match fs::read_to_string(self.record_path(name)).await {
            Ok(raw) => Some(raw),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(record = name, error = %err, "record unreadable, treating as absent");
                None
            }
        }
    }

    async fn write_record(&self, name: &str, contents: String) -> DomainResult<()> {
        fs::create_dir_all(&self.data_dir).await?;
        fs::write(self.record_path(name), contents).await?;
        Ok(())
    }

    async fn remove_record(&self, name: &str) -> DomainResult<()> {
        match fs::remove_file(self.record_path(name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn load_directory(&self) -> DomainResult<Vec<Account>> {
        let Some(raw) = self.read_record(DIRECTORY_RECORD).await else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(accounts) => Ok(accounts),
            Err(err) => {
                warn!(record = DIRECTORY_RECORD, error = %err, "corrupt record, starting with an empty directory");
                Ok(Vec::new())
            }
        }
    }

    async fn save_directory(&self, accounts: &[Account]) -> DomainResult<()> {
        let contents = serde_json::to_string_pretty(accounts)?;
        self.write_record(DIRECTORY_RECORD, contents).await
    }

    async fn load_session(&self) -> DomainResult<Option<Account>> {
        let Some(raw) = self.read_record(SESSION_RECORD).await else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(account) => Ok(Some(account)),
            Err(err) => {
                warn!(record = SESSION_RECORD, error = %err, "corrupt record, treating session as absent");
                Ok(None)
            }
        }
    }

    async fn save_session(&self, account: Option<&Account>) -> DomainResult<()> {
        match account {
            Some(account) => {
                let contents = serde_json::to_string_pretty(account)?;
                self.write_record(SESSION_RECORD, contents).await
            }
            None => self.remove_record(SESSION_RECORD).await,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

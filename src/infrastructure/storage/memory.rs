//! In-memory storage implementation

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Account, DomainResult, Storage};

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryStorage {
    directory: RwLock<Vec<Account>>,
    session: RwLock<Option<Account>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn load_directory(&self) -> DomainResult<Vec<Account>> {
        Ok(self.directory.read().await.clone())
    }

    async fn save_directory(&self, accounts: &[Account]) -> DomainResult<()> {
        *self.directory.write().await = accounts.to_vec();
        Ok(())
    }

    async fn load_session(&self) -> DomainResult<Option<Account>> {
        Ok(self.session.read().await.clone())
    }

    async fn save_session(&self, account: Option<&Account>) -> DomainResult<()> {
        *self.session.write().await = account.cloned();
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

//! Persistence port for the account records

use async_trait::async_trait;

use super::{Account, DomainResult};

/// Durable key-value persistence for the two account records.
///
/// Implementations own two named records: the full account directory and
/// the serialized current-session account. Reads that hit missing,
/// corrupt or unavailable data degrade to "no data" after logging a
/// warning; write faults are reported to the caller.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_directory(&self) -> DomainResult<Vec<Account>>;
    async fn save_directory(&self, accounts: &[Account]) -> DomainResult<()>;

    /// The session record is either absent or one serialized account.
    async fn load_session(&self) -> DomainResult<Option<Account>>;
    /// `None` removes the record.
    async fn save_session(&self, account: Option<&Account>) -> DomainResult<()>;
}

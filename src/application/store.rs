//! Account store business logic
//!
//! Sole owner of the account directory and the session pointer. Every
//! invariant (email uniqueness, protected administrator, session
//! consistency) is enforced here so no caller can bypass it. Mutating
//! operations take `&mut self` (single-writer access) and each
//! persistence write completes before the operation returns.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminConfig;
use crate::domain::{
    normalize_email, Account, AccountRole, AccountUpdate, DomainError, DomainResult, NewAccount,
    Storage,
};

/// Durable directory of accounts plus the single "current session" pointer
pub struct AccountStore {
    storage: Arc<dyn Storage>,
    accounts: Vec<Account>,
    /// Session pointer: id of the current account, resolved live against
    /// the directory on every read
    current: Option<String>,
    admin_seed: AdminConfig,
    admin_id: String,
}

impl AccountStore {
    /// Load both records, seed the protected administrator if absent and
    /// self-heal a stale persisted session before serving any operation.
    pub async fn open(storage: Arc<dyn Storage>, admin: &AdminConfig) -> DomainResult<Self> {
        let accounts = storage.load_directory().await?;
        let session = storage.load_session().await?;

        let mut store = Self {
            storage,
            accounts,
            current: session.map(|account| account.id),
            admin_seed: admin.clone(),
            admin_id: String::new(),
        };

        store.seed_protected_admin().await?;

        // Only the id of the persisted session record is trusted; a
        // pointer at a vanished account is cleared here rather than
        // surfacing stale data later.
        if let Some(id) = store.current.clone() {
            if store.find_index(&id).is_none() {
                warn!(account_id = %id, "persisted session points at an unknown account, clearing");
                store.current = None;
                store.persist_session().await?;
            }
        }

        Ok(store)
    }

    // ── Directory operations ───────────────────────────────────

    /// All accounts, in insertion order. No side effects.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Create a new account with the default `user` role.
    ///
    /// The session pointer is not touched; auto-login after registration
    /// is a service-layer decision.
    pub async fn create_account(&mut self, new: NewAccount) -> DomainResult<Account> {
        let email = normalize_email(&new.email);
        if self.accounts.iter().any(|a| a.email == email) {
            return Err(DomainError::Conflict(
                "An account with this email address already exists".to_string(),
            ));
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email,
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            password: new.password,
            role: AccountRole::User,
            created_at: Utc::now(),
            last_login: None,
        };

        self.accounts.push(account.clone());
        self.persist_directory().await?;

        info!(email = %account.email, "account created");
        Ok(account)
    }

    /// Check credentials; on a match, refresh `last_login` and make the
    /// account the current session. A miss is an expected outcome.
    pub async fn authenticate(
        &mut self,
        email: &str,
        password: &str,
    ) -> DomainResult<Option<Account>> {
        let email = normalize_email(email);
        let Some(idx) = self
            .accounts
            .iter()
            .position(|a| a.email == email && a.password == password)
        else {
            return Ok(None);
        };

        self.accounts[idx].last_login = Some(Utc::now());
        self.current = Some(self.accounts[idx].id.clone());
        self.persist_directory().await?;
        self.persist_session().await?;

        info!(email = %self.accounts[idx].email, "authentication succeeded");
        Ok(Some(self.accounts[idx].clone()))
    }

    /// Merge the present fields of `update` into the account.
    ///
    /// Returns `Ok(None)` for an unknown id and `Err(Conflict)` when a
    /// new email collides with a different account. Role is not part of
    /// an update.
    pub async fn update_account(
        &mut self,
        id: &str,
        update: AccountUpdate,
    ) -> DomainResult<Option<Account>> {
        let Some(idx) = self.find_index(id) else {
            return Ok(None);
        };

        if let Some(email) = &update.email {
            let email = normalize_email(email);
            if self.accounts.iter().any(|a| a.email == email && a.id != id) {
                return Err(DomainError::Conflict(
                    "This email address is already taken by another account".to_string(),
                ));
            }
            self.accounts[idx].email = email;
        }
        if let Some(first_name) = update.first_name {
            self.accounts[idx].first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = update.last_name {
            self.accounts[idx].last_name = last_name.trim().to_string();
        }
        if let Some(password) = update.password {
            self.accounts[idx].password = password;
        }

        self.persist_directory().await?;
        self.sync_session_record(id).await?;

        Ok(Some(self.accounts[idx].clone()))
    }

    /// Delete an account. Returns `false` without effect for the
    /// protected administrator or an unknown id; clears the session
    /// pointer when it referenced the removed account.
    pub async fn delete_account(&mut self, id: &str) -> DomainResult<bool> {
        if self.is_protected_admin(id) {
            warn!(account_id = %id, "refusing to delete the protected administrator");
            return Ok(false);
        }
        let Some(idx) = self.find_index(id) else {
            return Ok(false);
        };

        let removed = self.accounts.remove(idx);
        self.persist_directory().await?;

        if self.current.as_deref() == Some(id) {
            self.current = None;
            self.persist_session().await?;
        }

        info!(email = %removed.email, "account deleted");
        Ok(true)
    }

    /// Grant the `admin` role.
    pub async fn promote(&mut self, id: &str) -> DomainResult<bool> {
        self.set_role(id, AccountRole::Admin).await
    }

    /// Revoke the `admin` role. Returns `false` without effect for the
    /// protected administrator.
    pub async fn demote(&mut self, id: &str) -> DomainResult<bool> {
        if self.is_protected_admin(id) {
            warn!(account_id = %id, "refusing to demote the protected administrator");
            return Ok(false);
        }
        self.set_role(id, AccountRole::User).await
    }

    /// Whether `id` is the seeded administrator that can never be
    /// deleted or demoted. Pure predicate.
    pub fn is_protected_admin(&self, id: &str) -> bool {
        self.admin_id == id
    }

    /// Clear the entire directory and session pointer, then re-seed the
    /// protected administrator. The directory is never observable with
    /// zero accounts.
    pub async fn reset_all(&mut self) -> DomainResult<()> {
        info!("resetting account directory");
        self.accounts.clear();
        self.current = None;
        self.persist_session().await?;
        self.seed_protected_admin().await
    }

    // ── Session operations ─────────────────────────────────────

    /// Resolve the session pointer against the live directory.
    ///
    /// A pointer whose account no longer exists is cleared here
    /// (self-healing) instead of returning stale data.
    pub async fn current_session(&mut self) -> DomainResult<Option<Account>> {
        let Some(id) = self.current.clone() else {
            return Ok(None);
        };
        match self.find_index(&id) {
            Some(idx) => Ok(Some(self.accounts[idx].clone())),
            None => {
                warn!(account_id = %id, "current session points at a deleted account, clearing");
                self.current = None;
                self.persist_session().await?;
                Ok(None)
            }
        }
    }

    /// Point the session at an existing account. Returns `false` for an
    /// unknown id.
    pub async fn set_current_session(&mut self, id: &str) -> DomainResult<bool> {
        if self.find_index(id).is_none() {
            return Ok(false);
        }
        self.current = Some(id.to_string());
        self.persist_session().await?;
        Ok(true)
    }

    /// Clear the session pointer without touching the account. Idempotent.
    pub async fn clear_session(&mut self) -> DomainResult<()> {
        self.current = None;
        self.persist_session().await
    }

    // ── Internals ──────────────────────────────────────────────

    fn find_index(&self, id: &str) -> Option<usize> {
        self.accounts.iter().position(|a| a.id == id)
    }

    async fn set_role(&mut self, id: &str, role: AccountRole) -> DomainResult<bool> {
        let Some(idx) = self.find_index(id) else {
            return Ok(false);
        };
        self.accounts[idx].role = role;
        self.persist_directory().await?;
        self.sync_session_record(id).await?;
        Ok(true)
    }

    /// Guarantee exactly one protected administrator, identified by the
    /// configured well-known email.
    async fn seed_protected_admin(&mut self) -> DomainResult<()> {
        let email = normalize_email(&self.admin_seed.email);

        if let Some(idx) = self.accounts.iter().position(|a| a.email == email) {
            self.admin_id = self.accounts[idx].id.clone();
            if self.accounts[idx].role != AccountRole::Admin {
                self.accounts[idx].role = AccountRole::Admin;
                self.persist_directory().await?;
            }
            return Ok(());
        }

        info!(email = %email, "seeding protected administrator");
        let account = Account {
            id: Uuid::new_v4().to_string(),
            email,
            first_name: self.admin_seed.first_name.clone(),
            last_name: self.admin_seed.last_name.clone(),
            password: self.admin_seed.password.clone(),
            role: AccountRole::Admin,
            created_at: Utc::now(),
            last_login: None,
        };
        self.admin_id = account.id.clone();
        self.accounts.push(account);
        self.persist_directory().await
    }

    async fn persist_directory(&self) -> DomainResult<()> {
        self.storage.save_directory(&self.accounts).await
    }

    async fn persist_session(&self) -> DomainResult<()> {
        let account = self
            .current
            .as_ref()
            .and_then(|id| self.accounts.iter().find(|a| &a.id == id));
        self.storage.save_session(account).await
    }

    /// Refresh the persisted session record after a mutation to the
    /// account it references.
    async fn sync_session_record(&mut self, id: &str) -> DomainResult<()> {
        if self.current.as_deref() == Some(id) {
            self.persist_session().await?;
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryStorage;

    fn admin_seed() -> AdminConfig {
        AdminConfig::default()
    }

    async fn open_store() -> AccountStore {
        AccountStore::open(Arc::new(InMemoryStorage::new()), &admin_seed())
            .await
            .unwrap()
    }

    fn jane(email: &str) -> NewAccount {
        NewAccount {
            email: email.into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            password: "secret1".into(),
        }
    }

    #[tokio::test]
    async fn seeds_protected_admin_into_empty_directory() {
        let store = open_store().await;

        assert_eq!(store.accounts().len(), 1);
        let admin = &store.accounts()[0];
        assert_eq!(admin.email, "admin@modfusion.io");
        assert_eq!(admin.role, AccountRole::Admin);
        assert!(store.is_protected_admin(&admin.id));
    }

    #[tokio::test]
    async fn reopen_does_not_seed_twice() {
        let storage = Arc::new(InMemoryStorage::new());
        let first = AccountStore::open(storage.clone(), &admin_seed())
            .await
            .unwrap();
        let admin_id = first.accounts()[0].id.clone();
        drop(first);

        let second = AccountStore::open(storage, &admin_seed()).await.unwrap();
        assert_eq!(second.accounts().len(), 1);
        assert_eq!(second.accounts()[0].id, admin_id);
    }

    #[tokio::test]
    async fn create_assigns_id_role_and_normalized_email() {
        let mut store = open_store().await;

        let account = store
            .create_account(jane("  Jane.Doe@Example.COM "))
            .await
            .unwrap();

        assert!(!account.id.is_empty());
        assert_eq!(account.email, "jane.doe@example.com");
        assert_eq!(account.role, AccountRole::User);
        assert!(account.last_login.is_none());
        assert_eq!(store.accounts().len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_case_insensitively() {
        let mut store = open_store().await;
        store.create_account(jane("a@b.com")).await.unwrap();

        let err = store.create_account(jane("A@B.COM")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.accounts().len(), 2);
    }

    #[tokio::test]
    async fn create_does_not_touch_the_session() {
        let mut store = open_store().await;
        store.create_account(jane("a@b.com")).await.unwrap();

        assert!(store.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn authenticate_round_trip() {
        let mut store = open_store().await;
        let created = store.create_account(jane("a@b.com")).await.unwrap();

        let logged_in = store
            .authenticate("A@B.com", "secret1")
            .await
            .unwrap()
            .expect("credentials should match");

        assert_eq!(logged_in.id, created.id);
        assert_eq!(logged_in.email, created.email);
        assert_eq!(logged_in.first_name, created.first_name);
        assert_eq!(logged_in.last_name, created.last_name);
        assert_eq!(logged_in.password, "secret1");
        assert!(logged_in.last_login.is_some());

        let session = store.current_session().await.unwrap().unwrap();
        assert_eq!(session.id, created.id);
    }

    #[tokio::test]
    async fn authenticate_miss_is_not_an_error_and_keeps_session() {
        let mut store = open_store().await;
        let created = store.create_account(jane("a@b.com")).await.unwrap();
        store.authenticate("a@b.com", "secret1").await.unwrap();

        assert!(store
            .authenticate("a@b.com", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .authenticate("nobody@b.com", "secret1")
            .await
            .unwrap()
            .is_none());

        // the previous session survives the failed attempts
        let session = store.current_session().await.unwrap().unwrap();
        assert_eq!(session.id, created.id);
    }

    #[tokio::test]
    async fn session_is_a_live_reference() {
        let mut store = open_store().await;
        let created = store.create_account(jane("a@b.com")).await.unwrap();
        store.authenticate("a@b.com", "secret1").await.unwrap();

        store
            .update_account(
                &created.id,
                AccountUpdate {
                    first_name: Some("Janet".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let session = store.current_session().await.unwrap().unwrap();
        assert_eq!(session.first_name, "Janet");
    }

    #[tokio::test]
    async fn update_rejects_email_taken_by_another_account() {
        let mut store = open_store().await;
        store.create_account(jane("a@b.com")).await.unwrap();
        let other = store.create_account(jane("c@d.com")).await.unwrap();

        let err = store
            .update_account(
                &other.id,
                AccountUpdate {
                    email: Some("A@B.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        // no partial write
        assert_eq!(store.accounts()[2].email, "c@d.com");
    }

    #[tokio::test]
    async fn update_keeps_own_email_without_conflict() {
        let mut store = open_store().await;
        let created = store.create_account(jane("a@b.com")).await.unwrap();

        let updated = store
            .update_account(
                &created.id,
                AccountUpdate {
                    email: Some("A@B.com".into()),
                    last_name: Some("  Smith ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.email, "a@b.com");
        assert_eq!(updated.last_name, "Smith");
    }

    #[tokio::test]
    async fn update_unknown_id_returns_none() {
        let mut store = open_store().await;
        let result = store
            .update_account("missing", AccountUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn protected_admin_cannot_be_deleted_or_demoted() {
        let mut store = open_store().await;
        let admin_id = store.accounts()[0].id.clone();

        assert!(!store.delete_account(&admin_id).await.unwrap());
        assert!(!store.demote(&admin_id).await.unwrap());

        assert_eq!(store.accounts().len(), 1);
        assert_eq!(store.accounts()[0].role, AccountRole::Admin);
    }

    #[tokio::test]
    async fn promote_then_demote_round_trips() {
        let mut store = open_store().await;
        let created = store.create_account(jane("a@b.com")).await.unwrap();

        assert!(store.promote(&created.id).await.unwrap());
        assert_eq!(store.accounts()[1].role, AccountRole::Admin);

        assert!(store.demote(&created.id).await.unwrap());
        assert_eq!(store.accounts()[1].role, AccountRole::User);
    }

    #[tokio::test]
    async fn promote_unknown_id_returns_false() {
        let mut store = open_store().await;
        assert!(!store.promote("missing").await.unwrap());
        assert!(!store.demote("missing").await.unwrap());
    }

    #[tokio::test]
    async fn delete_clears_the_session_it_referenced() {
        let mut store = open_store().await;
        let created = store.create_account(jane("a@b.com")).await.unwrap();
        store.authenticate("a@b.com", "secret1").await.unwrap();

        assert!(store.delete_account(&created.id).await.unwrap());
        assert!(store.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_heals_a_stale_persisted_session() {
        let storage = Arc::new(InMemoryStorage::new());

        // persist a session record pointing at an account that is not in
        // the directory
        let ghost = Account {
            id: "ghost".into(),
            email: "ghost@b.com".into(),
            first_name: "Gone".into(),
            last_name: "Account".into(),
            password: "pw".into(),
            role: AccountRole::User,
            created_at: Utc::now(),
            last_login: None,
        };
        storage.save_session(Some(&ghost)).await.unwrap();

        let mut store = AccountStore::open(storage.clone(), &admin_seed())
            .await
            .unwrap();

        assert!(store.current_session().await.unwrap().is_none());
        assert!(storage.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_session_is_idempotent() {
        let mut store = open_store().await;
        store.create_account(jane("a@b.com")).await.unwrap();
        store.authenticate("a@b.com", "secret1").await.unwrap();

        store.clear_session().await.unwrap();
        assert!(store.current_session().await.unwrap().is_none());

        store.clear_session().await.unwrap();
        assert!(store.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_current_session_requires_a_known_id() {
        let mut store = open_store().await;
        let created = store.create_account(jane("a@b.com")).await.unwrap();

        assert!(!store.set_current_session("missing").await.unwrap());
        assert!(store.set_current_session(&created.id).await.unwrap());

        let session = store.current_session().await.unwrap().unwrap();
        assert_eq!(session.id, created.id);
    }

    #[tokio::test]
    async fn reset_all_leaves_exactly_the_protected_admin() {
        let mut store = open_store().await;
        store.create_account(jane("a@b.com")).await.unwrap();
        store.create_account(jane("c@d.com")).await.unwrap();
        store.authenticate("a@b.com", "secret1").await.unwrap();

        store.reset_all().await.unwrap();

        assert_eq!(store.accounts().len(), 1);
        let admin = &store.accounts()[0];
        assert!(store.is_protected_admin(&admin.id));
        assert!(store.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn emails_stay_unique_through_create_and_update_sequences() {
        let mut store = open_store().await;
        store.create_account(jane("a@b.com")).await.unwrap();
        let second = store.create_account(jane("c@d.com")).await.unwrap();

        assert!(store.create_account(jane(" A@b.com")).await.is_err());
        assert!(store
            .update_account(
                &second.id,
                AccountUpdate {
                    email: Some("a@B.COM ".into()),
                    ..Default::default()
                },
            )
            .await
            .is_err());

        let mut emails: Vec<_> = store.accounts().iter().map(|a| a.email.clone()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), store.accounts().len());
    }
}

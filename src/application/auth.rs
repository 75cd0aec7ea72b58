//! Session/auth service
//!
//! The only interface UI collaborators use. Wraps the account store with
//! input validation, credential checking and the session state machine,
//! and exposes the derived flags (`is_authenticated`, `is_admin`,
//! `is_loading`) reactively. Validation and conflict failures are always
//! returned as an [`AuthOutcome`]; storage faults are logged here and
//! degraded to a generic failure instead of reaching the UI.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::store::AccountStore;
use super::validation::{is_valid_email, is_valid_name, MIN_PASSWORD_LEN};
use crate::domain::{Account, AccountUpdate, DomainError, NewAccount};

const STORAGE_FAILURE: &str = "Service temporarily unavailable, please try again";

/// Session lifecycle: `Initializing` once at startup while the persisted
/// session is resolved, then cycling between `Anonymous` and
/// `Authenticated` for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Initializing,
    Anonymous,
    Authenticated,
}

/// Result envelope for user-initiated operations
///
/// At most one of the two shapes: `{success: true}` or
/// `{success: false, error: "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Stateful façade over the account store
pub struct AuthService {
    store: AccountStore,
    state: AuthState,
    loading: bool,
}

impl AuthService {
    pub fn new(store: AccountStore) -> Self {
        Self {
            store,
            state: AuthState::Initializing,
            loading: false,
        }
    }

    /// Resolve any persisted session once at startup.
    pub async fn initialize(&mut self) {
        self.loading = true;
        self.state = match self.store.current_session().await {
            Ok(Some(account)) => {
                info!(email = %account.email, "restored persisted session");
                AuthState::Authenticated
            }
            Ok(None) => AuthState::Anonymous,
            Err(err) => {
                error!(error = %err, "session resolution failed");
                AuthState::Anonymous
            }
        };
        self.loading = false;
    }

    // ── User operations ────────────────────────────────────────

    /// Authenticate with email and password.
    ///
    /// A credential miss never reveals which field was wrong.
    pub async fn login(&mut self, email: &str, password: &str) -> AuthOutcome {
        if email.trim().is_empty() || password.is_empty() {
            return AuthOutcome::fail("Email and password are required");
        }
        if !is_valid_email(email.trim()) {
            return AuthOutcome::fail("Invalid email address");
        }

        self.loading = true;
        let outcome = match self.store.authenticate(email, password).await {
            Ok(Some(_)) => {
                self.state = AuthState::Authenticated;
                AuthOutcome::ok()
            }
            Ok(None) => AuthOutcome::fail("Invalid credentials"),
            Err(err) => {
                error!(error = %err, "login failed against storage");
                AuthOutcome::fail(STORAGE_FAILURE)
            }
        };
        self.loading = false;
        outcome
    }

    /// Create an account and log it in (auto-login after registration).
    pub async fn register(&mut self, request: RegisterRequest) -> AuthOutcome {
        let email = request.email.trim();
        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();

        if email.is_empty()
            || first_name.is_empty()
            || last_name.is_empty()
            || request.password.is_empty()
            || request.confirm_password.is_empty()
        {
            return AuthOutcome::fail("All fields are required");
        }
        if !is_valid_email(email) {
            return AuthOutcome::fail("Invalid email address");
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return AuthOutcome::fail("Password must be at least 6 characters");
        }
        if request.password != request.confirm_password {
            return AuthOutcome::fail("Passwords do not match");
        }
        if !is_valid_name(first_name) || !is_valid_name(last_name) {
            return AuthOutcome::fail(
                "Names may only contain letters, spaces, hyphens and apostrophes",
            );
        }

        self.loading = true;
        let outcome = match self
            .store
            .create_account(NewAccount {
                email: email.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                password: request.password,
            })
            .await
        {
            Ok(account) => match self.store.set_current_session(&account.id).await {
                Ok(_) => {
                    info!(email = %account.email, "registered and logged in");
                    self.state = AuthState::Authenticated;
                    AuthOutcome::ok()
                }
                Err(err) => {
                    error!(error = %err, "auto-login after registration failed");
                    AuthOutcome::fail(STORAGE_FAILURE)
                }
            },
            Err(DomainError::Conflict(message)) => AuthOutcome::fail(message),
            Err(err) => {
                error!(error = %err, "registration failed against storage");
                AuthOutcome::fail(STORAGE_FAILURE)
            }
        };
        self.loading = false;
        outcome
    }

    /// Clear the session. Idempotent; calling it without an active
    /// session is not an error.
    pub async fn logout(&mut self) {
        if let Err(err) = self.store.clear_session().await {
            error!(error = %err, "failed to persist session clear");
        }
        self.state = AuthState::Anonymous;
    }

    /// Update the current account's profile fields.
    ///
    /// Present fields are re-validated with the registration rules; the
    /// store's email conflict surfaces as a user-facing message.
    pub async fn update_profile(&mut self, update: AccountUpdate) -> AuthOutcome {
        let Some(current) = self.current_account().await else {
            return AuthOutcome::fail("No active session");
        };

        if let Some(email) = &update.email {
            if !is_valid_email(email.trim()) {
                return AuthOutcome::fail("Invalid email address");
            }
        }
        if let Some(first_name) = &update.first_name {
            if !is_valid_name(first_name.trim()) {
                return AuthOutcome::fail(
                    "Names may only contain letters, spaces, hyphens and apostrophes",
                );
            }
        }
        if let Some(last_name) = &update.last_name {
            if !is_valid_name(last_name.trim()) {
                return AuthOutcome::fail(
                    "Names may only contain letters, spaces, hyphens and apostrophes",
                );
            }
        }
        if let Some(password) = &update.password {
            if password.chars().count() < MIN_PASSWORD_LEN {
                return AuthOutcome::fail("Password must be at least 6 characters");
            }
        }

        match self.store.update_account(&current.id, update).await {
            Ok(Some(_)) => AuthOutcome::ok(),
            Ok(None) => AuthOutcome::fail("No active session"),
            Err(DomainError::Conflict(message)) => AuthOutcome::fail(message),
            Err(err) => {
                error!(error = %err, "profile update failed against storage");
                AuthOutcome::fail(STORAGE_FAILURE)
            }
        }
    }

    // ── Derived flags ──────────────────────────────────────────

    /// The current account, resolved live against the directory. A
    /// session whose account was deleted elsewhere heals to `None` and
    /// flips the state machine to `Anonymous` without an explicit logout.
    pub async fn current_account(&mut self) -> Option<Account> {
        match self.store.current_session().await {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                if self.state == AuthState::Authenticated {
                    self.state = AuthState::Anonymous;
                }
                None
            }
            Err(err) => {
                error!(error = %err, "session resolution failed");
                None
            }
        }
    }

    pub async fn is_authenticated(&mut self) -> bool {
        self.current_account().await.is_some()
    }

    pub async fn is_admin(&mut self) -> bool {
        self.current_account()
            .await
            .map(|account| account.is_admin())
            .unwrap_or(false)
    }

    /// True only while `initialize`, `login` or `register` is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    // ── Admin-gated directory operations ───────────────────────

    /// The full directory, visible to administrators only.
    pub async fn directory(&mut self) -> Option<Vec<Account>> {
        if !self.is_admin().await {
            return None;
        }
        Some(self.store.accounts().to_vec())
    }

    /// Delete an account. Requires an admin session; refusals for the
    /// protected administrator surface as a visible failure.
    pub async fn delete_account(&mut self, id: &str) -> AuthOutcome {
        if !self.is_admin().await {
            return AuthOutcome::fail("Administrator access required");
        }
        match self.store.delete_account(id).await {
            Ok(true) => AuthOutcome::ok(),
            Ok(false) if self.store.is_protected_admin(id) => {
                AuthOutcome::fail("The protected administrator cannot be deleted")
            }
            Ok(false) => AuthOutcome::fail("Account not found"),
            Err(err) => {
                error!(error = %err, "account deletion failed against storage");
                AuthOutcome::fail(STORAGE_FAILURE)
            }
        }
    }

    /// Grant the admin role to an account.
    pub async fn promote_account(&mut self, id: &str) -> AuthOutcome {
        if !self.is_admin().await {
            return AuthOutcome::fail("Administrator access required");
        }
        match self.store.promote(id).await {
            Ok(true) => AuthOutcome::ok(),
            Ok(false) => AuthOutcome::fail("Account not found"),
            Err(err) => {
                error!(error = %err, "promotion failed against storage");
                AuthOutcome::fail(STORAGE_FAILURE)
            }
        }
    }

    /// Revoke the admin role; the protected administrator is refused.
    pub async fn demote_account(&mut self, id: &str) -> AuthOutcome {
        if !self.is_admin().await {
            return AuthOutcome::fail("Administrator access required");
        }
        match self.store.demote(id).await {
            Ok(true) => AuthOutcome::ok(),
            Ok(false) if self.store.is_protected_admin(id) => {
                AuthOutcome::fail("The protected administrator cannot be demoted")
            }
            Ok(false) => AuthOutcome::fail("Account not found"),
            Err(err) => {
                error!(error = %err, "demotion failed against storage");
                AuthOutcome::fail(STORAGE_FAILURE)
            }
        }
    }

    /// Wipe the directory and re-seed the protected administrator.
    /// Administrative operation, not a normal user path.
    pub async fn reset_directory(&mut self) -> AuthOutcome {
        if !self.is_admin().await {
            return AuthOutcome::fail("Administrator access required");
        }
        match self.store.reset_all().await {
            Ok(()) => {
                // the reset cleared every session, including the caller's
                self.state = AuthState::Anonymous;
                AuthOutcome::ok()
            }
            Err(err) => {
                error!(error = %err, "directory reset failed against storage");
                AuthOutcome::fail(STORAGE_FAILURE)
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

//! # ModFusion Account Directory
//!
//! Account directory and session-authentication core for the ModFusion
//! single-page application.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: the account entity, DTOs, error taxonomy and the storage port
//! - **application**: the account store (directory invariants, session
//!   pointer) and the auth service consumed by UI collaborators
//! - **infrastructure**: storage backends (JSON records on disk, in-memory)
//!
//! Known limitation, kept deliberately for parity with the original demo:
//! passwords are stored and compared in plaintext, and there is no token
//! issuance or concurrent-session support.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{default_config_path, AppConfig};

// Re-export the service surface for easy access
pub use application::{AccountStore, AuthOutcome, AuthService, AuthState, RegisterRequest};
pub use domain::{
    Account, AccountRole, AccountUpdate, DomainError, DomainResult, NewAccount, Storage,
};
pub use infrastructure::{InMemoryStorage, JsonFileStorage};

//! # authgate-auth
//!
//! The token and session lifecycle engine.
//!
//! ## Modules
//!
//! - `engine`: wiring of every component over one set of stores
//! - `ledger`: durable record of issued credentials (Postgres or in-memory)
//! - `revocation`: self-expiring blacklist consulted on every request
//! - `lockout`: per-principal failed-attempt counting and lockout
//! - `lease`: time-bounded cross-instance mutual exclusion
//! - `policy`: device login policy and atomic admission
//! - `session`: session views derived from the ledger
//! - `validator`: the credential usability predicate
//! - `login`: the end-to-end login flow

pub mod engine;
pub mod lease;
pub mod ledger;
pub mod lockout;
pub mod login;
pub mod policy;
pub mod revocation;
pub mod session;
pub mod validator;

pub use engine::{AuthEngine, EngineSettings};
pub use lease::{LeaseGuard, LeaseManager};
pub use ledger::TokenLedger;
pub use lockout::{LockoutGuard, LockoutStore};
pub use login::{LoginCoordinator, LoginOutcome};
pub use policy::{LoginPolicyEnforcer, NewLogin};
pub use revocation::RevocationCache;
pub use session::SessionDirectory;
pub use validator::{CredentialValidator, Usability};
